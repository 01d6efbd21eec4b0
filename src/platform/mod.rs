//! Hosted platform integration: RPC client, duplicate resolver, and mailer.

pub mod client;
pub mod mailer;
pub mod resolver;

pub use client::PlatformClient;
pub use mailer::{EmailMessage, EmailTemplate, Mailer};
pub use resolver::{RpcResolver, UnconfiguredResolver};
