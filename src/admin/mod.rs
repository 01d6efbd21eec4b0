//! Administration controllers: users, invitations, submissions, analytics.

pub mod analytics;
pub mod invitations;
pub mod submissions;
pub mod users;
