//! Duplicate-lesson review workflow.
//!
//! A reviewer walks a queue of duplicate groups, picks keep or archive for
//! each lesson, and either merges the group (Save & Next) or declares the
//! lessons distinct (Keep All). The actual merge runs on the platform.

pub mod notice;
pub mod queue;
pub mod registry;
pub mod resolver;
pub mod selection;
pub mod session;

pub use notice::ResolutionNotice;
pub use queue::{Navigation, ReviewQueue};
pub use registry::ReviewRegistry;
pub use resolver::{BoxFuture, DuplicateResolver, GroupSource};
pub use selection::SelectionMap;
pub use session::{
    ActionOutcome, DuplicateReview, GroupView, QueueView, ReviewSettings, SubmitAction,
};
