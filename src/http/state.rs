//! Shared state handed to every handler.

use std::sync::Arc;

use crate::admin::analytics::AnalyticsSources;
use crate::admin::invitations::Invitations;
use crate::persistence::db::Database;
use crate::persistence::invitation_repo::InvitationRepo;
use crate::persistence::lesson_repo::LessonRepo;
use crate::persistence::resolution_repo::ResolutionRepo;
use crate::persistence::submission_repo::SubmissionRepo;
use crate::persistence::user_repo::UserRepo;
use crate::platform::Mailer;
use crate::review::{DuplicateResolver, GroupSource, ReviewRegistry, ReviewSettings};
use crate::{GlobalConfig, Result};

/// Application state shared across requests.
pub struct AppState {
    /// Global configuration.
    pub config: Arc<GlobalConfig>,
    /// User profiles and emails.
    pub users: UserRepo,
    /// Lesson submissions.
    pub submissions: SubmissionRepo,
    /// Invitation controller.
    pub invitations: Invitations,
    /// Dashboard sources.
    pub analytics: AnalyticsSources,
    /// Per-reviewer duplicate review controllers.
    pub reviews: ReviewRegistry,
}

impl AppState {
    /// Wire repositories and controllers over one database.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a controller cannot be built.
    pub fn new(
        config: Arc<GlobalConfig>,
        db: &Arc<Database>,
        mailer: Mailer,
        source: Arc<dyn GroupSource>,
        resolver: Arc<dyn DuplicateResolver>,
    ) -> Result<Self> {
        let users = UserRepo::new(Arc::clone(db));
        let invitation_repo = InvitationRepo::new(Arc::clone(db));
        let submissions = SubmissionRepo::new(Arc::clone(db));
        let resolutions = ResolutionRepo::new(Arc::clone(db));

        let invitations = Invitations::new(
            invitation_repo.clone(),
            users.clone(),
            mailer,
            config.public_url.clone(),
            config.invitations.expiry_days,
        )?;
        let analytics = AnalyticsSources {
            users: users.clone(),
            invitations: invitation_repo,
            submissions: submissions.clone(),
            lessons: LessonRepo::new(Arc::clone(db)),
            resolutions: resolutions.clone(),
        };
        let reviews = ReviewRegistry::new(
            source,
            resolver,
            resolutions,
            ReviewSettings::from(&config.review),
        );

        Ok(Self {
            config,
            users,
            submissions,
            invitations,
            analytics,
            reviews,
        })
    }
}
