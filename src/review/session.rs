//! Per-reviewer duplicate review controller.
//!
//! State lives behind a `tokio::sync::Mutex`. Remote calls happen with the
//! lock released: a submit is split into begin (validate and mark busy),
//! call, and finish (apply the outcome). The busy flag stops a second
//! submit from starting while the first is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::ReviewConfig;
use crate::models::duplicate::{
    DismissMethod, DismissRequest, DuplicateGroup, ResolveRequest, Selection,
};
use crate::models::resolution::{ResolutionKind, ResolutionRecord};
use crate::persistence::resolution_repo::ResolutionRepo;
use crate::{AppError, Result};

use super::notice::ResolutionNotice;
use super::queue::{Navigation, ReviewQueue};
use super::resolver::{DuplicateResolver, GroupSource};
use super::selection::SelectionMap;

/// Message placed in the error slot when the platform cannot be reached.
pub const TRANSPORT_ERROR_MESSAGE: &str =
    "The request could not be completed. Check your connection and try again.";

const REJECTED_FALLBACK_MESSAGE: &str = "The platform rejected the request";

/// Which submit is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitAction {
    /// Save & Next merging the group.
    Resolve,
    /// Keep All dismissing the group.
    Dismiss,
}

/// Result of a submit that reached the platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The group was closed and removed from the queue.
    Completed {
        /// Where the reviewer goes next.
        navigation: Navigation,
        /// Confirmation for the list view.
        notice: ResolutionNotice,
    },
    /// The platform refused; queue and selections are unchanged.
    Rejected {
        /// Server-provided reason.
        message: String,
    },
}

/// Review behavior settings.
#[derive(Debug, Clone)]
pub struct ReviewSettings {
    /// Reason sent with every dismissal.
    pub dismiss_reason: String,
    /// How long closed groups stay hidden from reloaded queues.
    pub recently_resolved_ttl: Duration,
}

impl From<&ReviewConfig> for ReviewSettings {
    fn from(config: &ReviewConfig) -> Self {
        Self {
            dismiss_reason: config.dismiss_reason.clone(),
            recently_resolved_ttl: Duration::from_secs(config.recently_resolved_ttl_seconds),
        }
    }
}

/// One lesson's selection as rendered for the reviewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionEntry {
    /// Lesson identifier.
    pub lesson_id: String,
    /// Current choice.
    #[serde(flatten)]
    pub selection: Selection,
}

/// Snapshot of the open group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    /// The group being reviewed.
    pub group: DuplicateGroup,
    /// Selections in lesson order.
    pub selections: Vec<SelectionEntry>,
    /// Whether Save & Next may be submitted.
    pub has_valid_selection: bool,
    /// Whether selections were edited since the group was opened.
    pub has_changes: bool,
    /// Submit in flight, if any.
    pub submitting: Option<SubmitAction>,
    /// Last failure message.
    pub error: Option<String>,
    /// One-based position in the queue.
    pub position: usize,
    /// Pending groups.
    pub total: usize,
    /// Group that Skip or a completed submit would open.
    pub next_group_id: Option<String>,
}

/// Snapshot of the queue list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueView {
    /// Pending groups in order.
    pub groups: Vec<DuplicateGroup>,
    /// Pending group count.
    pub total: usize,
    /// Group currently open, if any.
    pub current_group_id: Option<String>,
    /// Confirmation of the last closed group, delivered once.
    pub notice: Option<ResolutionNotice>,
}

#[derive(Default)]
struct ReviewState {
    loaded: bool,
    queue: ReviewQueue,
    selections: SelectionMap,
    has_changes: bool,
    submitting: Option<SubmitAction>,
    error: Option<String>,
    recently_resolved: HashMap<String, Instant>,
    notice: Option<ResolutionNotice>,
}

impl ReviewState {
    /// Reset selections to all-keep for whatever group is now current.
    fn reset_selections(&mut self) {
        self.selections = self
            .queue
            .current()
            .map(SelectionMap::all_keep)
            .unwrap_or_default();
        self.has_changes = false;
        self.error = None;
    }

    /// Open `group_id` unless it is already current.
    fn make_current(&mut self, group_id: &str) -> Result<()> {
        if self.queue.current_id() == Some(group_id) {
            return Ok(());
        }
        if self.queue.open(group_id).is_none() {
            return Err(AppError::NotFound(format!("duplicate group {group_id}")));
        }
        self.reset_selections();
        Ok(())
    }

    fn view(&self) -> Result<GroupView> {
        let group = self
            .queue
            .current()
            .ok_or_else(|| AppError::NotFound("no duplicate group is open".into()))?;
        let next_group_id = match self.queue.next_after(&group.group_id) {
            Navigation::Group(id) => Some(id),
            Navigation::List => None,
        };
        Ok(GroupView {
            group: group.clone(),
            selections: self
                .selections
                .iter()
                .map(|(id, selection)| SelectionEntry {
                    lesson_id: id.to_owned(),
                    selection: selection.clone(),
                })
                .collect(),
            has_valid_selection: self.selections.is_valid(),
            has_changes: self.has_changes,
            submitting: self.submitting,
            error: self.error.clone(),
            position: self.queue.position(&group.group_id).map_or(0, |p| p + 1),
            total: self.queue.len(),
            next_group_id,
        })
    }

    /// Fill the error slot only if `group_id` is still the open group.
    fn report_error(&mut self, group_id: &str, message: String) {
        if self.queue.current_id() == Some(group_id) {
            self.error = Some(message);
        } else {
            debug!(group_id, %message, "submit failed after the reviewer moved on");
        }
    }

    fn prune_recently_resolved(&mut self, ttl: Duration) {
        self.recently_resolved
            .retain(|_, resolved_at| resolved_at.elapsed() < ttl);
    }
}

enum PendingSubmit {
    Resolve(ResolveRequest),
    Dismiss {
        request: DismissRequest,
        group_id: String,
    },
}

/// Duplicate review controller for one reviewer.
pub struct DuplicateReview {
    reviewer_id: String,
    source: Arc<dyn GroupSource>,
    resolver: Arc<dyn DuplicateResolver>,
    journal: ResolutionRepo,
    settings: ReviewSettings,
    state: Mutex<ReviewState>,
}

impl DuplicateReview {
    /// Create a controller with an unloaded queue.
    #[must_use]
    pub fn new(
        reviewer_id: impl Into<String>,
        source: Arc<dyn GroupSource>,
        resolver: Arc<dyn DuplicateResolver>,
        journal: ResolutionRepo,
        settings: ReviewSettings,
    ) -> Self {
        Self {
            reviewer_id: reviewer_id.into(),
            source,
            resolver,
            journal,
            settings,
            state: Mutex::new(ReviewState::default()),
        }
    }

    /// Reviewer that owns this controller.
    #[must_use]
    pub fn reviewer_id(&self) -> &str {
        &self.reviewer_id
    }

    /// Replace the queue with the pending groups from the source.
    ///
    /// On failure the previous queue and selections are left as they were.
    /// The open group stays open if it is still pending.
    ///
    /// # Errors
    ///
    /// Propagates the source's error.
    pub async fn load(&self) -> Result<QueueView> {
        let span = info_span!("review_load", reviewer_id = %self.reviewer_id);
        let groups = self
            .source
            .fetch_groups(false)
            .instrument(span)
            .await
            .inspect_err(|err| {
                warn!(%err, reviewer_id = %self.reviewer_id, "failed to load duplicate queue");
            })?;

        let mut state = self.state.lock().await;
        state.prune_recently_resolved(self.settings.recently_resolved_ttl);
        let recently_resolved = &state.recently_resolved;
        let pending: Vec<DuplicateGroup> = groups
            .into_iter()
            .filter(|g| !recently_resolved.contains_key(&g.group_id))
            .collect();

        let previous = state.queue.current_id().map(str::to_owned);
        state.queue = ReviewQueue::new(pending);
        let still_open = previous
            .as_deref()
            .is_some_and(|id| state.queue.open(id).is_some());
        if !still_open {
            state.reset_selections();
        }
        state.loaded = true;
        info!(
            reviewer_id = %self.reviewer_id,
            pending = state.queue.len(),
            "duplicate queue loaded"
        );
        Ok(queue_view(&mut state, false))
    }

    async fn ensure_loaded(&self) -> Result<()> {
        let loaded = self.state.lock().await.loaded;
        if !loaded {
            self.load().await?;
        }
        Ok(())
    }

    /// Queue list, consuming any pending notice.
    ///
    /// # Errors
    ///
    /// Propagates the source's error when the queue has not been loaded yet.
    pub async fn queue(&self) -> Result<QueueView> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        Ok(queue_view(&mut state, true))
    }

    /// Take the pending notice, if any.
    pub async fn take_notice(&self) -> Option<ResolutionNotice> {
        self.state.lock().await.notice.take()
    }

    /// Open a group by id.
    ///
    /// Selections reset to all-keep when the open group changes.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the group is not pending.
    pub async fn open(&self, group_id: &str) -> Result<GroupView> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        state.make_current(group_id)?;
        state.view()
    }

    /// Overwrite one lesson's selection.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown group or lesson.
    pub async fn set_selection(
        &self,
        group_id: &str,
        lesson_id: &str,
        selection: Selection,
    ) -> Result<GroupView> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        state.make_current(group_id)?;
        if !state.selections.set(lesson_id, selection) {
            return Err(AppError::NotFound(format!(
                "lesson {lesson_id} in group {group_id}"
            )));
        }
        state.has_changes = true;
        state.view()
    }

    /// Keep one lesson and archive the rest into it.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown group or lesson.
    pub async fn quick_keep(&self, group_id: &str, lesson_id: &str) -> Result<GroupView> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        state.make_current(group_id)?;
        if !state.selections.quick_keep(lesson_id) {
            return Err(AppError::NotFound(format!(
                "lesson {lesson_id} in group {group_id}"
            )));
        }
        state.has_changes = true;
        state.view()
    }

    /// Move to the next group without submitting.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the group is not pending.
    pub async fn skip(&self, group_id: &str) -> Result<Navigation> {
        self.ensure_loaded().await?;
        let mut state = self.state.lock().await;
        if state.queue.position(group_id).is_none() {
            return Err(AppError::NotFound(format!("duplicate group {group_id}")));
        }
        let navigation = state.queue.skip(group_id);
        state.reset_selections();
        info!(reviewer_id = %self.reviewer_id, group_id, ?navigation, "group skipped");
        Ok(navigation)
    }

    /// Leave the open group, discarding selections.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Conflict` if selections were edited and `force`
    /// is not set.
    pub async fn leave(&self, force: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.has_changes && !force {
            return Err(AppError::Conflict(
                "you have unsaved selections; leave with force to discard them".into(),
            ));
        }
        state.queue.close();
        state.reset_selections();
        Ok(())
    }

    /// Whether selections were edited since the group was opened.
    pub async fn has_unsaved_changes(&self) -> bool {
        self.state.lock().await.has_changes
    }

    /// Dismiss the group: every lesson is kept as distinct.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` for an unknown group, `AppError::Conflict`
    /// while another submit is in flight, or the transport error.
    pub async fn keep_all(&self, group_id: &str) -> Result<ActionOutcome> {
        self.ensure_loaded().await?;
        let pending = {
            let mut state = self.state.lock().await;
            state.make_current(group_id)?;
            self.begin_dismiss(&mut state)?
        };
        self.run(pending).await
    }

    /// Submit the selections and move on.
    ///
    /// An all-keep selection is sent as a dismissal.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` when the selection is not submittable,
    /// `AppError::NotFound` for an unknown group, `AppError::Conflict` while
    /// another submit is in flight, or the transport error.
    pub async fn save_and_next(&self, group_id: &str) -> Result<ActionOutcome> {
        self.ensure_loaded().await?;
        let pending = {
            let mut state = self.state.lock().await;
            state.make_current(group_id)?;
            ensure_idle(&state)?;
            if !state.selections.is_valid() {
                return Err(AppError::Validation(
                    "keep at least one lesson and choose a target for every archived lesson"
                        .into(),
                ));
            }
            if state.selections.is_all_keep() {
                self.begin_dismiss(&mut state)?
            } else {
                state.submitting = Some(SubmitAction::Resolve);
                state.error = None;
                PendingSubmit::Resolve(ResolveRequest {
                    group_id: group_id.to_owned(),
                    resolutions: state.selections.resolutions(),
                })
            }
        };
        self.run(pending).await
    }

    fn begin_dismiss(&self, state: &mut ReviewState) -> Result<PendingSubmit> {
        ensure_idle(state)?;
        let group = state
            .queue
            .current()
            .ok_or_else(|| AppError::NotFound("no duplicate group is open".into()))?;
        let request = DismissRequest {
            lesson_ids: group.lesson_ids(),
            detection_method: DismissMethod::from(group.detection_method),
            reason: self.settings.dismiss_reason.clone(),
        };
        let group_id = group.group_id.clone();
        state.submitting = Some(SubmitAction::Dismiss);
        state.error = None;
        Ok(PendingSubmit::Dismiss { request, group_id })
    }

    async fn run(&self, pending: PendingSubmit) -> Result<ActionOutcome> {
        match pending {
            PendingSubmit::Resolve(request) => {
                let span = info_span!(
                    "review_resolve",
                    reviewer_id = %self.reviewer_id,
                    group_id = %request.group_id
                );
                let result = self.resolver.resolve(&request).instrument(span).await;
                match result {
                    Ok(outcome) if outcome.success => {
                        let record = ResolutionRecord::new(
                            request.group_id.clone(),
                            ResolutionKind::Resolved,
                            self.reviewer_id.clone(),
                            outcome.kept_count,
                            outcome.archived_count,
                            None,
                        );
                        let notice = ResolutionNotice::resolved(
                            &request.group_id,
                            outcome.kept_count,
                            outcome.archived_count,
                        );
                        Ok(self.complete(&request.group_id, &record, notice).await)
                    }
                    Ok(outcome) => Ok(self.reject(&request.group_id, outcome.error).await),
                    Err(err) => Err(self.fail(&request.group_id, err).await),
                }
            }
            PendingSubmit::Dismiss { request, group_id } => {
                let span = info_span!(
                    "review_dismiss",
                    reviewer_id = %self.reviewer_id,
                    group_id = %group_id
                );
                let result = self.resolver.dismiss(&request).instrument(span).await;
                match result {
                    Ok(outcome) if outcome.success => {
                        let lesson_count =
                            u32::try_from(request.lesson_ids.len()).unwrap_or(u32::MAX);
                        let record = ResolutionRecord::new(
                            group_id.clone(),
                            ResolutionKind::Dismissed,
                            self.reviewer_id.clone(),
                            lesson_count,
                            0,
                            Some(request.reason.clone()),
                        );
                        let notice = ResolutionNotice::dismissed(&group_id, lesson_count);
                        Ok(self.complete(&group_id, &record, notice).await)
                    }
                    Ok(outcome) => Ok(self.reject(&group_id, outcome.error).await),
                    Err(err) => Err(self.fail(&group_id, err).await),
                }
            }
        }
    }

    async fn complete(
        &self,
        group_id: &str,
        record: &ResolutionRecord,
        notice: ResolutionNotice,
    ) -> ActionOutcome {
        if let Err(err) = self.journal.record(record).await {
            warn!(%err, group_id, "failed to journal duplicate resolution");
        }

        let mut state = self.state.lock().await;
        state.submitting = None;
        state
            .recently_resolved
            .insert(group_id.to_owned(), Instant::now());

        let was_current = state.queue.current_id() == Some(group_id);
        let next = state.queue.complete(group_id);
        let navigation = if was_current {
            state.reset_selections();
            next
        } else {
            state
                .queue
                .current_id()
                .map_or(Navigation::List, |id| Navigation::Group(id.to_owned()))
        };
        state.notice = Some(notice.clone());
        info!(
            reviewer_id = %self.reviewer_id,
            group_id,
            kind = record.kind.as_str(),
            remaining = state.queue.len(),
            "duplicate group closed"
        );
        ActionOutcome::Completed { navigation, notice }
    }

    async fn reject(&self, group_id: &str, message: Option<String>) -> ActionOutcome {
        let message = message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| REJECTED_FALLBACK_MESSAGE.to_owned());
        warn!(reviewer_id = %self.reviewer_id, group_id, %message, "platform rejected submit");
        let mut state = self.state.lock().await;
        state.submitting = None;
        state.report_error(group_id, message.clone());
        ActionOutcome::Rejected { message }
    }

    async fn fail(&self, group_id: &str, err: AppError) -> AppError {
        warn!(reviewer_id = %self.reviewer_id, group_id, %err, "submit failed");
        let mut state = self.state.lock().await;
        state.submitting = None;
        state.report_error(group_id, TRANSPORT_ERROR_MESSAGE.to_owned());
        err
    }
}

fn ensure_idle(state: &ReviewState) -> Result<()> {
    match state.submitting {
        Some(action) => Err(AppError::Conflict(format!(
            "a {} is already in progress",
            match action {
                SubmitAction::Resolve => "resolve",
                SubmitAction::Dismiss => "dismiss",
            }
        ))),
        None => Ok(()),
    }
}

fn queue_view(state: &mut ReviewState, take_notice: bool) -> QueueView {
    QueueView {
        groups: state.queue.groups().to_vec(),
        total: state.queue.len(),
        current_group_id: state.queue.current_id().map(str::to_owned),
        notice: if take_notice {
            state.notice.take()
        } else {
            None
        },
    }
}
