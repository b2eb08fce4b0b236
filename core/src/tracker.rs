//! At-most-once view counting per page visit.
//!
//! # Design
//! A rendering host may mount, re-run effects, or remount the same page
//! several times during one visit. Counting a view on every load would
//! overcount, so the claim to record a view lives in a `PageVisit` created
//! per visit and dropped with it. The claim is an atomic check-and-set:
//! only the first caller wins, however the loads interleave.
//!
//! State per visit: `UNTRACKED -> TRACK_ISSUED`, no way back. A new visit is
//! a new `PageVisit`.
//!
//! Tracking runs in a spawned task and its outcome never reaches the page:
//! a rate-limited `tracked: false` is a success and a failure is only
//! logged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::client::BlogClient;
use crate::error::ApiError;
use crate::transport::Transport;
use crate::types::Post;

/// Guard scoped to one logical page visit.
#[derive(Debug)]
pub struct PageVisit {
    id: Uuid,
    claimed: AtomicBool,
    active: AtomicBool,
}

impl PageVisit {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            claimed: AtomicBool::new(false),
            active: AtomicBool::new(true),
        }
    }

    /// Identifier used to correlate this visit's log events.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Claim the visit's single view. Returns `true` exactly once.
    pub fn try_claim(&self) -> bool {
        self.claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn is_claimed(&self) -> bool {
        self.claimed.load(Ordering::Acquire)
    }

    /// Mark the visit as gone. Responses that arrive afterwards are dropped.
    pub fn tear_down(&self) {
        self.active.store(false, Ordering::Release);
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Default for PageVisit {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of loading a post for a visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostLoad {
    Loaded(Post),
    /// The visit was torn down before the fetch finished.
    Discarded,
}

/// Loads posts for a page and records at most one view per visit.
#[derive(Debug)]
pub struct ViewTracker<T> {
    client: Arc<BlogClient<T>>,
}

impl<T> Clone for ViewTracker<T> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl<T: Transport + 'static> ViewTracker<T> {
    pub fn new(client: Arc<BlogClient<T>>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &BlogClient<T> {
        &self.client
    }

    /// Fetch a post for `visit` and, on success, record the visit's view.
    ///
    /// Fetch errors are returned for the page to display. If the visit was
    /// torn down while the fetch was pending, the result is dropped whatever
    /// it was and no view is recorded.
    pub async fn load_post(&self, visit: &PageVisit, slug: &str) -> Result<PostLoad, ApiError> {
        let result = self.client.get_post_by_slug(slug).await;

        if !visit.is_active() {
            debug!(visit = %visit.id(), slug, "visit torn down before post arrived, discarding");
            return Ok(PostLoad::Discarded);
        }

        let post = result?;
        self.record_view(visit, slug);
        Ok(PostLoad::Loaded(post))
    }

    /// Issue the track-view call if this visit has not claimed its view yet.
    ///
    /// Returns the handle of the spawned call, or `None` when nothing was
    /// sent. Outside a tokio runtime nothing is sent and the visit stays
    /// unclaimed.
    pub fn record_view(&self, visit: &PageVisit, slug: &str) -> Option<JoinHandle<()>> {
        let Ok(runtime) = Handle::try_current() else {
            debug!(visit = %visit.id(), slug, "no tokio runtime, view not recorded");
            return None;
        };
        if !visit.is_active() || !visit.try_claim() {
            return None;
        }

        let client = Arc::clone(&self.client);
        let slug = slug.to_string();
        let visit_id = visit.id();
        Some(runtime.spawn(async move {
            match client.track_post_view(&slug).await {
                Ok(outcome) => debug!(
                    visit = %visit_id,
                    slug = %slug,
                    tracked = outcome.tracked,
                    message = %outcome.message,
                    "view recorded"
                ),
                Err(e) => debug!(visit = %visit_id, slug = %slug, error = %e, "view tracking failed"),
            }
        }))
    }
}
