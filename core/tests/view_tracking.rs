//! `ViewTracker` against an in-memory backend.
//!
//! The scripted transport answers the post fetch and the track-view call
//! without a network, counts track-view requests, and can hold the post
//! fetch until the test releases it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blog_core::{
    BlogClient, HttpMethod, HttpRequest, HttpResponse, PageVisit, PostLoad, Transport,
    TransportError, ViewTracker,
};
use tokio::sync::Notify;

const BASE: &str = "http://blog.test/api/blog";

fn post_json(slug: &str, views: u64) -> String {
    serde_json::json!({
        "id": 7,
        "title": "Haldi Ideas",
        "slug": slug,
        "category": {"id": 2, "name": "Decor", "slug": "decor"},
        "is_published": true,
        "view_count": views
    })
    .to_string()
}

struct Backend {
    post: Mutex<HttpResponse>,
    track: Mutex<Result<HttpResponse, TransportError>>,
    gate: Option<Arc<Notify>>,
    track_calls: AtomicUsize,
    fetches_in_flight: AtomicUsize,
    max_fetches_in_flight: AtomicUsize,
}

impl Backend {
    fn new() -> Self {
        Self {
            post: Mutex::new(HttpResponse::new(200, post_json("haldi-ideas", 5))),
            track: Mutex::new(Ok(HttpResponse::new(
                200,
                r#"{"tracked":true,"message":"View tracked"}"#,
            ))),
            gate: None,
            track_calls: AtomicUsize::new(0),
            fetches_in_flight: AtomicUsize::new(0),
            max_fetches_in_flight: AtomicUsize::new(0),
        }
    }

    fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    fn with_post(self, response: HttpResponse) -> Self {
        *self.post.lock().unwrap() = response;
        self
    }

    fn with_track(self, response: Result<HttpResponse, TransportError>) -> Self {
        *self.track.lock().unwrap() = response;
        self
    }

    fn track_calls(&self) -> usize {
        self.track_calls.load(Ordering::SeqCst)
    }

    fn max_fetches_in_flight(&self) -> usize {
        self.max_fetches_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for Backend {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        match request.method {
            HttpMethod::Post if request.url.ends_with("/view") => {
                self.track_calls.fetch_add(1, Ordering::SeqCst);
                let response = self.track.lock().unwrap().clone();
                response
            }
            HttpMethod::Get => {
                let in_flight = self.fetches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.max_fetches_in_flight
                    .fetch_max(in_flight, Ordering::SeqCst);
                if let Some(gate) = &self.gate {
                    gate.notified().await;
                }
                self.fetches_in_flight.fetch_sub(1, Ordering::SeqCst);
                let response = self.post.lock().unwrap().clone();
                Ok(response)
            }
            other => panic!("unexpected {other} {}", request.url),
        }
    }
}

fn tracker_for(backend: &Arc<Backend>) -> ViewTracker<Arc<Backend>> {
    ViewTracker::new(Arc::new(BlogClient::new(BASE, Arc::clone(backend))))
}

/// Let spawned tracking tasks run to completion on the current thread.
async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test(flavor = "current_thread")]
async fn repeated_loads_in_one_visit_track_once() {
    let backend = Arc::new(Backend::new());
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    for _ in 0..4 {
        let load = tracker.load_post(&visit, "haldi-ideas").await.unwrap();
        let PostLoad::Loaded(post) = load else {
            panic!("visit is still active");
        };
        assert_eq!(post.slug, "haldi-ideas");
        assert_eq!(post.view_count, 5);
    }
    settle().await;

    assert_eq!(backend.track_calls(), 1);
    assert!(visit.is_claimed());
}

#[tokio::test(flavor = "current_thread")]
async fn concurrent_loads_in_one_visit_track_once() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(Backend::gated(Arc::clone(&gate)));
    let tracker = tracker_for(&backend);
    let visit = Arc::new(PageVisit::new());

    let loads: Vec<_> = (0..2)
        .map(|_| {
            let tracker = tracker.clone();
            let visit = Arc::clone(&visit);
            tokio::spawn(async move { tracker.load_post(&visit, "haldi-ideas").await })
        })
        .collect();

    // Both fetches are parked on the gate before either response arrives.
    settle().await;
    assert_eq!(backend.max_fetches_in_flight(), 2);
    assert!(!visit.is_claimed());

    gate.notify_waiters();
    for load in loads {
        assert!(matches!(load.await.unwrap().unwrap(), PostLoad::Loaded(_)));
    }
    settle().await;

    assert_eq!(backend.track_calls(), 1);
    assert!(visit.is_claimed());
}

#[tokio::test(flavor = "current_thread")]
async fn separate_visits_each_track_once() {
    let backend = Arc::new(Backend::new());
    let tracker = tracker_for(&backend);

    for _ in 0..2 {
        let visit = PageVisit::new();
        tracker.load_post(&visit, "haldi-ideas").await.unwrap();
        tracker.load_post(&visit, "haldi-ideas").await.unwrap();
    }
    settle().await;

    assert_eq!(backend.track_calls(), 2);
}

#[tokio::test(flavor = "current_thread")]
async fn record_view_hands_out_one_handle() {
    let backend = Arc::new(Backend::new());
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    let handle = tracker.record_view(&visit, "haldi-ideas").unwrap();
    assert!(tracker.record_view(&visit, "haldi-ideas").is_none());
    assert!(tracker.record_view(&visit, "haldi-ideas").is_none());
    handle.await.unwrap();

    assert_eq!(backend.track_calls(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn teardown_before_fetch_completes_discards_and_skips_tracking() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(Backend::gated(Arc::clone(&gate)));
    let tracker = tracker_for(&backend);
    let visit = Arc::new(PageVisit::new());

    let pending = {
        let tracker = tracker.clone();
        let visit = Arc::clone(&visit);
        tokio::spawn(async move { tracker.load_post(&visit, "haldi-ideas").await })
    };
    settle().await;

    visit.tear_down();
    gate.notify_one();

    let load = pending.await.unwrap().unwrap();
    assert_eq!(load, PostLoad::Discarded);
    settle().await;

    assert_eq!(backend.track_calls(), 0);
    assert!(!visit.is_claimed());
}

#[tokio::test(flavor = "current_thread")]
async fn fetch_error_after_teardown_is_discarded_too() {
    let gate = Arc::new(Notify::new());
    let backend = Arc::new(
        Backend::gated(Arc::clone(&gate))
            .with_post(HttpResponse::new(500, r#"{"error":"boom"}"#)),
    );
    let tracker = tracker_for(&backend);
    let visit = Arc::new(PageVisit::new());

    let pending = {
        let tracker = tracker.clone();
        let visit = Arc::clone(&visit);
        tokio::spawn(async move { tracker.load_post(&visit, "haldi-ideas").await })
    };
    settle().await;
    visit.tear_down();
    gate.notify_one();

    assert_eq!(pending.await.unwrap().unwrap(), PostLoad::Discarded);
}

#[tokio::test(flavor = "current_thread")]
async fn torn_down_visit_never_records() {
    let backend = Arc::new(Backend::new());
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();
    visit.tear_down();

    assert!(tracker.record_view(&visit, "haldi-ideas").is_none());
    assert_eq!(
        tracker.load_post(&visit, "haldi-ideas").await.unwrap(),
        PostLoad::Discarded
    );
    settle().await;
    assert_eq!(backend.track_calls(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn fetch_error_is_returned_and_leaves_the_view_unclaimed() {
    let backend = Arc::new(Backend::new().with_post(HttpResponse::new(404, "")));
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    let err = tracker.load_post(&visit, "missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.message(), "Not Found");
    settle().await;

    assert_eq!(backend.track_calls(), 0);
    assert!(!visit.is_claimed());
}

#[tokio::test(flavor = "current_thread")]
async fn tracking_failures_do_not_reach_the_page() {
    let backend = Arc::new(
        Backend::new().with_track(Ok(HttpResponse::new(500, r#"{"error":"db down"}"#))),
    );
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    let load = tracker.load_post(&visit, "haldi-ideas").await.unwrap();
    assert!(matches!(load, PostLoad::Loaded(_)));
    settle().await;
    assert_eq!(backend.track_calls(), 1);

    // Not retried on the next load of the same visit.
    tracker.load_post(&visit, "haldi-ideas").await.unwrap();
    settle().await;
    assert_eq!(backend.track_calls(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn transport_failure_while_tracking_is_swallowed() {
    let backend = Arc::new(
        Backend::new().with_track(Err(TransportError("connection reset".to_string()))),
    );
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    let handle = tracker.record_view(&visit, "haldi-ideas").unwrap();
    handle.await.unwrap();
    assert_eq!(backend.track_calls(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn rate_limited_response_counts_as_done() {
    let backend = Arc::new(Backend::new().with_track(Ok(HttpResponse::new(
        200,
        r#"{"tracked":false,"message":"View rate-limited (already tracked recently)"}"#,
    ))));
    let tracker = tracker_for(&backend);
    let visit = PageVisit::new();

    for _ in 0..3 {
        tracker.load_post(&visit, "haldi-ideas").await.unwrap();
    }
    settle().await;
    assert_eq!(backend.track_calls(), 1);
}
