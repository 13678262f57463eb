//! Workflow controller tests with scripted collaborators.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use wastemap::workflow::{GEOLOCATION_UNSUPPORTED_MESSAGE, MarkerKind, NoticeKind, StatusLine};
use wastemap::{
    AlertSink, BinQuery, Classifier, Coordinates, GeolocationProvider, ImageUpload, NearbyBin,
    PlacesSearch, Result, SearchSettings, Services, Stage, WasteLabel, WasteMapError, Workflow,
};

// ============================================================================
// Scripted collaborators
// ============================================================================

/// Returns queued results in order; optionally waits for a release first.
struct ScriptedClassifier {
    results: Mutex<VecDeque<Result<WasteLabel>>>,
    release: Option<Arc<Notify>>,
    calls: AtomicU32,
}

impl ScriptedClassifier {
    fn new(results: Vec<Result<WasteLabel>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            release: None,
            calls: AtomicU32::new(0),
        }
    }

    fn gated(results: Vec<Result<WasteLabel>>, release: Arc<Notify>) -> Self {
        Self {
            release: Some(release),
            ..Self::new(results)
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, _image: &ImageUpload) -> Result<WasteLabel> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(release) = &self.release {
            release.notified().await;
        }
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(WasteMapError::Http("no scripted result".into())))
    }
}

/// Never answers for `slow.jpg`; answers `metal` for anything else.
struct SlowFirstClassifier;

#[async_trait]
impl Classifier for SlowFirstClassifier {
    fn name(&self) -> &str {
        "slow-first"
    }

    async fn classify(&self, image: &ImageUpload) -> Result<WasteLabel> {
        if image.file_name == "slow.jpg" {
            std::future::pending::<()>().await;
        }
        WasteLabel::new("metal")
    }
}

struct CountingGeolocation {
    result: fn() -> Result<Coordinates>,
    calls: AtomicU32,
}

impl CountingGeolocation {
    fn new(result: fn() -> Result<Coordinates>) -> Self {
        Self {
            result,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GeolocationProvider for CountingGeolocation {
    fn name(&self) -> &str {
        "counting"
    }

    async fn current_position(&self) -> Result<Coordinates> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        (self.result)()
    }
}

/// Records queries; answers from a queue, then repeats the last entry.
struct RecordingPlaces {
    responses: Mutex<VecDeque<Result<Vec<NearbyBin>>>>,
    queries: Mutex<Vec<BinQuery>>,
}

impl RecordingPlaces {
    fn new(responses: Vec<Result<Vec<NearbyBin>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            queries: Mutex::new(Vec::new()),
        }
    }

    fn queries(&self) -> Vec<BinQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlacesSearch for RecordingPlaces {
    fn name(&self) -> &str {
        "recording"
    }

    async fn search(&self, query: &BinQuery) -> Result<Vec<NearbyBin>> {
        self.queries.lock().unwrap().push(query.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

#[derive(Default)]
struct RecordingAlerts {
    messages: Mutex<Vec<String>>,
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn label(s: &str) -> WasteLabel {
    WasteLabel::new(s).unwrap()
}

fn san_francisco() -> Result<Coordinates> {
    Ok(Coordinates::new(37.77, -122.41))
}

fn unsupported() -> Result<Coordinates> {
    Err(WasteMapError::GeolocationUnavailable)
}

fn denied() -> Result<Coordinates> {
    Err(WasteMapError::GeolocationDenied("User denied Geolocation".into()))
}

fn two_bins() -> Vec<NearbyBin> {
    vec![
        NearbyBin {
            kind: "Plastic Drop-off".into(),
            location: Coordinates::new(37.775, -122.415),
        },
        NearbyBin {
            kind: "Recology".into(),
            location: Coordinates::new(37.765, -122.405),
        },
    ]
}

fn image(name: &str) -> ImageUpload {
    ImageUpload::new(name, b"image-bytes".to_vec())
}

struct Harness {
    workflow: Workflow,
    geolocation: Arc<CountingGeolocation>,
    places: Arc<RecordingPlaces>,
    alerts: Arc<RecordingAlerts>,
}

fn harness(
    classifier: Arc<dyn Classifier>,
    geolocation: fn() -> Result<Coordinates>,
    places: Vec<Result<Vec<NearbyBin>>>,
) -> Harness {
    let geolocation = Arc::new(CountingGeolocation::new(geolocation));
    let places = Arc::new(RecordingPlaces::new(places));
    let alerts = Arc::new(RecordingAlerts::default());
    let services = Services {
        classifier,
        geolocation: geolocation.clone(),
        places: places.clone(),
        alerts: alerts.clone(),
    };
    Harness {
        workflow: Workflow::new(services, SearchSettings::default()),
        geolocation,
        places,
        alerts,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn processing_flag_spans_exactly_the_classify_call() {
    let release = Arc::new(Notify::new());
    let classifier = Arc::new(ScriptedClassifier::gated(
        vec![Ok(label("plastic"))],
        release.clone(),
    ));
    let mut h = harness(classifier, san_francisco, vec![Ok(two_bins())]);

    assert!(!h.workflow.state().is_processing());

    h.workflow.submit_image(image("bottle.jpg"));
    assert!(h.workflow.state().is_processing());
    assert_eq!(h.workflow.state().stage(), Stage::Classifying);
    assert_eq!(h.workflow.view().status, Some(StatusLine::Processing));

    release.notify_one();
    assert!(h.workflow.step().await);
    assert!(!h.workflow.state().is_processing());
    assert_eq!(h.workflow.state().stage(), Stage::LocatingUser);

    h.workflow.settle().await;
    assert!(!h.workflow.state().is_processing());
    assert!(!h.workflow.has_pending());
}

#[tokio::test]
async fn full_pipeline_shows_label_and_markers() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(label("plastic"))]));
    let mut h = harness(classifier, san_francisco, vec![Ok(two_bins())]);

    let view = h.workflow.run(image("bottle.jpg")).await;

    assert_eq!(h.workflow.state().stage(), Stage::Ready);
    assert_eq!(view.status, Some(StatusLine::Classified("PLASTIC".into())));
    assert_eq!(
        view.heading.as_deref(),
        Some("PLASTIC dustbins near your location:")
    );

    let map = view.map.expect("map shown once location is known");
    assert_eq!(map.center, Coordinates::new(37.77, -122.41));
    assert_eq!(map.zoom, 13);
    assert_eq!(map.markers.len(), 3);
    assert_eq!(map.bin_markers().count(), 2);
    let user = map.user_marker().unwrap();
    assert_eq!(user.kind, MarkerKind::User);
    assert_eq!(user.popup, "Your location");
    assert_eq!(
        map.bin_markers().next().unwrap().popup,
        "Dustbin Type: Plastic Drop-off"
    );
}

#[tokio::test]
async fn places_query_uses_label_suffix_and_radius() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(label("glass"))]));
    let mut h = harness(classifier, san_francisco, vec![Ok(vec![])]);

    h.workflow.run(image("jar.png")).await;

    let queries = h.places.queries();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].category, "glass dustbins");
    assert_eq!(queries[0].radius_m, 5000);
    assert_eq!(queries[0].location, Coordinates::new(37.77, -122.41));
}

#[tokio::test]
async fn one_geolocation_request_per_classification() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![
        Ok(label("paper")),
        Ok(label("cardboard")),
    ]));
    let mut h = harness(classifier, san_francisco, vec![]);

    h.workflow.run(image("a.jpg")).await;
    assert_eq!(h.geolocation.calls(), 1);

    h.workflow.run(image("b.jpg")).await;
    assert_eq!(h.geolocation.calls(), 2);
    assert_eq!(h.workflow.state().label(), Some(&label("cardboard")));
}

#[tokio::test]
async fn first_classification_failure_leaves_everything_empty() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![Err(WasteMapError::Http(
        "connection refused".into(),
    ))]));
    let mut h = harness(classifier, san_francisco, vec![]);

    let view = h.workflow.run(image("bottle.jpg")).await;

    assert!(!h.workflow.state().is_processing());
    assert!(h.workflow.state().label().is_none());
    assert_eq!(h.workflow.state().stage(), Stage::Idle);
    assert_eq!(h.geolocation.calls(), 0);
    assert!(h.places.queries().is_empty());
    assert!(view.status.is_none());
    assert!(view.map.is_none());
    assert_eq!(
        view.notice.map(|n| n.kind),
        Some(NoticeKind::ClassificationFailed)
    );
}

#[tokio::test]
async fn later_classification_failure_keeps_previous_label() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![
        Ok(label("metal")),
        Err(WasteMapError::Api {
            status: 500,
            message: "boom".into(),
        }),
    ]));
    let mut h = harness(classifier, san_francisco, vec![Ok(two_bins())]);

    h.workflow.run(image("can.jpg")).await;
    let view = h.workflow.run(image("blurry.jpg")).await;

    assert!(!h.workflow.state().is_processing());
    assert_eq!(h.workflow.state().label(), Some(&label("metal")));
    assert_eq!(view.status, Some(StatusLine::Classified("METAL".into())));
    assert_eq!(h.geolocation.calls(), 1);
    assert_eq!(view.preview.unwrap().file_name, "blurry.jpg");
}

#[tokio::test]
async fn missing_geolocation_alerts_and_skips_places() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(label("plastic"))]));
    let mut h = harness(classifier, unsupported, vec![Ok(two_bins())]);

    let view = h.workflow.run(image("bottle.jpg")).await;

    assert_eq!(
        *h.alerts.messages.lock().unwrap(),
        vec![GEOLOCATION_UNSUPPORTED_MESSAGE.to_string()]
    );
    assert!(h.workflow.state().location().is_none());
    assert!(h.places.queries().is_empty());
    assert!(view.map.is_none());
    assert_eq!(h.workflow.state().stage(), Stage::Classified);
    // The label is still shown.
    assert_eq!(view.status, Some(StatusLine::Classified("PLASTIC".into())));
}

#[tokio::test]
async fn denied_geolocation_is_reported_without_alert() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(label("plastic"))]));
    let mut h = harness(classifier, denied, vec![]);

    let view = h.workflow.run(image("bottle.jpg")).await;

    assert!(h.alerts.messages.lock().unwrap().is_empty());
    assert!(h.places.queries().is_empty());
    let notice = view.notice.unwrap();
    assert_eq!(notice.kind, NoticeKind::GeolocationDenied);
    assert!(notice.message.contains("User denied Geolocation"));
}

#[tokio::test]
async fn places_failure_keeps_previous_bins() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![
        Ok(label("plastic")),
        Ok(label("glass")),
    ]));
    let mut h = harness(
        classifier,
        san_francisco,
        vec![
            Ok(two_bins()),
            Err(WasteMapError::Http("timeout".into())),
        ],
    );

    h.workflow.run(image("one.jpg")).await;
    let view = h.workflow.run(image("two.jpg")).await;

    let queries = h.places.queries();
    assert_eq!(queries.len(), 2);
    assert_eq!(queries[1].category, "glass dustbins");
    assert_eq!(h.workflow.state().bins(), two_bins().as_slice());
    assert_eq!(view.map.unwrap().bin_markers().count(), 2);
    assert_eq!(
        view.notice.map(|n| n.kind),
        Some(NoticeKind::PlacesQueryFailed)
    );
}

#[tokio::test]
async fn same_label_twice_locates_and_searches_once() {
    let classifier = Arc::new(ScriptedClassifier::new(vec![
        Ok(label("plastic")),
        Ok(label("plastic")),
    ]));
    let mut h = harness(classifier, san_francisco, vec![Ok(two_bins())]);

    h.workflow.run(image("one.jpg")).await;
    let view = h.workflow.run(image("two.jpg")).await;

    assert_eq!(h.geolocation.calls(), 1);
    assert_eq!(h.places.queries().len(), 1);
    assert_eq!(h.workflow.state().stage(), Stage::Ready);
    assert_eq!(view.preview.unwrap().file_name, "two.jpg");
    assert_eq!(view.map.unwrap().bin_markers().count(), 2);
}

#[tokio::test]
async fn selecting_while_classifying_keeps_sent_preview() {
    let dir = tempfile::tempdir().unwrap();
    let other = dir.path().join("other.jpg");
    std::fs::write(&other, b"other-bytes").unwrap();

    let release = Arc::new(Notify::new());
    let classifier = Arc::new(ScriptedClassifier::gated(
        vec![Ok(label("plastic"))],
        release.clone(),
    ));
    let mut h = harness(classifier, san_francisco, vec![]);

    h.workflow.submit_image(image("sent.jpg"));
    let pending = h.workflow.select_image(&other).await.unwrap();
    assert_eq!(pending.file_name, "other.jpg");
    assert_eq!(h.workflow.state().stage(), Stage::Classifying);
    assert!(h.workflow.state().is_processing());

    release.notify_one();
    h.workflow.settle().await;

    assert_eq!(h.workflow.state().stage(), Stage::Ready);
    assert_eq!(h.workflow.state().preview().unwrap().file_name, "sent.jpg");
    assert_eq!(h.workflow.state().label(), Some(&label("plastic")));
}

#[tokio::test]
async fn latest_submission_wins() {
    let mut h = harness(Arc::new(SlowFirstClassifier), san_francisco, vec![]);

    h.workflow.submit_image(image("slow.jpg"));
    h.workflow.submit_image(image("fast.jpg"));
    assert_eq!(h.workflow.state().generation(), 2);

    h.workflow.settle().await;

    assert!(!h.workflow.state().is_processing());
    assert_eq!(h.workflow.state().label(), Some(&label("metal")));
    assert_eq!(h.workflow.state().preview().unwrap().file_name, "fast.jpg");
    assert_eq!(h.geolocation.calls(), 1);
}

#[tokio::test]
async fn select_image_reads_file_into_preview() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bottle.png");
    std::fs::write(&path, b"png-bytes").unwrap();

    let classifier = Arc::new(ScriptedClassifier::new(vec![Ok(label("plastic"))]));
    let mut h = harness(classifier, san_francisco, vec![]);

    let upload = h.workflow.select_image(&path).await.unwrap();
    assert_eq!(h.workflow.state().stage(), Stage::Selecting);
    assert!(!h.workflow.state().is_processing());
    let preview = h.workflow.view().preview.unwrap();
    assert_eq!(preview.file_name, "bottle.png");
    assert_eq!(preview.content_type, "image/png");

    h.workflow.run(upload).await;
    assert_eq!(h.workflow.state().stage(), Stage::Ready);
}

/// A panicking collaborator still settles the workflow.
#[tokio::test]
async fn panicking_classifier_resets_processing() {
    struct Panics;

    #[async_trait]
    impl Classifier for Panics {
        fn name(&self) -> &str {
            "panics"
        }

        async fn classify(&self, _image: &ImageUpload) -> Result<WasteLabel> {
            panic!("model exploded");
        }
    }

    let mut h = harness(Arc::new(Panics), san_francisco, vec![]);
    h.workflow.run(image("x.jpg")).await;

    assert!(!h.workflow.state().is_processing());
    assert_eq!(
        h.workflow.state().last_error().map(|n| n.kind),
        Some(NoticeKind::ClassificationFailed)
    );
}

#[tokio::test]
async fn builder_runs_against_http_services() {
    use wastemap::WasteMap;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    let classifier = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/classify/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"image_label": "plastic"})),
        )
        .expect(1)
        .mount(&classifier)
        .await;

    let places = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/maps/api/place/nearbysearch/json"))
        .and(query_param("type", "plastic dustbins"))
        .and(query_param("radius", "5000"))
        .and(query_param("location", "37.77,-122.41"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "OK",
            "results": [
                {"name": "Drop-off A", "geometry": {"location": {"lat": 37.771, "lng": -122.411}}},
                {"name": "Drop-off B", "geometry": {"location": {"lat": 37.772, "lng": -122.412}}}
            ]
        })))
        .expect(1)
        .mount(&places)
        .await;

    let mut workflow = WasteMap::builder()
        .classifier_url(classifier.uri())
        .places_url(places.uri())
        .places_api_key("test-key")
        .location(Coordinates::new(37.77, -122.41))
        .build()
        .unwrap();

    let view = workflow.run(image("bottle.jpg")).await;

    assert_eq!(view.status, Some(StatusLine::Classified("PLASTIC".into())));
    let map = view.map.unwrap();
    assert_eq!(map.markers.len(), 3);
    assert_eq!(
        map.bin_markers().map(|m| m.popup.as_str()).collect::<Vec<_>>(),
        ["Dustbin Type: Drop-off A", "Dustbin Type: Drop-off B"]
    );
    assert!(view.notice.is_none());
}

#[test]
fn builder_requires_places_key() {
    let err = wastemap::WasteMap::builder()
        .location(Coordinates::new(0.0, 0.0))
        .build()
        .err()
        .expect("missing key should fail");
    assert!(matches!(err, WasteMapError::Configuration(_)));
}
