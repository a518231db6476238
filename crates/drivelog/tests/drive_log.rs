use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use drivelog::delivery::{DirectoryDelivery, DraftMailComposer, FallbackDelivery};
use drivelog::ports::{
    ConfirmGate, DeliveryRoute, DisplaySink, Notification, NotificationLevel, Notifier, TimerStatus,
};
use drivelog::timer::{format_elapsed, parse_elapsed, ManualClock, Timer};
use drivelog::{
    App, AppSettings, EmailRequest, ExportFormat, MemoryBlobStore, Ports, SessionState,
    SqliteBlobStore, TripRecord,
};

// 2025-01-05T12:00:00Z
const NOON: i64 = 1_736_078_400_000;

#[derive(Default)]
struct Screen {
    elapsed: Mutex<Vec<String>>,
    statuses: Mutex<Vec<TimerStatus>>,
}

impl DisplaySink for Screen {
    fn show_elapsed(&self, text: &str) {
        self.elapsed.lock().unwrap().push(text.to_string());
    }

    fn show_status(&self, status: TimerStatus) {
        self.statuses.lock().unwrap().push(status);
    }
}

#[derive(Clone, Default)]
struct Inbox(Rc<RefCell<Vec<Notification>>>);

impl Inbox {
    fn last(&self) -> Notification {
        self.0.borrow().last().cloned().expect("no notifications")
    }
}

impl Notifier for Inbox {
    fn notify(&self, notification: Notification) {
        self.0.borrow_mut().push(notification);
    }
}

struct Yes;

impl ConfirmGate for Yes {
    fn confirm(&self, _: &str) -> bool {
        true
    }
}

struct Harness<S: drivelog::ports::BlobStore> {
    app: App<S>,
    clock: ManualClock,
    inbox: Inbox,
    screen: Arc<Screen>,
}

fn harness<S: drivelog::ports::BlobStore>(backend: S, dir: &std::path::Path) -> Harness<S> {
    let clock = ManualClock::new(NOON);
    let inbox = Inbox::default();
    let screen = Arc::new(Screen::default());
    let ports = Ports {
        clock: Arc::new(clock.clone()),
        display: screen.clone(),
        notifier: Box::new(inbox.clone()),
        delivery: Box::new(FallbackDelivery::download_only(Box::new(
            DirectoryDelivery::new(dir.join("exports")),
        ))),
        mail: Box::new(DraftMailComposer::new(dir.join("drafts"))),
    };
    Harness {
        app: App::open(backend, AppSettings::default(), ports),
        clock,
        inbox,
        screen,
    }
}

fn record_trip<S: drivelog::ports::BlobStore>(
    h: &mut Harness<S>,
    driver: &str,
    elapsed_ms: i64,
    distance: &str,
) {
    h.app.start_trip().unwrap();
    h.clock.advance(elapsed_ms);
    h.app.stop_trip();

    let form = h.app.form_mut().unwrap();
    form.driver_name = driver.to_string();
    form.road_type = "mixed".to_string();
    form.day_night = "day".to_string();
    form.city = "Austin".to_string();
    form.set_distance(distance);
    h.app.submit().unwrap();
}

#[test]
fn test_full_trip_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(MemoryBlobStore::new(), dir.path());

    h.app.start_trip().unwrap();
    assert_eq!(h.app.state(), SessionState::Running);

    h.clock.advance(5_430_000);
    h.app.stop_trip();
    assert_eq!(h.app.state(), SessionState::PendingDetails);

    let form = h.app.form_mut().unwrap();
    assert_eq!(form.date, "2025-01-05");
    assert_eq!(form.duration(), "1.51");
    form.set_distance("100");
    assert_eq!(form.avg_speed(), "66.2");
    form.driver_name = "Ann".to_string();
    form.road_type = "highway".to_string();
    form.day_night = "day".to_string();

    let id = h.app.submit().unwrap();
    assert_eq!(h.inbox.last().message, "Log entry added successfully!");

    let record = &h.app.records()[0];
    assert_eq!(record.id, id);
    assert!((record.total_duration - 1.51).abs() < 1e-12);
    assert_eq!(h.app.state(), SessionState::Idle);
    assert_eq!(
        h.screen.statuses.lock().unwrap().as_slice(),
        [
            TimerStatus::Ready,
            TimerStatus::InProgress,
            TimerStatus::Finished,
            TimerStatus::Ready
        ]
    );
    assert_eq!(
        h.screen.elapsed.lock().unwrap().last().map(String::as_str),
        Some("00:00:00")
    );
}

#[test]
fn test_three_trips_then_delete() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(MemoryBlobStore::new(), dir.path());

    record_trip(&mut h, "A", 3_600_000, "10");
    record_trip(&mut h, "B", 7_200_000, "20");
    record_trip(&mut h, "C", 10_800_000, "30");

    let stats = h.app.stats();
    assert!((stats.total_distance - 60.0).abs() < 1e-9);
    assert!((stats.total_duration - 6.0).abs() < 1e-9);
    assert!((stats.avg_speed - 10.0).abs() < 1e-9);
    assert_eq!(stats.trip_count, 3);

    let middle = h.app.records()[1].id;
    assert!(h.app.delete(middle, &Yes));
    assert_eq!(h.inbox.last().message, "Log entry deleted");

    let drivers: Vec<&str> = h.app.records().iter().map(|r| r.driver_name.as_str()).collect();
    assert_eq!(drivers, ["C", "A"]);
    assert_eq!(h.app.stats().trip_count, 2);
    assert_eq!(h.app.view().stats.total_distance, "40.0 mi");
}

#[test]
fn test_sqlite_log_survives_reopen_and_exports() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("drivelog.db");

    {
        let mut h = harness(SqliteBlobStore::open(&db).unwrap(), dir.path());
        record_trip(&mut h, "Ann", 1_800_000, "15");
        record_trip(&mut h, "Bob", 3_600_000, "42");
    }

    let h = harness(SqliteBlobStore::open(&db).unwrap(), dir.path());
    assert_eq!(h.app.records().len(), 2);
    assert_eq!(h.app.records()[0].driver_name, "Bob");

    assert_eq!(
        h.app.export(ExportFormat::Json).unwrap(),
        DeliveryRoute::Downloaded
    );
    assert_eq!(h.inbox.last().message, "Downloaded successfully!");

    let text = std::fs::read_to_string(dir.path().join("exports/vehicle-logs.json")).unwrap();
    let decoded: Vec<TripRecord> = serde_json::from_str(&text).unwrap();
    assert_eq!(decoded, h.app.records());

    h.app.export(ExportFormat::Csv).unwrap();
    let csv = std::fs::read_to_string(dir.path().join("exports/vehicle-logs.csv")).unwrap();
    assert_eq!(csv.lines().count(), 3);
    assert!(csv.lines().nth(1).unwrap().starts_with("\"2025-01-05\",\"Bob\""));
}

#[test]
fn test_derived_speed_survives_json_and_reload_exactly() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("drivelog.db");

    let first = {
        let mut h = harness(SqliteBlobStore::open(&db).unwrap(), dir.path());
        h.app.start_trip().unwrap();
        h.app.stop_trip();

        let form = h.app.form_mut().unwrap();
        form.driver_name = "Ann".to_string();
        form.road_type = "rural".to_string();
        form.day_night = "night".to_string();
        form.set_duration("0.83");
        form.set_distance("3");
        form.set_avg_speed("");
        h.app.submit().unwrap();

        let records = h.app.records().to_vec();
        assert_eq!(records[0].avg_speed.to_bits(), (3.0_f64 / 0.83).to_bits());

        let text = drivelog::export::to_json(&records).unwrap();
        let decoded: Vec<TripRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, records);
        records
    };

    let h = harness(SqliteBlobStore::open(&db).unwrap(), dir.path());
    assert_eq!(h.app.records(), first.as_slice());
    assert_eq!(h.app.records()[0].avg_speed.to_bits(), (3.0_f64 / 0.83).to_bits());
}

#[test]
fn test_email_draft_written() {
    let dir = tempfile::tempdir().unwrap();
    let mut h = harness(MemoryBlobStore::new(), dir.path());
    record_trip(&mut h, "Ann", 3_600_000, "30");

    h.app
        .email(&EmailRequest {
            recipient: "fleet@example.com".to_string(),
            subject: Some("March logs".to_string()),
            message: None,
        })
        .unwrap();
    assert_eq!(h.inbox.last().message, "Opening email client...");

    let drafts: Vec<_> = std::fs::read_dir(dir.path().join("drafts"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(drafts.len(), 1);
    let draft = std::fs::read_to_string(&drafts[0]).unwrap();
    assert!(draft.contains("To: fleet@example.com\r\n"));
    assert!(draft.contains("Subject: March logs\r\n"));
    assert!(draft.contains("Location: Austin, N/A"));
}

#[test]
fn test_corrupt_storage_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(
        MemoryBlobStore::with_blob("vehicleLogs", "[{\"broken\":"),
        dir.path(),
    );

    assert!(h.app.records().is_empty());
    let note = h.inbox.last();
    assert_eq!(note.level, NotificationLevel::Error);
    assert_eq!(note.message, "Error loading saved logs");
    assert!(h.app.view().empty_message.is_some());
}

#[test]
fn test_elapsed_format_property() {
    let pattern = regex::Regex::new(r"^\d{2,}:\d{2}:\d{2}$").unwrap();
    for ms in [0, 999, 1_000, 59_999, 3_599_999, 5_430_000, 86_400_000, 360_000_000_123] {
        let text = format_elapsed(ms);
        assert!(pattern.is_match(&text), "{text}");
        assert_eq!(parse_elapsed(&text), Some(ms / 1000));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_no_tick_after_stop() {
    let clock = ManualClock::new(0);
    let screen = Arc::new(Screen::default());
    let mut timer = Timer::new(
        Arc::new(clock.clone()),
        screen.clone(),
        Duration::from_millis(5),
    );

    timer.start();
    clock.advance(2_000);
    tokio::time::sleep(Duration::from_millis(50)).await;
    timer.stop();

    let seen = screen.elapsed.lock().unwrap().len();
    assert!(seen > 0);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(screen.elapsed.lock().unwrap().len(), seen);
    assert_eq!(timer.elapsed_ms(), 2_000);
}
