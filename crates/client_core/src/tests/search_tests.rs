use super::*;
use std::sync::Mutex;

use tokio::time::{sleep, Instant};

#[derive(Default)]
struct RecordingTarget {
    actions: Mutex<Vec<(SearchAction, Instant)>>,
}

impl RecordingTarget {
    fn actions(&self) -> Vec<SearchAction> {
        self.actions
            .lock()
            .expect("lock")
            .iter()
            .map(|(action, _)| action.clone())
            .collect()
    }

    fn fired_at(&self) -> Vec<Instant> {
        self.actions
            .lock()
            .expect("lock")
            .iter()
            .map(|(_, at)| *at)
            .collect()
    }
}

impl SearchDispatch for RecordingTarget {
    fn dispatch(self: Arc<Self>, action: SearchAction) {
        self.actions
            .lock()
            .expect("lock")
            .push((action, Instant::now()));
    }
}

fn coordinator() -> (Arc<RecordingTarget>, SearchCoordinator) {
    let target = Arc::new(RecordingTarget::default());
    let coordinator = SearchCoordinator::new(target.clone());
    (target, coordinator)
}

#[test]
fn action_from_query_trims_before_emptiness_check() {
    assert_eq!(SearchAction::from_query(""), SearchAction::FetchTrending);
    assert_eq!(SearchAction::from_query(" \t "), SearchAction::FetchTrending);
    assert_eq!(
        SearchAction::from_query("  batman "),
        SearchAction::Search("batman".to_string())
    );
}

#[tokio::test(start_paused = true)]
async fn settled_search_fires_once_with_query() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("batman");
    assert_eq!(
        coordinator.state(),
        CoordinatorState::Pending {
            query: "batman".to_string()
        }
    );

    sleep(Duration::from_millis(299)).await;
    assert!(target.actions().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(
        target.actions(),
        vec![SearchAction::Search("batman".to_string())]
    );
    assert_eq!(coordinator.state(), CoordinatorState::Idle);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(target.actions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn settled_empty_input_fetches_trending_once() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("");
    sleep(Duration::from_secs(1)).await;

    assert_eq!(target.actions(), vec![SearchAction::FetchTrending]);
}

#[tokio::test(start_paused = true)]
async fn whitespace_only_input_fetches_trending() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("   ");
    assert_eq!(
        coordinator.state(),
        CoordinatorState::Pending {
            query: String::new()
        }
    );
    sleep(Duration::from_secs(1)).await;

    assert_eq!(target.actions(), vec![SearchAction::FetchTrending]);
}

#[tokio::test(start_paused = true)]
async fn rapid_input_only_acts_on_last_query_after_window() {
    let (target, coordinator) = coordinator();
    let start = Instant::now();

    coordinator.on_input("a");
    sleep(Duration::from_millis(100)).await;
    coordinator.on_input("ab");

    sleep(Duration::from_millis(299)).await;
    assert!(target.actions().is_empty(), "must not fire before t=400ms");

    sleep(Duration::from_millis(2)).await;
    assert_eq!(target.actions(), vec![SearchAction::Search("ab".to_string())]);

    let fired = target.fired_at()[0].duration_since(start);
    assert!(
        fired >= Duration::from_millis(400) && fired < Duration::from_millis(402),
        "fired at {fired:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn burst_of_inputs_within_window_emits_single_action() {
    let (target, coordinator) = coordinator();

    for query in ["s", "st", "sta", "star", "star w", "star wars"] {
        coordinator.on_input(query);
        sleep(Duration::from_millis(250)).await;
    }
    assert!(target.actions().is_empty());

    sleep(Duration::from_millis(100)).await;
    assert_eq!(
        target.actions(),
        vec![SearchAction::Search("star wars".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn cancel_before_window_suppresses_action_and_is_idempotent() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("alien");
    sleep(Duration::from_millis(150)).await;
    coordinator.cancel();
    coordinator.cancel();
    assert_eq!(coordinator.state(), CoordinatorState::Idle);

    sleep(Duration::from_secs(2)).await;
    assert!(target.actions().is_empty());

    coordinator.on_input("aliens");
    sleep(Duration::from_secs(1)).await;
    assert_eq!(
        target.actions(),
        vec![SearchAction::Search("aliens".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn dropping_coordinator_cancels_pending_timer() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("heat");
    drop(coordinator);

    sleep(Duration::from_secs(1)).await;
    assert!(target.actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn submit_is_debounced_like_typed_input() {
    let (target, coordinator) = coordinator();
    let start = Instant::now();

    coordinator.on_input("dun");
    assert!(coordinator.submit(" dune "));
    assert_eq!(
        coordinator.state(),
        CoordinatorState::Pending {
            query: "dune".to_string()
        }
    );
    assert!(target.actions().is_empty());

    sleep(Duration::from_millis(299)).await;
    assert!(target.actions().is_empty(), "must not fire inside the window");

    sleep(Duration::from_millis(2)).await;
    assert_eq!(target.actions(), vec![SearchAction::Search("dune".to_string())]);
    assert!(target.fired_at()[0].duration_since(start) >= Duration::from_millis(300));

    sleep(Duration::from_secs(1)).await;
    assert_eq!(target.actions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn submit_ignores_blank_text() {
    let (target, coordinator) = coordinator();

    coordinator.on_input("x");
    assert!(!coordinator.submit("   "));
    assert_eq!(
        coordinator.state(),
        CoordinatorState::Pending {
            query: "x".to_string()
        }
    );

    sleep(Duration::from_secs(1)).await;
    assert_eq!(target.actions(), vec![SearchAction::Search("x".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn independent_coordinators_do_not_share_timers() {
    let (first_target, first) = coordinator();
    let (second_target, second) = coordinator();

    first.on_input("left");
    sleep(Duration::from_millis(200)).await;
    second.on_input("right");
    first.cancel();

    sleep(Duration::from_secs(1)).await;
    assert!(first_target.actions().is_empty());
    assert_eq!(
        second_target.actions(),
        vec![SearchAction::Search("right".to_string())]
    );
}

#[tokio::test(start_paused = true)]
async fn custom_delay_is_honoured() {
    let target = Arc::new(RecordingTarget::default());
    let coordinator = SearchCoordinator::with_delay(target.clone(), Duration::from_millis(1000));
    assert_eq!(coordinator.delay(), Duration::from_millis(1000));

    coordinator.on_input("slow");
    sleep(Duration::from_millis(999)).await;
    assert!(target.actions().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(target.actions().len(), 1);
}
