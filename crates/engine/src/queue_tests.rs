// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::time::Instant;

#[derive(Default)]
struct Probe {
    events: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    starts: Mutex<Vec<(u32, Instant)>>,
}

impl Probe {
    fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

struct TestTask {
    key: u32,
    work: Duration,
    outcome: Result<(), TaskError>,
    probe: Arc<Probe>,
}

#[async_trait]
impl QueueTask for TestTask {
    type Key = u32;

    fn key(&self) -> u32 {
        self.key
    }

    async fn run(&self) -> Result<(), TaskError> {
        self.probe.starts.lock().push((self.key, Instant::now()));
        let now = self.probe.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.probe.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.work).await;
        self.probe.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

impl QueueObserver<TestTask> for Probe {
    fn on_enqueued(&self, task: &TestTask) {
        self.record(format!("enqueued {}", task.key));
    }

    fn on_started(&self, task: &TestTask) {
        self.record(format!("started {}", task.key));
    }

    fn on_finished(&self, task: &TestTask) {
        self.record(format!("finished {}", task.key));
    }

    fn on_failed(&self, task: &TestTask, error: &TaskError) {
        self.record(format!("failed {}: {error}", task.key));
    }

    fn on_drained(&self) {
        self.record("drained".to_string());
    }
}

fn config(concurrency: usize, timeout_secs: u64, delay_ms: u64) -> QueueConfig {
    QueueConfig {
        name: "test",
        concurrency,
        timeout: Duration::from_secs(timeout_secs),
        delay: Duration::from_millis(delay_ms),
    }
}

fn queue(probe: &Arc<Probe>, config: QueueConfig) -> TaskQueue<TestTask> {
    let weak = Arc::downgrade(probe);
    let observer: Weak<dyn QueueObserver<TestTask>> = weak;
    TaskQueue::new(config, observer)
}

fn task(probe: &Arc<Probe>, key: u32, work_ms: u64) -> TestTask {
    TestTask {
        key,
        work: Duration::from_millis(work_ms),
        outcome: Ok(()),
        probe: Arc::clone(probe),
    }
}

fn failing(probe: &Arc<Probe>, key: u32, error: TaskError) -> TestTask {
    TestTask {
        outcome: Err(error),
        ..task(probe, key, 10)
    }
}

#[tokio::test(start_paused = true)]
async fn runs_in_fifo_order_and_reports_drain() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    assert!(q.push(task(&probe, 1, 100)));
    assert!(q.push(task(&probe, 2, 100)));
    q.wait_idle().await;

    assert_eq!(
        probe.events(),
        vec![
            "enqueued 1",
            "enqueued 2",
            "started 1",
            "finished 1",
            "started 2",
            "finished 2",
            "drained",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn never_exceeds_concurrency() {
    for concurrency in [1, 2, 4] {
        let probe = Arc::new(Probe::default());
        let q = queue(&probe, config(concurrency, 60, 0));

        for key in 0..8 {
            q.push(task(&probe, key, 1_000));
        }
        q.wait_idle().await;

        assert_eq!(probe.max_in_flight.load(Ordering::SeqCst), concurrency);
        assert_eq!(probe.starts.lock().len(), 8);
    }
}

#[tokio::test(start_paused = true)]
async fn timeout_fails_task_and_continues() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 1, 0));

    q.push(task(&probe, 1, 10_000));
    q.push(task(&probe, 2, 10));
    q.wait_idle().await;

    let events = probe.events();
    assert!(events.contains(&"failed 1: timed out after 1s".to_string()), "{events:?}");
    assert!(events.contains(&"finished 2".to_string()), "{events:?}");
}

#[tokio::test(start_paused = true)]
async fn failure_does_not_halt_later_tasks() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    q.push(task(&probe, 1, 10));
    q.push(failing(&probe, 2, TaskError::Failed("engine crashed".into())));
    q.push(task(&probe, 3, 10));
    q.wait_idle().await;

    let events = probe.events();
    assert!(events.contains(&"failed 2: engine crashed".to_string()));
    assert_eq!(events.last().map(String::as_str), Some("drained"));
    assert!(events.contains(&"finished 3".to_string()));
}

#[tokio::test(start_paused = true)]
async fn delay_separates_dispatches() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 500));

    q.push(task(&probe, 1, 100));
    q.push(task(&probe, 2, 100));
    q.wait_idle().await;

    let starts = probe.starts.lock().clone();
    assert_eq!(starts.len(), 2);
    let gap = starts[1].1 - starts[0].1;
    assert!(gap >= Duration::from_millis(600), "gap was {gap:?}");
}

#[tokio::test(start_paused = true)]
async fn duplicate_keys_are_rejected_while_held() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    assert!(q.push(task(&probe, 1, 1_000)));
    assert!(!q.push(task(&probe, 1, 1_000)));
    tokio::task::yield_now().await;

    // Running now, still held
    assert_eq!(q.active(), 1);
    assert!(q.contains(&1));
    assert!(!q.push(task(&probe, 1, 1_000)));

    q.wait_idle().await;
    assert!(!q.contains(&1));
    assert!(q.push(task(&probe, 1, 10)));
}

#[tokio::test(start_paused = true)]
async fn remove_pending_task_skips_it() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    q.push(task(&probe, 1, 1_000));
    q.push(task(&probe, 2, 10));
    tokio::task::yield_now().await;

    let removed = q.remove(&2);
    assert_eq!(removed.map(|t| t.key), Some(2));
    assert!(q.remove(&1).is_none(), "running tasks cannot be removed");

    q.wait_idle().await;
    let events = probe.events();
    assert!(!events.contains(&"started 2".to_string()));
    assert_eq!(events.iter().filter(|e| *e == "drained").count(), 1);
}

#[tokio::test(start_paused = true)]
async fn removing_last_pending_task_while_idle_drains() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    // No await between push and remove: no worker has picked it up.
    q.push(task(&probe, 7, 10));
    assert!(q.remove(&7).is_some());

    assert_eq!(probe.events(), vec!["enqueued 7", "drained"]);
    assert_eq!(q.pending(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_queue_discards_pending_work() {
    let probe = Arc::new(Probe::default());
    let q = queue(&probe, config(1, 60, 0));

    q.push(task(&probe, 1, 10));
    drop(q);
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(probe.starts.lock().is_empty());
}

#[tokio::test(start_paused = true)]
async fn tasks_run_without_a_live_observer() {
    let probe = Arc::new(Probe::default());
    let observer: Weak<dyn QueueObserver<TestTask>> = Weak::<Probe>::new();
    let q = TaskQueue::new(config(1, 60, 0), observer);

    q.push(task(&probe, 1, 10));
    q.wait_idle().await;

    assert_eq!(probe.starts.lock().len(), 1);
    assert!(probe.events().is_empty());
}
