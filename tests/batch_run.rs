//! End-to-end batch execution tests with a mock script executor.

use apexbatch::{
    BatchProcessor, BatchRequest, CheckpointStore, ExecFailure, ExecOutput, JobPaths,
    ProgressSink, ScriptExecutor,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

/// Mock executor that records which units it ran.
#[derive(Default)]
struct MockExecutor {
    executed: Mutex<Vec<String>>,
    /// Record IDs that fail with a simulated error
    fail_on: HashSet<String>,
    /// Per-unit delay, to let pause requests land mid-run
    delay: Option<Duration>,
    /// Request a pause on this controller after N executions
    pause_after: Option<(usize, apexbatch::PauseController)>,
    count: AtomicUsize,
}

#[async_trait]
impl ScriptExecutor for MockExecutor {
    async fn execute(
        &self,
        script_path: &Path,
        _target_org: &str,
    ) -> Result<ExecOutput, ExecFailure> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let record_id = script_path
            .file_stem()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        self.executed.lock().unwrap().push(record_id.clone());

        let ran = self.count.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((threshold, pause)) = &self.pause_after {
            if ran >= *threshold {
                pause.request_pause();
            }
        }

        if self.fail_on.contains(&record_id) {
            Err(ExecFailure {
                message: format!("simulated failure for {record_id}"),
                stdout: String::new(),
                stderr: "System.LimitException: Too many SOQL queries".to_string(),
            })
        } else {
            Ok(ExecOutput {
                stdout: format!("executed {record_id}"),
                stderr: String::new(),
            })
        }
    }
}

/// Progress sink that collects every message.
#[derive(Default)]
struct CollectingSink {
    messages: Mutex<Vec<String>>,
}

impl ProgressSink for CollectingSink {
    fn notify(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }
}

fn record_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("rec{i:02}")).collect()
}

fn prepare(base: &Path, job: &str, n: usize) {
    let processor = BatchProcessor::new(base, Arc::new(MockExecutor::default()));
    processor
        .generate_scripts(job, &record_ids(n), "System.debug('hi');")
        .unwrap();
}

fn request(job: &str, concurrency: usize) -> BatchRequest {
    BatchRequest {
        job_name: job.to_string(),
        target_org: "dev-org".to_string(),
        concurrency,
    }
}

fn artifact_names(paths: &JobPaths) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(&paths.results_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn full_run_counts_every_unit_once() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "bulk", 10);

    let mock = Arc::new(MockExecutor {
        fail_on: HashSet::from(["rec07".to_string()]),
        ..Default::default()
    });
    let processor = BatchProcessor::new(temp.path(), mock.clone());

    let summary = processor.run(request("bulk", 3)).await.unwrap();
    assert_eq!(summary.successful, 9);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total, 10);

    // Every unit claimed exactly once
    let mut executed = mock.executed.lock().unwrap().clone();
    executed.sort();
    assert_eq!(executed, record_ids(10));

    // One failure artifact for rec07 with the captured error, nine successes
    let paths = processor.resolve_paths("bulk");
    let names = artifact_names(&paths);
    assert_eq!(names.len(), 10);
    let failures: Vec<_> = names.iter().filter(|n| n.starts_with("failure_")).collect();
    assert_eq!(failures.len(), 1);
    assert!(failures[0].starts_with("failure_rec07_"));
    let body =
        std::fs::read_to_string(paths.results_dir.join(failures[0])).unwrap();
    assert!(body.contains("simulated failure for rec07"));
    assert!(body.contains("Too many SOQL queries"));

    // Normal completion clears both markers
    assert!(!paths.checkpoint_file.exists());
    assert!(!paths.pause_file.exists());
}

#[tokio::test]
async fn empty_directory_yields_zero_summary() {
    let temp = TempDir::new().unwrap();
    let processor = BatchProcessor::new(temp.path(), Arc::new(MockExecutor::default()));

    let summary = processor.run(request("nothing", 4)).await.unwrap();
    assert_eq!(summary.successful, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.total, 0);
}

#[tokio::test]
async fn pause_then_resume_completes_remainder_without_rework() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "resumable", 5);

    // First run: single worker, pause after two units
    let pause = apexbatch::PauseController::new();
    let mock = Arc::new(MockExecutor {
        pause_after: Some((2, pause.clone())),
        ..Default::default()
    });
    let processor = BatchProcessor::new(temp.path(), mock.clone()).with_pause(pause);

    let summary = processor.run(request("resumable", 1)).await.unwrap();
    assert_eq!(summary.total, 2);

    let paths = processor.resolve_paths("resumable");
    assert!(paths.pause_file.exists());
    // Single worker ran in enumerated order, so the checkpoint is rec02
    let store = CheckpointStore::new(paths.checkpoint_file.clone(), paths.pause_file.clone());
    let checkpoint = store.load_checkpoint().unwrap();
    assert!(checkpoint.to_string_lossy().ends_with("rec02.apex"));

    // Second run, as after a restart: fresh processor, plain executor
    let mock2 = Arc::new(MockExecutor::default());
    let processor2 = BatchProcessor::new(temp.path(), mock2.clone());
    let summary2 = processor2.run(request("resumable", 2)).await.unwrap();
    assert_eq!(summary2.total, 3);

    // Only the remaining units ran, none of the first two again
    let mut executed = mock2.executed.lock().unwrap().clone();
    executed.sort();
    assert_eq!(executed, vec!["rec03", "rec04", "rec05"]);

    // Completing the backlog cleared both markers
    assert!(!paths.checkpoint_file.exists());
    assert!(!paths.pause_file.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn external_pause_request_stops_claiming() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "slowjob", 10);

    let mock = Arc::new(MockExecutor {
        delay: Some(Duration::from_millis(50)),
        ..Default::default()
    });
    let processor = Arc::new(BatchProcessor::new(temp.path(), mock));
    let pause = processor.pause_controller();

    let runner = {
        let processor = Arc::clone(&processor);
        tokio::spawn(async move { processor.run(request("slowjob", 2)).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    pause.request_pause();

    let summary = runner.await.unwrap().unwrap();
    assert!(summary.total < 10, "pause should leave units unprocessed");

    let paths = processor.resolve_paths("slowjob");
    assert!(paths.pause_file.exists());

    // Resume and finish on the same instance
    processor.resume();
    let summary2 = processor.run(request("slowjob", 2)).await.unwrap();
    assert_eq!(summary.total + summary2.total, 10);
    assert!(!paths.pause_file.exists());
    assert!(!paths.checkpoint_file.exists());
}

#[tokio::test]
async fn missing_resume_point_falls_back_to_all_units() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "moved", 3);

    let processor = BatchProcessor::new(temp.path(), Arc::new(MockExecutor::default()));
    let paths = processor.resolve_paths("moved");
    paths.ensure().unwrap();

    // Checkpoint references a unit that is no longer listed
    let store = CheckpointStore::new(paths.checkpoint_file.clone(), paths.pause_file.clone());
    store
        .write_checkpoint(&paths.script_dir.join("vanished.apex"))
        .unwrap();

    let sink = Arc::new(CollectingSink::default());
    let mock = Arc::new(MockExecutor::default());
    let processor =
        BatchProcessor::new(temp.path(), mock.clone()).with_progress(sink.clone());

    let summary = processor.run(request("moved", 2)).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(mock.executed.lock().unwrap().len(), 3);

    // The fallback is observable, not silent
    let messages = sink.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m.contains("Resume point not found")));
}

#[tokio::test]
async fn case_insensitive_job_names_share_one_namespace() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "CamelJob", 2);

    let mock = Arc::new(MockExecutor::default());
    let processor = BatchProcessor::new(temp.path(), mock.clone());

    // Run under a different casing than the job was prepared with
    let summary = processor.run(request("CAMELJOB", 1)).await.unwrap();
    assert_eq!(summary.total, 2);

    let lower = processor.resolve_paths("cameljob");
    let upper = processor.resolve_paths("CamelJob");
    assert_eq!(lower.script_dir, upper.script_dir);
    assert_eq!(artifact_names(&lower).len(), 2);
}

#[tokio::test]
async fn progress_messages_cover_every_unit() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "noisy", 4);

    let sink = Arc::new(CollectingSink::default());
    let processor = BatchProcessor::new(temp.path(), Arc::new(MockExecutor::default()))
        .with_progress(sink.clone());

    processor.run(request("noisy", 2)).await.unwrap();

    let messages = sink.messages.lock().unwrap();
    assert!(messages.iter().any(|m| m == "Total scripts to process: 4"));
    let processing = messages
        .iter()
        .filter(|m| m.starts_with("Processing script "))
        .count();
    let progress = messages
        .iter()
        .filter(|m| m.starts_with("Progress: "))
        .count();
    assert_eq!(processing, 4);
    assert_eq!(progress, 4);
}

#[tokio::test]
async fn checkpoint_at_last_unit_leaves_zero_pending() {
    let temp = TempDir::new().unwrap();
    prepare(temp.path(), "finished", 3);

    let processor = BatchProcessor::new(temp.path(), Arc::new(MockExecutor::default()));
    let paths = processor.resolve_paths("finished");
    paths.ensure().unwrap();

    let store = CheckpointStore::new(paths.checkpoint_file.clone(), paths.pause_file.clone());
    store
        .write_checkpoint(&paths.script_dir.join("rec03.apex"))
        .unwrap();

    let mock = Arc::new(MockExecutor::default());
    let processor = BatchProcessor::new(temp.path(), mock.clone());
    let summary = processor.run(request("finished", 3)).await.unwrap();

    assert_eq!(summary.total, 0);
    assert!(mock.executed.lock().unwrap().is_empty());
    // Draining a zero-unit backlog still clears the markers
    assert!(!paths.checkpoint_file.exists());
}
