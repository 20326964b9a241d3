//! Slurm backend.
//!
//! Every task is its own `sbatch` job. The strategy tracks the job ids in
//! flight, waits for them with a dependency probe, reads final states with
//! `sacct`, and resubmits failed tasks until their retry budget is spent.
mod pacing;
pub use pacing::Pacing;

mod status;
pub use status::{JobStatus, parse_statuses};

use std::{
    collections::BTreeMap,
    future::Future,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use gridrun_core::{CoreError, ExclusionList, Strategy, render_job_ids};
use gridrun_model::{JobId, RunConfig, RunStatus, TaskIndex, TaskTemplate};

use crate::{error::ExecError, invoke::Invoker, util::trailing_job_id};

/// Jobs up to this limit go to the `short` partition unless one is given.
const SHORT_PARTITION_LIMIT_SECS: u64 = 4 * 60 * 60;
const SHORT_PARTITION: &str = "short";

/// One submitted attempt of a task.
///
/// A retry gets a new record under the new job id; records are never rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub job_id: JobId,
    pub task: TaskIndex,
    pub retries: u32,
}

/// Argv plus the script fed to sbatch on stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitRequest {
    pub argv: Vec<String>,
    pub script: String,
}

pub struct SlurmStrategy {
    template: TaskTemplate,
    cfg: RunConfig,
    invoker: Arc<dyn Invoker>,
    cancel: CancellationToken,
    tracked: Mutex<BTreeMap<JobId, TaskRecord>>,
}

impl SlurmStrategy {
    pub fn new(template: TaskTemplate, cfg: RunConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            template,
            cfg,
            invoker,
            cancel: CancellationToken::new(),
            tracked: Mutex::new(BTreeMap::new()),
        }
    }

    /// Build the sbatch request for one task.
    ///
    /// The exclusion list is read from disk on every call.
    pub fn request(&self, task: TaskIndex) -> SubmitRequest {
        let cfg = &self.cfg;
        let label = task.to_string();

        let mut argv: Vec<String> = vec![
            "sbatch".into(),
            "-J".into(),
            format!("{}.{label}", self.template.job_label()),
            "-t".into(),
            cfg.time_limit.to_string(),
            "-N".into(),
            cfg.nodes.to_string(),
            "-n".into(),
            "1".into(),
        ];

        let exclusions = ExclusionList::build(&cfg.exclude_nodes, cfg.denylist_path().as_deref());
        if !exclusions.is_empty() {
            argv.extend(["-x".into(), exclusions.to_string()]);
        }

        argv.push(format!("--mem-per-cpu={}", cfg.mem_limit_mb));
        argv.extend([
            "-o".into(),
            self.template.resolve_stdout(&label, None, None),
            "-e".into(),
            self.template.resolve_stderr(&label, None, None),
        ]);

        let mut priority = cfg.priority;
        match cfg.partition() {
            Some(partition) => argv.extend(["-p".into(), partition.to_string()]),
            None if cfg.time_limit.seconds() <= SHORT_PARTITION_LIMIT_SECS => {
                argv.extend(["-p".into(), SHORT_PARTITION.into()]);
                priority += 1;
            }
            None => {}
        }
        if !task.is_single() {
            priority += 1;
        }
        if priority > 0 {
            argv.push(format!("--nice={priority}"));
        }

        SubmitRequest {
            argv,
            script: self.template.script(&task.number().to_string()),
        }
    }

    fn tracked(&self) -> MutexGuard<'_, BTreeMap<JobId, TaskRecord>> {
        self.tracked.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stop tracking every job and return their ids.
    fn drain(&self) -> Vec<JobId> {
        std::mem::take(&mut *self.tracked()).into_keys().collect()
    }

    fn tracked_ids(&self) -> Vec<JobId> {
        self.tracked().keys().cloned().collect()
    }

    async fn track(&self, record: TaskRecord) {
        let job_id = record.job_id.clone();
        self.tracked().insert(job_id.clone(), record);

        // cancel() may have drained the set while this job was being submitted
        if self.cancel.is_cancelled() {
            let stray = self.tracked().remove(&job_id);
            self.scancel(stray.into_iter().map(|r| r.job_id).collect()).await;
        }
    }

    fn report_in_flight(&self) {
        let ids = self.tracked_ids();
        info!(
            target: "gridrun.exec.slurm",
            "{} submitted as id's: {}",
            self.template.job_label(),
            render_job_ids(ids.iter().map(String::as_str))
        );
    }

    /// Resolve `fut` unless the run is cancelled first.
    async fn guarded<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            out = fut => Some(out),
        }
    }

    /// Sleep; `false` if the run was cancelled meanwhile.
    async fn pause(&self, d: Duration) -> bool {
        self.guarded(tokio::time::sleep(d)).await.is_some()
    }

    /// Submit until sbatch answers with a job id. `None` once cancelled.
    async fn submit(&self, task: TaskIndex, pacing: &mut Pacing) -> Result<Option<JobId>, CoreError> {
        let req = self.request(task);
        trace!(target: "gridrun.exec.slurm", argv = %req.argv.join(" "), "submit");
        trace!(target: "gridrun.exec.slurm", script = %req.script, "script");

        loop {
            let Some(output) = self.guarded(self.invoker.invoke(&req.argv, Some(&req.script))).await else {
                return Ok(None);
            };
            let output = match output {
                Ok(out) => out,
                Err(e @ ExecError::Spawn(_)) => return Err(e.into()),
                Err(e) => {
                    debug!(target: "gridrun.exec.slurm", %task, error = %e, "sbatch failed");
                    String::new()
                }
            };

            if let Some(job_id) = trailing_job_id(&output) {
                pacing.on_accepted();
                debug!(target: "gridrun.exec.slurm", %task, %job_id, "submitted");
                return Ok(Some(job_id));
            }

            let backoff = pacing.on_rejected();
            warn!(
                target: "gridrun.exec.slurm",
                %task,
                output = %output.trim_end(),
                backoff_ms = backoff.as_millis() as u64,
                "no job id in sbatch output; backing off"
            );
            if !self.pause(backoff).await {
                return Ok(None);
            }
        }
    }

    /// Block until none of `ids` is pending or running and return their final states.
    async fn wait_for_states(&self, ids: &[JobId]) -> Option<Vec<JobStatus>> {
        let probe = self.probe_argv(ids);
        trace!(target: "gridrun.exec.slurm", argv = %probe.join(" "), "dependency probe");
        match self.guarded(self.invoker.invoke(&probe, None)).await {
            None => return None,
            Some(Err(e)) => warn!(target: "gridrun.exec.slurm", error = %e, "dependency probe failed"),
            Some(Ok(_)) => {}
        }

        let query = self.sacct_argv(ids);
        loop {
            let Some(output) = self.guarded(self.invoker.invoke(&query, None)).await else {
                return None;
            };
            // an unanswered query is asked again after the poll interval
            let output = output.unwrap_or_else(|e| {
                warn!(target: "gridrun.exec.slurm", error = %e, "sacct failed");
                String::new()
            });
            let statuses = parse_statuses(&output);

            if !statuses.iter().any(JobStatus::is_active) {
                return Some(statuses);
            }
            trace!(target: "gridrun.exec.slurm", "jobs still active");
            if !self.pause(self.cfg.pacing.poll_interval()).await {
                return None;
            }
        }
    }

    fn probe_argv(&self, ids: &[JobId]) -> Vec<String> {
        vec![
            "srun".into(),
            "-t".into(),
            "00:01:00".into(),
            "-J".into(),
            format!("wait{}", self.template.job_label()),
            "-n".into(),
            "1".into(),
            "-N".into(),
            "1".into(),
            "-p".into(),
            SHORT_PARTITION.into(),
            "--mem-per-cpu".into(),
            "10".into(),
            format!("--dependency=afterany:{}", ids.join(":")),
            "sleep".into(),
            "0".into(),
        ]
    }

    fn sacct_argv(&self, ids: &[JobId]) -> Vec<String> {
        vec![
            "sacct".into(),
            "--starttime".into(),
            "1970-01-01".into(),
            "-n".into(),
            "--format=JobID,ExitCode,State".into(),
            "-X".into(),
            "-P".into(),
            "-j".into(),
            ids.join(","),
        ]
    }

    /// Submit, wait, retry. Errors leave jobs tracked for the caller to cancel.
    async fn drive(&self) -> Result<RunStatus, CoreError> {
        let num_tasks = self.cfg.num_tasks;
        let mut pacing = Pacing::new(&self.cfg.pacing);

        for n in 1..=num_tasks {
            let task = TaskIndex::for_task(n, num_tasks);
            let Some(job_id) = self.submit(task, &mut pacing).await? else {
                return Ok(RunStatus::Cancelled);
            };
            self.track(TaskRecord { job_id, task, retries: 0 }).await;

            if !self.pause(pacing.delay()).await {
                return Ok(RunStatus::Cancelled);
            }
        }
        self.report_in_flight();

        let mut all_success = true;
        loop {
            let ids = self.tracked_ids();
            if ids.is_empty() {
                break;
            }

            let Some(statuses) = self.wait_for_states(&ids).await else {
                return Ok(RunStatus::Cancelled);
            };

            let mut progressed = false;
            for status in statuses {
                let Some(record) = self.tracked().remove(&status.job_id) else {
                    continue;
                };
                progressed = true;

                if status.is_success() {
                    debug!(target: "gridrun.exec.slurm", task = %record.task, job_id = %record.job_id, "task succeeded");
                    continue;
                }

                if record.retries < self.cfg.retries {
                    warn!(
                        target: "gridrun.exec.slurm",
                        task = %record.task,
                        job_id = %record.job_id,
                        exit_code = %status.exit_code,
                        state = %status.state,
                        "Retrying task {}", record.task
                    );
                    let Some(job_id) = self.submit(record.task, &mut pacing).await? else {
                        return Ok(RunStatus::Cancelled);
                    };
                    self.track(TaskRecord {
                        job_id,
                        task: record.task,
                        retries: record.retries + 1,
                    })
                    .await;
                    if !self.pause(self.cfg.pacing.retry_pause()).await {
                        return Ok(RunStatus::Cancelled);
                    }
                } else {
                    error!(
                        target: "gridrun.exec.slurm",
                        task = %record.task,
                        job_id = %record.job_id,
                        exit_code = %status.exit_code,
                        state = %status.state,
                        "Task {} really failed", record.task
                    );
                    all_success = false;
                }
            }

            if self.tracked().is_empty() {
                continue;
            }
            self.report_in_flight();
            if !progressed && !self.pause(self.cfg.pacing.poll_interval()).await {
                return Ok(RunStatus::Cancelled);
            }
        }

        if self.cancel.is_cancelled() {
            return Ok(RunStatus::Cancelled);
        }
        if all_success {
            debug!(target: "gridrun.exec.slurm", "all tasks succeeded");
            Ok(RunStatus::Succeeded)
        } else {
            Ok(RunStatus::Failed)
        }
    }

    async fn scancel(&self, ids: Vec<JobId>) {
        if ids.is_empty() {
            debug!(target: "gridrun.exec.slurm", "no jobs to cancel");
            return;
        }
        let mut argv = vec!["scancel".to_string()];
        argv.extend(ids);

        match self.invoker.invoke(&argv, None).await {
            Ok(_) => info!(target: "gridrun.exec.slurm", "jobs are cancelled"),
            Err(e) => warn!(target: "gridrun.exec.slurm", error = %e, "scancel failed"),
        }
    }
}

#[async_trait]
impl Strategy for SlurmStrategy {
    fn name(&self) -> &'static str {
        "slurm"
    }

    async fn run(&self) -> Result<RunStatus, CoreError> {
        let res = self.drive().await;
        if let Err(e) = &res {
            error!(target: "gridrun.exec.slurm", error = %e, "run aborted; cancelling submitted jobs");
            let ids = self.drain();
            self.scancel(ids).await;
        }
        res
    }

    async fn cancel(&self) {
        self.cancel.cancel();
        let ids = self.drain();
        self.scancel(ids).await;
    }
}
