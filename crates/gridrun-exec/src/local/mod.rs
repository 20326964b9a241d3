//! Local worker pool backend.
//!
//! Used when the host belongs to no known cluster. Tasks run as subprocesses
//! on a bounded number of tokio workers; the first failure stops the pool from
//! starting anything new while running siblings are allowed to finish.
use std::{
    fs::File,
    process::Stdio,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc},
    task::JoinSet,
    time::timeout,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use gridrun_core::{CoreError, Strategy};
use gridrun_model::{RunConfig, RunStatus, TaskIndex, TaskTemplate};

use crate::{
    error::ExecError,
    util::{KILL_GRACE, cmd_program, kill_graceful},
};

/// Bounded wait for the next queued task.
const DEQUEUE_WAIT: Duration = Duration::from_secs(5);
/// Bounded wait for the next worker to finish.
const JOIN_WAIT: Duration = Duration::from_secs(5);

/// Number of workers for a `cores` setting on a machine with `available` CPUs.
///
/// Positive values are taken as is; otherwise `|cores|` CPUs are kept free.
pub fn resolve_workers(cores: i32, available: usize) -> usize {
    if cores > 0 {
        cores as usize
    } else {
        available.saturating_sub(cores.unsigned_abs() as usize).max(1)
    }
}

/// Random id in `1..=9999` standing in for a scheduler job id.
pub fn local_job_id() -> u32 {
    (uuid::Uuid::new_v4().as_u128() % 9999) as u32 + 1
}

/// One queued unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub task: TaskIndex,
    pub command: Vec<String>,
    pub stdout: String,
    pub stderr: String,
}

type Queue = Arc<Mutex<mpsc::UnboundedReceiver<TaskDescriptor>>>;

pub struct LocalPoolStrategy {
    template: TaskTemplate,
    cfg: RunConfig,
    workers: usize,
    job_id: u32,
    /// Set by `cancel()`; kills running children.
    kill: CancellationToken,
    /// Set by the first failure or by `kill`; no task starts afterwards.
    stop: CancellationToken,
    origin_pid: u32,
}

impl LocalPoolStrategy {
    pub fn new(template: TaskTemplate, cfg: RunConfig) -> Self {
        let workers = resolve_workers(cfg.cores, num_cpus::get());
        Self::with_workers(template, cfg, workers)
    }

    pub fn with_workers(template: TaskTemplate, cfg: RunConfig, workers: usize) -> Self {
        let kill = CancellationToken::new();
        let stop = kill.child_token();
        Self {
            template,
            cfg,
            workers: workers.max(1),
            job_id: local_job_id(),
            kill,
            stop,
            origin_pid: std::process::id(),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn job_id(&self) -> u32 {
        self.job_id
    }

    /// Every task of the run with its command and output paths resolved.
    pub fn descriptors(&self) -> Vec<TaskDescriptor> {
        let job_id = self.job_id.to_string();
        (1..=self.cfg.num_tasks)
            .map(|n| {
                // local tasks are always numbered, even a single one
                let number = n.to_string();
                TaskDescriptor {
                    task: TaskIndex::for_task(n, self.cfg.num_tasks),
                    command: self.template.resolve_command(&number),
                    stdout: self.template.resolve_stdout(&number, Some(&job_id), Some(&job_id)),
                    stderr: self.template.resolve_stderr(&number, Some(&job_id), Some(&job_id)),
                }
            })
            .collect()
    }
}

#[async_trait]
impl Strategy for LocalPoolStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn run(&self) -> Result<RunStatus, CoreError> {
        let (tx, rx) = mpsc::unbounded_channel();
        for descriptor in self.descriptors() {
            // the receiver is alive until the workers are done
            let _ = tx.send(descriptor);
        }
        drop(tx);

        info!(
            target: "gridrun.exec.local",
            label = %self.template.job_label(),
            job_id = self.job_id,
            tasks = self.cfg.num_tasks,
            workers = self.workers,
            "running locally"
        );

        let queue: Queue = Arc::new(Mutex::new(rx));
        let failed = Arc::new(AtomicBool::new(false));
        let mut set = JoinSet::new();
        for worker in 0..self.workers {
            set.spawn(work(
                worker,
                queue.clone(),
                self.stop.clone(),
                self.kill.clone(),
                failed.clone(),
            ));
        }

        loop {
            match timeout(JOIN_WAIT, set.join_next()).await {
                Ok(None) => break,
                Ok(Some(Ok(()))) => {}
                Ok(Some(Err(e))) => {
                    error!(target: "gridrun.exec.local", error = %e, "worker panicked");
                    failed.store(true, Ordering::SeqCst);
                    self.stop.cancel();
                }
                Err(_) => trace!(target: "gridrun.exec.local", remaining = set.len(), "workers still busy"),
            }
        }

        if failed.load(Ordering::SeqCst) {
            Ok(RunStatus::Failed)
        } else if self.kill.is_cancelled() {
            Ok(RunStatus::Cancelled)
        } else {
            debug!(target: "gridrun.exec.local", "all tasks succeeded");
            Ok(RunStatus::Succeeded)
        }
    }

    async fn cancel(&self) {
        if std::process::id() != self.origin_pid {
            return;
        }
        if !self.kill.is_cancelled() {
            info!(target: "gridrun.exec.local", job_id = self.job_id, "cancelling local tasks");
        }
        self.kill.cancel();
    }
}

async fn work(
    worker: usize,
    queue: Queue,
    stop: CancellationToken,
    kill: CancellationToken,
    failed: Arc<AtomicBool>,
) {
    loop {
        if stop.is_cancelled() {
            break;
        }
        let next = {
            let mut rx = queue.lock().await;
            timeout(DEQUEUE_WAIT, rx.recv()).await
        };
        let descriptor = match next {
            Ok(Some(d)) => d,
            Ok(None) => break,
            Err(_) => continue,
        };
        if stop.is_cancelled() {
            break;
        }

        debug!(target: "gridrun.exec.local", worker, task = %descriptor.task, "start");
        match execute(&descriptor, &kill).await {
            Ok(()) => debug!(target: "gridrun.exec.local", worker, task = %descriptor.task, "done"),
            Err(ExecError::Cancelled) => {
                debug!(target: "gridrun.exec.local", worker, task = %descriptor.task, "killed");
                break;
            }
            Err(e) => {
                error!(target: "gridrun.exec.local", worker, task = %descriptor.task, error = %e, "task failed");
                failed.store(true, Ordering::SeqCst);
                stop.cancel();
            }
        }
    }
    trace!(target: "gridrun.exec.local", worker, "worker exits");
}

async fn execute(descriptor: &TaskDescriptor, kill: &CancellationToken) -> Result<(), ExecError> {
    let (program, args) = descriptor.command.split_first().ok_or(ExecError::MissingProgram)?;

    let stdout = File::create(&descriptor.stdout)?;
    let stderr = File::create(&descriptor.stderr)?;

    let mut cmd = cmd_program(program, args);
    cmd.stdin(Stdio::null())
        .stdout(Stdio::from(stdout))
        .stderr(Stdio::from(stderr))
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .map_err(|e| ExecError::Spawn(format!("{program}: {e}")))?;

    tokio::select! {
        status = child.wait() => {
            let status = status?;
            if status.success() {
                return Ok(());
            }
            match status.code() {
                Some(code) => Err(ExecError::NonZeroExit { code }),
                None => Err(ExecError::KilledBySignal),
            }
        }
        _ = kill.cancelled() => {
            if let Err(e) = kill_graceful(&mut child, KILL_GRACE).await {
                warn!(target: "gridrun.exec.local", %program, error = %e, "kill failed");
            }
            Err(ExecError::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_cores_are_taken_verbatim() {
        assert_eq!(resolve_workers(3, 16), 3);
        assert_eq!(resolve_workers(64, 4), 64);
    }

    #[test]
    fn non_positive_cores_keep_cpus_free() {
        assert_eq!(resolve_workers(0, 8), 8);
        assert_eq!(resolve_workers(-1, 8), 7);
        assert_eq!(resolve_workers(-8, 8), 1);
        assert_eq!(resolve_workers(-100, 8), 1);
    }

    #[test]
    fn job_id_stays_in_range() {
        for _ in 0..1000 {
            assert!((1..=9999).contains(&local_job_id()));
        }
    }

    #[test]
    fn descriptors_resolve_ids_and_indices() {
        let template = TaskTemplate::new(
            vec!["/bin/echo".into(), "chunk-%t".into()],
            "/tmp/out/%c.o%j.%t",
            "/tmp/out/%c.e%J.%t",
        )
        .unwrap();
        let cfg = RunConfig {
            num_tasks: 2,
            ..Default::default()
        };
        let s = LocalPoolStrategy::with_workers(template, cfg, 2);
        let id = s.job_id();
        let d = s.descriptors();

        assert_eq!(d.len(), 2);
        assert_eq!(d[1].command, ["/bin/echo", "chunk-2"]);
        assert_eq!(d[0].stdout, format!("/tmp/out/echo.o{id}.1"));
        assert_eq!(d[1].stderr, format!("/tmp/out/echo.e{id}.2"));
    }

    #[test]
    fn single_task_output_is_numbered() {
        let template = TaskTemplate::new(vec!["run".into(), "%t".into()], "/tmp/%c.o%j.%t", "/tmp/%c.e%j.%t").unwrap();
        let s = LocalPoolStrategy::with_workers(template, RunConfig::default(), 1);
        let id = s.job_id();
        let d = s.descriptors();

        assert_eq!(d.len(), 1);
        assert_eq!(d[0].task, TaskIndex::Single);
        assert_eq!(d[0].command, ["run", "1"]);
        assert_eq!(d[0].stdout, format!("/tmp/run.o{id}.1"));
        assert_eq!(d[0].stderr, format!("/tmp/run.e{id}.1"));
    }

    #[test]
    fn workers_never_drop_to_zero() {
        let template = TaskTemplate::new(vec!["run".into()], "o", "e").unwrap();
        assert_eq!(LocalPoolStrategy::with_workers(template, RunConfig::default(), 0).workers(), 1);
    }
}
