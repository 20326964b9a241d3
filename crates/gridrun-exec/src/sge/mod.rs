//! Grid-engine backend.
//!
//! The whole array is one `qsub -sync y` submission. qsub only returns once
//! every task has finished and prints one line per task, so success is judged
//! by counting `exited with exit code 0` markers in its output.
//!
//! The count is taken over the raw output: a task that prints the marker
//! itself can inflate it.
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use gridrun_core::{CoreError, Strategy};
use gridrun_model::{RunConfig, RunStatus, TaskTemplate};

use crate::invoke::Invoker;

/// Marker qsub prints for every successful task.
pub const SUCCESS_MARKER: &str = "exited with exit code 0";

pub struct GridEngineStrategy {
    template: TaskTemplate,
    cfg: RunConfig,
    invoker: Arc<dyn Invoker>,
    cancel: CancellationToken,
}

impl GridEngineStrategy {
    pub fn new(template: TaskTemplate, cfg: RunConfig, invoker: Arc<dyn Invoker>) -> Self {
        Self {
            template,
            cfg,
            invoker,
            cancel: CancellationToken::new(),
        }
    }

    /// `qsub` argv for the whole array.
    ///
    /// Paths are resolved against the scheduler's own variables since the task
    /// index and job id are only known on the execution host.
    pub fn submit_argv(&self) -> Vec<String> {
        let cfg = &self.cfg;
        let mut argv: Vec<String> = vec![
            "qsub".into(),
            "-N".into(),
            self.template.job_label().to_string(),
            "-l".into(),
            format!("mem={}M,t={}", cfg.mem_limit_mb, cfg.time_limit),
            "-cwd".into(),
        ];

        // grid engine treats a negative priority as "be nice"
        if cfg.priority > 0 {
            argv.extend(["-p".into(), format!("-{}", cfg.priority)]);
        }

        let queue = cfg.queue.trim();
        if queue.starts_with('-') {
            argv.extend(queue.split_whitespace().map(str::to_string));
        } else if !queue.is_empty() {
            argv.extend(["-q".into(), queue.to_string()]);
        }

        let out = self
            .template
            .resolve_stdout("$TASK_ID", Some("$JOB_ID"), Some("$JOB_ID"));
        let err = self
            .template
            .resolve_stderr("$TASK_ID", Some("$JOB_ID"), Some("$JOB_ID"));

        argv.extend([
            "-t".into(),
            format!("1-{}", cfg.num_tasks),
            "-o".into(),
            out,
            "-e".into(),
            err,
            "-sync".into(),
            "y".into(),
        ]);
        argv
    }

    pub fn script(&self) -> String {
        self.template.script("$SGE_TASK_ID")
    }
}

/// Number of tasks qsub reported as successful.
pub fn count_successes(output: &str) -> usize {
    output.matches(SUCCESS_MARKER).count()
}

#[async_trait]
impl Strategy for GridEngineStrategy {
    fn name(&self) -> &'static str {
        "sge"
    }

    async fn run(&self) -> Result<RunStatus, CoreError> {
        if self.cancel.is_cancelled() {
            return Ok(RunStatus::Cancelled);
        }

        let argv = self.submit_argv();
        let script = self.script();
        trace!(target: "gridrun.exec.sge", argv = %argv.join(" "), "submit");
        trace!(target: "gridrun.exec.sge", %script, "script");

        let output = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Ok(RunStatus::Cancelled),
            out = self.invoker.invoke(&argv, Some(&script)) => out?,
        };

        let total = self.cfg.num_tasks as usize;
        let succeeded = count_successes(&output);
        if succeeded < total {
            info!(target: "gridrun.exec.sge", succeeded, total, "{succeeded} out of {total} tasks succeeded");
            Ok(RunStatus::Failed)
        } else {
            debug!(target: "gridrun.exec.sge", total, "all {total} tasks succeeded");
            Ok(RunStatus::Succeeded)
        }
    }

    async fn cancel(&self) {
        // run() drops the pending qsub, which is SIGKILLed; tasks already
        // queued on the cluster are left to the scheduler
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoke::testing::FakeScheduler;

    fn strategy(cfg: RunConfig, fake: Arc<FakeScheduler>) -> GridEngineStrategy {
        let template = TaskTemplate::new(
            vec!["/work/bin/align".into(), "--part".into(), "%t".into()],
            "/work/log/%c.o%j.%t",
            "/work/log/%c.e%J.%t",
        )
        .unwrap();
        GridEngineStrategy::new(template, cfg, fake)
    }

    fn qsub_output(ok: usize, failed: usize) -> String {
        let mut out = String::from("Your job-array 77.1-3:1 (\"align\") has been submitted\n");
        for i in 0..ok {
            out.push_str(&format!("Job 77.{} exited with exit code 0.\n", i + 1));
        }
        for i in 0..failed {
            out.push_str(&format!("Job 77.{} exited with exit code 1.\n", ok + i + 1));
        }
        out
    }

    #[test]
    fn argv_carries_limits_and_scheduler_variables() {
        let cfg = RunConfig {
            num_tasks: 3,
            priority: 2,
            mem_limit_mb: 512,
            ..Default::default()
        };
        let s = strategy(cfg, Arc::new(FakeScheduler::new()));
        let argv = s.submit_argv();

        assert_eq!(
            argv,
            [
                "qsub",
                "-N",
                "align",
                "-l",
                "mem=512M,t=00:15:00",
                "-cwd",
                "-p",
                "-2",
                "-soft",
                "-q",
                "helli.q",
                "-t",
                "1-3",
                "-o",
                "/work/log/align.o$JOB_ID.$TASK_ID",
                "-e",
                "/work/log/align.e$JOB_ID.$TASK_ID",
                "-sync",
                "y",
            ]
        );
        assert_eq!(
            s.script(),
            "#!/bin/bash\n\"/work/bin/align\" \"--part\" \"$SGE_TASK_ID\""
        );
    }

    #[test]
    fn plain_queue_name_becomes_q_flag() {
        let cfg = RunConfig {
            queue: "long.q".into(),
            ..Default::default()
        };
        let argv = strategy(cfg, Arc::new(FakeScheduler::new())).submit_argv();
        let pos = argv.iter().position(|a| a == "-q").unwrap();
        assert_eq!(argv[pos + 1], "long.q");
        assert!(!argv.iter().any(|a| a == "-p"));
    }

    #[tokio::test]
    async fn all_markers_mean_success() {
        let fake = Arc::new(FakeScheduler::new().reply("qsub", &qsub_output(3, 0)));
        let cfg = RunConfig {
            num_tasks: 3,
            ..Default::default()
        };
        let status = strategy(cfg, fake.clone()).run().await.unwrap();

        assert_eq!(status, RunStatus::Succeeded);
        let calls = fake.calls_to("qsub");
        assert_eq!(calls.len(), 1);
        assert!(calls[0].stdin.as_deref().unwrap().starts_with("#!/bin/bash\n"));
    }

    #[tokio::test]
    async fn any_shortfall_is_failure() {
        let fake = Arc::new(FakeScheduler::new().reply("qsub", &qsub_output(2, 1)));
        let cfg = RunConfig {
            num_tasks: 3,
            ..Default::default()
        };
        let status = strategy(cfg, fake).run().await.unwrap();
        assert_eq!(status, RunStatus::Failed);
    }

    #[tokio::test]
    async fn cancelled_run_submits_nothing() {
        let fake = Arc::new(FakeScheduler::new());
        let s = strategy(RunConfig::default(), fake.clone());
        s.cancel().await;
        s.cancel().await;

        assert_eq!(s.run().await.unwrap(), RunStatus::Cancelled);
        assert!(fake.calls().is_empty());
    }

    struct Waiting;

    #[async_trait]
    impl Invoker for Waiting {
        async fn invoke(&self, _argv: &[String], _stdin: Option<&str>) -> Result<String, crate::ExecError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_releases_pending_submission() {
        let template = TaskTemplate::new(vec!["/work/bin/align".into()], "o", "e").unwrap();
        let s = Arc::new(GridEngineStrategy::new(template, RunConfig::default(), Arc::new(Waiting)));

        let runner = {
            let s = s.clone();
            tokio::spawn(async move { s.run().await })
        };
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        s.cancel().await;

        assert_eq!(runner.await.unwrap().unwrap(), RunStatus::Cancelled);
    }

    #[test]
    fn marker_count_ignores_other_codes() {
        assert_eq!(count_successes(&qsub_output(4, 2)), 4);
        assert_eq!(count_successes(""), 0);
    }
}
