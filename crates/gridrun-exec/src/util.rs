use std::time::Duration;

use tokio::process::{Child, Command};

/// Time a child gets to exit after SIGTERM before it is killed.
pub const KILL_GRACE: Duration = Duration::from_secs(2);

pub fn cmd_program(program: &str, args: &[String]) -> Command {
    let mut cmd = Command::new(program);
    cmd.args(args.iter().map(|s| s.as_str()));
    cmd
}

cfg_if::cfg_if! {
    if #[cfg(unix)] {
        fn send_sigterm(child: &Child) -> bool {
            use nix::sys::signal::{Signal, kill};
            use nix::unistd::Pid;

            child
                .id()
                .is_some_and(|id| kill(Pid::from_raw(id as i32), Signal::SIGTERM).is_ok())
        }
    } else {
        fn send_sigterm(_child: &Child) -> bool {
            false
        }
    }
}

/// SIGTERM, then SIGKILL if the child is still alive after `grace`.
pub async fn kill_graceful(child: &mut Child, grace: Duration) -> std::io::Result<()> {
    if send_sigterm(child) && tokio::time::timeout(grace, child.wait()).await.is_ok() {
        return Ok(());
    }
    child.kill().await
}

/// Job id printed at the very end of a submitter's output.
pub fn trailing_job_id(output: &str) -> Option<String> {
    let trimmed = output.trim_end();
    let digits = trimmed
        .bytes()
        .rev()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        None
    } else {
        Some(trimmed[trimmed.len() - digits..].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_is_trailing_integer() {
        assert_eq!(
            trailing_job_id("Submitted batch job 4242\n").as_deref(),
            Some("4242")
        );
        assert_eq!(trailing_job_id("77").as_deref(), Some("77"));
    }

    #[test]
    fn no_trailing_integer_means_no_job() {
        assert_eq!(trailing_job_id(""), None);
        assert_eq!(
            trailing_job_id("sbatch: error: Batch job submission failed: Socket timed out"),
            None
        );
        assert_eq!(trailing_job_id("job 12 queued."), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn kill_graceful_stops_sleeping_child() {
        let mut child = cmd_program("sleep", &["30".to_string()]).spawn().unwrap();
        kill_graceful(&mut child, Duration::from_millis(500)).await.unwrap();
        let status = child.wait().await.unwrap();
        assert!(!status.success());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn sigterm_comes_before_kill() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = cmd_program("sleep", &["30".to_string()]).spawn().unwrap();
        kill_graceful(&mut child, Duration::from_secs(5)).await.unwrap();
        let status = child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(nix::sys::signal::Signal::SIGTERM as i32));
    }
}
