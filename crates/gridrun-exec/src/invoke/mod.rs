//! External command seam.
//!
//! Batch backends talk to the scheduler only through [`Invoker`]: an argv, an
//! optional script on stdin, and the captured stdout back. Tests swap in a
//! scripted scheduler.
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tracing::{debug, trace};

use crate::{error::ExecError, util::cmd_program};

#[async_trait]
pub trait Invoker: Send + Sync {
    /// Run `argv`, feed `stdin` if given, and return everything written to stdout.
    ///
    /// A non-zero exit status is not an error; callers judge the output.
    async fn invoke(&self, argv: &[String], stdin: Option<&str>) -> Result<String, ExecError>;
}

/// Runs commands as local subprocesses.
///
/// The child is killed if the returned future is dropped, so cancelling a
/// blocking submission also stops the submitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessInvoker;

#[async_trait]
impl Invoker for ProcessInvoker {
    async fn invoke(&self, argv: &[String], stdin: Option<&str>) -> Result<String, ExecError> {
        let (program, args) = argv.split_first().ok_or(ExecError::MissingProgram)?;

        let mut cmd = cmd_program(program, args);
        cmd.stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

        trace!(target: "gridrun.exec.invoke", %program, ?args, "spawn");
        let mut child = cmd
            .spawn()
            .map_err(|e| ExecError::Spawn(format!("{program}: {e}")))?;

        let pipe = child.stdin.take();
        let feed = async move {
            if let (Some(mut pipe), Some(input)) = (pipe, stdin) {
                pipe.write_all(input.as_bytes()).await?;
                pipe.shutdown().await?;
            }
            Ok::<_, std::io::Error>(())
        };

        let (fed, output) = tokio::join!(feed, child.wait_with_output());
        if let Err(e) = fed {
            debug!(target: "gridrun.exec.invoke", %program, error = %e, "stdin not fully consumed");
        }
        let output = output?;

        if !output.status.success() {
            debug!(target: "gridrun.exec.invoke", %program, code = ?output.status.code(), "command exited non-zero");
        }
        if !output.stderr.is_empty() {
            debug!(target: "gridrun.exec.invoke", %program, stderr = %String::from_utf8_lossy(&output.stderr).trim_end(), "stderr");
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
pub(crate) mod testing;
