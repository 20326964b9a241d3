use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Command and output-path patterns shared by every task of one run.
///
/// Placeholders:
/// - `%c`: basename of the executable (the job label)
/// - `%t`: task index
/// - `%j`: lower job id (the array's outer id)
/// - `%J`: upper job id (the id of the specific sub-job)
///
/// Commands only substitute `%t`; path patterns substitute all four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskTemplate {
    command: Vec<String>,
    stdout_pattern: String,
    stderr_pattern: String,
    job_label: String,
}

impl TaskTemplate {
    pub fn new(
        command: Vec<String>,
        stdout_pattern: impl Into<String>,
        stderr_pattern: impl Into<String>,
    ) -> Result<Self, ModelError> {
        let program = command.first().ok_or(ModelError::EmptyCommand)?;
        if program.is_empty() {
            return Err(ModelError::EmptyCommand);
        }

        let job_label = Path::new(program)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| program.clone());

        Ok(Self {
            command,
            stdout_pattern: stdout_pattern.into(),
            stderr_pattern: stderr_pattern.into(),
            job_label,
        })
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn stdout_pattern(&self) -> &str {
        &self.stdout_pattern
    }

    pub fn stderr_pattern(&self) -> &str {
        &self.stderr_pattern
    }

    /// Basename of the executable.
    pub fn job_label(&self) -> &str {
        &self.job_label
    }

    /// Command with `%t` replaced by `task`.
    pub fn resolve_command(&self, task: &str) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace("%t", task))
            .collect()
    }

    /// Resolve a path pattern for one task.
    ///
    /// Without a lower id, `%j` degrades to `%J`. Without an upper id, `%J` is
    /// left in place for the batch system to fill in.
    pub fn resolve_pattern(
        &self,
        pattern: &str,
        task: &str,
        lower_id: Option<&str>,
        upper_id: Option<&str>,
    ) -> String {
        let mut out = pattern.replace("%c", &self.job_label).replace("%t", task);

        out = match lower_id {
            Some(id) => out.replace("%j", id),
            None => out.replace("%j", "%J"),
        };

        if let Some(id) = upper_id {
            out = out.replace("%J", id);
        }
        out
    }

    pub fn resolve_stdout(&self, task: &str, lower_id: Option<&str>, upper_id: Option<&str>) -> String {
        self.resolve_pattern(&self.stdout_pattern, task, lower_id, upper_id)
    }

    pub fn resolve_stderr(&self, task: &str, lower_id: Option<&str>, upper_id: Option<&str>) -> String {
        self.resolve_pattern(&self.stderr_pattern, task, lower_id, upper_id)
    }

    /// Bash script running the command for `task`, fed to batch submitters on stdin.
    ///
    /// Arguments are double-quoted so shell variables such as `$SGE_TASK_ID` still expand.
    pub fn script(&self, task: &str) -> String {
        let args: Vec<String> = self
            .resolve_command(task)
            .iter()
            .map(|arg| format!("\"{}\"", escape_double_quoted(arg)))
            .collect();
        format!("#!/bin/bash\n{}", args.join(" "))
    }
}

fn escape_double_quoted(arg: &str) -> String {
    let mut out = String::with_capacity(arg.len());
    for ch in arg.chars() {
        if matches!(ch, '"' | '\\' | '`') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}
