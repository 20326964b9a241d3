//! Normalisation of caller input into a [`TaskTemplate`].
//!
//! Tasks may run on other hosts with another working directory, so local
//! executables and output paths are made absolute up front.
use std::path::Path;

use gridrun_model::{DEFAULT_STDERR_PATTERN, DEFAULT_STDOUT_PATTERN, RunConfig, TaskTemplate};

use crate::error::CoreError;

/// Build the template relative to the process working directory.
pub fn prepare_template(command: Vec<String>, cfg: &RunConfig) -> Result<TaskTemplate, CoreError> {
    let cwd = std::env::current_dir()?;
    prepare_template_in(command, cfg, &cwd)
}

/// Build the template relative to `cwd`.
pub fn prepare_template_in(
    mut command: Vec<String>,
    cfg: &RunConfig,
    cwd: &Path,
) -> Result<TaskTemplate, CoreError> {
    if let Some(program) = command.first_mut()
        && is_relative(program)
        && cwd.join(program.as_str()).is_file()
    {
        *program = cwd.join(program.as_str()).to_string_lossy().into_owned();
    }

    let stdout = normalize_pattern(&cfg.stdout_pattern, DEFAULT_STDOUT_PATTERN, cwd);
    let stderr = normalize_pattern(&cfg.stderr_pattern, DEFAULT_STDERR_PATTERN, cwd);

    Ok(TaskTemplate::new(command, stdout, stderr)?)
}

fn normalize_pattern(pattern: &str, default: &str, cwd: &Path) -> String {
    let pattern = if pattern.is_empty() { default } else { pattern };

    let mut out = if is_relative(pattern) {
        cwd.join(pattern).to_string_lossy().into_owned()
    } else {
        pattern.to_string()
    };

    if Path::new(&out).is_dir() {
        out = format!("{}/{default}", out.trim_end_matches('/'));
    }
    out
}

/// Neither absolute nor explicitly relative to the current directory.
fn is_relative(path: &str) -> bool {
    !path.starts_with('.') && !path.starts_with('/')
}

#[cfg(test)]
mod tests {
    use gridrun_model::ModelError;

    use super::*;

    #[test]
    fn local_script_becomes_absolute() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("train.sh"), "#!/bin/sh\n").unwrap();

        let t = prepare_template_in(
            vec!["train.sh".into(), "%t".into()],
            &RunConfig::default(),
            dir.path(),
        )
        .unwrap();

        assert_eq!(t.command()[0], dir.path().join("train.sh").to_string_lossy());
        assert_eq!(t.job_label(), "train.sh");
    }

    #[test]
    fn commands_on_path_are_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let t = prepare_template_in(vec!["echo".into()], &RunConfig::default(), dir.path()).unwrap();
        assert_eq!(t.command(), ["echo"]);

        let t = prepare_template_in(vec!["./run".into()], &RunConfig::default(), dir.path()).unwrap();
        assert_eq!(t.command(), ["./run"]);
    }

    #[test]
    fn relative_patterns_are_anchored_in_cwd() {
        let dir = tempfile::tempdir().unwrap();
        let t = prepare_template_in(vec!["echo".into()], &RunConfig::default(), dir.path()).unwrap();
        assert_eq!(
            t.stdout_pattern(),
            dir.path().join("%c.o%j.%t").to_string_lossy()
        );
    }

    #[test]
    fn directory_patterns_get_default_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let logs = dir.path().join("logs");
        std::fs::create_dir(&logs).unwrap();

        let cfg = RunConfig {
            stdout_pattern: logs.to_string_lossy().into_owned(),
            stderr_pattern: format!("{}/", logs.to_string_lossy()),
            ..Default::default()
        };
        let t = prepare_template_in(vec!["echo".into()], &cfg, dir.path()).unwrap();

        assert_eq!(t.stdout_pattern(), format!("{}/%c.o%j.%t", logs.to_string_lossy()));
        assert_eq!(t.stderr_pattern(), format!("{}/%c.e%j.%t", logs.to_string_lossy()));
    }

    #[test]
    fn empty_command_is_a_config_error() {
        let err = prepare_template_in(Vec::new(), &RunConfig::default(), Path::new("/")).unwrap_err();
        assert!(matches!(err, CoreError::Config(ModelError::EmptyCommand)));
    }
}
