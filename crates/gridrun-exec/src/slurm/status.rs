//! Parsing of `sacct -P` output.

/// States a job can still leave on its own.
const ACTIVE_STATES: &[&str] = &["PENDING", "RUNNING", "COMPLETING", "CONFIGURING"];

/// One `JobID|ExitCode|State` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub job_id: String,
    pub exit_code: String,
    pub state: String,
}

impl JobStatus {
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.trim().splitn(3, '|');
        let job_id = parts.next()?.trim();
        let exit_code = parts.next()?.trim();
        let state = parts.next()?.trim();
        if job_id.is_empty() {
            return None;
        }
        Some(Self {
            job_id: job_id.to_string(),
            exit_code: exit_code.to_string(),
            state: state.to_string(),
        })
    }

    /// Exit `0:0` and state `COMPLETED`; everything else is a failure.
    pub fn is_success(&self) -> bool {
        self.exit_code == "0:0" && self.state == "COMPLETED"
    }

    pub fn is_active(&self) -> bool {
        // "CANCELLED by 123" style states carry a suffix
        let head = self.state.split_whitespace().next().unwrap_or_default();
        ACTIVE_STATES.contains(&head)
    }
}

pub fn parse_statuses(output: &str) -> Vec<JobStatus> {
    output.lines().filter_map(JobStatus::parse).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pipe_delimited_lines() {
        let out = "1001|0:0|COMPLETED\n1002|1:0|FAILED\n\n1003|0:15|CANCELLED by 4001\n";
        let statuses = parse_statuses(out);

        assert_eq!(statuses.len(), 3);
        assert!(statuses[0].is_success());
        assert!(!statuses[1].is_success());
        assert_eq!(statuses[2].state, "CANCELLED by 4001");
        assert!(!statuses[2].is_success());
        assert!(!statuses[2].is_active());
    }

    #[test]
    fn success_needs_both_exit_code_and_state() {
        let timeout = JobStatus::parse("9|0:0|TIMEOUT").unwrap();
        assert!(!timeout.is_success());
        let odd = JobStatus::parse("9|0:1|COMPLETED").unwrap();
        assert!(!odd.is_success());
    }

    #[test]
    fn pending_and_running_are_active() {
        assert!(JobStatus::parse("5|0:0|PENDING").unwrap().is_active());
        assert!(JobStatus::parse("5|0:0|RUNNING").unwrap().is_active());
        assert!(!JobStatus::parse("5|0:0|COMPLETED").unwrap().is_active());
    }

    #[test]
    fn junk_lines_are_skipped() {
        assert!(parse_statuses("sacct: error: slurmdbd unreachable\n|0:0|X\n").is_empty());
    }
}
