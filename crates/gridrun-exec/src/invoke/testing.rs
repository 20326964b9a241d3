//! Scripted scheduler used by backend tests.
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use async_trait::async_trait;

use super::Invoker;
use crate::error::ExecError;

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub argv: Vec<String>,
    pub stdin: Option<String>,
}

impl Call {
    pub fn program(&self) -> &str {
        self.argv.first().map(String::as_str).unwrap_or_default()
    }

    /// Value following `flag`, e.g. `-J`.
    pub fn flag(&self, flag: &str) -> Option<&str> {
        self.argv
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.argv.get(i + 1))
            .map(String::as_str)
    }

    pub fn has(&self, arg: &str) -> bool {
        self.argv.iter().any(|a| a == arg)
    }
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    next_id: u64,
    /// sbatch answers without a job id this many times before accepting.
    rejections: usize,
    /// sacct reports RUNNING this many times before final states.
    running_polls: u32,
    /// Job name -> number of attempts that still fail.
    failures: HashMap<String, u32>,
    names: HashMap<String, String>,
    /// Canned stdout for programs other than the Slurm tools.
    canned: HashMap<String, String>,
    /// Program -> (calls that still succeed, calls that then fail to spawn).
    spawn_failures: HashMap<String, (u32, u32)>,
}

/// Minimal Slurm and grid-engine stand-in.
pub struct FakeScheduler {
    state: Mutex<State>,
}

impl FakeScheduler {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_id: 1000,
                ..Default::default()
            }),
        }
    }

    pub fn reject_submissions(self, n: usize) -> Self {
        self.with_state(|s| s.rejections = n);
        self
    }

    pub fn running_polls(self, n: u32) -> Self {
        self.with_state(|s| s.running_polls = n);
        self
    }

    /// Make the first `attempts` jobs named `name` fail.
    pub fn fail(self, name: &str, attempts: u32) -> Self {
        self.with_state(|s| {
            s.failures.insert(name.to_string(), attempts);
        });
        self
    }

    /// Let `program` run `after` times, then fail to spawn `times` times.
    pub fn fail_spawn(self, program: &str, after: u32, times: u32) -> Self {
        self.with_state(|s| {
            s.spawn_failures.insert(program.to_string(), (after, times));
        });
        self
    }

    pub fn reply(self, program: &str, stdout: &str) -> Self {
        self.with_state(|s| {
            s.canned.insert(program.to_string(), stdout.to_string());
        });
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|s| s.calls.clone())
    }

    pub fn calls_to(&self, program: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.program() == program)
            .collect()
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut state)
    }
}

#[async_trait]
impl Invoker for FakeScheduler {
    async fn invoke(&self, argv: &[String], stdin: Option<&str>) -> Result<String, ExecError> {
        self.with_state(|s| {
            let call = Call {
                argv: argv.to_vec(),
                stdin: stdin.map(str::to_string),
            };
            s.calls.push(call.clone());

            if let Some((after, times)) = s.spawn_failures.get_mut(call.program()) {
                if *after > 0 {
                    *after -= 1;
                } else if *times > 0 {
                    *times -= 1;
                    return Err(ExecError::Spawn(format!(
                        "{}: Resource temporarily unavailable",
                        call.program()
                    )));
                }
            }

            match call.program() {
                "sbatch" => {
                    if s.rejections > 0 {
                        s.rejections -= 1;
                        return Ok("sbatch: error: Slurm temporarily unable to accept job".into());
                    }
                    s.next_id += 1;
                    let id = s.next_id.to_string();
                    let name = call.flag("-J").unwrap_or_default().to_string();
                    s.names.insert(id.clone(), name);
                    Ok(format!("Submitted batch job {id}\n"))
                }
                "sacct" => {
                    let ids: Vec<String> = call
                        .flag("-j")
                        .unwrap_or_default()
                        .split(',')
                        .map(str::to_string)
                        .collect();
                    let running = s.running_polls > 0;
                    if running {
                        s.running_polls -= 1;
                    }
                    let mut out = String::new();
                    for id in ids {
                        let line = if running {
                            format!("{id}|0:0|RUNNING\n")
                        } else {
                            let name = s.names.get(&id).cloned().unwrap_or_default();
                            match s.failures.get_mut(&name) {
                                Some(left) if *left > 0 => {
                                    *left -= 1;
                                    format!("{id}|1:0|FAILED\n")
                                }
                                _ => format!("{id}|0:0|COMPLETED\n"),
                            }
                        };
                        out.push_str(&line);
                    }
                    Ok(out)
                }
                "srun" | "scancel" => Ok(String::new()),
                other => Ok(s.canned.get(other).cloned().unwrap_or_default()),
            }
        })
    }
}
