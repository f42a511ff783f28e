//! Running external programs.

use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::debug;

/// CommandError is returned when an external program cannot be run or fails.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

/// CommandRunner runs a program to completion and returns its stdout.
///
/// Generation and history lookups go through this trait, so tests can stand
/// in canned output for `helm`, `docker` and `git`.
pub trait CommandRunner {
    fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<Vec<u8>, CommandError>;
}

/// SystemRunner runs programs as child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<Vec<u8>, CommandError> {
        debug!(program, ?args, "running");
        let spawn_err = |source: std::io::Error| CommandError::Spawn {
            program: program.to_string(),
            source,
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(spawn_err)?;

        // The child may fill its stdout pipe before it has read all of stdin.
        let writer = child.stdin.take().map(|mut pipe| {
            let input = stdin.to_vec();
            std::thread::spawn(move || pipe.write_all(&input))
        });

        let output = child.wait_with_output().map_err(spawn_err)?;
        if let Some(handle) = writer {
            match handle.join() {
                Ok(Err(err)) if err.kind() != std::io::ErrorKind::BrokenPipe => {
                    return Err(spawn_err(err));
                }
                _ => {}
            }
        }

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: program.to_string(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(output.stdout)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{CommandError, CommandRunner};
    use std::cell::RefCell;

    /// Invocation recorded by [`FakeRunner`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct Invocation {
        pub program: String,
        pub args: Vec<String>,
        pub stdin: String,
    }

    /// FakeRunner answers every invocation with the same output and records
    /// what it was asked to run.
    pub struct FakeRunner {
        output: Result<String, String>,
        pub calls: RefCell<Vec<Invocation>>,
    }

    impl FakeRunner {
        pub fn new(output: &str) -> Self {
            FakeRunner {
                output: Ok(output.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn failing(stderr: &str) -> Self {
            FakeRunner {
                output: Err(stderr.to_string()),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn last_call(&self) -> Invocation {
            self.calls.borrow().last().cloned().expect("runner was not called")
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, program: &str, args: &[String], stdin: &[u8]) -> Result<Vec<u8>, CommandError> {
            self.calls.borrow_mut().push(Invocation {
                program: program.to_string(),
                args: args.to_vec(),
                stdin: String::from_utf8_lossy(stdin).into_owned(),
            });
            match &self.output {
                Ok(out) => Ok(out.clone().into_bytes()),
                Err(stderr) => Err(CommandError::Failed {
                    program: program.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: stderr.clone(),
                }),
            }
        }
    }
}
