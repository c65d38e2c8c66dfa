//! External block sorter invocation
//!
//! The sorter (`tfsort` by default) runs in dry-run mode and prints the sorted
//! file; the output is compared line by line with the current text. Any
//! failure to get that output falls back to the built-in ordering check.

use hclguard_core::findings::Finding;
use hclguard_core::formatter;
use hclguard_core::logging::codes;
use hclguard_core::pipeline::ExternalOrdering;
use hclguard_core::{log_debug, log_warning};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub const DEFAULT_FORMATTER: &str = "tfsort";

/// Runs allowlisted programs with a timeout and captures their output
#[derive(Clone)]
pub struct CommandExecutor {
    default_timeout: Duration,
    allowed_commands: HashSet<String>,
}

impl CommandExecutor {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            default_timeout: timeout,
            allowed_commands: HashSet::new(),
        }
    }

    pub fn allow_command(&mut self, command: impl Into<String>) {
        self.allowed_commands.insert(command.into());
    }

    pub fn is_allowed(&self, command: &str) -> bool {
        self.allowed_commands.contains(command)
    }

    pub fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput, CommandError> {
        if !self.is_allowed(program) {
            return Err(CommandError::NotAllowed {
                program: program.to_string(),
            });
        }

        let start = Instant::now();
        let mut cmd = Command::new(program);
        cmd.args(args)
            .env_clear()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => CommandError::ProgramNotFound {
                program: program.to_string(),
            },
            _ => CommandError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            },
        })?;

        // Drain the pipes while waiting so a large output cannot block the child
        let stdout_reader = child.stdout.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let _ = pipe.read_to_end(&mut buffer);
                buffer
            })
        });
        let stderr_reader = child.stderr.take().map(|mut pipe| {
            thread::spawn(move || {
                let mut buffer = Vec::new();
                let _ = pipe.read_to_end(&mut buffer);
                buffer
            })
        });

        let status = wait_timeout::ChildExt::wait_timeout(&mut child, self.default_timeout)
            .map_err(|e| CommandError::ExecutionFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        let Some(status) = status else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(CommandError::Timeout {
                timeout_ms: self.default_timeout.as_millis() as u64,
            });
        };

        let collect = |reader: Option<thread::JoinHandle<Vec<u8>>>| {
            reader
                .and_then(|handle| handle.join().ok())
                .map(|bytes| String::from_utf8_lossy(&bytes).to_string())
                .unwrap_or_default()
        };

        Ok(CommandOutput {
            stdout: collect(stdout_reader),
            stderr: collect(stderr_reader),
            exit_code: status.code().unwrap_or(-1),
            duration: start.elapsed(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub duration: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Program not found: {program}")]
    ProgramNotFound { program: String },

    #[error("Execution failed for '{program}': {reason}")]
    ExecutionFailed { program: String, reason: String },

    #[error("Command timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Command '{program}' is not in the allowlist")]
    NotAllowed { program: String },
}

impl CommandError {
    pub fn error_code(&self) -> hclguard_core::logging::Code {
        match self {
            CommandError::NotAllowed { .. } => codes::command::COMMAND_NOT_ALLOWED,
            CommandError::Timeout { .. } => codes::command::COMMAND_TIMEOUT,
            CommandError::ProgramNotFound { .. } | CommandError::ExecutionFailed { .. } => {
                codes::command::COMMAND_FAILED
            }
        }
    }
}

/// Ordering check backed by the external sorter
pub struct FormatterOrdering {
    program: String,
    executor: CommandExecutor,
}

impl FormatterOrdering {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        let program = program.into();
        let mut executor = CommandExecutor::with_timeout(timeout);
        executor.allow_command(program.clone());
        Self { program, executor }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ExternalOrdering for FormatterOrdering {
    fn check(&self, file_path: &Path, text: &str) -> Option<Vec<Finding>> {
        let path = file_path.to_string_lossy();
        let output = match self.executor.execute(&self.program, &["--dry-run", &path]) {
            Ok(output) => output,
            Err(error) => {
                log_warning!(
                    error.error_code(),
                    "Formatter unavailable, using built-in ordering check",
                    "program" => self.program,
                    "error" => error
                );
                return None;
            }
        };

        if output.exit_code != 0 {
            log_warning!(
                codes::command::COMMAND_FAILED,
                "Formatter exited with an error, using built-in ordering check",
                "program" => self.program,
                "exit_code" => output.exit_code,
                "stderr" => output.stderr.trim()
            );
            return None;
        }

        let comparison = formatter::compare(text, &output.stdout);
        if comparison.differs {
            log_warning!(
                codes::validation::FORMATTER_DIFF,
                "Formatter would reorder file",
                "file" => path,
                "first_line" => comparison.first_line
            );
            log_debug!("Formatter diff", "file" => path, "diff" => comparison.preview);
        }
        Some(comparison.to_finding(file_path).into_iter().collect())
    }
}
