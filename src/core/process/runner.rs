// rpmpq: RPM spec patch-queue tool
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Process execution.
//!
//! ```text
//! run()
//!   |
//!   v
//! build_command()
//! args, cwd, env, stdio
//!   |
//!   v
//! spawn() --> stdin writer thread (optional)
//!   |
//!   v
//! wait_with_output()
//!   |
//!   v
//! forward output to log (FORWARD_TO_LOG)
//! validate exit_code (skip if ALLOW_FAILURE)
//!   |
//!   v
//! ProcessOutput { exit_code, stdout, stderr }
//! ```

use std::io::Write as _;
use std::process::{Command, Stdio};
use tracing::{debug, error, trace};

use super::builder::{ProcessBuilder, ProcessFlags, ProcessOutput, StreamFlags};
use crate::error::{PqResult, ProcessError};

impl ProcessBuilder {
    fn display_name(&self) -> String {
        self.name_override().map_or_else(
            || {
                self.program().file_stem().map_or_else(
                    || "process".to_string(),
                    |s| s.to_string_lossy().into_owned(),
                )
            },
            String::from,
        )
    }

    /// Returns the full command line as a string (for logging).
    pub(super) fn command_line(&self) -> String {
        use std::fmt::Write as _;
        let mut cmd = format!("{}", self.program().display());
        for arg in self.args_slice() {
            if arg.contains(' ') {
                let _ = write!(cmd, " \"{arg}\"");
            } else {
                let _ = write!(cmd, " {arg}");
            }
        }
        cmd
    }

    /// Spawns the process and waits for it to finish.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Spawning the child process fails.
    /// - Feeding stdin or collecting output fails.
    /// - The process exits with a code outside the success set (and
    ///   `ALLOW_FAILURE` is not set).
    pub fn run(self) -> PqResult<ProcessOutput> {
        let name = self.display_name();
        let cmd_line = self.command_line();

        if let Some(cwd) = self.working_dir() {
            debug!(cwd = %cwd.display(), "cd");
        }
        debug!(cmd = %cmd_line, "exec");

        let mut command = self.build_command();
        let mut child = command
            .spawn()
            .map_err(|source| ProcessError::SpawnFailed {
                command: cmd_line.clone(),
                source,
            })
            .map_err(Box::new)?;
        trace!(process = %name, pid = child.id(), "spawned");

        let stdin = child.stdin.take();
        let output = std::thread::scope(|scope| {
            let writer = match (stdin, self.stdin_content()) {
                (Some(mut pipe), Some(content)) => {
                    Some(scope.spawn(move || pipe.write_all(content)))
                }
                _ => None,
            };
            let output = child.wait_with_output();
            let written = writer.map_or(Ok(()), |handle| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")))
            });
            output.and_then(|output| written.map(|()| output))
        })
        .map_err(|e| ProcessError::OutputError {
            command: cmd_line.clone(),
            message: e.to_string(),
        })
        .map_err(Box::new)?;

        let exit_code = output.status.code().unwrap_or(-1);
        let output = ProcessOutput::new(exit_code, output.stdout, output.stderr);
        let succeeded = self.success_code_set().contains(&exit_code);

        if !(succeeded
            && self
                .process_flags()
                .contains(ProcessFlags::IGNORE_OUTPUT_ON_SUCCESS))
        {
            self.forward_to_log(&name, &output);
        }

        if !succeeded && !self.process_flags().contains(ProcessFlags::ALLOW_FAILURE) {
            if !output.stderr().trim().is_empty() {
                error!(process = %name, stderr = %output.stderr().trim_end(), "process error output");
            }
            return Err(Box::new(ProcessError::NonZeroExit {
                command: cmd_line,
                code: exit_code,
            })
            .into());
        }

        trace!(process = %name, exit_code, "completed");
        Ok(output)
    }

    fn forward_to_log(&self, name: &str, output: &ProcessOutput) {
        if self.stdout_config().contains(StreamFlags::FORWARD_TO_LOG) {
            for line in output.stdout().lines() {
                trace!(process = %name, "{line}");
            }
        }
        if self.stderr_config().contains(StreamFlags::FORWARD_TO_LOG) {
            for line in output.stderr().lines() {
                debug!(process = %name, "{line}");
            }
        }
    }

    fn build_command(&self) -> Command {
        let mut command = Command::new(self.program());
        command.args(self.args_slice());

        if let Some(cwd) = self.working_dir() {
            command.current_dir(cwd);
        }
        command.envs(self.environment());

        if self.stdin_content().is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }
        command.stdout(Self::stdio_from_flags(self.stdout_config()));
        command.stderr(Self::stdio_from_flags(self.stderr_config()));

        command
    }

    fn stdio_from_flags(flags: StreamFlags) -> Stdio {
        if flags.contains(StreamFlags::INHERIT) {
            Stdio::inherit()
        } else if flags.contains(StreamFlags::BIT_BUCKET) {
            Stdio::null()
        } else {
            Stdio::piped()
        }
    }
}
