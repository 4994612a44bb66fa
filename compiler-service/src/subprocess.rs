// Copyright 2025 Jonas Kruckenberg
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

//! One external compiler/linker invocation.
//!
//! The original implementation polled its child's output pipe on a timer
//! (`CodeCompilerProcess::HasInput`), which could leave the UI spinning on
//! a dead process if the pipe never signalled readable. Here stdout/stderr
//! are drained on dedicated threads that block on read and forward
//! complete lines to the caller over a channel; the only timing dependency
//! left is [`SubprocessRunner::wait`]'s underlying `wait_timeout` poll.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::Duration;

use wait_timeout::ChildExt;

/// Kills the wrapped child if it is still running when dropped, so a
/// scheduler that bails out early (shutdown, panic unwind) never leaves
/// an orphaned compiler process behind.
struct KillOnDrop(Child);

impl Drop for KillOnDrop {
    fn drop(&mut self) {
        self.0.kill().ok();
    }
}

/// A line of captured output, tagged by which stream it came from.
#[derive(Debug, Clone)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// A spawned compiler/linker invocation whose output is being drained on
/// background threads.
pub struct RunningProcess {
    child: KillOnDrop,
    lines: Receiver<OutputLine>,
}

impl RunningProcess {
    /// Poll for the process to exit, waiting at most `timeout` before
    /// giving up. `Ok(None)` means it is still running.
    pub fn try_wait(&mut self, timeout: Duration) -> std::io::Result<Option<i32>> {
        match self.child.0.wait_timeout(timeout)? {
            Some(status) => Ok(Some(status.code().unwrap_or(-1))),
            None => Ok(None),
        }
    }

    /// Drain whatever output lines have arrived so far without blocking.
    pub fn drain_available(&self) -> Vec<OutputLine> {
        self.lines.try_iter().collect()
    }

    /// Block until the process exits, collecting every remaining line of
    /// output along with the exit code.
    pub fn wait(mut self) -> std::io::Result<(Option<i32>, Vec<OutputLine>)> {
        let status = self.child.0.wait()?;
        let mut lines: Vec<_> = self.lines.try_iter().collect();
        // the reader threads may still be flushing their last line; give
        // them a final chance to deliver it now that the child is reaped.
        for line in self.lines.try_iter() {
            lines.push(line);
        }
        Ok((status.code(), lines))
    }
}

/// Spawns compiler/linker subprocesses. Stateless: one instance can drive
/// every invocation the scheduler ever makes.
#[derive(Debug, Default)]
pub struct SubprocessRunner;

impl SubprocessRunner {
    pub fn new() -> Self {
        Self
    }

    /// Spawn `binary` with `args` in `working_dir`, returning immediately
    /// with a handle whose output is drained asynchronously.
    ///
    /// # Errors
    /// Returns the `io::Error` from `Command::spawn` if the binary cannot
    /// be launched (this is reported to the caller as a terminal event,
    /// never as a hang).
    ///
    /// # Panics
    /// Never, in practice: stdout/stderr are always requested as piped
    /// above, so `Child::stdout`/`Child::stderr` are always `Some` on a
    /// successfully spawned child.
    pub fn spawn(&self, binary: &Path, args: &[String], working_dir: &Path) -> std::io::Result<RunningProcess> {
        let mut command = Command::new(binary);
        command
            .args(args)
            .current_dir(working_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, rx) = mpsc::channel();
        spawn_reader(stdout, tx.clone(), OutputLine::Stdout as fn(String) -> OutputLine);
        spawn_reader(stderr, tx, OutputLine::Stderr as fn(String) -> OutputLine);

        Ok(RunningProcess {
            child: KillOnDrop(child),
            lines: rx,
        })
    }
}

fn spawn_reader<R>(stream: R, tx: mpsc::Sender<OutputLine>, wrap: fn(String) -> OutputLine)
where
    R: std::io::Read + Send + 'static,
{
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if tx.send(wrap(line)).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn spawn_and_wait_collects_stdout() {
        let runner = SubprocessRunner::new();
        let process = runner
            .spawn(Path::new("echo"), &["hello".to_string()], Path::new("."))
            .expect("echo should spawn");

        let (code, lines) = process.wait().expect("wait should succeed");
        assert_eq!(code, Some(0));
        assert!(lines.iter().any(|l| matches!(l, OutputLine::Stdout(s) if s == "hello")));
    }

    #[test]
    fn spawn_of_missing_binary_errors_immediately() {
        let runner = SubprocessRunner::new();
        let result = runner.spawn(Path::new("/no/such/binary-xyz"), &[], Path::new("."));
        assert!(result.is_err());
    }

    #[test]
    fn try_wait_reports_still_running_then_exited() {
        let runner = SubprocessRunner::new();
        let mut process = runner
            .spawn(Path::new("sleep"), &["0.2".to_string()], Path::new("."))
            .expect("sleep should spawn");

        assert_eq!(process.try_wait(Duration::from_millis(10)).unwrap(), None);
        let code = loop {
            if let Some(code) = process.try_wait(Duration::from_millis(50)).unwrap() {
                break code;
            }
        };
        assert_eq!(code, 0);
    }
}
