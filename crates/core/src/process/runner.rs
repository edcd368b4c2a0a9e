//! tokio-backed process runner.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use super::{ProcessRunner, ProcessSettings, ToolProcess};
use crate::{Error, Result};

/// Runs processes with `tokio::process`.
///
/// Children are killed when their handle is dropped, so an abandoned
/// invocation never leaves an orphan behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioProcessRunner;

impl TokioProcessRunner {
    /// Create a new runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn start(
        &self,
        program: &Path,
        args: &[String],
        settings: &ProcessSettings,
    ) -> std::io::Result<Box<dyn ToolProcess>> {
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &settings.working_directory {
            cmd.current_dir(dir);
        }
        for (key, value) in &settings.environment_variables {
            cmd.env(key, value);
        }
        cmd.stdout(if settings.redirect_standard_output {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.stderr(if settings.redirect_standard_error {
            Stdio::piped()
        } else {
            Stdio::inherit()
        });
        cmd.kill_on_drop(true);

        if !settings.silent {
            tracing::info!(
                program = %program.display(),
                arguments = %settings.arguments.render_safe(),
                "Executing process"
            );
        }

        let mut child = cmd.spawn()?;
        let stdout_task = child.stdout.take().map(collect_lines);
        let stderr_task = child.stderr.take().map(collect_lines);

        Ok(Box::new(TokioProcess {
            child,
            stdout_task,
            stderr_task,
            exit_code: None,
            stdout: Vec::new(),
            stderr: Vec::new(),
        }))
    }
}

/// Drain `stream` to EOF on a background task, one entry per line.
///
/// Bytes that are not UTF-8 are replaced rather than ending the read, so the
/// child never sees its pipe closed early.
fn collect_lines<R>(stream: R) -> JoinHandle<Vec<String>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = decode_line(&buf);
                    tracing::trace!(%line, "process output");
                    lines.push(line);
                }
                Err(e) => {
                    tracing::debug!(error = %e, "Stopped reading process output");
                    break;
                }
            }
        }
        lines
    })
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// A process started by [`TokioProcessRunner`].
#[derive(Debug)]
pub struct TokioProcess {
    child: Child,
    stdout_task: Option<JoinHandle<Vec<String>>>,
    stderr_task: Option<JoinHandle<Vec<String>>>,
    exit_code: Option<i32>,
    stdout: Vec<String>,
    stderr: Vec<String>,
}

impl TokioProcess {
    /// Wait for exit, then for both output pipes to reach EOF.
    async fn finish(&mut self) -> Result<()> {
        let status = self
            .child
            .wait()
            .await
            .map_err(|e| Error::io(e, None, "wait for process"))?;

        if let Some(task) = self.stdout_task.as_mut() {
            self.stdout = task.await.unwrap_or_default();
        }
        if let Some(task) = self.stderr_task.as_mut() {
            self.stderr = task.await.unwrap_or_default();
        }
        self.stdout_task = None;
        self.stderr_task = None;

        // Signal-terminated processes have no code on Unix.
        self.exit_code = Some(status.code().unwrap_or(-1));
        Ok(())
    }

    fn abort_readers(&mut self) {
        for task in [self.stdout_task.take(), self.stderr_task.take()]
            .into_iter()
            .flatten()
        {
            task.abort();
        }
    }
}

#[async_trait]
impl ToolProcess for TokioProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    async fn wait_for_exit(&mut self, timeout: Option<Duration>) -> Result<bool> {
        // The deadline covers the pipes too: a background child can keep
        // them open long after the process itself has exited.
        let finished = match timeout {
            Some(limit) => tokio::time::timeout(limit, self.finish()).await.ok(),
            None => Some(self.finish().await),
        };
        match finished {
            Some(result) => result.map(|()| true),
            None => {
                self.abort_readers();
                Ok(false)
            }
        }
    }

    async fn kill(&mut self) -> Result<()> {
        self.abort_readers();
        if matches!(self.child.try_wait(), Ok(Some(_))) {
            return Ok(());
        }
        self.child
            .kill()
            .await
            .map_err(|e| Error::io(e, None, "kill process"))
    }

    fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }

    fn standard_output(&self) -> &[String] {
        &self.stdout
    }

    fn standard_error(&self) -> &[String] {
        &self.stderr
    }
}

#[cfg(test)]
mod decode_tests {
    use super::decode_line;

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"plain\n"), "plain");
        assert_eq!(decode_line(b"windows\r\n"), "windows");
        assert_eq!(decode_line(b"last"), "last");
        assert_eq!(decode_line(b"caf\xe9\n"), "caf\u{FFFD}");
    }
}
