//! Process launcher and stdio channel for the MCP server
//!
//! The server is started as a child process. Its stdin/stdout carry the
//! protocol; its stderr is forwarded line by line to our stderr.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use colored::Colorize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::common::{Error, Result};

use super::codec;

/// Everything needed to start the server process
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// Executable name (looked up on PATH) or path
    pub program: String,
    /// Arguments, in order
    pub args: Vec<String>,
    /// Extra environment variables for the child
    pub env: Vec<(String, String)>,
}

impl LaunchSpec {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, env: Vec<(String, String)>) -> Self {
        self.env = env;
        self
    }
}

/// Bidirectional message channel over a child's stdio
pub struct StdioTransport {
    /// Server subprocess
    child: Child,
    /// Buffered reader for server stdout
    reader: BufReader<ChildStdout>,
    /// Bytes of a line not yet fully received
    pending: Vec<u8>,
    /// Buffered writer for server stdin; taken on shutdown to close the pipe
    writer: Option<BufWriter<ChildStdin>>,
    /// Task copying server stderr to ours
    stderr_task: Option<JoinHandle<()>>,
}

impl StdioTransport {
    /// Spawn the server and wire up its pipes
    pub fn launch(spec: &LaunchSpec) -> Result<Self> {
        let program = resolve_program(&spec.program)?;
        let mut cmd = Command::new(&program);
        cmd.args(&spec.args)
            .envs(spec.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(program = %program.display(), args = ?spec.args, "Launching MCP server");

        let mut child = cmd.spawn().map_err(|e| {
            Error::ServerStartFailed(format!("Failed to start {}: {}", program.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::ServerStartFailed("Failed to get server stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ServerStartFailed("Failed to get server stdout".to_string()))?;
        let stderr_task = child.stderr.take().map(|stderr| tokio::spawn(forward_stderr(stderr)));

        Ok(Self {
            child,
            reader: BufReader::new(stdout),
            pending: Vec::new(),
            writer: Some(BufWriter::new(stdin)),
            stderr_task,
        })
    }

    /// Send one message
    pub async fn send(&mut self, json: &str) -> Result<()> {
        let writer = self.writer.as_mut().ok_or(Error::ServerExited)?;
        codec::write_message(writer, json).await
    }

    /// Receive the next message
    ///
    /// Cancel-safe: dropping the future keeps any partial line for the next call.
    pub async fn recv(&mut self) -> Result<String> {
        codec::read_message(&mut self.reader, &mut self.pending).await
    }

    /// Close stdin and wait for the server to exit, killing it after `grace`
    pub async fn shutdown(&mut self, grace: Duration) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            // A stdio MCP server exits when its input closes
            let _ = writer.shutdown().await;
        }

        match tokio::time::timeout(grace, self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                tracing::debug!("MCP server exited with {}", status);
            }
            Err(_) => {
                tracing::debug!("MCP server did not exit within {:?}, killing it", grace);
                self.child.kill().await?;
            }
        }

        if let Some(task) = self.stderr_task.take() {
            // Drain what the server wrote before exiting, but never hang on it
            let _ = tokio::time::timeout(grace, task).await;
        }

        Ok(())
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        // Best-effort since we can't await in drop
        let _ = self.child.start_kill();
    }
}

/// Find the server executable
///
/// Anything with a directory component is taken as a path; a bare name is
/// searched for on PATH.
pub fn resolve_program(program: &str) -> Result<PathBuf> {
    let program = program.trim();
    if program.is_empty() {
        return Err(Error::Config("Server command is empty".to_string()));
    }

    let path = Path::new(program);
    if path.components().count() > 1 {
        return if path.exists() {
            Ok(path.to_path_buf())
        } else {
            Err(Error::server_not_found(program, &[program]))
        };
    }

    which::which(program).map_err(|_| Error::server_not_found(program, &["PATH"]))
}

async fn forward_stderr(stderr: ChildStderr) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        eprintln!("{} {}", "[server]".dimmed(), line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_missing_program_fails() {
        let spec = LaunchSpec::new("/nonexistent/lifeup-mcp-server", Vec::new());
        let err = StdioTransport::launch(&spec).err().unwrap();
        assert!(matches!(err, Error::ServerNotFound { .. }));
        assert!(err.is_launch_failure());
    }

    #[test]
    fn test_resolve_program() {
        assert!(matches!(resolve_program("  "), Err(Error::Config(_))));
        assert!(matches!(
            resolve_program("definitely-not-a-real-server-binary"),
            Err(Error::ServerNotFound { .. })
        ));

        let exe = std::env::current_exe().unwrap();
        assert_eq!(resolve_program(exe.to_str().unwrap()).unwrap(), exe);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_round_trip_through_cat() {
        let spec = LaunchSpec::new("cat", Vec::new());
        let mut transport = StdioTransport::launch(&spec).unwrap();

        transport.send("{\"ping\":1}").await.unwrap();
        assert_eq!(transport.recv().await.unwrap(), "{\"ping\":1}");
        assert!(transport.child.try_wait().unwrap().is_none());

        transport.shutdown(Duration::from_secs(2)).await.unwrap();
        assert!(transport.child.try_wait().unwrap().is_some());
        assert!(matches!(
            transport.send("{}").await,
            Err(Error::ServerExited)
        ));
    }
}
