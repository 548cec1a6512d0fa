use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::task::JoinHandle;
use tracing::Instrument;

/// One invocation of the external downloader.
#[derive(Debug, Clone)]
pub struct DownloaderCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl DownloaderCommand {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

/// Exit status plus captured stderr of a finished process.
#[derive(Debug)]
pub struct ProcessExit {
    pub code: Option<i32>,
    pub stderr: String,
}

impl ProcessExit {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Fully collected output of a process run to completion.
#[derive(Debug)]
pub struct ProcessOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// A spawned downloader whose stdout is consumed line by line.
///
/// Stderr is drained in the background so the child never blocks on a full
/// pipe; every line is logged under the caller's span.
pub struct RunningProcess {
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr_task: JoinHandle<String>,
}

impl RunningProcess {
    /// Next stdout line in emission order, `None` once the stream closes.
    /// Invalid UTF-8 is replaced, never an error.
    pub async fn next_stdout_line(&mut self) -> Result<Option<String>, ProcessError> {
        read_line_lossy(&mut self.stdout)
            .await
            .map_err(ProcessError::Io)
    }

    /// Waits for exit. Any unread stdout is discarded.
    pub async fn wait(mut self) -> Result<ProcessExit, ProcessError> {
        let status = self.child.wait().await.map_err(ProcessError::Io)?;
        let stderr = self.stderr_task.await.unwrap_or_default();
        Ok(ProcessExit {
            code: status.code(),
            stderr,
        })
    }
}

/// Spawn the downloader with piped output for incremental consumption.
pub fn spawn_streaming(cmd: &DownloaderCommand) -> Result<RunningProcess, ProcessError> {
    let mut child = cmd.command().spawn().map_err(ProcessError::Spawn)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProcessError::Io(missing_pipe("stdout")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ProcessError::Io(missing_pipe("stderr")))?;

    let stderr_task = tokio::spawn(
        async move {
            let mut captured = String::new();
            let mut reader = BufReader::new(stderr);
            while let Ok(Some(line)) = read_line_lossy(&mut reader).await {
                tracing::warn!(stderr = %line, "downloader stderr");
                captured.push_str(&line);
                captured.push('\n');
            }
            captured
        }
        .in_current_span(),
    );

    Ok(RunningProcess {
        child,
        stdout: BufReader::new(stdout),
        stderr_task,
    })
}

/// Run the downloader to completion, killing it if `limit` elapses first.
pub async fn run_to_completion(
    cmd: &DownloaderCommand,
    limit: Duration,
) -> Result<ProcessOutput, ProcessError> {
    let mut child = cmd.command().spawn().map_err(ProcessError::Spawn)?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| ProcessError::Io(missing_pipe("stdout")))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| ProcessError::Io(missing_pipe("stderr")))?;

    let stdout_task = tokio::spawn(read_all(stdout));
    let stderr_task = tokio::spawn(read_all(stderr));

    let status = tokio::select! {
        status = child.wait() => status.map_err(ProcessError::Io)?,
        _ = tokio::time::sleep(limit) => {
            if let Err(e) = child.kill().await {
                tracing::warn!(error = %e, "failed to kill timed out downloader");
            }
            stdout_task.abort();
            stderr_task.abort();
            return Err(ProcessError::Timeout(limit));
        }
    };

    Ok(ProcessOutput {
        code: status.code(),
        stdout: stdout_task.await.unwrap_or_default(),
        stderr: stderr_task.await.unwrap_or_default(),
    })
}

async fn read_all<R: AsyncRead + Unpin>(mut reader: R) -> String {
    let mut buf = Vec::new();
    if let Err(e) = reader.read_to_end(&mut buf).await {
        tracing::debug!(error = %e, "pipe read ended early");
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// One line without its terminator, decoded lossily; `None` at end of stream.
async fn read_line_lossy<R: AsyncBufRead + Unpin>(
    reader: &mut R,
) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf).await? == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

fn missing_pipe(name: &str) -> std::io::Error {
    std::io::Error::other(format!("child {name} was not captured"))
}

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Failed to start downloader: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Downloader timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Downloader I/O error: {0}")]
    Io(#[source] std::io::Error),
}
