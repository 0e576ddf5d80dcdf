//! Command building and process execution.
//!
//! [`CommandRunner`] starts an external tool, reads its diagnostic stream on a
//! spawned task while waiting for the exit status, and forwards lines that
//! carry a progress marker to a [`ProgressSink`]. The reader is always started
//! before the wait and joined after it, so a chatty failing tool can never
//! block on a full pipe.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, trace, warn};

use crate::error::{MediaError, MediaResult};
use crate::progress::ProgressSink;

/// Number of diagnostic lines kept as error context.
const CONTEXT_LINES: usize = 20;

type DiagnosticReader = Box<dyn AsyncRead + Send + Unpin>;

/// Which output stream carries a tool's progress and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiagnosticStream {
    #[default]
    Stderr,
    Stdout,
}

/// Description of one external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    diagnostic: DiagnosticStream,
    /// Receives stdout when diagnostics are read from stderr
    stdout_file: Option<PathBuf>,
    progress_marker: String,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            diagnostic: DiagnosticStream::Stderr,
            stdout_file: None,
            progress_marker: "%".to_string(),
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

    /// Path argument, converted lossily.
    pub fn path_arg(self, path: impl AsRef<Path>) -> Self {
        let arg = path.as_ref().to_string_lossy().to_string();
        self.arg(arg)
    }

    /// Read diagnostics from the given stream.
    pub fn diagnostic_stream(mut self, stream: DiagnosticStream) -> Self {
        self.diagnostic = stream;
        if stream == DiagnosticStream::Stdout {
            self.stdout_file = None;
        }
        self
    }

    /// Redirect stdout into `path` (created or truncated by the runner).
    ///
    /// Implies diagnostics on stderr.
    pub fn stdout_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdout_file = Some(path.into());
        self.diagnostic = DiagnosticStream::Stderr;
        self
    }

    /// Substring that marks a diagnostic line as a progress update.
    pub fn progress_marker(mut self, marker: impl Into<String>) -> Self {
        self.progress_marker = marker.into();
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn diagnostic(&self) -> DiagnosticStream {
        self.diagnostic
    }

    pub fn stdout_file(&self) -> Option<&Path> {
        self.stdout_file.as_deref()
    }

    /// Whether a diagnostic line should be forwarded as progress.
    pub fn is_progress_line(&self, line: &str) -> bool {
        !self.progress_marker.is_empty() && line.contains(&self.progress_marker)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Outcome of a successful [`ProcessExecutor::run`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletedProcess {
    pub program: String,
    pub exit_code: Option<i32>,
    /// Number of lines forwarded to the progress sink
    pub progress_lines: usize,
    /// Last lines of the diagnostic stream
    pub diagnostic_tail: Vec<String>,
}

/// Output of [`ProcessExecutor::capture`], collected regardless of exit status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CapturedOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    /// Stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Launches external tools.
///
/// The pipeline only talks to tools through this trait, so tests can swap in
/// a spy that records invocations instead of spawning processes.
#[async_trait]
pub trait ProcessExecutor: Send + Sync {
    /// Run to completion, streaming progress lines to `progress`.
    ///
    /// A non-zero exit status is an error carrying the diagnostic tail.
    async fn run(
        &self,
        spec: &CommandSpec,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<CompletedProcess>;

    /// Run to completion and collect both output streams without judging
    /// the exit status.
    async fn capture(&self, spec: &CommandSpec) -> MediaResult<CapturedOutput>;
}

/// Tokio-backed [`ProcessExecutor`].
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    /// Timeout in seconds
    timeout_secs: Option<u64>,
}

impl CommandRunner {
    /// Create a new runner without a timeout.
    pub fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Kill tools that run longer than `secs`.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    fn locate(program: &str) -> MediaResult<()> {
        which::which(program)
            .map(|_| ())
            .map_err(|_| MediaError::ToolNotFound(program.to_string()))
    }

    /// Wait for child process, honouring the optional timeout.
    async fn wait_for_completion(&self, child: &mut Child) -> MediaResult<ExitStatus> {
        let Some(timeout_secs) = self.timeout_secs else {
            return Ok(child.wait().await?);
        };

        match tokio::time::timeout(Duration::from_secs(timeout_secs), child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("Process timed out after {} seconds, killing it", timeout_secs);
                let _ = child.kill().await;
                Err(MediaError::Timeout(timeout_secs))
            }
        }
    }
}

#[async_trait]
impl ProcessExecutor for CommandRunner {
    async fn run(
        &self,
        spec: &CommandSpec,
        progress: Arc<dyn ProgressSink>,
    ) -> MediaResult<CompletedProcess> {
        let program = spec.program();
        Self::locate(program)?;

        debug!("Running: {}", spec);

        let mut command = Command::new(program);
        command
            .args(spec.arguments())
            .stdin(Stdio::null())
            .kill_on_drop(true);

        match spec.diagnostic() {
            DiagnosticStream::Stderr => {
                command.stderr(Stdio::piped());
                match spec.stdout_file() {
                    Some(path) => {
                        let file = tokio::fs::File::create(path)
                            .await
                            .map_err(|source| MediaError::Spawn {
                                program: program.to_string(),
                                source,
                            })?
                            .into_std()
                            .await;
                        command.stdout(file);
                    }
                    None => {
                        command.stdout(Stdio::null());
                    }
                }
            }
            DiagnosticStream::Stdout => {
                command.stdout(Stdio::piped()).stderr(Stdio::null());
            }
        }

        let mut child = command.spawn().map_err(|source| MediaError::Spawn {
            program: program.to_string(),
            source,
        })?;

        let stream = match spec.diagnostic() {
            DiagnosticStream::Stderr => child.stderr.take().map(|s| Box::new(s) as DiagnosticReader),
            DiagnosticStream::Stdout => child.stdout.take().map(|s| Box::new(s) as DiagnosticReader),
        }
        .ok_or_else(|| MediaError::Spawn {
            program: program.to_string(),
            source: std::io::Error::other("diagnostic stream not captured"),
        })?;

        // Spawn line reader before waiting on the process
        let reader_spec = spec.clone();
        let reader_handle = tokio::spawn(async move {
            read_diagnostic_lines(stream, &reader_spec, progress.as_ref()).await
        });

        let status = self.wait_for_completion(&mut child).await;

        // Reader finishes once the stream closes
        let summary = match reader_handle.await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(program = %program, "Diagnostic reader failed: {}", e);
                DiagnosticSummary::default()
            }
        };
        let status = status?;

        if status.success() {
            Ok(CompletedProcess {
                program: program.to_string(),
                exit_code: status.code(),
                progress_lines: summary.progress_lines,
                diagnostic_tail: summary.tail.into(),
            })
        } else {
            Err(MediaError::process_failed(
                program,
                status.code(),
                summary.tail.into(),
            ))
        }
    }

    async fn capture(&self, spec: &CommandSpec) -> MediaResult<CapturedOutput> {
        let program = spec.program();
        Self::locate(program)?;

        debug!("Capturing: {}", spec);

        let output_future = Command::new(program)
            .args(spec.arguments())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output();

        let output = match self.timeout_secs {
            Some(secs) => tokio::time::timeout(Duration::from_secs(secs), output_future)
                .await
                .map_err(|_| MediaError::Timeout(secs))?,
            None => output_future.await,
        }
        .map_err(|source| MediaError::Spawn {
            program: program.to_string(),
            source,
        })?;

        Ok(CapturedOutput {
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[derive(Debug, Default)]
struct DiagnosticSummary {
    progress_lines: usize,
    tail: VecDeque<String>,
}

impl DiagnosticSummary {
    fn observe(&mut self, raw: &[u8], spec: &CommandSpec, progress: &dyn ProgressSink) {
        let line = String::from_utf8_lossy(raw);
        let line = line.trim_end();
        if line.trim().is_empty() {
            return;
        }

        if spec.is_progress_line(line) {
            progress.update(line);
            self.progress_lines += 1;
        } else {
            trace!(program = %spec.program(), "{}", line);
        }

        if self.tail.len() == CONTEXT_LINES {
            self.tail.pop_front();
        }
        self.tail.push_back(line.to_string());
    }
}

/// Read a stream until EOF, splitting on `\n` and `\r` so that
/// carriage-return progress bars are seen as they redraw.
async fn read_diagnostic_lines(
    mut stream: DiagnosticReader,
    spec: &CommandSpec,
    progress: &dyn ProgressSink,
) -> DiagnosticSummary {
    let mut summary = DiagnosticSummary::default();
    let mut line = Vec::new();
    let mut chunk = [0u8; 4096];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                warn!(program = %spec.program(), "Diagnostic stream read failed: {}", e);
                break;
            }
        };

        for &byte in &chunk[..n] {
            if byte == b'\n' || byte == b'\r' {
                summary.observe(&line, spec, progress);
                line.clear();
            } else {
                line.push(byte);
            }
        }
    }

    if !line.is_empty() {
        summary.observe(&line, spec, progress);
    }

    summary
}

/// Builder for FFmpeg invocations.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    /// Input file path
    input: PathBuf,
    /// Output file path, `None` for the null muxer
    output: Option<PathBuf>,
    /// Input arguments (before -i)
    input_args: Vec<String>,
    /// Output arguments (after -i)
    output_args: Vec<String>,
    /// Whether to overwrite output
    overwrite: bool,
    /// Log level, `None` keeps FFmpeg's default banner output
    log_level: Option<String>,
}

impl FfmpegCommand {
    /// Create a command writing `output`.
    pub fn new(input: impl AsRef<Path>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: Some(output.as_ref().to_path_buf()),
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: true,
            log_level: Some("error".to_string()),
        }
    }

    /// Decode `input` into the null muxer; FFmpeg prints the stream
    /// information (including `Duration:`) on stderr.
    pub fn probe(input: impl AsRef<Path>) -> Self {
        Self {
            input: input.as_ref().to_path_buf(),
            output: None,
            input_args: Vec::new(),
            output_args: Vec::new(),
            overwrite: false,
            log_level: None,
        }
    }

    /// Add input arguments (before -i).
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.input_args.push(arg.into());
        self
    }

    /// Add output arguments (after -i).
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Set seek position (before input).
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Set duration.
    pub fn duration(self, seconds: f64) -> Self {
        self.input_arg("-t").input_arg(format!("{:.3}", seconds))
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        if let Some(level) = &self.log_level {
            args.push("-v".to_string());
            args.push(level.clone());
        }

        args.extend(self.input_args.iter().cloned());

        args.push("-i".to_string());
        args.push(self.input.to_string_lossy().to_string());

        args.extend(self.output_args.iter().cloned());

        match &self.output {
            Some(output) => args.push(output.to_string_lossy().to_string()),
            None => {
                args.extend(["-f", "null", "-"].map(String::from));
            }
        }

        args
    }

    /// Turn into an invocation of `program` (normally `ffmpeg`).
    pub fn into_spec(self, program: &str) -> CommandSpec {
        CommandSpec::new(program).args(self.build_args())
    }
}
