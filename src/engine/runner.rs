//! External encoder invocation with streamed diagnostics.
//!
//! The encode call pipes stderr only; stdout stays untouched so a large
//! encoder write can never fill an unread pipe while we block on exit. The
//! stderr stream is drained to EOF before waiting, which keeps that guarantee
//! for the one pipe we do hold.
//!
//! There is deliberately no timeout or kill path for a hung encoder process;
//! a stuck external process blocks its slot.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};

use thiserror::Error;

use crate::events::{Event, Level, Reporter};

#[derive(Debug, Error)]
pub enum RunnerError {
    /// The binary itself could not be launched - fatal to the whole batch,
    /// unlike a non-zero exit.
    #[error("encoder not found, check installation ({program})")]
    EncoderNotFound { program: String },

    #[error("failed to run {program}: {source}")]
    Io {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Outcome of one encoder invocation.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub success: bool,
    /// Last five non-empty stderr lines - the actionable context on failure.
    pub diagnostic_tail: Vec<String>,
}

/// Seam between the orchestrator and the real encoder process.
pub trait EncodeBackend {
    /// Launch the encoder with `args`, streaming progress for `item_name`.
    fn run_encode(
        &self,
        args: &[String],
        item_name: &str,
        reporter: &Reporter,
    ) -> Result<RunReport, RunnerError>;
}

/// Splits a byte stream into logical lines on CR *or* LF.
///
/// ffmpeg rewrites its progress line in place with carriage returns, so a
/// plain `lines()` iterator would sit on one giant "line" until the process
/// exits.
pub struct SplitLines<R: Read> {
    reader: BufReader<R>,
}

impl<R: Read> SplitLines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
        }
    }

    /// Next completed line, trimmed; `None` at end of stream.
    ///
    /// Empty segments (e.g. the LF following a CR) are skipped.
    pub fn next_line(&mut self) -> std::io::Result<Option<String>> {
        let mut line = Vec::new();

        loop {
            let buf = self.reader.fill_buf()?;
            if buf.is_empty() {
                // EOF: flush whatever is pending
                if line.is_empty() {
                    return Ok(None);
                }
                break;
            }

            match buf.iter().position(|&b| b == b'\r' || b == b'\n') {
                Some(pos) => {
                    line.extend_from_slice(&buf[..pos]);
                    self.reader.consume(pos + 1);
                    let text = String::from_utf8_lossy(&line).trim().to_string();
                    if text.is_empty() {
                        line.clear();
                        continue;
                    }
                    return Ok(Some(text));
                }
                None => {
                    let len = buf.len();
                    line.extend_from_slice(buf);
                    self.reader.consume(len);
                }
            }
        }

        let text = String::from_utf8_lossy(&line).trim().to_string();
        Ok(if text.is_empty() { None } else { Some(text) })
    }
}

/// Extract the `time=` token from an ffmpeg progress line.
///
/// Progress lines start with a frame counter; the time value runs to the next
/// whitespace, or to an abutting `bitrate` token when ffmpeg omits the space.
pub fn parse_progress_time(line: &str) -> Option<&str> {
    if !line.starts_with("frame=") || !line.contains("time=") {
        return None;
    }

    let start = line.find("time=")? + "time=".len();
    let rest = &line[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let mut token = &rest[..end];

    if let Some(pos) = token.find("bitrate") {
        token = token[..pos].trim_end();
    }

    if token.is_empty() { None } else { Some(token) }
}

/// Truncate `00:01:23.45` to `00:01:23` for the log throttle.
fn truncate_to_seconds(time: &str) -> &str {
    time.split('.').next().unwrap_or(time)
}

/// Tracks per-invocation progress state: throttled logging and the rolling
/// diagnostic tail.
struct StderrScanner<'a> {
    reporter: &'a Reporter,
    item_name: String,
    last_logged: String,
    tail: Vec<String>,
}

impl<'a> StderrScanner<'a> {
    fn new(item_name: &str, reporter: &'a Reporter) -> Self {
        Self {
            reporter,
            item_name: item_name.to_string(),
            last_logged: String::new(),
            tail: Vec::new(),
        }
    }

    fn observe(&mut self, line: &str) {
        self.tail.push(line.to_string());
        if self.tail.len() > 5 {
            self.tail.remove(0);
        }

        if let Some(time) = parse_progress_time(line) {
            self.reporter.send(Event::Progress {
                name: self.item_name.clone(),
                time: time.to_string(),
            });

            // One log line per second of encoded output, not per frame
            let seconds = truncate_to_seconds(time);
            if seconds != self.last_logged {
                self.last_logged = seconds.to_string();
                self.reporter.emit(Level::Info, format!("  Progress: {}", line));
            }
        } else if line.to_lowercase().contains("error") {
            self.reporter.emit(Level::Info, format!("  {}", line));
        }
    }

    fn into_tail(self) -> Vec<String> {
        self.tail
    }
}

/// Runs the real ffmpeg binary.
#[derive(Debug, Clone)]
pub struct FfmpegRunner {
    program: String,
}

impl FfmpegRunner {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for FfmpegRunner {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl EncodeBackend for FfmpegRunner {
    fn run_encode(
        &self,
        args: &[String],
        item_name: &str,
        reporter: &Reporter,
    ) -> Result<RunReport, RunnerError> {
        tracing::debug!(program = %self.program, ?args, "spawning encoder");

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => RunnerError::EncoderNotFound {
                    program: self.program.clone(),
                },
                _ => RunnerError::Io {
                    program: self.program.clone(),
                    source: e,
                },
            })?;

        let stderr = child.stderr.take().expect("stderr was piped");
        let mut scanner = StderrScanner::new(item_name, reporter);
        let mut lines = SplitLines::new(stderr);

        while let Some(line) = lines.next_line().map_err(|e| RunnerError::Io {
            program: self.program.clone(),
            source: e,
        })? {
            scanner.observe(&line);
        }

        let status = child.wait().map_err(|e| RunnerError::Io {
            program: self.program.clone(),
            source: e,
        })?;

        Ok(RunReport {
            success: status.success(),
            diagnostic_tail: scanner.into_tail(),
        })
    }
}
