//! Encoder/prober boundary. Every stage reaches ffmpeg through
//! [`MediaToolkit`] so it can run against a fake in tests.

pub mod args;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use indicatif::ProgressBar;

use super::error::LessonError;
use crate::ui::prelude::*;
use crate::ui::{is_debug_enabled, progress::create_render_bar};

pub trait MediaToolkit {
    fn run_ffmpeg(&self, args: &[String], options: FfmpegRunOptions) -> Result<(), LessonError>;
    fn probe_duration(&self, path: &Path) -> Result<f64, LessonError>;
}

#[derive(Debug, Clone, Default)]
pub struct FfmpegRunOptions {
    /// Expected output length; enables the progress bar.
    pub total_duration: Option<f64>,
    pub message: Option<String>,
}

impl FfmpegRunOptions {
    pub fn quiet() -> Self {
        Self::default()
    }

    pub fn with_progress(total_duration: f64, message: impl Into<String>) -> Self {
        Self {
            total_duration: Some(total_duration),
            message: Some(message.into()),
        }
    }
}

/// ffmpeg/ffprobe found on `PATH`.
#[derive(Debug, Clone)]
pub struct SystemMedia {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl SystemMedia {
    pub fn locate() -> Result<Self, LessonError> {
        Ok(Self {
            ffmpeg: locate_tool("ffmpeg")?,
            ffprobe: locate_tool("ffprobe")?,
        })
    }
}

pub fn locate_tool(name: &str) -> Result<PathBuf, LessonError> {
    which::which(name).map_err(|err| LessonError::process(name, format!("not found on PATH ({err})")))
}

impl MediaToolkit for SystemMedia {
    fn run_ffmpeg(&self, args: &[String], options: FfmpegRunOptions) -> Result<(), LessonError> {
        emit(
            Level::Debug,
            "lesson.media.ffmpeg",
            &format!("ffmpeg {}", args.join(" ")),
            None,
        );

        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| LessonError::process("ffmpeg", format!("failed to spawn: {err}")))?;

        let pb = options.total_duration.map(|total| {
            create_render_bar(total, options.message.as_deref().unwrap_or("encoding"))
        });

        let mut report = StderrReport::default();
        let read_result = match child.stderr.take() {
            Some(stderr) => read_ffmpeg_stderr(stderr, pb.as_ref(), &mut report),
            None => Ok(()),
        };

        let status = child
            .wait()
            .map_err(|err| LessonError::process("ffmpeg", format!("failed to wait: {err}")))?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        read_result.map_err(|err| LessonError::process("ffmpeg", format!("reading stderr: {err}")))?;

        if !status.success() {
            let detail = if report.error_lines.is_empty() {
                report.last_line
            } else {
                report.error_lines.join("\n")
            };
            return Err(LessonError::process(
                "ffmpeg",
                format!("exited with status {:?}: {}", status.code(), detail.trim()),
            ));
        }
        Ok(())
    }

    fn probe_duration(&self, path: &Path) -> Result<f64, LessonError> {
        let output = Command::new(&self.ffprobe)
            .args(args::probe_args(path))
            .output()
            .map_err(|err| LessonError::process("ffprobe", format!("failed to run: {err}")))?;

        if !output.status.success() {
            return Err(LessonError::process(
                "ffprobe",
                format!(
                    "failed for {}: {}",
                    path.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            ));
        }

        args::parse_duration(&String::from_utf8_lossy(&output.stdout), path)
    }
}

#[derive(Debug, Default)]
struct StderrReport {
    last_line: String,
    error_lines: Vec<String>,
}

fn read_ffmpeg_stderr<R: Read>(
    mut stderr: R,
    pb: Option<&ProgressBar>,
    report: &mut StderrReport,
) -> std::io::Result<()> {
    let verbose = is_debug_enabled();
    let mut buffer = [0u8; 4096];
    let mut pending = String::new();

    loop {
        let read = stderr.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        pending.push_str(&String::from_utf8_lossy(&buffer[..read]));

        // ffmpeg rewrites its stats line with '\r'.
        while let Some(pos) = pending.find(['\r', '\n']) {
            let line: String = pending.drain(..=pos).collect();
            let line = line.trim_end_matches(['\r', '\n']);
            if line.is_empty() {
                continue;
            }
            if verbose {
                emit(Level::Debug, "lesson.media.stderr", line, None);
            }
            if line.to_ascii_lowercase().contains("error") {
                report.error_lines.push(line.to_string());
            }
            if let (Some(pb), Some(seconds)) = (pb, parse_progress_seconds(line)) {
                pb.set_position((seconds * 1000.0) as u64);
            }
            report.last_line = line.to_string();
        }
    }

    Ok(())
}

/// `time=HH:MM:SS.ms` from an ffmpeg stats line.
fn parse_progress_seconds(line: &str) -> Option<f64> {
    let start = line.find("time=")? + "time=".len();
    let value = line[start..].split_whitespace().next()?;

    let mut parts = value.split(':');
    let hours: f64 = parts.next()?.parse().ok()?;
    let minutes: f64 = parts.next()?.parse().ok()?;
    let seconds: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_is_read_from_stats_lines() {
        let line = "size=     256kB time=00:01:02.50 bitrate= 33.5kbits/s speed=41.2x";
        assert_eq!(parse_progress_seconds(line), Some(62.5));
        assert_eq!(parse_progress_seconds("Input #0, mp3, from 'en1.mp3':"), None);
    }

    #[test]
    fn stderr_report_keeps_error_lines() {
        let stderr = b"Input #0\r\nsize=1kB time=00:00:01.00 bitrate=1\rError opening output\n".as_slice();
        let mut report = StderrReport::default();

        read_ffmpeg_stderr(stderr, None, &mut report).unwrap();

        assert_eq!(report.error_lines, ["Error opening output"]);
        assert_eq!(report.last_line, "Error opening output");
    }
}
