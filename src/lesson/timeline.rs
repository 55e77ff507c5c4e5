//! Duration-synchronized timeline.
//!
//! Each slot's clip gets a trailing silence appended, the resulting block is
//! probed, and the probed length becomes the display time of the slot's
//! image. Blocks are joined (after a short lead-in) into the master track.

use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use super::config::{Encoding, Timing};
use super::error::{IoContext, LessonError};
use super::media::{FfmpegRunOptions, MediaToolkit, args};
use crate::ui::prelude::*;

/// Audio and image slots, paired by position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlotLists {
    pub audio: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
}

/// Truncate the longer list to the shorter one. A mismatch is warned about,
/// never fatal.
pub fn reconcile(mut audio: Vec<PathBuf>, mut images: Vec<PathBuf>) -> SlotLists {
    if audio.len() != images.len() {
        let mismatch = LessonError::CountMismatch {
            audio: audio.len(),
            images: images.len(),
        };
        emit(
            Level::Warn,
            "lesson.timeline.count_mismatch",
            &mismatch.to_string(),
            Some(json!({ "audio": audio.len(), "images": images.len() })),
        );
        let shorter = audio.len().min(images.len());
        audio.truncate(shorter);
        images.truncate(shorter);
    }
    SlotLists { audio, images }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Slide {
    pub image: PathBuf,
    /// `None` only on the closing repeat of the last image
    pub duration: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct Timeline {
    pub master_audio: PathBuf,
    pub slides: Vec<Slide>,
}

impl Timeline {
    pub fn total_duration(&self) -> f64 {
        self.slides.iter().filter_map(|slide| slide.duration).sum()
    }
}

/// Per-run temporary directory. Removed on drop; a failed removal is only
/// logged.
pub struct Scratch {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Scratch {
    pub fn new() -> Result<Self, LessonError> {
        let dir = tempfile::Builder::new()
            .prefix("lessonreel-")
            .tempdir()
            .map_err(|source| LessonError::Io {
                path: std::env::temp_dir(),
                source,
            })?;
        let path = dir.path().to_path_buf();
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let Some(dir) = self.dir.take() else {
            return;
        };
        if let Err(err) = dir.close() {
            emit(
                Level::Warn,
                "lesson.timeline.cleanup",
                &format!("Could not remove temporary files in {}: {err}", self.path.display()),
                None,
            );
        }
    }
}

pub struct TimelineBuilder<'a> {
    toolkit: &'a dyn MediaToolkit,
    timing: &'a Timing,
    scratch: &'a Scratch,
}

impl<'a> TimelineBuilder<'a> {
    pub fn new(toolkit: &'a dyn MediaToolkit, timing: &'a Timing, scratch: &'a Scratch) -> Self {
        Self {
            toolkit,
            timing,
            scratch,
        }
    }

    /// Build the blocks, slide list and master track written to `master_audio`.
    pub fn build_timeline(
        &self,
        lists: SlotLists,
        trailing_silence: f64,
        master_audio: &Path,
    ) -> Result<Timeline, LessonError> {
        let SlotLists { audio, images } = reconcile(lists.audio, lists.images);
        if audio.is_empty() {
            return Err(LessonError::EmptyTimeline);
        }

        let mut slide_images = Vec::with_capacity(images.len());
        for image in &images {
            if !image.is_file() {
                return Err(LessonError::missing("slide image", image));
            }
            slide_images.push(std::path::absolute(image).at(image)?);
        }

        let silence = self.scratch.file("silence.mp3");
        self.make_silence(trailing_silence, &silence)?;

        let pb = crate::ui::progress::create_spinner(format!("Building {} audio block(s)", audio.len()));
        let mut blocks = Vec::with_capacity(audio.len());
        let mut slides = Vec::with_capacity(audio.len() + 1);
        for (i, (clip, image)) in audio.iter().zip(slide_images).enumerate() {
            pb.set_message(format!("Audio block {}/{}", i + 1, audio.len()));
            let block = self.scratch.file(&format!("block_{}.mp3", i + 1));
            self.toolkit.run_ffmpeg(
                &args::append_silence_args(clip, &silence, &block),
                FfmpegRunOptions::quiet(),
            )?;
            let duration = self.toolkit.probe_duration(&block)?;
            emit(
                Level::Debug,
                "lesson.timeline.block",
                &format!("{} -> {:.3}s", clip.display(), duration),
                None,
            );
            blocks.push(block);
            slides.push(Slide {
                image,
                duration: Some(duration),
            });
        }
        pb.finish_and_clear();

        if let Some(last) = slides.last() {
            slides.push(Slide {
                image: last.image.clone(),
                duration: None,
            });
        }

        let lead_in = self.scratch.file("lead_in.mp3");
        self.make_silence(self.timing.lead_in_silence, &lead_in)?;

        let manifest = self.scratch.file("audio_list.txt");
        let parts = std::iter::once(lead_in.as_path()).chain(blocks.iter().map(PathBuf::as_path));
        fs::write(&manifest, args::audio_manifest(parts)).at(&manifest)?;

        if let Some(parent) = master_audio.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        self.toolkit.run_ffmpeg(
            &args::concat_copy_args(&manifest, master_audio),
            FfmpegRunOptions::quiet(),
        )?;

        Ok(Timeline {
            master_audio: master_audio.to_path_buf(),
            slides,
        })
    }

    fn make_silence(&self, duration: f64, output: &Path) -> Result<(), LessonError> {
        self.toolkit.run_ffmpeg(
            &args::silence_args(duration, self.timing.sample_rate, output),
            FfmpegRunOptions::quiet(),
        )
    }

    /// Mux the slide list with the master track into `output`.
    pub fn assemble_video(
        &self,
        timeline: &Timeline,
        encoding: &Encoding,
        output: &Path,
    ) -> Result<(), LessonError> {
        let manifest = self.scratch.file("slides.txt");
        let slides = timeline
            .slides
            .iter()
            .map(|slide| (slide.image.as_path(), slide.duration));
        fs::write(&manifest, args::slide_manifest(slides)).at(&manifest)?;

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent).at(parent)?;
        }
        let label = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".to_string());
        self.toolkit.run_ffmpeg(
            &args::mux_args(&manifest, &timeline.master_audio, encoding, output),
            FfmpegRunOptions::with_progress(timeline.total_duration(), label),
        )
    }
}
