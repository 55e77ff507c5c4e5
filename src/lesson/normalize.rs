use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::{Loudness, Timing};
use super::error::{IoContext, LessonError};
use super::library::is_mp3;
use super::media::{FfmpegRunOptions, MediaToolkit, args};
use super::ordering::list_ordered_recursive;
use super::workspace::Workspace;
use crate::ui::prelude::*;

const TEMP_SUFFIX: &str = ".temp.mp3";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub processed: usize,
    pub failed: usize,
    pub skipped_folders: usize,
}

/// Folders holding the canonical pool: English, Spanish and one fragment
/// folder per English phrase clip.
pub fn normalize_targets(workspace: &Workspace) -> Vec<PathBuf> {
    let english = workspace.english_dir();
    let phrase_count = fs::read_dir(&english)
        .map(|entries| {
            entries
                .filter_map(Result::ok)
                .filter(|entry| entry.path().is_file() && is_mp3(&entry.path()))
                .count()
        })
        .unwrap_or(0);

    let mut folders = vec![english, workspace.spanish_dir()];
    folders.extend((1..=phrase_count as u32).map(|n| workspace.fragment_dir(n)));
    folders
}

/// Loudness-normalize every clip of the pool in place. A file that fails is
/// counted and left untouched.
pub fn normalize_tree(
    toolkit: &dyn MediaToolkit,
    workspace: &Workspace,
    loudness: &Loudness,
    timing: &Timing,
) -> Result<NormalizeReport, LessonError> {
    let mut report = NormalizeReport::default();

    for folder in normalize_targets(workspace) {
        if !folder.is_dir() {
            emit(
                Level::Warn,
                "lesson.normalize.missing_folder",
                &format!("Folder {} does not exist; skipping", folder.display()),
                None,
            );
            report.skipped_folders += 1;
            continue;
        }

        let clips: Vec<PathBuf> = list_ordered_recursive(&folder, r".+\.mp3")?
            .into_iter()
            .filter(|clip| !clip.to_string_lossy().ends_with(TEMP_SUFFIX))
            .collect();

        let (mut ok, mut failed) = (0usize, 0usize);
        for clip in &clips {
            match normalize_file(toolkit, clip, loudness, timing.sample_rate) {
                Ok(()) => ok += 1,
                Err(err) => {
                    emit(
                        Level::Error,
                        "lesson.normalize.failed",
                        &format!("Could not normalize {}: {err}", clip.display()),
                        None,
                    );
                    failed += 1;
                }
            }
        }

        emit(
            Level::Info,
            "lesson.normalize.folder",
            &format!("{}: {ok} normalized, {failed} failed", folder.display()),
            Some(json!({ "folder": folder.display().to_string(), "processed": ok, "failed": failed })),
        );
        report.processed += ok;
        report.failed += failed;
    }

    Ok(report)
}

fn temp_path(clip: &Path) -> PathBuf {
    clip.with_extension("temp.mp3")
}

fn normalize_file(
    toolkit: &dyn MediaToolkit,
    clip: &Path,
    loudness: &Loudness,
    sample_rate: u32,
) -> Result<(), LessonError> {
    let temp = temp_path(clip);
    let result = toolkit
        .run_ffmpeg(
            &args::loudnorm_args(clip, loudness, sample_rate, &temp),
            FfmpegRunOptions::quiet(),
        )
        .and_then(|()| fs::rename(&temp, clip).at(clip));

    if result.is_err() && temp.exists() {
        if let Err(err) = fs::remove_file(&temp) {
            emit(
                Level::Warn,
                "lesson.normalize.cleanup",
                &format!("Could not remove {}: {err}", temp.display()),
                None,
            );
        }
    }
    result
}
