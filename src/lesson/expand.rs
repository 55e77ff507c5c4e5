//! Expansion of the phrase list into numbered output slots.
//!
//! Main lesson, per phrase: a short pause on the bare background, English,
//! English, translation (English when the Spanish clip is missing),
//! highlight + repeat for every fragment, then English final twice. That is
//! `6 + 2 * fragments` slots per phrase, numbered densely from 1. The pause
//! slot shares its number with the phrase's bare-background image.

use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use super::config::Timing;
use super::error::{IoContext, LessonError};
use super::indices::IndicesData;
use super::library::{AudioLibrary, Language, phrase_file_name, phrase_pattern};
use super::media::{FfmpegRunOptions, MediaToolkit, args};
use super::ordering::list_ordered;
use super::template::Phrase;
use super::timeline::{SlotLists, reconcile};
use super::workspace::{Workspace, prepare_clean_dir};
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "fragment", rename_all = "snake_case")]
pub enum SlotKind {
    Pause,
    EnglishFirst,
    EnglishSecond,
    Translation,
    Highlight(u32),
    Repeat(u32),
    Final,
    FinalRepeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotAudio {
    Clip(PathBuf),
    /// Placeholder silence; the encoder produces it once per run.
    Silence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSlot {
    /// Dense, 1-based position in the output
    pub index: usize,
    pub phrase: u32,
    pub kind: SlotKind,
    pub audio: SlotAudio,
}

/// Accumulates slots and hands out their output numbers.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SlotSequence {
    slots: Vec<LessonSlot>,
}

impl SlotSequence {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, phrase: u32, kind: SlotKind, audio: SlotAudio) -> usize {
        let index = self.slots.len() + 1;
        self.slots.push(LessonSlot {
            index,
            phrase,
            kind,
            audio,
        });
        index
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[LessonSlot] {
        &self.slots
    }

    pub fn has_silence(&self) -> bool {
        self.slots.iter().any(|slot| slot.audio == SlotAudio::Silence)
    }
}

/// Slots a phrase with `fragments` fragments contributes.
pub const fn slots_per_phrase(fragments: u32) -> usize {
    6 + 2 * fragments as usize
}

pub fn expand_main_lesson(
    phrases: &[Phrase],
    library: &AudioLibrary<'_>,
) -> Result<SlotSequence, LessonError> {
    let mut sequence = SlotSequence::with_capacity(
        phrases
            .iter()
            .map(|phrase| slots_per_phrase(phrase.fragment_count()))
            .sum(),
    );

    for phrase in phrases {
        let n = phrase.index;
        emit(
            Level::Debug,
            "lesson.expand.phrase",
            &format!("Phrase {n}: {} / {}", phrase.english, phrase.spanish),
            Some(json!({
                "phrase": n,
                "fragments": phrase
                    .fragments
                    .iter()
                    .map(|f| [f.highlight.as_str(), f.translation.as_str()])
                    .collect::<Vec<_>>(),
            })),
        );
        let english = library.english(n)?;
        let translation = match library.spanish(n) {
            Some(spanish) => spanish,
            None => {
                emit(
                    Level::Info,
                    "lesson.expand.translation_fallback",
                    &format!(
                        "{} is missing; phrase {n} repeats the English clip instead",
                        phrase_file_name(Language::Spanish, n)
                    ),
                    Some(json!({ "phrase": n })),
                );
                english.clone()
            }
        };

        sequence.push(n, SlotKind::Pause, SlotAudio::Silence);
        sequence.push(n, SlotKind::EnglishFirst, SlotAudio::Clip(english.clone()));
        sequence.push(n, SlotKind::EnglishSecond, SlotAudio::Clip(english.clone()));
        sequence.push(n, SlotKind::Translation, SlotAudio::Clip(translation));
        for k in 1..=phrase.fragment_count() {
            let fragment = library.fragment(n, k)?;
            sequence.push(n, SlotKind::Highlight(k), SlotAudio::Clip(fragment.clone()));
            sequence.push(n, SlotKind::Repeat(k), SlotAudio::Clip(fragment));
        }
        sequence.push(n, SlotKind::Final, SlotAudio::Clip(english.clone()));
        sequence.push(n, SlotKind::FinalRepeat, SlotAudio::Clip(english));
    }

    Ok(sequence)
}

/// Copy every slot to `en{index}.mp3` in the main-lesson folder, which is
/// emptied first. Returns the number of files written.
pub fn write_main_lesson(
    toolkit: &dyn MediaToolkit,
    workspace: &Workspace,
    sequence: &SlotSequence,
    timing: &Timing,
) -> Result<usize, LessonError> {
    let out_dir = workspace.main_lesson_dir();
    prepare_clean_dir(&out_dir)?;

    let scratch = tempfile::Builder::new()
        .prefix("lessonreel-pause-")
        .tempdir()
        .map_err(|source| LessonError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
    let silence = scratch.path().join("pause.mp3");
    if sequence.has_silence() {
        toolkit.run_ffmpeg(
            &args::silence_args(timing.placeholder_silence, timing.sample_rate, &silence),
            FfmpegRunOptions::quiet(),
        )?;
    }

    for slot in sequence.slots() {
        let source: &Path = match &slot.audio {
            SlotAudio::Clip(path) => path,
            SlotAudio::Silence => &silence,
        };
        let target = out_dir.join(phrase_file_name(Language::English, slot.index as u32));
        fs::copy(source, &target).at(&target)?;
        emit(
            Level::Debug,
            "lesson.main_lesson.slot",
            &format!("{} <- {}", target.display(), source.display()),
            Some(json!({ "index": slot.index, "phrase": slot.phrase, "slot": slot.kind })),
        );
    }

    emit(
        Level::Success,
        "lesson.main_lesson.written",
        &format!(
            "Wrote {} main-lesson clip(s) to {}",
            sequence.len(),
            out_dir.display()
        ),
        Some(json!({ "slots": sequence.len() })),
    );
    Ok(sequence.len())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueVariant {
    /// Images from the english-only index list
    English,
    /// Images from the english+spanish index list
    Spanish,
    /// The two character backgrounds, alternating once per phrase
    Background,
}

/// Pair the selected images positionally with the ordered English phrase
/// clips. Extra entries on either side are dropped with a warning.
pub fn expand_dialogue(
    workspace: &Workspace,
    indices: &IndicesData,
    variant: DialogueVariant,
) -> Result<SlotLists, LessonError> {
    let images: Vec<PathBuf> = match variant {
        DialogueVariant::English => indices.english_only.iter().map(|&n| workspace.image(n)).collect(),
        DialogueVariant::Spanish => indices
            .english_spanish
            .iter()
            .map(|&n| workspace.image(n))
            .collect(),
        DialogueVariant::Background => {
            let backgrounds = workspace.backgrounds();
            (0..indices.total_phrases as usize)
                .map(|i| backgrounds[i % 2].clone())
                .collect()
        }
    };
    let audio = list_ordered(&workspace.english_dir(), &phrase_pattern(Language::English))?;

    let lists = reconcile(audio, images);
    emit(
        Level::Debug,
        "lesson.expand.dialogue",
        &format!("{variant:?} dialogue: {} slide(s)", lists.audio.len()),
        None,
    );
    Ok(lists)
}
