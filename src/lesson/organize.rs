//! Renaming/classification of the raw capture pool.
//!
//! Raw captures carry only a `<tool>_YYYY-MM-DDTHH_MM_SS` token. They are put
//! in capture order and handed phrase numbers positionally: the k-th file of an
//! odd folder becomes phrase `2k-1`, of an even folder phrase `2k`. Nothing in
//! a raw file name is used for numbering.

use chrono::NaiveDateTime;
use regex::{Regex, RegexBuilder};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

use super::error::{IoContext, LessonError};
use super::fragments::FragmentCounts;
use super::library::{Language, fragment_file_name, fragment_folder_name, is_mp3, phrase_file_name};
use super::workspace::{RAW_FOLDERS, RawKind, Workspace, prepare_clean_dir};
use crate::ui::prelude::*;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H_%M_%S";

/// One raw folder to place into the canonical pool.
#[derive(Debug, Clone)]
pub struct OrganizeJob<'a> {
    pub source: &'a Path,
    pub dest: &'a Path,
    pub language: Language,
    pub odd_numbered: bool,
    /// Empty: phrase-level clips. Otherwise fragment clips, one entry per phrase.
    pub fragment_counts: &'a [u32],
    pub capture_tool: &'a str,
}

impl OrganizeJob<'_> {
    fn fragment_mode(&self) -> bool {
        !self.fragment_counts.is_empty()
    }

    /// Phrase number of the `position`-th (0-based) phrase of this parity.
    fn phrase_number(&self, position: usize) -> u32 {
        let k = position as u32 + 1;
        if self.odd_numbered { 2 * k - 1 } else { 2 * k }
    }
}

struct Classifier {
    timestamp: Regex,
    canonical: Regex,
}

impl Classifier {
    fn new(job: &OrganizeJob<'_>) -> Result<Self, LessonError> {
        let timestamp = format!(
            r"{}_(\d{{4}}-\d{{2}}-\d{{2}}T\d{{2}}_\d{{2}}_\d{{2}})",
            regex::escape(job.capture_tool)
        );
        let canonical = if job.fragment_mode() {
            format!(r"^{}(\d+)fr\d+\.mp3$", job.language.prefix())
        } else {
            format!(r"^{}(\d+)\.mp3$", job.language.prefix())
        };

        Ok(Self {
            timestamp: build_regex(&timestamp)?,
            canonical: build_regex(&canonical)?,
        })
    }

    fn timestamp_token<'n>(&self, name: &'n str) -> Option<&'n str> {
        self.timestamp
            .captures(name)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Phrase number of an already-canonical name. Names that also carry a
    /// capture timestamp are raw, whatever else they look like.
    fn canonical_phrase(&self, name: &str) -> Option<u32> {
        if self.timestamp_token(name).is_some() {
            return None;
        }
        self.canonical
            .captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }

    /// Sort key of a raw file: its timestamp token, compared as text. The
    /// fixed-width format makes text order match capture order.
    fn capture_key(&self, name: &str) -> Option<String> {
        let token = self.timestamp_token(name)?;
        if let Err(err) = NaiveDateTime::parse_from_str(token, TIMESTAMP_FORMAT) {
            emit(
                Level::Warn,
                "lesson.organize.bad_timestamp",
                &format!("Capture time {token:?} in {name} is not a valid date ({err}); ordering it as text"),
                None,
            );
        }
        Some(token.to_string())
    }
}

fn build_regex(pattern: &str) -> Result<Regex, LessonError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .map_err(|err| LessonError::process("regex", err.to_string()))
}

/// Place one raw folder. Returns the number of files written (canonical
/// pass-through copies included).
///
/// When the raw files run out before the fragment counts are satisfied, the
/// files already written stay and [`LessonError::PoolExhausted`] reports how
/// far it got.
pub fn organize(job: &OrganizeJob<'_>) -> Result<usize, LessonError> {
    if !job.source.is_dir() {
        return Err(LessonError::missing("raw audio folder", job.source));
    }
    let classifier = Classifier::new(job)?;
    fs::create_dir_all(job.dest).at(job.dest)?;

    // Fragment folders are reset before anything is copied into them.
    if job.fragment_mode() {
        for position in 0..job.fragment_counts.len() {
            prepare_clean_dir(&job.dest.join(fragment_folder_name(job.phrase_number(position))))?;
        }
    }

    let mut mp3s = Vec::new();
    for entry in fs::read_dir(job.source).at(job.source)? {
        let path = entry.at(job.source)?.path();
        if path.is_file() && is_mp3(&path) {
            mp3s.push(path);
        }
    }
    mp3s.sort();

    let mut placed = 0usize;
    let mut raw: Vec<(Option<String>, PathBuf)> = Vec::new();

    for path in mp3s {
        let name = file_name(&path);
        match classifier.canonical_phrase(&name) {
            Some(phrase) => {
                let target_dir = if job.fragment_mode() {
                    job.dest.join(fragment_folder_name(phrase))
                } else {
                    job.dest.to_path_buf()
                };
                fs::create_dir_all(&target_dir).at(&target_dir)?;
                copy_into(&path, &target_dir.join(&name))?;
                emit(
                    Level::Info,
                    "lesson.organize.passthrough",
                    &format!("Already named, copied as-is: {name}"),
                    None,
                );
                placed += 1;
            }
            None => raw.push((classifier.capture_key(&name), path)),
        }
    }

    // Stable: files without a timestamp keep name order at the front.
    raw.sort_by(|(a, _), (b, _)| a.cmp(b));
    let mut raw = raw.into_iter().map(|(_, path)| path);

    if !job.fragment_mode() {
        for (position, source) in raw.enumerate() {
            let target = job
                .dest
                .join(phrase_file_name(job.language, job.phrase_number(position)));
            copy_into(&source, &target)?;
            log_renamed(&source, &target);
            placed += 1;
        }
        return Ok(placed);
    }

    let required = placed + job.fragment_counts.iter().map(|&c| c as usize).sum::<usize>();
    for (position, &count) in job.fragment_counts.iter().enumerate() {
        let phrase = job.phrase_number(position);
        let target_dir = job.dest.join(fragment_folder_name(phrase));
        for fragment in 1..=count {
            let Some(source) = raw.next() else {
                return Err(LessonError::PoolExhausted {
                    folder: job.source.to_path_buf(),
                    placed,
                    required,
                });
            };
            let target = target_dir.join(fragment_file_name(job.language, phrase, fragment));
            copy_into(&source, &target)?;
            log_renamed(&source, &target);
            placed += 1;
        }
    }

    let leftover = raw.count();
    if leftover > 0 {
        emit(
            Level::Warn,
            "lesson.organize.leftover",
            &format!(
                "{leftover} raw file(s) in {} not covered by the fragment counts were left unused",
                job.source.display()
            ),
            Some(json!({ "folder": job.source.display().to_string(), "leftover": leftover })),
        );
    }

    Ok(placed)
}

/// Organize the six raw folders in their fixed order. Phrase folders are
/// emptied first. Missing folders and exhausted pools are reported and
/// skipped; returns the number of files placed.
pub fn organize_all(
    workspace: &Workspace,
    counts: &FragmentCounts,
    capture_tool: &str,
) -> Result<usize, LessonError> {
    prepare_clean_dir(&workspace.english_dir())?;
    prepare_clean_dir(&workspace.spanish_dir())?;

    let mut total = 0usize;
    for folder in RAW_FOLDERS {
        let source = workspace.raw_dir(&folder);
        let dest = workspace.organize_target(&folder);
        let fragment_counts: &[u32] = match folder.kind {
            RawKind::Phrase(_) => &[],
            RawKind::Fragments => counts.for_parity(folder.odd_numbered),
        };

        if matches!(folder.kind, RawKind::Fragments) && fragment_counts.is_empty() {
            emit(
                Level::Info,
                "lesson.organize.no_fragments",
                &format!("No fragment counts for {}; skipping", folder.folder_name()),
                None,
            );
            continue;
        }

        let job = OrganizeJob {
            source: &source,
            dest: &dest,
            language: folder.language(),
            odd_numbered: folder.odd_numbered,
            fragment_counts,
            capture_tool,
        };

        match organize(&job) {
            Ok(placed) => {
                total += placed;
                emit(
                    Level::Success,
                    "lesson.organize.folder",
                    &format!("{}: placed {placed} file(s)", folder.folder_name()),
                    Some(json!({ "folder": folder.folder_name(), "placed": placed })),
                );
            }
            Err(err @ LessonError::PoolExhausted { placed, .. }) => {
                total += placed;
                emit(Level::Warn, "lesson.organize.exhausted", &err.to_string(), None);
            }
            Err(err @ LessonError::MissingResource { .. }) => {
                emit(Level::Warn, "lesson.organize.missing", &err.to_string(), None);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(total)
}

fn copy_into(source: &Path, target: &Path) -> Result<(), LessonError> {
    fs::copy(source, target).at(target).map(|_| ())
}

fn log_renamed(source: &Path, target: &Path) {
    emit(
        Level::Debug,
        "lesson.organize.renamed",
        &format!("{} -> {}", source.display(), target.display()),
        None,
    );
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::config::ProjectLayout;
    use tempfile::tempdir;

    fn raw(dir: &Path, name: &str, contents: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), contents).unwrap();
    }

    fn job<'a>(
        source: &'a Path,
        dest: &'a Path,
        language: Language,
        odd_numbered: bool,
        fragment_counts: &'a [u32],
    ) -> OrganizeJob<'a> {
        OrganizeJob {
            source,
            dest,
            language,
            odd_numbered,
            fragment_counts,
            capture_tool: "ElevenLabs",
        }
    }

    fn read(path: PathBuf) -> String {
        fs::read_to_string(path).unwrap()
    }

    #[test]
    fn odd_phrases_are_numbered_in_capture_order() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("1_en");
        let dest = temp.path().join("Frases_English");
        raw(&source, "a_ElevenLabs_2024-05-01T10_00_02.mp3", "third");
        raw(&source, "b_ElevenLabs_2024-05-01T10_00_00.mp3", "first");
        raw(&source, "c_ElevenLabs_2024-05-01T09_59_59.MP3", "zeroth");
        raw(&source, "notes.txt", "ignored");

        let placed = organize(&job(&source, &dest, Language::English, true, &[])).unwrap();

        assert_eq!(placed, 3);
        assert_eq!(read(dest.join("en1.mp3")), "zeroth");
        assert_eq!(read(dest.join("en3.mp3")), "first");
        assert_eq!(read(dest.join("en5.mp3")), "third");
        assert!(!dest.join("notes.txt").exists());
    }

    #[test]
    fn impossible_capture_time_still_sorts_by_its_text() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("1_en");
        let dest = temp.path().join("Frases_English");
        raw(&source, "ElevenLabs_2024-05-01T25_00_00.mp3", "late");
        raw(&source, "ElevenLabs_2024-05-01T10_00_00.mp3", "early");
        raw(&source, "untimed.mp3", "untimed");

        organize(&job(&source, &dest, Language::English, true, &[])).unwrap();

        assert_eq!(read(dest.join("en1.mp3")), "untimed");
        assert_eq!(read(dest.join("en3.mp3")), "early");
        assert_eq!(read(dest.join("en5.mp3")), "late");
    }

    #[test]
    fn even_fragments_fill_phrases_in_order() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("2_subs");
        let dest = temp.path().join("Audios");
        raw(&source, "ElevenLabs_2024-05-01T10_00_03_x.mp3", "c");
        raw(&source, "ElevenLabs_2024-05-01T10_00_01_y.mp3", "a");
        raw(&source, "ElevenLabs_2024-05-01T10_00_02_z.mp3", "b");

        let placed = organize(&job(&source, &dest, Language::English, false, &[2, 1])).unwrap();

        assert_eq!(placed, 3);
        assert_eq!(read(dest.join("SubFrases_Frase2/en2fr1.mp3")), "a");
        assert_eq!(read(dest.join("SubFrases_Frase2/en2fr2.mp3")), "b");
        assert_eq!(read(dest.join("SubFrases_Frase4/en4fr1.mp3")), "c");
    }

    #[test]
    fn exhausted_pool_keeps_partial_output() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("1_subs");
        let dest = temp.path().join("Audios");
        for second in 0..3 {
            raw(&source, &format!("ElevenLabs_2024-05-01T10_00_0{second}.mp3"), "clip");
        }

        let err = organize(&job(&source, &dest, Language::English, true, &[2, 2])).unwrap_err();

        match err {
            LessonError::PoolExhausted {
                placed, required, ..
            } => {
                assert_eq!(placed, 3);
                assert_eq!(required, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(dest.join("SubFrases_Frase3/en3fr1.mp3").exists());
        assert!(!dest.join("SubFrases_Frase3/en3fr2.mp3").exists());
    }

    #[test]
    fn canonical_files_pass_through_unchanged() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("1_es");
        let dest = temp.path().join("Frases_Spanish");
        raw(&source, "es7.mp3", "canonical");
        raw(&source, "ElevenLabs_2024-05-01T10_00_00.mp3", "raw");

        let placed = organize(&job(&source, &dest, Language::Spanish, true, &[])).unwrap();

        assert_eq!(placed, 2);
        assert_eq!(read(dest.join("es7.mp3")), "canonical");
        assert_eq!(read(dest.join("es1.mp3")), "raw");
    }

    #[test]
    fn canonical_fragments_survive_folder_reset() {
        let temp = tempdir().unwrap();
        let source = temp.path().join("1_subs");
        let dest = temp.path().join("Audios");
        raw(&dest.join("SubFrases_Frase1"), "stale.mp3", "old");
        raw(&source, "en3fr2.mp3", "kept");
        raw(&source, "ElevenLabs_2024-05-01T10_00_00.mp3", "first");
        raw(&source, "ElevenLabs_2024-05-01T10_00_01.mp3", "second");

        let placed = organize(&job(&source, &dest, Language::English, true, &[1, 1])).unwrap();

        assert_eq!(placed, 3);
        assert!(!dest.join("SubFrases_Frase1/stale.mp3").exists());
        assert_eq!(read(dest.join("SubFrases_Frase1/en1fr1.mp3")), "first");
        assert_eq!(read(dest.join("SubFrases_Frase3/en3fr1.mp3")), "second");
        assert_eq!(read(dest.join("SubFrases_Frase3/en3fr2.mp3")), "kept");
    }

    #[test]
    fn extra_source_files_shift_numbering_silently() {
        // Numbering is positional: a stray capture moves every later phrase.
        let temp = tempdir().unwrap();
        let source = temp.path().join("2_en");
        let dest = temp.path().join("Frases_English");
        raw(&source, "ElevenLabs_2024-05-01T10_00_00.mp3", "retake");
        raw(&source, "ElevenLabs_2024-05-01T10_00_01.mp3", "phrase two");

        organize(&job(&source, &dest, Language::English, false, &[])).unwrap();

        assert_eq!(read(dest.join("en2.mp3")), "retake");
        assert_eq!(read(dest.join("en4.mp3")), "phrase two");
    }

    #[test]
    fn organize_all_walks_every_raw_folder() {
        let temp = tempdir().unwrap();
        let workspace = Workspace::new(temp.path(), ProjectLayout::default());
        let pool = workspace.raw_pool_dir();
        raw(&pool.join("1_en"), "ElevenLabs_2024-05-01T10_00_00.mp3", "en1");
        raw(&pool.join("2_en"), "ElevenLabs_2024-05-01T10_00_00.mp3", "en2");
        raw(&pool.join("1_es"), "ElevenLabs_2024-05-01T10_00_00.mp3", "es1");
        raw(&pool.join("1_subs"), "ElevenLabs_2024-05-01T10_00_00.mp3", "f1");
        raw(&workspace.english_dir(), "en99.mp3", "stale");
        let counts = FragmentCounts {
            odd: vec![2],
            even: vec![],
        };

        let total = organize_all(&workspace, &counts, "ElevenLabs").unwrap();

        // 1_subs is one clip short of its count; the clip it had still counts.
        assert_eq!(total, 4);
        assert_eq!(read(workspace.english_dir().join("en1.mp3")), "en1");
        assert_eq!(read(workspace.english_dir().join("en2.mp3")), "en2");
        assert_eq!(read(workspace.spanish_dir().join("es1.mp3")), "es1");
        assert_eq!(read(workspace.fragment_dir(1).join("en1fr1.mp3")), "f1");
        assert!(!workspace.english_dir().join("en99.mp3").exists());
    }
}
