//! Numeric ordering of numbered files (`en2.mp3` before `en10.mp3`).
//!
//! Every stage that needs "the clips in phrase order" goes through here.

use regex::{Regex, RegexBuilder};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::{IoContext, LessonError};

/// Files directly inside `dir` whose whole name matches `pattern`
/// (case-insensitive), ordered by their first embedded number.
pub fn list_ordered(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, LessonError> {
    require_dir(dir)?;
    let matcher = whole_name_matcher(pattern)?;

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        let path = entry.path();
        if path.is_file() && name_matches(&matcher, &path) {
            files.push(path);
        }
    }

    sort_numerically(&mut files);
    Ok(files)
}

/// Like [`list_ordered`], but descends into sub-folders. Ordering is applied
/// to the whole result by file name key.
pub fn list_ordered_recursive(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, LessonError> {
    require_dir(dir)?;
    let matcher = whole_name_matcher(pattern)?;

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|err| LessonError::Io {
            path: dir.to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && name_matches(&matcher, entry.path()) {
            files.push(entry.into_path());
        }
    }

    sort_numerically(&mut files);
    Ok(files)
}

/// First run of decimal digits in `name`, or 0 when there is none.
/// Runs too long for a `u64` saturate.
pub fn numeric_key(name: &str) -> u64 {
    let digits: String = name
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        0
    } else {
        digits.parse().unwrap_or(u64::MAX)
    }
}

/// Stable sort by [`numeric_key`] of the file name. Paths are first put in
/// name order so equal keys come out the same on every platform.
pub fn sort_numerically(paths: &mut [PathBuf]) {
    paths.sort();
    paths.sort_by_key(|path| numeric_key(&file_name(path)));
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn name_matches(matcher: &Regex, path: &Path) -> bool {
    matcher.is_match(&file_name(path))
}

fn whole_name_matcher(pattern: &str) -> Result<Regex, LessonError> {
    RegexBuilder::new(&format!("^(?:{pattern})$"))
        .case_insensitive(true)
        .build()
        .map_err(|err| LessonError::process("regex", format!("invalid file pattern {pattern:?}: {err}")))
}

fn require_dir(dir: &Path) -> Result<(), LessonError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(LessonError::missing("directory", dir))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, names: &[&str]) {
        for name in names {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, b"clip").unwrap();
        }
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths.iter().map(|p| file_name(p)).collect()
    }

    #[test]
    fn orders_numerically_not_lexically() {
        let temp = tempdir().unwrap();
        touch(temp.path(), &["en2.mp3", "en10.mp3", "en1.mp3"]);

        let files = list_ordered(temp.path(), r"en\d+\.mp3").unwrap();

        assert_eq!(names(&files), ["en1.mp3", "en2.mp3", "en10.mp3"]);
    }

    #[test]
    fn matching_is_whole_name_and_case_insensitive() {
        let temp = tempdir().unwrap();
        touch(
            temp.path(),
            &["EN3.MP3", "en1.mp3", "en1fr1.mp3", "old_en2.mp3", "en2.mp3.bak"],
        );

        let files = list_ordered(temp.path(), r"en\d+\.mp3").unwrap();

        assert_eq!(names(&files), ["en1.mp3", "EN3.MP3"]);
    }

    #[test]
    fn listing_is_not_recursive() {
        let temp = tempdir().unwrap();
        touch(temp.path(), &["en1.mp3", "SubFrases_Frase1/en4.mp3"]);

        let files = list_ordered(temp.path(), r"en\d+\.mp3").unwrap();

        assert_eq!(names(&files), ["en1.mp3"]);
    }

    #[test]
    fn recursive_variant_descends() {
        let temp = tempdir().unwrap();
        touch(
            temp.path(),
            &["en3.mp3", "SubFrases_Frase1/en1fr2.mp3", "deeper/x/en2.mp3"],
        );

        let files = list_ordered_recursive(temp.path(), r".*\.mp3").unwrap();

        assert_eq!(names(&files), ["en1fr2.mp3", "en2.mp3", "en3.mp3"]);
    }

    #[test]
    fn missing_directory_is_reported() {
        let temp = tempdir().unwrap();
        let err = list_ordered(&temp.path().join("nope"), r".*").unwrap_err();
        assert!(matches!(err, LessonError::MissingResource { .. }));
    }

    #[test]
    fn numeric_key_uses_first_digit_run() {
        assert_eq!(numeric_key("en12fr3.mp3"), 12);
        assert_eq!(numeric_key("silence.mp3"), 0);
        assert_eq!(numeric_key("99999999999999999999999.png"), u64::MAX);
    }

    #[test]
    fn equal_keys_keep_name_order() {
        let mut paths = vec![
            PathBuf::from("b7.mp3"),
            PathBuf::from("a7.mp3"),
            PathBuf::from("c.mp3"),
        ];
        sort_numerically(&mut paths);
        assert_eq!(names(&paths), ["c.mp3", "a7.mp3", "b7.mp3"]);
    }
}
