//! Per-phrase fragment counts, split by phrase parity.
//!
//! `cantidadFragmentos.txt` holds two comma lists: fragment counts of the
//! odd phrases (1, 3, 5, ...) on line 1, of the even phrases on line 2.

use serde_json::json;
use std::fs;
use std::path::Path;

use super::error::{IoContext, LessonError};
use super::indices::join_numbers;
use super::template::Phrase;
use crate::ui::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FragmentCounts {
    pub odd: Vec<u32>,
    pub even: Vec<u32>,
}

impl FragmentCounts {
    pub fn from_phrases(phrases: &[Phrase]) -> Self {
        let mut counts = Self::default();
        for phrase in phrases {
            counts.push(phrase.is_odd(), phrase.fragment_count());
        }
        counts
    }

    fn push(&mut self, odd: bool, count: u32) {
        if odd {
            self.odd.push(count);
        } else {
            self.even.push(count);
        }
    }

    pub fn for_parity(&self, odd_numbered: bool) -> &[u32] {
        if odd_numbered { &self.odd } else { &self.even }
    }

    pub fn to_file_string(&self) -> String {
        format!("{}\n{}\n", join_numbers(&self.odd), join_numbers(&self.even))
    }
}

pub fn write_fragment_counts(path: &Path, counts: &FragmentCounts) -> Result<(), LessonError> {
    fs::write(path, counts.to_file_string()).at(path)
}

pub fn parse_fragment_counts(path: &Path) -> Result<FragmentCounts, LessonError> {
    if !path.is_file() {
        return Err(LessonError::missing("fragment-count file", path));
    }
    let contents = fs::read_to_string(path).at(path)?;
    Ok(parse_fragment_counts_str(&contents, path))
}

/// Lenient: bad tokens and a missing line are warned about, never fatal.
pub fn parse_fragment_counts_str(contents: &str, origin: &Path) -> FragmentCounts {
    let mut lines = contents.lines();
    let mut read_line = |line_no: usize| match lines.next() {
        Some(line) => parse_count_list(line, origin, line_no),
        None => {
            emit(
                Level::Warn,
                "lesson.fragments.missing_line",
                &format!(
                    "{}: line {line_no} is missing; treating it as an empty list",
                    origin.display()
                ),
                None,
            );
            Vec::new()
        }
    };

    let odd = read_line(1);
    let even = read_line(2);
    FragmentCounts { odd, even }
}

fn parse_count_list(line: &str, origin: &Path, line_no: usize) -> Vec<u32> {
    let mut counts = Vec::new();
    for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        match token.parse::<u32>() {
            Ok(count) => counts.push(count),
            Err(_) => emit(
                Level::Warn,
                "lesson.fragments.bad_token",
                &format!(
                    "{}: line {line_no}: skipping non-numeric fragment count {token:?}",
                    origin.display()
                ),
                Some(json!({ "line": line_no, "token": token })),
            ),
        }
    }
    counts
}

/// Split `Cantidad_Sub_Frases.txt` (one count per phrase, in phrase order)
/// into the odd/even lists.
pub fn derive_fragment_counts(source: &Path) -> Result<FragmentCounts, LessonError> {
    if !source.is_file() {
        return Err(LessonError::missing("fragment source file", source));
    }
    let contents = fs::read_to_string(source).at(source)?;
    derive_fragment_counts_str(&contents, source)
}

pub fn derive_fragment_counts_str(
    contents: &str,
    origin: &Path,
) -> Result<FragmentCounts, LessonError> {
    let mut counts = FragmentCounts::default();
    let mut phrase_position = 0usize;

    for (idx, line) in contents.lines().enumerate() {
        let value = line.trim();
        if value.is_empty() {
            emit(
                Level::Warn,
                "lesson.fragments.blank_line",
                &format!("{}: line {} is blank; ignoring it", origin.display(), idx + 1),
                None,
            );
            continue;
        }

        let count = value.parse::<u32>().map_err(|_| {
            LessonError::format(origin, idx + 1, format!("expected an integer, found {value:?}"))
        })?;
        counts.push(phrase_position % 2 == 0, count);
        phrase_position += 1;
    }

    Ok(counts)
}
