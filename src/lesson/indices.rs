//! `IndicesImagenes.txt`: which rendered images belong to which dialogue
//! variant, written by the image renderer.
//!
//! ```text
//! 1,3,5        english-only image numbers
//! 2,4,6        english+spanish image numbers
//! 3            total phrases
//! 40           total generated images
//! ```

use std::fs;
use std::path::Path;

use super::error::{IoContext, LessonError};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndicesData {
    pub english_only: Vec<u32>,
    pub english_spanish: Vec<u32>,
    pub total_phrases: u32,
    pub total_generated_images: u32,
}

impl IndicesData {
    /// Four `\n`-terminated records, the exact shape [`parse_indices_str`] accepts.
    pub fn to_file_string(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n",
            join_numbers(&self.english_only),
            join_numbers(&self.english_spanish),
            self.total_phrases,
            self.total_generated_images
        )
    }

    /// Refuses to write numbers the parser would reject.
    pub fn write(&self, path: &Path) -> Result<(), LessonError> {
        self.validate(path)?;
        fs::write(path, self.to_file_string()).at(path)
    }

    /// Every listed image number must lie in `1..=total_generated_images`.
    pub fn validate(&self, origin: &Path) -> Result<(), LessonError> {
        let total = self.total_generated_images;
        for (line, list) in [(1, &self.english_only), (2, &self.english_spanish)] {
            if let Some(bad) = list.iter().find(|&&n| n == 0 || n > total) {
                return Err(LessonError::format(
                    origin,
                    line,
                    format!("image number {bad} is outside 1..={total}"),
                ));
            }
        }
        Ok(())
    }
}

pub fn parse_indices(path: &Path) -> Result<IndicesData, LessonError> {
    if !path.is_file() {
        return Err(LessonError::missing("indices file", path));
    }
    let contents = fs::read_to_string(path).at(path)?;
    parse_indices_str(&contents, path)
}

/// Parse indices text. `origin` only labels errors.
pub fn parse_indices_str(contents: &str, origin: &Path) -> Result<IndicesData, LessonError> {
    let lines: Vec<&str> = contents.lines().collect();
    if lines.len() < 4 {
        return Err(LessonError::format(
            origin,
            lines.len() + 1,
            format!("expected 4 lines, found {}", lines.len()),
        ));
    }

    let english_only = parse_number_list(lines[0], origin, 1)?;
    let english_spanish = parse_number_list(lines[1], origin, 2)?;
    let total_phrases = parse_scalar(lines[2], origin, 3)?;
    let total_generated_images = parse_scalar(lines[3], origin, 4)?;

    let data = IndicesData {
        english_only,
        english_spanish,
        total_phrases,
        total_generated_images,
    };
    data.validate(origin)?;
    Ok(data)
}

fn parse_number_list(line: &str, origin: &Path, line_no: usize) -> Result<Vec<u32>, LessonError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Vec::new());
    }
    line.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<u32>().map_err(|_| {
                LessonError::format(origin, line_no, format!("expected an integer, found {token:?}"))
            })
        })
        .collect()
}

fn parse_scalar(line: &str, origin: &Path, line_no: usize) -> Result<u32, LessonError> {
    let token = line.trim();
    token.parse::<u32>().map_err(|_| {
        LessonError::format(origin, line_no, format!("expected an integer, found {token:?}"))
    })
}

pub(crate) fn join_numbers(numbers: &[u32]) -> String {
    numbers
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
