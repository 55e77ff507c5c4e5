use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::error::LessonError;
use super::workspace::Workspace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Spanish,
}

impl Language {
    pub fn prefix(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
        }
    }
}

/// `en{phrase}.mp3`
pub fn phrase_file_name(language: Language, phrase: u32) -> String {
    format!("{}{phrase}.mp3", language.prefix())
}

/// `en{phrase}fr{fragment}.mp3`
pub fn fragment_file_name(language: Language, phrase: u32, fragment: u32) -> String {
    format!("{}{phrase}fr{fragment}.mp3", language.prefix())
}

pub fn fragment_folder_name(phrase: u32) -> String {
    format!("SubFrases_Frase{phrase}")
}

/// Regex (unanchored) for canonical phrase names of one language.
pub fn phrase_pattern(language: Language) -> String {
    format!(r"{}\d+\.mp3", language.prefix())
}

/// Read-only view over the organized clip pool.
pub struct AudioLibrary<'a> {
    workspace: &'a Workspace,
}

impl<'a> AudioLibrary<'a> {
    pub fn new(workspace: &'a Workspace) -> Self {
        Self { workspace }
    }

    pub fn english(&self, phrase: u32) -> Result<PathBuf, LessonError> {
        let path = self
            .workspace
            .english_dir()
            .join(phrase_file_name(Language::English, phrase));
        require_file(path, "English phrase audio")
    }

    /// The Spanish clip, if it was recorded.
    pub fn spanish(&self, phrase: u32) -> Option<PathBuf> {
        let path = self
            .workspace
            .spanish_dir()
            .join(phrase_file_name(Language::Spanish, phrase));
        path.is_file().then_some(path)
    }

    pub fn fragment(&self, phrase: u32, fragment: u32) -> Result<PathBuf, LessonError> {
        let path = self
            .workspace
            .fragment_dir(phrase)
            .join(fragment_file_name(Language::English, phrase, fragment));
        require_file(path, "fragment audio")
    }
}

fn require_file(path: PathBuf, what: &'static str) -> Result<PathBuf, LessonError> {
    if path.is_file() {
        Ok(path)
    } else {
        Err(LessonError::missing(what, path))
    }
}

/// True when `path` has an `.mp3` extension in any letter case.
pub fn is_mp3(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("mp3"))
}
