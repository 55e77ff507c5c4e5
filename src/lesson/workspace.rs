//! Typed access to the workspace folders and files.
//!
//! The external renderer and the encoder only agree with this crate through
//! file names, so every path the pipeline touches is built here.

use std::fs;
use std::path::{Path, PathBuf};

use super::config::ProjectLayout;
use super::error::{IoContext, LessonError};
use super::library::{Language, fragment_folder_name};

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    layout: ProjectLayout,
}

/// The six raw capture folders, in processing order.
pub const RAW_FOLDERS: [RawFolder; 6] = [
    RawFolder::new(true, RawKind::Phrase(Language::Spanish)),
    RawFolder::new(true, RawKind::Phrase(Language::English)),
    RawFolder::new(true, RawKind::Fragments),
    RawFolder::new(false, RawKind::Phrase(Language::Spanish)),
    RawFolder::new(false, RawKind::Phrase(Language::English)),
    RawFolder::new(false, RawKind::Fragments),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawKind {
    Phrase(Language),
    Fragments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFolder {
    pub odd_numbered: bool,
    pub kind: RawKind,
}

impl RawFolder {
    const fn new(odd_numbered: bool, kind: RawKind) -> Self {
        Self { odd_numbered, kind }
    }

    /// `1_es`, `2_en`, `1_subs`, ...
    pub fn folder_name(&self) -> String {
        let parity = if self.odd_numbered { 1 } else { 2 };
        let suffix = match self.kind {
            RawKind::Phrase(language) => language.prefix(),
            RawKind::Fragments => "subs",
        };
        format!("{parity}_{suffix}")
    }

    /// Fragment clips are always narrated in English.
    pub fn language(&self) -> Language {
        match self.kind {
            RawKind::Phrase(language) => language,
            RawKind::Fragments => Language::English,
        }
    }
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, layout: ProjectLayout) -> Self {
        Self {
            root: root.into(),
            layout,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.root.join(relative)
    }

    pub fn english_dir(&self) -> PathBuf {
        self.resolve(&self.layout.english_dir)
    }

    pub fn spanish_dir(&self) -> PathBuf {
        self.resolve(&self.layout.spanish_dir)
    }

    pub fn phrase_dir(&self, language: Language) -> PathBuf {
        match language {
            Language::English => self.english_dir(),
            Language::Spanish => self.spanish_dir(),
        }
    }

    pub fn fragment_base_dir(&self) -> PathBuf {
        self.resolve(&self.layout.fragment_base_dir)
    }

    /// `SubFrases_Frase{phrase}` below the fragment base.
    pub fn fragment_dir(&self, phrase: u32) -> PathBuf {
        self.fragment_base_dir().join(fragment_folder_name(phrase))
    }

    pub fn raw_pool_dir(&self) -> PathBuf {
        self.resolve(&self.layout.raw_pool_dir)
    }

    pub fn raw_dir(&self, folder: &RawFolder) -> PathBuf {
        self.raw_pool_dir().join(folder.folder_name())
    }

    /// Where a raw folder's canonical files end up.
    pub fn organize_target(&self, folder: &RawFolder) -> PathBuf {
        match folder.kind {
            RawKind::Phrase(language) => self.phrase_dir(language),
            RawKind::Fragments => self.fragment_base_dir(),
        }
    }

    pub fn main_lesson_dir(&self) -> PathBuf {
        self.resolve(&self.layout.main_lesson_dir)
    }

    pub fn images_dir(&self) -> PathBuf {
        self.resolve(&self.layout.images_dir)
    }

    /// Numbered renderer output, `{n}.png`.
    pub fn image(&self, number: u32) -> PathBuf {
        self.images_dir().join(format!("{number}.png"))
    }

    pub fn backgrounds_dir(&self) -> PathBuf {
        self.resolve(&self.layout.backgrounds_dir)
    }

    /// The two alternating character backgrounds.
    pub fn backgrounds(&self) -> [PathBuf; 2] {
        let dir = self.backgrounds_dir();
        [dir.join("1000.png"), dir.join("2000.png")]
    }

    pub fn indices_file(&self) -> PathBuf {
        self.resolve(&self.layout.indices_file)
    }

    pub fn fragment_counts_file(&self) -> PathBuf {
        self.resolve(&self.layout.fragment_counts_file)
    }

    pub fn fragment_source_file(&self) -> PathBuf {
        self.resolve(&self.layout.fragment_source_file)
    }

    pub fn template_file(&self) -> PathBuf {
        self.resolve(&self.layout.template_file)
    }

    pub fn generated_audio_dir(&self) -> PathBuf {
        self.resolve(&self.layout.generated_audio_dir)
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.resolve(&self.layout.videos_dir)
    }

    pub fn data_root(&self) -> PathBuf {
        self.resolve(&self.layout.data_root)
    }
}

/// Remove everything inside `dir` (or create it) so a stage starts clean.
pub fn prepare_clean_dir(dir: &Path) -> Result<(), LessonError> {
    if dir.exists() {
        if !dir.is_dir() {
            return Err(LessonError::Io {
                path: dir.to_path_buf(),
                source: std::io::Error::other("exists but is not a directory"),
            });
        }
        fs::remove_dir_all(dir).at(dir)?;
    }
    fs::create_dir_all(dir).at(dir)
}
