//! Pull one project's inputs from the data root into the workspace.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use super::error::{IoContext, LessonError};
use super::workspace::{Workspace, prepare_clean_dir};
use crate::ui::prelude::*;

const RAW_AUDIO_SOURCE: &str = "Audios Sin Nombres";
const BACKGROUNDS_SOURCE: &str = "Personajes";
const TEMPLATE_SOURCE: &str = "Excel.txt";
const FRAGMENT_SOURCE: &str = "SubFrases.txt";

pub fn project_dir(workspace: &Workspace, project: &str) -> PathBuf {
    workspace.data_root().join(project)
}

/// Copy the raw pool, backgrounds, phrase template and fragment-count source
/// of `project` into the workspace. Every copy is attempted; the first
/// failure is returned.
pub fn bootstrap(workspace: &Workspace, project: &str) -> Result<(), LessonError> {
    let source = project_dir(workspace, project);
    if !source.is_dir() {
        return Err(LessonError::missing("project folder", source));
    }

    let steps: [(&str, Result<usize, LessonError>); 4] = [
        (
            RAW_AUDIO_SOURCE,
            replace_dir_contents(&source.join(RAW_AUDIO_SOURCE), &workspace.raw_pool_dir()),
        ),
        (
            BACKGROUNDS_SOURCE,
            replace_dir_contents(&source.join(BACKGROUNDS_SOURCE), &workspace.backgrounds_dir()),
        ),
        (
            TEMPLATE_SOURCE,
            copy_file(&source.join(TEMPLATE_SOURCE), &workspace.template_file()),
        ),
        (
            FRAGMENT_SOURCE,
            copy_file(&source.join(FRAGMENT_SOURCE), &workspace.fragment_source_file()),
        ),
    ];

    let mut first_error = None;
    for (name, result) in steps {
        match result {
            Ok(files) => emit(
                Level::Debug,
                "lesson.bootstrap.copied",
                &format!("{project}/{name}: {files} file(s)"),
                None,
            ),
            Err(err) => {
                emit(
                    Level::Error,
                    "lesson.bootstrap.failed",
                    &format!("{project}/{name}: {err}"),
                    None,
                );
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => {
            emit(
                Level::Success,
                "lesson.bootstrap.done",
                &format!("Workspace prepared for project '{project}'"),
                None,
            );
            Ok(())
        }
    }
}

fn replace_dir_contents(source: &Path, dest: &Path) -> Result<usize, LessonError> {
    prepare_clean_dir(dest)?;
    if !source.is_dir() {
        return Err(LessonError::missing("project data folder", source));
    }

    let mut copied = 0;
    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|err| LessonError::Io {
            path: source.to_path_buf(),
            source: err.into(),
        })?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).at(&target)?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &target).at(&target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

fn copy_file(source: &Path, dest: &Path) -> Result<usize, LessonError> {
    if !source.is_file() {
        return Err(LessonError::missing("project data file", source));
    }
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).at(parent)?;
    }
    fs::copy(source, dest).at(dest)?;
    Ok(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::config::ProjectLayout;
    use tempfile::tempdir;

    fn put(path: PathBuf, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn workspace(root: &Path) -> Workspace {
        let layout = ProjectLayout {
            data_root: PathBuf::from("data"),
            ..ProjectLayout::default()
        };
        Workspace::new(root, layout)
    }

    #[test]
    fn copies_project_inputs_into_the_workspace() {
        let temp = tempdir().unwrap();
        let workspace = workspace(temp.path());
        let project = project_dir(&workspace, "Vid0001");
        put(project.join("Audios Sin Nombres/1_en/ElevenLabs_2024-01-01T00_00_00.mp3"), "a");
        put(project.join("Personajes/1000.png"), "bg");
        put(project.join("Excel.txt"), "Hi|Hola\n");
        put(project.join("SubFrases.txt"), "0\n");
        put(workspace.raw_pool_dir().join("old.mp3"), "stale");

        bootstrap(&workspace, "Vid0001").unwrap();

        assert!(
            workspace
                .raw_pool_dir()
                .join("1_en/ElevenLabs_2024-01-01T00_00_00.mp3")
                .exists()
        );
        assert!(!workspace.raw_pool_dir().join("old.mp3").exists());
        assert!(workspace.backgrounds()[0].exists());
        assert_eq!(fs::read_to_string(workspace.template_file()).unwrap(), "Hi|Hola\n");
        assert_eq!(fs::read_to_string(workspace.fragment_source_file()).unwrap(), "0\n");
    }

    #[test]
    fn a_missing_input_fails_but_the_rest_is_copied() {
        let temp = tempdir().unwrap();
        let workspace = workspace(temp.path());
        let project = project_dir(&workspace, "Vid0002");
        put(project.join("Audios Sin Nombres/1_en/a.mp3"), "a");
        put(project.join("Personajes/1000.png"), "bg");
        put(project.join("Excel.txt"), "Hi|Hola\n");

        let err = bootstrap(&workspace, "Vid0002").unwrap_err();

        assert!(matches!(err, LessonError::MissingResource { .. }));
        assert!(workspace.template_file().exists());
    }

    #[test]
    fn unknown_project_is_reported() {
        let temp = tempdir().unwrap();
        let err = bootstrap(&workspace(temp.path()), "nope").unwrap_err();
        assert!(matches!(err, LessonError::MissingResource { .. }));
    }
}
