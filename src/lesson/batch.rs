//! Whole-pipeline runs over every project in the data root.

use anyhow::{Context, Result, bail};
use serde::Serialize;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

use super::bootstrap::bootstrap;
use super::config::LessonConfig;
use super::error::{IoContext, LessonError};
use super::expand::{expand_main_lesson, write_main_lesson};
use super::fragments::{derive_fragment_counts, write_fragment_counts};
use super::indices::parse_indices;
use super::library::AudioLibrary;
use super::media::MediaToolkit;
use super::normalize::normalize_tree;
use super::organize::organize_all;
use super::render::render_variant;
use super::template::parse_template;
use super::workspace::{Workspace, prepare_clean_dir};
use crate::ui::prelude::*;
use crate::ui::progress::{create_spinner, finish_spinner_with_success};

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Project folders below the data root, sorted by name.
pub fn list_projects(data_root: &Path) -> Result<Vec<String>> {
    if !data_root.is_dir() {
        return Err(LessonError::missing("project data root", data_root).into());
    }
    let mut projects = Vec::new();
    for entry in fs::read_dir(data_root)
        .with_context(|| format!("reading project data root {}", data_root.display()))?
    {
        let entry = entry.with_context(|| format!("reading {}", data_root.display()))?;
        if entry.path().is_dir() {
            projects.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    projects.sort();
    Ok(projects)
}

/// Process every project to completion, one after the other. A failing
/// project is reported and the batch moves on.
pub fn run_batch(
    toolkit: &dyn MediaToolkit,
    workspace: &Workspace,
    config: &LessonConfig,
) -> Result<BatchReport> {
    let projects = list_projects(&workspace.data_root())?;
    if projects.is_empty() {
        emit(
            Level::Warn,
            "lesson.batch.empty",
            &format!("No project folders in {}", workspace.data_root().display()),
            None,
        );
    }

    let mut report = BatchReport::default();
    for project in projects {
        separator();
        emit(
            Level::Info,
            "lesson.batch.project",
            &format!("Processing project '{project}'"),
            Some(json!({ "project": project })),
        );

        match run_project(toolkit, workspace, config, &project) {
            Ok(()) => {
                emit(
                    Level::Success,
                    "lesson.batch.project_done",
                    &format!("Project '{project}' finished"),
                    None,
                );
                report.succeeded.push(project);
            }
            Err(err) => {
                emit(
                    Level::Error,
                    "lesson.batch.project_failed",
                    &format!("Project '{project}' failed: {err:#}"),
                    Some(json!({ "project": project })),
                );
                report.failed.push(project);
            }
        }
    }

    Ok(report)
}

/// Every stage for one project, stopping at the first failing stage.
///
/// Images and indices are per project: whatever the previous project left
/// behind is removed first, and the renderer must produce them again.
pub fn run_project(
    toolkit: &dyn MediaToolkit,
    workspace: &Workspace,
    config: &LessonConfig,
    project: &str,
) -> Result<()> {
    clear_rendered_images(workspace)?;
    let Some(renderer) = &config.renderer else {
        return Err(LessonError::missing(
            "image renderer command (`renderer` in the config)",
            workspace.indices_file(),
        )
        .into());
    };

    bootstrap(workspace, project).context("bootstrapping the workspace")?;

    let counts = derive_fragment_counts(&workspace.fragment_source_file())
        .context("deriving fragment counts")?;
    write_fragment_counts(&workspace.fragment_counts_file(), &counts)?;

    run_renderer(renderer, workspace.root()).context("rendering phrase images")?;
    let indices = parse_indices(&workspace.indices_file())
        .context("reading the image indices written by the renderer")?;
    emit(
        Level::Info,
        "lesson.batch.rendered",
        &format!(
            "Renderer produced {} image(s) for {} phrase(s)",
            indices.total_generated_images, indices.total_phrases
        ),
        None,
    );

    let placed = organize_all(workspace, &counts, &config.capture_tool)
        .context("organizing the raw audio pool")?;
    emit(
        Level::Info,
        "lesson.batch.organized",
        &format!("Organized {placed} clip(s)"),
        None,
    );

    let normalized = normalize_tree(toolkit, workspace, &config.loudness, &config.timing)
        .context("normalizing loudness")?;
    if normalized.failed > 0 {
        emit(
            Level::Warn,
            "lesson.batch.normalize_failures",
            &format!("{} clip(s) could not be normalized", normalized.failed),
            None,
        );
    }

    let phrases = parse_template(&workspace.template_file())?;
    let sequence = expand_main_lesson(&phrases, &AudioLibrary::new(workspace))
        .context("expanding the main lesson")?;
    write_main_lesson(toolkit, workspace, &sequence, &config.timing)?;

    for &variant in &config.variants {
        render_variant(toolkit, workspace, config, variant, Some(project))
            .with_context(|| format!("rendering {}", variant.output_name()))?;
    }

    Ok(())
}

fn clear_rendered_images(workspace: &Workspace) -> Result<(), LessonError> {
    prepare_clean_dir(&workspace.images_dir())?;
    let indices = workspace.indices_file();
    if indices.exists() {
        fs::remove_file(&indices).at(&indices)?;
    }
    Ok(())
}

/// Run the external image renderer (argv) inside the workspace.
pub fn run_renderer(argv: &[String], workdir: &Path) -> Result<()> {
    let Some((program, args)) = argv.split_first() else {
        bail!("renderer command is empty");
    };

    let pb = create_spinner(format!("Running {program}"));
    let output = Command::new(program)
        .args(args)
        .current_dir(workdir)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run renderer {program}"));
    let output = match output {
        Ok(output) => output,
        Err(err) => {
            pb.finish_and_clear();
            return Err(err);
        }
    };

    if !output.status.success() {
        pb.finish_and_clear();
        return Err(LessonError::process(
            program.clone(),
            format!(
                "exited with status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            ),
        )
        .into());
    }

    finish_spinner_with_success(pb, format!("{program} finished"));
    Ok(())
}
