use anyhow::{Context, Result, bail};
use serde_json::json;
use std::path::PathBuf;

use super::batch::run_batch;
use super::bootstrap::bootstrap;
use super::cli::{IndicesArgs, LessonCommands};
use super::config::{CONFIG_FILE_NAME, LessonConfig};
use super::expand::{expand_main_lesson, write_main_lesson};
use super::fragments::{
    FragmentCounts, derive_fragment_counts, parse_fragment_counts, write_fragment_counts,
};
use super::indices::IndicesData;
use super::library::AudioLibrary;
use super::media::{SystemMedia, locate_tool};
use super::normalize::normalize_tree;
use super::organize::organize_all;
use super::render::render_variant;
use super::template::parse_template;
use super::workspace::Workspace;
use crate::ui::prelude::*;

/// Where the pipeline runs and which config file drives it.
#[derive(Debug, Clone)]
pub struct LessonContext {
    pub root: PathBuf,
    pub config_path: Option<PathBuf>,
}

impl LessonContext {
    fn load(&self) -> Result<(LessonConfig, Workspace)> {
        let path = self
            .config_path
            .clone()
            .unwrap_or_else(|| self.root.join(CONFIG_FILE_NAME));
        let config = LessonConfig::load_from_path(&path)?;
        let workspace = Workspace::new(&self.root, config.layout.clone());
        Ok((config, workspace))
    }
}

pub fn handle_lesson_command(command: LessonCommands, context: &LessonContext) -> Result<()> {
    let (config, workspace) = context.load()?;
    match command {
        LessonCommands::Check => handle_check(&workspace),
        LessonCommands::Bootstrap(args) => {
            bootstrap(&workspace, &args.project)
                .with_context(|| format!("bootstrapping project '{}'", args.project))?;
            Ok(())
        }
        LessonCommands::Fragments => handle_fragments(&workspace),
        LessonCommands::Indices(args) => handle_indices(&workspace, args),
        LessonCommands::Organize => handle_organize(&workspace, &config),
        LessonCommands::Normalize => {
            let media = SystemMedia::locate()?;
            let report = normalize_tree(&media, &workspace, &config.loudness, &config.timing)?;
            emit(
                Level::Success,
                "lesson.normalize.done",
                &format!(
                    "Normalized {} clip(s), {} failed",
                    report.processed, report.failed
                ),
                Some(json!(report)),
            );
            Ok(())
        }
        LessonCommands::MainLesson => {
            let media = SystemMedia::locate()?;
            let phrases = parse_template(&workspace.template_file())?;
            let sequence = expand_main_lesson(&phrases, &AudioLibrary::new(&workspace))?;
            write_main_lesson(&media, &workspace, &sequence, &config.timing)?;
            Ok(())
        }
        LessonCommands::Render(args) => {
            let media = SystemMedia::locate()?;
            render_variant(
                &media,
                &workspace,
                &config,
                args.variant,
                args.project.as_deref(),
            )
            .with_context(|| format!("rendering {}", args.variant.output_name()))?;
            Ok(())
        }
        LessonCommands::Batch => {
            let media = SystemMedia::locate()?;
            let report = run_batch(&media, &workspace, &config)?;
            emit(
                Level::Info,
                "lesson.batch.summary",
                &format!(
                    "{} project(s) succeeded, {} failed",
                    report.succeeded.len(),
                    report.failed.len()
                ),
                Some(json!(report)),
            );
            if !report.failed.is_empty() {
                bail!("{} project(s) failed: {}", report.failed.len(), report.failed.join(", "));
            }
            Ok(())
        }
    }
}

fn handle_check(workspace: &Workspace) -> Result<()> {
    emit(
        Level::Info,
        "lesson.check.workspace",
        &format!("Workspace: {}", workspace.root().display()),
        None,
    );
    let mut missing = Vec::new();
    for tool in ["ffmpeg", "ffprobe"] {
        match locate_tool(tool) {
            Ok(path) => emit(
                Level::Success,
                "lesson.check.found",
                &format!("{tool}: {}", path.display()),
                Some(json!({ "tool": tool, "path": path.display().to_string() })),
            ),
            Err(err) => {
                emit(Level::Error, "lesson.check.missing", &err.to_string(), None);
                missing.push(tool);
            }
        }
    }
    if !missing.is_empty() {
        bail!("missing required tool(s): {}", missing.join(", "));
    }
    Ok(())
}

fn handle_fragments(workspace: &Workspace) -> Result<()> {
    let source = workspace.fragment_source_file();
    let counts = if source.is_file() {
        derive_fragment_counts(&source)?
    } else {
        emit(
            Level::Info,
            "lesson.fragments.from_template",
            &format!(
                "{} not found; counting fragments in the phrase template",
                source.display()
            ),
            None,
        );
        FragmentCounts::from_phrases(&parse_template(&workspace.template_file())?)
    };

    let target = workspace.fragment_counts_file();
    write_fragment_counts(&target, &counts)?;
    emit(
        Level::Success,
        "lesson.fragments.written",
        &format!(
            "Wrote {} (odd: {:?}, even: {:?})",
            target.display(),
            counts.odd,
            counts.even
        ),
        Some(json!({ "odd": counts.odd, "even": counts.even })),
    );
    Ok(())
}

fn handle_indices(workspace: &Workspace, args: IndicesArgs) -> Result<()> {
    let data = IndicesData {
        english_only: args.english_only,
        english_spanish: args.english_spanish,
        total_phrases: args.phrases,
        total_generated_images: args.images,
    };
    let target = workspace.indices_file();
    data.write(&target)?;
    emit(
        Level::Success,
        "lesson.indices.written",
        &format!("Wrote {}", target.display()),
        Some(json!({
            "english_only": data.english_only,
            "english_spanish": data.english_spanish,
            "total_phrases": data.total_phrases,
            "total_generated_images": data.total_generated_images,
        })),
    );
    Ok(())
}

fn handle_organize(workspace: &Workspace, config: &LessonConfig) -> Result<()> {
    let counts_file = workspace.fragment_counts_file();
    let counts = if counts_file.is_file() {
        parse_fragment_counts(&counts_file)?
    } else {
        emit(
            Level::Warn,
            "lesson.organize.no_counts",
            &format!(
                "{} not found; fragment folders will be skipped (run `fragments` first)",
                counts_file.display()
            ),
            None,
        );
        FragmentCounts::default()
    };

    let placed = organize_all(workspace, &counts, &config.capture_tool)?;
    emit(
        Level::Success,
        "lesson.organize.done",
        &format!("Placed {placed} clip(s)"),
        Some(json!({ "placed": placed })),
    );
    Ok(())
}
