use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;

use super::config::{LessonConfig, Timing};
use super::error::LessonError;
use super::expand::{DialogueVariant, expand_dialogue};
use super::indices::parse_indices;
use super::library::{Language, phrase_pattern};
use super::media::MediaToolkit;
use super::ordering::list_ordered;
use super::timeline::{Scratch, SlotLists, TimelineBuilder};
use super::workspace::Workspace;
use crate::ui::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum VideoVariant {
    MainLesson,
    DialogueEnglish,
    DialogueSpanish,
    DialogueBackground,
}

impl VideoVariant {
    pub const ALL: [VideoVariant; 4] = [
        VideoVariant::MainLesson,
        VideoVariant::DialogueEnglish,
        VideoVariant::DialogueSpanish,
        VideoVariant::DialogueBackground,
    ];

    pub fn output_name(self) -> &'static str {
        match self {
            VideoVariant::MainLesson => "Main_Lesson.mp4",
            VideoVariant::DialogueEnglish => "Dialogo_English.mp4",
            VideoVariant::DialogueSpanish => "Dialogo_Spanish.mp4",
            VideoVariant::DialogueBackground => "Dialogo_Fondo.mp4",
        }
    }

    pub fn audio_name(self) -> String {
        let name = self.output_name();
        format!("{}.mp3", name.trim_end_matches(".mp4"))
    }

    pub fn trailing_silence(self, timing: &Timing) -> f64 {
        match self {
            VideoVariant::MainLesson => timing.main_lesson_silence,
            _ => timing.dialogue_silence,
        }
    }

    fn dialogue(self) -> Option<DialogueVariant> {
        match self {
            VideoVariant::MainLesson => None,
            VideoVariant::DialogueEnglish => Some(DialogueVariant::English),
            VideoVariant::DialogueSpanish => Some(DialogueVariant::Spanish),
            VideoVariant::DialogueBackground => Some(DialogueVariant::Background),
        }
    }
}

/// Audio/image slot lists for one variant.
pub fn variant_slots(
    workspace: &Workspace,
    variant: VideoVariant,
) -> Result<SlotLists, LessonError> {
    let indices = parse_indices(&workspace.indices_file())?;
    match variant.dialogue() {
        Some(dialogue) => expand_dialogue(workspace, &indices, dialogue),
        None => Ok(SlotLists {
            audio: list_ordered(&workspace.main_lesson_dir(), &phrase_pattern(Language::English))?,
            images: (1..=indices.total_generated_images)
                .map(|n| workspace.image(n))
                .collect(),
        }),
    }
}

/// Assemble one video. The master track goes to the generated-audio folder,
/// the video to the videos folder (below `project` when given). Returns the
/// video path.
pub fn render_variant(
    toolkit: &dyn MediaToolkit,
    workspace: &Workspace,
    config: &LessonConfig,
    variant: VideoVariant,
    project: Option<&str>,
) -> Result<PathBuf, LessonError> {
    let lists = variant_slots(workspace, variant)?;

    let mut video_dir = workspace.videos_dir();
    if let Some(project) = project {
        video_dir.push(project);
    }
    let video = video_dir.join(variant.output_name());
    let master_audio = workspace.generated_audio_dir().join(variant.audio_name());

    emit(
        Level::Info,
        "lesson.render.start",
        &format!(
            "Rendering {} from {} slot(s)",
            variant.output_name(),
            lists.audio.len().min(lists.images.len())
        ),
        Some(json!({ "variant": variant, "audio": lists.audio.len(), "images": lists.images.len() })),
    );

    let scratch = Scratch::new()?;
    let builder = TimelineBuilder::new(toolkit, &config.timing, &scratch);
    let timeline =
        builder.build_timeline(lists, variant.trailing_silence(&config.timing), &master_audio)?;
    builder.assemble_video(&timeline, &config.encoding, &video)?;

    emit(
        Level::Success,
        "lesson.render.done",
        &format!(
            "{} ready ({} slides, {:.1}s)",
            video.display(),
            timeline.slides.len(),
            timeline.total_duration()
        ),
        Some(json!({ "video": video.display().to_string(), "audio": master_audio.display().to_string() })),
    );
    Ok(video)
}
