use clap::{Args, Subcommand};

use super::render::VideoVariant;

#[derive(Subcommand, Debug, Clone)]
pub enum LessonCommands {
    /// Report whether ffmpeg and ffprobe are available
    Check,
    /// Copy a project's data (raw audio, backgrounds, template) into the workspace
    Bootstrap(BootstrapArgs),
    /// Derive the fragment-count file from the per-phrase counts
    Fragments,
    /// Write the image indices file by hand (when no renderer produces it)
    Indices(IndicesArgs),
    /// Rename and classify the raw audio pool into canonical clips
    Organize,
    /// Loudness-normalize the canonical audio pool in place
    Normalize,
    /// Materialize the numbered main-lesson audio pool
    MainLesson,
    /// Assemble one video
    Render(RenderArgs),
    /// Run every stage for every project folder in the data root
    Batch,
}

#[derive(Args, Debug, Clone)]
pub struct BootstrapArgs {
    /// Project folder name below the data root
    pub project: String,
}

#[derive(Args, Debug, Clone)]
pub struct IndicesArgs {
    /// Image numbers shown in the English dialogue, comma separated
    #[arg(long, value_delimiter = ',')]
    pub english_only: Vec<u32>,

    /// Image numbers shown in the Spanish dialogue, comma separated
    #[arg(long, value_delimiter = ',')]
    pub english_spanish: Vec<u32>,

    /// Number of phrases in the lesson
    #[arg(long)]
    pub phrases: u32,

    /// Number of rendered images in the images folder
    #[arg(long)]
    pub images: u32,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Which video to assemble
    #[arg(value_enum)]
    pub variant: VideoVariant,

    /// Project name; the video is written below Videos_Generados/<project>/
    pub project: Option<String>,
}
