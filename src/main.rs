mod lesson;
mod ui;

use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use crate::lesson::{LessonCommands, LessonContext, handle_lesson_command};
use crate::ui::prelude::*;

/// Lessonreel: narrated language-lesson videos from phrase scripts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Print debug events and ffmpeg output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit JSON lines instead of coloured text
    #[arg(long, global = true)]
    json: bool,

    /// Workspace root holding the audio pool and generated files
    #[arg(short, long, global = true, default_value = ".")]
    workspace: PathBuf,

    /// Config file (defaults to <workspace>/lessonreel.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: LessonCommands,
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, std::io::stdout().is_terminal());
    ui::set_debug_mode(cli.debug);

    let context = LessonContext {
        root: cli.workspace,
        config_path: cli.config,
    };

    if let Err(err) = handle_lesson_command(cli.command, &context) {
        emit(Level::Error, "lessonreel.failed", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
