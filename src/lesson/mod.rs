//! Language-lesson video pipeline: canonical audio pool, slot expansion and
//! duration-synchronized assembly.

pub mod batch;
pub mod bootstrap;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod expand;
pub mod fragments;
pub mod indices;
pub mod library;
pub mod media;
pub mod normalize;
pub mod ordering;
pub mod organize;
pub mod render;
pub mod template;
pub mod timeline;
pub mod workspace;

pub use cli::LessonCommands;
pub use commands::{LessonContext, handle_lesson_command};
