use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::render::VideoVariant;

pub const CONFIG_FILE_NAME: &str = "lessonreel.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    /// Tool tag embedded in raw capture filenames (`<tag>_YYYY-MM-DDTHH_MM_SS`)
    pub capture_tool: String,
    /// External image renderer run in the workspace before assembly (argv)
    pub renderer: Option<Vec<String>>,
    /// Videos assembled by `batch`
    pub variants: Vec<VideoVariant>,
    pub layout: ProjectLayout,
    pub timing: Timing,
    pub loudness: Loudness,
    pub encoding: Encoding,
}

impl Default for LessonConfig {
    fn default() -> Self {
        Self {
            capture_tool: "ElevenLabs".to_string(),
            renderer: None,
            variants: VideoVariant::ALL.to_vec(),
            layout: ProjectLayout::default(),
            timing: Timing::default(),
            loudness: Loudness::default(),
            encoding: Encoding::default(),
        }
    }
}

/// Well-known relative paths shared with the external tools.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    pub english_dir: PathBuf,
    pub spanish_dir: PathBuf,
    pub fragment_base_dir: PathBuf,
    pub raw_pool_dir: PathBuf,
    pub main_lesson_dir: PathBuf,
    pub images_dir: PathBuf,
    pub backgrounds_dir: PathBuf,
    pub indices_file: PathBuf,
    pub fragment_counts_file: PathBuf,
    pub fragment_source_file: PathBuf,
    pub template_file: PathBuf,
    pub generated_audio_dir: PathBuf,
    pub videos_dir: PathBuf,
    /// Folder holding one sub-folder per video project (batch input)
    pub data_root: PathBuf,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            english_dir: PathBuf::from("Audios/Frases_English"),
            spanish_dir: PathBuf::from("Audios/Frases_Spanish"),
            fragment_base_dir: PathBuf::from("Audios"),
            raw_pool_dir: PathBuf::from("Audios_Sin_Nombres"),
            main_lesson_dir: PathBuf::from("Audios_Main_Lesson"),
            images_dir: PathBuf::from("imagenes_generadas"),
            backgrounds_dir: PathBuf::from("personajes"),
            indices_file: PathBuf::from("IndicesImagenes.txt"),
            fragment_counts_file: PathBuf::from("cantidadFragmentos.txt"),
            fragment_source_file: PathBuf::from("Cantidad_Sub_Frases.txt"),
            template_file: PathBuf::from("Excel.txt"),
            generated_audio_dir: PathBuf::from("Audios_Generados"),
            videos_dir: PathBuf::from("Videos_Generados"),
            data_root: PathBuf::from("../Aplicacion/Datos de Videos"),
        }
    }
}

/// Durations in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    pub main_lesson_silence: f64,
    pub dialogue_silence: f64,
    pub lead_in_silence: f64,
    pub placeholder_silence: f64,
    pub sample_rate: u32,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            main_lesson_silence: 2.0,
            dialogue_silence: 1.0,
            lead_in_silence: 0.7,
            placeholder_silence: 0.5,
            sample_rate: 44_100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Loudness {
    /// Integrated loudness target in LUFS
    pub target_lufs: f64,
    pub loudness_range: f64,
    pub true_peak: f64,
    pub bitrate: String,
}

impl Default for Loudness {
    fn default() -> Self {
        Self {
            target_lufs: -23.0,
            loudness_range: 7.0,
            true_peak: -2.0,
            bitrate: "192k".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Encoding {
    pub video_codec: String,
    pub preset: String,
    pub crf: u32,
    pub pixel_format: String,
    pub audio_codec: String,
}

impl Default for Encoding {
    fn default() -> Self {
        Self {
            video_codec: "libx264".to_string(),
            preset: "fast".to_string(),
            crf: 22,
            pixel_format: "yuv420p".to_string(),
            audio_codec: "aac".to_string(),
        }
    }
}

impl LessonConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to_path(path)?;
            return Ok(config);
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading lesson config from {}", path.display()))?;
        let mut config: Self = toml::from_str(&contents)
            .with_context(|| format!("parsing lesson config {}", path.display()))?;
        config.sanitize();
        Ok(config)
    }

    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("creating lesson config directory {}", parent.display())
            })?;
        }

        let toml = toml::to_string_pretty(self).context("serializing lesson config")?;
        fs::write(path, toml)
            .with_context(|| format!("writing lesson config to {}", path.display()))?;
        Ok(())
    }

    fn sanitize(&mut self) {
        let defaults = Timing::default();
        let timing = &mut self.timing;
        for (value, fallback) in [
            (&mut timing.main_lesson_silence, defaults.main_lesson_silence),
            (&mut timing.dialogue_silence, defaults.dialogue_silence),
            (&mut timing.lead_in_silence, defaults.lead_in_silence),
            (&mut timing.placeholder_silence, defaults.placeholder_silence),
        ] {
            if !value.is_finite() || *value <= 0.0 {
                *value = fallback;
            }
        }
        if timing.sample_rate == 0 {
            timing.sample_rate = defaults.sample_rate;
        }
        if !self.loudness.target_lufs.is_finite() {
            self.loudness.target_lufs = Loudness::default().target_lufs;
        }
        if self.capture_tool.trim().is_empty() {
            self.capture_tool = Self::default().capture_tool;
        }
    }
}
