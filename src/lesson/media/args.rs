//! Argument lists for the encoder and prober. Pure, so the exact command
//! lines are testable without ffmpeg installed.

use std::path::Path;

use crate::lesson::config::{Encoding, Loudness};
use crate::lesson::error::LessonError;

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn seconds(value: f64) -> String {
    format!("{value:.3}")
}

fn strings<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|part| part.to_string()).collect()
}

/// Mono digital silence of `duration` seconds.
pub fn silence_args(duration: f64, sample_rate: u32, output: &Path) -> Vec<String> {
    let mut args = strings(["-y", "-f", "lavfi", "-i"]);
    args.push(format!("anullsrc=r={sample_rate}:cl=mono"));
    args.push("-t".into());
    args.push(seconds(duration));
    args.push(path_arg(output));
    args
}

/// `audio` followed by `silence`, re-encoded into one clip.
pub fn append_silence_args(audio: &Path, silence: &Path, output: &Path) -> Vec<String> {
    let mut args = strings(["-y", "-i"]);
    args.push(path_arg(audio));
    args.push("-i".into());
    args.push(path_arg(silence));
    args.extend(strings([
        "-filter_complex",
        "[0][1]concat=n=2:v=0:a=1[out]",
        "-map",
        "[out]",
    ]));
    args.push(path_arg(output));
    args
}

/// Stream-copy concatenation of the files listed in a concat manifest.
pub fn concat_copy_args(manifest: &Path, output: &Path) -> Vec<String> {
    let mut args = strings(["-y", "-f", "concat", "-safe", "0", "-i"]);
    args.push(path_arg(manifest));
    args.extend(strings(["-c", "copy"]));
    args.push(path_arg(output));
    args
}

pub fn loudnorm_args(
    input: &Path,
    loudness: &Loudness,
    sample_rate: u32,
    output: &Path,
) -> Vec<String> {
    let mut args = strings(["-y", "-i"]);
    args.push(path_arg(input));
    args.push("-af".into());
    args.push(format!(
        "loudnorm=I={}:LRA={}:TP={}",
        loudness.target_lufs, loudness.loudness_range, loudness.true_peak
    ));
    args.push("-ar".into());
    args.push(sample_rate.to_string());
    args.push("-b:a".into());
    args.push(loudness.bitrate.clone());
    args.push(path_arg(output));
    args
}

/// Slide-list video muxed with the master track, cut to the shorter stream.
pub fn mux_args(
    slide_manifest: &Path,
    audio: &Path,
    encoding: &Encoding,
    output: &Path,
) -> Vec<String> {
    let mut args = strings(["-y", "-f", "concat", "-safe", "0", "-i"]);
    args.push(path_arg(slide_manifest));
    args.push("-i".into());
    args.push(path_arg(audio));
    args.extend(strings(["-map", "0:v:0", "-map", "1:a:0", "-c:v"]));
    args.push(encoding.video_codec.clone());
    args.push("-preset".into());
    args.push(encoding.preset.clone());
    args.push("-crf".into());
    args.push(encoding.crf.to_string());
    args.push("-pix_fmt".into());
    args.push(encoding.pixel_format.clone());
    args.push("-c:a".into());
    args.push(encoding.audio_codec.clone());
    args.push("-shortest".into());
    args.push(path_arg(output));
    args
}

pub fn probe_args(path: &Path) -> Vec<String> {
    let mut args = strings([
        "-v",
        "error",
        "-show_entries",
        "format=duration",
        "-of",
        "default=noprint_wrappers=1:nokey=1",
    ]);
    args.push(path_arg(path));
    args
}

/// Prober stdout is a single dot-decimal number of seconds.
pub fn parse_duration(stdout: &str, path: &Path) -> Result<f64, LessonError> {
    let raw = stdout.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(LessonError::process(
            "ffprobe",
            format!("unparsable duration {raw:?} for {}", path.display()),
        )),
    }
}

/// Quote a path for a concat manifest `file '...'` line.
pub fn escape_manifest_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "'\\''")
}

pub fn audio_manifest<'a>(files: impl IntoIterator<Item = &'a Path>) -> String {
    files
        .into_iter()
        .map(|file| format!("file '{}'\n", escape_manifest_path(file)))
        .collect()
}

/// Image concat list. An entry without a duration is the closing repeat of
/// the last image, so the final slide keeps its length.
pub fn slide_manifest<'a>(slides: impl IntoIterator<Item = (&'a Path, Option<f64>)>) -> String {
    let mut manifest = String::new();
    for (image, duration) in slides {
        manifest.push_str(&format!("file '{}'\n", escape_manifest_path(image)));
        if let Some(duration) = duration {
            manifest.push_str(&format!("duration {duration:.6}\n"));
        }
    }
    manifest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_uses_mono_null_source() {
        let args = silence_args(0.7, 44_100, Path::new("/tmp/s.mp3"));
        assert_eq!(
            args,
            [
                "-y",
                "-f",
                "lavfi",
                "-i",
                "anullsrc=r=44100:cl=mono",
                "-t",
                "0.700",
                "/tmp/s.mp3"
            ]
        );
    }

    #[test]
    fn append_silence_concats_two_audio_inputs() {
        let args = append_silence_args(
            Path::new("en1.mp3"),
            Path::new("silence.mp3"),
            Path::new("block_1.mp3"),
        );
        assert_eq!(
            args.join(" "),
            "-y -i en1.mp3 -i silence.mp3 -filter_complex [0][1]concat=n=2:v=0:a=1[out] -map [out] block_1.mp3"
        );
    }

    #[test]
    fn loudnorm_carries_targets() {
        let args = loudnorm_args(
            Path::new("en1.mp3"),
            &Loudness::default(),
            44_100,
            Path::new("en1.temp.mp3"),
        );
        assert_eq!(
            args.join(" "),
            "-y -i en1.mp3 -af loudnorm=I=-23:LRA=7:TP=-2 -ar 44100 -b:a 192k en1.temp.mp3"
        );
    }

    #[test]
    fn mux_maps_video_and_audio_and_trims() {
        let args = mux_args(
            Path::new("slides.txt"),
            Path::new("master.mp3"),
            &Encoding::default(),
            Path::new("Main_Lesson.mp4"),
        );
        assert_eq!(
            args.join(" "),
            "-y -f concat -safe 0 -i slides.txt -i master.mp3 -map 0:v:0 -map 1:a:0 \
             -c:v libx264 -preset fast -crf 22 -pix_fmt yuv420p -c:a aac -shortest Main_Lesson.mp4"
        );
    }

    #[test]
    fn concat_copy_disables_reencoding() {
        let args = concat_copy_args(Path::new("list.txt"), Path::new("out.mp3"));
        assert_eq!(args.join(" "), "-y -f concat -safe 0 -i list.txt -c copy out.mp3");
    }

    #[test]
    fn duration_parsing_is_strict() {
        let path = Path::new("block_1.mp3");
        assert_eq!(parse_duration("3.250000\n", path).unwrap(), 3.25);
        assert!(parse_duration("N/A", path).is_err());
        assert!(parse_duration("3,25", path).is_err());
        assert!(parse_duration("", path).is_err());
    }

    #[test]
    fn manifests_quote_paths() {
        let audio = audio_manifest([Path::new("/w/it's.mp3"), Path::new("/w/b.mp3")]);
        assert_eq!(audio, "file '/w/it'\\''s.mp3'\nfile '/w/b.mp3'\n");

        let slides = slide_manifest([
            (Path::new("/w/1.png"), Some(2.5)),
            (Path::new("/w/2.png"), Some(1.0)),
            (Path::new("/w/2.png"), None),
        ]);
        assert_eq!(
            slides,
            "file '/w/1.png'\nduration 2.500000\nfile '/w/2.png'\nduration 1.000000\nfile '/w/2.png'\n"
        );
    }
}
