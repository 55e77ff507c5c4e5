mod common;

use anyhow::Result;
use common::{TestEnvironment, run_lessonreel};

#[test]
fn test_fragments_splits_counts_by_parity() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("Cantidad_Sub_Frases.txt", "2\n1\n3\n\n0\n")?;

    let output = run_lessonreel(&env, &["fragments"])?;
    assert_eq!(output.exit_code, 0, "fragments failed: {}", output.stderr);

    assert_eq!(env.read("cantidadFragmentos.txt")?, "2,3\n1,0\n");
    // Default config is written on first use.
    assert!(env.exists("lessonreel.toml"));
    Ok(())
}

#[test]
fn test_fragments_falls_back_to_template() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("Excel.txt", "I run|Yo corro|run|corro\nWe eat|Comemos\n")?;

    let output = run_lessonreel(&env, &["fragments"])?;
    assert_eq!(output.exit_code, 0, "fragments failed: {}", output.stderr);

    assert_eq!(env.read("cantidadFragmentos.txt")?, "1\n0\n");
    Ok(())
}

#[test]
fn test_fragments_rejects_non_numeric_source() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("Cantidad_Sub_Frases.txt", "2\nmany\n")?;

    let output = run_lessonreel(&env, &["fragments"])?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("line 2"), "stderr: {}", output.stderr);
    Ok(())
}

#[test]
fn test_organize_renames_raw_pool() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("cantidadFragmentos.txt", "1\n\n")?;
    env.write("Audios_Sin_Nombres/1_en/ElevenLabs_2024-03-01T10_00_05.mp3", "second")?;
    env.write("Audios_Sin_Nombres/1_en/ElevenLabs_2024-03-01T10_00_01.mp3", "first")?;
    env.write("Audios_Sin_Nombres/2_en/ElevenLabs_2024-03-01T11_00_00.mp3", "even")?;
    env.write("Audios_Sin_Nombres/1_subs/ElevenLabs_2024-03-01T12_00_00.mp3", "frag")?;

    let output = run_lessonreel(&env, &["organize"])?;
    assert_eq!(output.exit_code, 0, "organize failed: {}", output.stderr);

    assert_eq!(env.read("Audios/Frases_English/en1.mp3")?, "first");
    assert_eq!(env.read("Audios/Frases_English/en3.mp3")?, "second");
    assert_eq!(env.read("Audios/Frases_English/en2.mp3")?, "even");
    assert_eq!(env.read("Audios/SubFrases_Frase1/en1fr1.mp3")?, "frag");
    Ok(())
}

#[test]
fn test_json_output_is_machine_readable() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("Cantidad_Sub_Frases.txt", "1\n2\n")?;

    let output = run_lessonreel(&env, &["--json", "fragments"])?;
    assert_eq!(output.exit_code, 0, "fragments failed: {}", output.stderr);

    let event: serde_json::Value = serde_json::from_str(output.stdout.trim())?;
    assert_eq!(event["code"], "lesson.fragments.written");
    assert_eq!(event["data"]["odd"], serde_json::json!([1]));
    assert_eq!(event["data"]["even"], serde_json::json!([2]));
    Ok(())
}

#[test]
fn test_unknown_project_fails_bootstrap() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write(
        "lessonreel.toml",
        "[layout]\ndata_root = \"projects\"\n",
    )?;

    let output = run_lessonreel(&env, &["bootstrap", "Vid0001"])?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("project folder"), "stderr: {}", output.stderr);
    Ok(())
}

#[test]
fn test_indices_written_by_hand() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_lessonreel(
        &env,
        &[
            "indices",
            "--english-only",
            "1,3",
            "--english-spanish",
            "2",
            "--phrases",
            "2",
            "--images",
            "3",
        ],
    )?;
    assert_eq!(output.exit_code, 0, "indices failed: {}", output.stderr);

    assert_eq!(env.read("IndicesImagenes.txt")?, "1,3\n2\n2\n3\n");
    Ok(())
}

#[test]
fn test_indices_rejects_images_beyond_total() -> Result<()> {
    let env = TestEnvironment::new()?;

    let output = run_lessonreel(
        &env,
        &["indices", "--english-only", "1,9", "--phrases", "1", "--images", "3"],
    )?;

    assert_eq!(output.exit_code, 1);
    assert!(output.stderr.contains("image number 9"), "stderr: {}", output.stderr);
    assert!(!env.exists("IndicesImagenes.txt"));
    Ok(())
}
