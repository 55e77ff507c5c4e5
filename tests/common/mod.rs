use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

pub struct TestEnvironment {
    temp_dir: TempDir,
}

pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl TestEnvironment {
    pub fn new() -> Result<Self> {
        Ok(Self {
            temp_dir: tempfile::tempdir()?,
        })
    }

    /// Workspace root handed to `--workspace`
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        Ok(fs::read_to_string(self.path().join(relative))?)
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }
}

/// Run the built binary against the environment's workspace.
pub fn run_lessonreel(env: &TestEnvironment, args: &[&str]) -> Result<CommandOutput> {
    let output = Command::new(env!("CARGO_BIN_EXE_lessonreel"))
        .arg("--workspace")
        .arg(env.path())
        .args(args)
        .output()?;

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        exit_code: output.status.code().unwrap_or(-1),
    })
}
