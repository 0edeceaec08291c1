//! Speech synthesis behind a capability trait.
//!
//! One implementation per platform; [`for_current_platform`] picks it once at startup. All of
//! them shell out to the system speech tool and pass the text on stdin.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::Context as _;
use tracing::info;

use crate::foundation::core::ensure_parent_dir;
use crate::foundation::error::{ReelError, ReelResult};

/// Converts narration text into an audio file.
pub trait NarrationProvider {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Extension (without dot) of the files this provider writes.
    fn file_extension(&self) -> &'static str;

    /// Write speech for `text` to `out_path` and return the written path.
    fn synthesize(&self, text: &str, out_path: &Path) -> ReelResult<PathBuf>;
}

/// macOS `say`.
#[derive(Clone, Debug, Default)]
pub struct SayNarrator {
    pub voice: Option<String>,
}

impl SayNarrator {
    pub fn command(&self, out_path: &Path) -> Command {
        let mut cmd = Command::new("say");
        if let Some(voice) = &self.voice {
            cmd.args(["-v", voice]);
        }
        cmd.arg("-o").arg(out_path).args(["-f", "-"]);
        cmd
    }
}

impl NarrationProvider for SayNarrator {
    fn name(&self) -> &'static str {
        "say"
    }

    fn file_extension(&self) -> &'static str {
        "aiff"
    }

    fn synthesize(&self, text: &str, out_path: &Path) -> ReelResult<PathBuf> {
        run_speech_command(self.name(), self.command(out_path), text, out_path)
    }
}

/// Linux `espeak` (or a compatible binary such as `espeak-ng`).
#[derive(Clone, Debug)]
pub struct EspeakNarrator {
    pub program: String,
    pub voice: Option<String>,
}

impl Default for EspeakNarrator {
    fn default() -> Self {
        Self {
            program: "espeak".to_string(),
            voice: None,
        }
    }
}

impl EspeakNarrator {
    pub fn command(&self, out_path: &Path) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(voice) = &self.voice {
            cmd.args(["-v", voice]);
        }
        cmd.arg("-w").arg(out_path).arg("--stdin");
        cmd
    }
}

impl NarrationProvider for EspeakNarrator {
    fn name(&self) -> &'static str {
        "espeak"
    }

    fn file_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, text: &str, out_path: &Path) -> ReelResult<PathBuf> {
        run_speech_command(self.name(), self.command(out_path), text, out_path)
    }
}

/// Windows PowerShell with `System.Speech`.
#[derive(Clone, Debug, Default)]
pub struct SapiNarrator;

impl SapiNarrator {
    pub fn command(&self, out_path: &Path) -> Command {
        let quoted = out_path.to_string_lossy().replace('\'', "''");
        let script = format!(
            "Add-Type -AssemblyName System.Speech; \
             $s = New-Object System.Speech.Synthesis.SpeechSynthesizer; \
             $s.SetOutputToWaveFile('{quoted}'); \
             $s.Speak([Console]::In.ReadToEnd()); \
             $s.Dispose()"
        );
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command"])
            .arg(script);
        cmd
    }
}

impl NarrationProvider for SapiNarrator {
    fn name(&self) -> &'static str {
        "sapi"
    }

    fn file_extension(&self) -> &'static str {
        "wav"
    }

    fn synthesize(&self, text: &str, out_path: &Path) -> ReelResult<PathBuf> {
        run_speech_command(self.name(), self.command(out_path), text, out_path)
    }
}

/// The speech provider for the platform this binary was built for.
pub fn for_current_platform() -> ReelResult<Box<dyn NarrationProvider>> {
    if cfg!(target_os = "macos") {
        Ok(Box::new(SayNarrator::default()))
    } else if cfg!(target_os = "windows") {
        Ok(Box::new(SapiNarrator))
    } else if cfg!(unix) {
        Ok(Box::new(EspeakNarrator::default()))
    } else {
        Err(ReelError::narration(
            "no speech synthesis tool is known for this platform",
        ))
    }
}

fn run_speech_command(
    name: &str,
    mut cmd: Command,
    text: &str,
    out_path: &Path,
) -> ReelResult<PathBuf> {
    if text.trim().is_empty() {
        return Err(ReelError::validation("narration text is empty"));
    }
    ensure_parent_dir(out_path)?;
    if out_path.exists() {
        std::fs::remove_file(out_path)
            .with_context(|| format!("remove stale narration '{}'", out_path.display()))?;
    }

    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ReelError::narration(format!("failed to spawn {name}: {e}")))?;
    {
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ReelError::narration(format!("failed to open {name} stdin")))?;
        stdin
            .write_all(text.as_bytes())
            .map_err(|e| ReelError::narration(format!("failed to write text to {name}: {e}")))?;
    }
    let output = child
        .wait_with_output()
        .map_err(|e| ReelError::narration(format!("failed to wait for {name}: {e}")))?;

    if !output.status.success() {
        return Err(ReelError::narration(format!(
            "{name} exited with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    if !out_path.is_file() {
        return Err(ReelError::narration(format!(
            "{name} reported success but '{}' was not written",
            out_path.display()
        )));
    }

    info!(provider = name, out = %out_path.display(), "narration written");
    Ok(out_path.to_path_buf())
}

#[cfg(test)]
#[path = "../../tests/unit/narration/mod.rs"]
mod tests;
