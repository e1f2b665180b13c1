//! Narration: pick a voice and render text to an audio file.
//!
//! The speech engine itself sits behind [`SpeechBackend`]; this module owns
//! the parts that do not depend on which engine is installed:
//!
//! 1. **Voice selection**: the backend exposes an ordered voice table and the
//!    narrator maps onto it by position (male → 0, female → 1). A table that
//!    is too short is a configuration error, not an index panic.
//! 2. **Atomic output**: the backend renders into a hidden staging file next
//!    to the target, which is renamed over `output_path` only after a
//!    non-empty render. Failure, timeout, or cancellation drops the staging
//!    file, so the target is either the complete new audio or untouched.
//! 3. **Bounded duration**: rendering runs under `tokio::time::timeout`.

use crate::config::NarratorGender;
use crate::error::Pdf2AudioError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Mode of the written audio file on unix.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

/// One entry of a speech backend's voice table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    /// Identifier passed back to the backend when rendering.
    pub id: String,
    /// Human-readable label for logs.
    pub name: String,
}

impl Voice {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A text-to-speech engine that can write an MP3 file.
///
/// Each call is an independent session: implementations must not keep
/// engine state between `render` calls.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Short name used in errors and logs (e.g. `"espeak-ng"`).
    fn name(&self) -> &str;

    /// The ordered voice table. Fails if the engine is not usable.
    async fn voices(&self) -> Result<Vec<Voice>, Pdf2AudioError>;

    /// Render `text` with `voice` into an MP3 at `output`, overwriting it.
    async fn render(&self, text: &str, voice: &Voice, output: &Path) -> Result<(), Pdf2AudioError>;
}

/// Resolve the narrator's entry in the voice table.
pub fn select_voice(voices: &[Voice], gender: NarratorGender) -> Result<&Voice, Pdf2AudioError> {
    let index = gender.voice_index();
    voices
        .get(index)
        .ok_or_else(|| Pdf2AudioError::VoiceTableTooSmall {
            gender: gender.to_string(),
            index,
            available: voices.len(),
        })
}

/// Render `text` to `output_path` with the narrator's voice.
///
/// Creates the parent directory if needed and overwrites any existing file.
pub async fn synthesize(
    backend: &dyn SpeechBackend,
    text: &str,
    gender: NarratorGender,
    output_path: &Path,
    timeout: Duration,
) -> Result<(), Pdf2AudioError> {
    let write_err = |source: std::io::Error| Pdf2AudioError::OutputWriteFailed {
        path: output_path.to_path_buf(),
        source,
    };

    let voices = backend.voices().await?;
    let voice = select_voice(&voices, gender)?;
    info!(
        "Narrating {} chars with {} voice '{}' ({})",
        text.chars().count(),
        gender,
        voice.name,
        backend.name()
    );

    let parent = match output_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    tokio::fs::create_dir_all(parent).await.map_err(write_err)?;

    let staging = tempfile::Builder::new()
        .prefix(".pdf2audio-")
        .suffix(".part")
        .tempfile_in(parent)
        .map_err(write_err)?
        .into_temp_path();

    let start = Instant::now();
    match tokio::time::timeout(timeout, backend.render(text, voice, &staging)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(
                "{} did not finish within {}s, cancelled",
                backend.name(),
                timeout.as_secs()
            );
            return Err(Pdf2AudioError::SynthesisTimeout {
                secs: timeout.as_secs(),
            });
        }
    }

    let written = tokio::fs::metadata(&staging).await.map_err(write_err)?.len();
    if written == 0 {
        return Err(Pdf2AudioError::SynthesisFailed {
            detail: format!("{} produced an empty audio file", backend.name()),
        });
    }
    debug!(
        "Rendered {} bytes in {}ms",
        written,
        start.elapsed().as_millis()
    );

    // Staging files are created 0600.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&staging, std::fs::Permissions::from_mode(OUTPUT_MODE))
            .await
            .map_err(write_err)?;
    }

    staging
        .persist(output_path)
        .map_err(|e| write_err(e.error))?;

    info!("Audio saved as {}", output_path.display());
    Ok(())
}
