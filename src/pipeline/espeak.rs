//! Default speech backend: espeak-ng for speech, ffmpeg for MP3 encoding.
//!
//! Both are driven as child processes through `tokio::process` with
//! `kill_on_drop`, so a synthesis timeout in [`crate::pipeline::narrate`]
//! also terminates whichever program is still running.
//!
//! Text is fed to espeak-ng on stdin rather than argv; a few hundred pages
//! of text exceeds the argument length limit on most platforms.

use crate::error::Pdf2AudioError;
use crate::pipeline::narrate::{SpeechBackend, Voice};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// espeak-ng variants used when no voice table is configured.
///
/// Order matters: entry 0 narrates as male, entry 1 as female.
pub const DEFAULT_VOICES: [&str; 2] = ["en+m3", "en+f3"];

/// espeak-ng's own default speaking rate, in words per minute.
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 175;

/// Speech backend that shells out to espeak-ng and ffmpeg.
#[derive(Debug, Clone)]
pub struct EspeakBackend {
    /// espeak-ng executable. Default: `espeak-ng` on `PATH`.
    pub program: PathBuf,
    /// MP3 encoder executable (ffmpeg CLI). Default: `ffmpeg` on `PATH`.
    pub encoder: PathBuf,
    /// Ordered voice table (espeak-ng voice names, `+variant` allowed).
    pub voice_table: Vec<String>,
    /// Speaking rate in words per minute.
    pub words_per_minute: u32,
}

impl Default for EspeakBackend {
    fn default() -> Self {
        Self {
            program: PathBuf::from("espeak-ng"),
            encoder: PathBuf::from("ffmpeg"),
            voice_table: DEFAULT_VOICES.iter().map(|v| v.to_string()).collect(),
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
        }
    }
}

impl EspeakBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn encoder(mut self, encoder: impl Into<PathBuf>) -> Self {
        self.encoder = encoder.into();
        self
    }

    pub fn voice_table<I, S>(mut self, voices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.voice_table = voices.into_iter().map(Into::into).collect();
        self
    }

    pub fn words_per_minute(mut self, wpm: u32) -> Self {
        self.words_per_minute = wpm.clamp(80, 450);
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    async fn speak_to_wav(&self, text: &str, voice: &Voice, wav: &Path) -> Result<(), Pdf2AudioError> {
        let mut child = Command::new(&self.program)
            .arg("-v")
            .arg(&voice.id)
            .arg("-s")
            .arg(self.words_per_minute.to_string())
            .arg("-w")
            .arg(wav)
            .arg("--stdin")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(&self.program_name(), e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| Pdf2AudioError::SynthesisFailed {
                    detail: format!("writing text to {}: {}", self.program_name(), e),
                })?;
            // Dropping stdin signals end of input.
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Pdf2AudioError::SynthesisFailed {
                detail: format!("{}: {}", self.program_name(), e),
            })?;
        check_status(&self.program_name(), &output)
    }

    async fn encode_mp3(&self, wav: &Path, mp3: &Path) -> Result<(), Pdf2AudioError> {
        let output = Command::new(&self.encoder)
            .arg("-y")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(wav)
            .arg("-codec:a")
            .arg("libmp3lame")
            .arg("-q:a")
            .arg("4")
            // The staging path has no .mp3 extension to infer the muxer from.
            .arg("-f")
            .arg("mp3")
            .arg(mp3)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&self.encoder.display().to_string(), e))?;
        check_status(&self.encoder.display().to_string(), &output)
    }
}

#[async_trait]
impl SpeechBackend for EspeakBackend {
    fn name(&self) -> &str {
        "espeak-ng"
    }

    async fn voices(&self) -> Result<Vec<Voice>, Pdf2AudioError> {
        let probe = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| spawn_error(&self.program_name(), e))?;
        check_status(&self.program_name(), &probe).map_err(|e| {
            Pdf2AudioError::BackendUnavailable {
                backend: self.program_name(),
                detail: e.to_string(),
            }
        })?;
        debug!("{}", String::from_utf8_lossy(&probe.stdout).trim());

        Ok(self
            .voice_table
            .iter()
            .map(|id| Voice::new(id.clone(), describe_voice(id)))
            .collect())
    }

    async fn render(&self, text: &str, voice: &Voice, output: &Path) -> Result<(), Pdf2AudioError> {
        let wav = tempfile::Builder::new()
            .prefix("pdf2audio-")
            .suffix(".wav")
            .tempfile()
            .map_err(|e| Pdf2AudioError::Internal(format!("tempfile: {e}")))?
            .into_temp_path();

        // `wav` is deleted on drop, whichever step fails.
        self.speak_to_wav(text, voice, &wav).await?;
        self.encode_mp3(&wav, output).await
    }
}

/// Human-readable label for an espeak-ng voice id such as `en+f3`.
fn describe_voice(id: &str) -> String {
    match id.split_once('+') {
        Some((lang, variant)) => {
            let kind = match variant.chars().next() {
                Some('m') => "male",
                Some('f') => "female",
                _ => "variant",
            };
            format!("{lang} ({kind} {variant})")
        }
        None => id.to_string(),
    }
}

fn spawn_error(program: &str, e: std::io::Error) -> Pdf2AudioError {
    let detail = if e.kind() == ErrorKind::NotFound {
        format!("'{program}' not found on PATH; install it or pass its location")
    } else {
        e.to_string()
    };
    Pdf2AudioError::BackendUnavailable {
        backend: program.to_string(),
        detail,
    }
}

fn check_status(program: &str, output: &std::process::Output) -> Result<(), Pdf2AudioError> {
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    Err(Pdf2AudioError::SynthesisFailed {
        detail: format!("{program} exited with {}: {}", output.status, stderr.trim()),
    })
}
