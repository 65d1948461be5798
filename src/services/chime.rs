//! Chime playback with a synthesized fallback

use std::{
    fmt,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use super::{
    player::PlayerCommand,
    synth::{encode_wav, synthesize_chime, wav_duration, DEFAULT_CHIME_MS, SAMPLE_RATE},
};

/// Asset base name requested when a timer boundary is reached
pub const CHIME_BASE_NAME: &str = "chime";

/// Tried in order; the first asset that plays wins
const ASSET_EXTENSIONS: [&str; 3] = ["mp3", "wav", "ogg"];
const PLAYBACK_TAIL: Duration = Duration::from_millis(50);
const SYNTH_FILE_NAME: &str = "chime-timer-synth.wav";

/// Something that can sound the chime.
///
/// `play` must return immediately; playback happens in the background and
/// its outcome is never reported back.
pub trait ChimeRenderer: Send + Sync + fmt::Debug {
    fn play(&self, base_name: &str);
}

/// Plays bundled chime assets through an external player
#[derive(Debug, Clone)]
pub struct ChimePlayer {
    asset_dir: PathBuf,
    scratch_dir: PathBuf,
    extensions: Vec<String>,
    player: PlayerCommand,
}

impl ChimePlayer {
    pub fn new(asset_dir: impl Into<PathBuf>, player: PlayerCommand) -> Self {
        Self {
            asset_dir: asset_dir.into(),
            scratch_dir: std::env::temp_dir(),
            extensions: ASSET_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            player,
        }
    }

    /// Directory where the synthesized fallback is written before playback
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    /// Asset formats the player can decode, in order of preference
    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Play `<base_name>.<ext>` from the asset directory for the first
    /// configured extension that plays, or the synthesized chime
    pub async fn play_custom_or_fallback(&self, base_name: &str) {
        for ext in &self.extensions {
            let path = self.asset_dir.join(format!("{}.{}", base_name, ext));
            match self.play_asset(&path).await {
                Ok(()) => {
                    debug!("Chime played from {}", path.display());
                    return;
                }
                Err(e) => debug!("Chime asset {} not played: {:#}", path.display(), e),
            }
        }

        info!("No chime asset for '{}', playing synthesized chime", base_name);
        if let Err(e) = self.play_synth().await {
            warn!("Synthesized chime failed: {:#}", e);
        }
    }

    async fn play_asset(&self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        // Assets of unknown length play until the player exits
        let budget = wav_duration(&bytes)
            .filter(|d| !d.is_zero())
            .map(|d| d + PLAYBACK_TAIL);
        self.player.play(path, budget).await
    }

    async fn play_synth(&self) -> Result<()> {
        let samples = synthesize_chime(DEFAULT_CHIME_MS, SAMPLE_RATE);
        let wav = encode_wav(&samples, SAMPLE_RATE);
        let path = self.scratch_dir.join(SYNTH_FILE_NAME);
        tokio::fs::write(&path, wav)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        let budget = Duration::from_millis(u64::from(DEFAULT_CHIME_MS)) + PLAYBACK_TAIL;
        self.player.play(&path, Some(budget)).await
    }
}

impl ChimeRenderer for ChimePlayer {
    fn play(&self, base_name: &str) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("No async runtime available, chime skipped");
            return;
        };
        let player = self.clone();
        let base_name = base_name.to_string();
        runtime.spawn(async move {
            player.play_custom_or_fallback(&base_name).await;
        });
    }
}
