//! Configuration and CLI argument handling

use std::path::PathBuf;

use clap::Parser;

use crate::{
    languages::Locale,
    services::PlayerCommand,
    utils::device_locale,
};

/// CLI argument parsing structure
#[derive(Parser, Debug)]
#[command(name = "chime-timer")]
#[command(about = "A count-down/count-up timer with a chime, driven over HTTP")]
#[command(version = "1.0.0")]
pub struct Config {
    /// Port to bind the server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// JSON file holding the persisted settings
    #[arg(short, long, default_value = "chime-timer.json")]
    pub settings: PathBuf,

    /// Directory searched for chime.mp3, chime.wav or chime.ogg
    #[arg(short, long, default_value = "assets")]
    pub assets: PathBuf,

    /// Command used to play sound files; the file path is appended
    #[arg(long, default_value = "ffplay -nodisp -autoexit -loglevel quiet")]
    pub player: String,

    /// Comma-separated chime formats the player can decode, most preferred first
    /// (e.g. "wav" with `--player "aplay -q"`)
    #[arg(long, default_value = "mp3,wav,ogg")]
    pub asset_formats: String,

    /// Locale used when no language has been picked (e.g. "pt_BR.UTF-8");
    /// defaults to the environment
    #[arg(long)]
    pub locale: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    /// The configured player, or an error if the command line is blank
    pub fn player_command(&self) -> anyhow::Result<PlayerCommand> {
        PlayerCommand::parse(&self.player)
            .ok_or_else(|| anyhow::anyhow!("--player must name a program"))
    }

    /// Asset extensions from `--asset-formats`, normalized to lowercase
    pub fn asset_formats(&self) -> Vec<String> {
        self.asset_formats
            .split(',')
            .map(|f| f.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|f| !f.is_empty())
            .collect()
    }

    /// Locale from `--locale`, falling back to the environment
    pub fn device_locale(&self) -> Locale {
        match &self.locale {
            Some(raw) => Locale::parse(raw),
            None => device_locale(),
        }
    }
}
