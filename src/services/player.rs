//! External audio player invocation

use std::{path::Path, process::Stdio, time::Duration};

use anyhow::{bail, Context, Result};
use tokio::{process::Command, time::timeout};
use tracing::debug;

/// Command line used to play a sound file; the file path is appended last
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerCommand {
    program: String,
    args: Vec<String>,
}

impl PlayerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// Split a whitespace-separated command line such as `ffplay -nodisp -autoexit`
    pub fn parse(cmdline: &str) -> Option<Self> {
        let mut words = cmdline.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(Self::new(program, words.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Play `path`, stopping the player once `budget` has elapsed.
    ///
    /// Without a budget the player runs until it exits on its own.
    pub async fn play(&self, path: &Path, budget: Option<Duration>) -> Result<()> {
        debug!("Playing {} with {}", path.display(), self.program);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("Failed to execute {}", self.program))?;

        let status = match budget {
            Some(budget) => match timeout(budget, child.wait()).await {
                Ok(status) => status,
                Err(_) => {
                    debug!("Player still running after {:?}, stopping it", budget);
                    child.kill().await.context("Failed to stop player")?;
                    return Ok(());
                }
            },
            None => child.wait().await,
        };

        let status = status.context("Failed to wait for player")?;
        if !status.success() {
            bail!("{} exited with {}", self.program, status);
        }
        Ok(())
    }
}
