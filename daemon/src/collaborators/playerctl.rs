use super::{MediaCapabilities, MediaPlayer, PlayOutcome};
use anyhow::{Context, Result};
use std::process::Command;
use tracing::{debug, info, warn};

const VOLUME_STEP: &str = "0.1";

/// MPRIS control through the `playerctl` binary.
///
/// Transport controls and player switching only: playerctl cannot search a
/// library, so `play_any` always reports nothing found.
pub struct PlayerctlMedia {
    player: Option<String>,
}

impl PlayerctlMedia {
    pub fn new(player: Option<String>) -> Self {
        info!("Using playerctl media control (player: {:?})", player);
        Self { player }
    }

    fn args(&self, action: &[&str]) -> Vec<String> {
        let mut args = Vec::with_capacity(action.len() + 1);
        if let Some(player) = &self.player {
            args.push(format!("--player={}", player));
        }
        args.extend(action.iter().map(|a| a.to_string()));
        args
    }

    fn run(&self, action: &[&str]) -> Result<String> {
        let args = self.args(action);
        debug!("playerctl {}", args.join(" "));

        let output = Command::new("playerctl")
            .args(&args)
            .output()
            .context("Failed to run playerctl")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow::anyhow!("playerctl {:?} failed: {}", action, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    fn list_players(&self) -> Result<Vec<String>> {
        let output = Command::new("playerctl")
            .arg("--list-all")
            .output()
            .context("Failed to run playerctl")?;
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }
}

impl MediaPlayer for PlayerctlMedia {
    fn play_pause(&mut self) -> Result<()> {
        self.run(&["play-pause"]).map(|_| ())
    }

    fn stop(&mut self) -> Result<()> {
        self.run(&["stop"]).map(|_| ())
    }

    fn next_track(&mut self) -> Result<()> {
        self.run(&["next"]).map(|_| ())
    }

    fn previous_track(&mut self) -> Result<()> {
        self.run(&["previous"]).map(|_| ())
    }

    fn volume_up(&mut self) -> Result<()> {
        let step = format!("{}+", VOLUME_STEP);
        self.run(&["volume", step.as_str()]).map(|_| ())
    }

    fn volume_down(&mut self) -> Result<()> {
        let step = format!("{}-", VOLUME_STEP);
        self.run(&["volume", step.as_str()]).map(|_| ())
    }

    fn whats_playing(&mut self) -> Result<Option<String>> {
        let now = self.run(&["metadata", "--format", "{{ title }} by {{ artist }}"])?;
        Ok(Some(now).filter(|s| !s.is_empty() && s != "by"))
    }

    fn play_any(&mut self, query: &str) -> Result<PlayOutcome> {
        debug!("playerctl cannot search for '{}'", query);
        Ok(PlayOutcome::NotFound)
    }

    fn capabilities(&self) -> MediaCapabilities {
        MediaCapabilities {
            switch_player: true,
            ..MediaCapabilities::default()
        }
    }

    fn switch_player(&mut self, name: &str) -> Result<bool> {
        let players = self.list_players()?;
        let Some(found) = players
            .iter()
            .find(|p| p.to_lowercase().starts_with(&name.to_lowercase()))
        else {
            warn!("No player named '{}' among {:?}", name, players);
            return Ok(false);
        };

        info!("Switching media player to {}", found);
        self.player = Some(found.clone());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_without_player() {
        let media = PlayerctlMedia::new(None);
        assert_eq!(media.args(&["next"]), vec!["next".to_string()]);
    }

    #[test]
    fn test_args_with_player() {
        let media = PlayerctlMedia::new(Some("spotify".to_string()));
        assert_eq!(
            media.args(&["volume", "0.1+"]),
            vec![
                "--player=spotify".to_string(),
                "volume".to_string(),
                "0.1+".to_string()
            ]
        );
    }

    #[test]
    fn test_capabilities_only_switch_player() {
        let caps = PlayerctlMedia::new(None).capabilities();
        assert!(caps.switch_player);
        assert!(!caps.play_random);
        assert!(!caps.library_artists);
    }

    #[test]
    fn test_play_any_reports_not_found() {
        let mut media = PlayerctlMedia::new(None);
        assert_eq!(media.play_any("abba").unwrap(), PlayOutcome::NotFound);
    }
}
