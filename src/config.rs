use crate::error::{Result, ScoreScanError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_SERVER_URL: &str = "SCORESCAN_SERVER_URL";
pub const ENV_TOKEN: &str = "SCORESCAN_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server_url: String,
    pub token: Option<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    u64::from(score_scan_common::poller::POLL_INTERVAL_MS)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8000".into(),
            token: None,
            poll_interval_ms: default_poll_interval(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| ScoreScanError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("score-scan").join("config.json"))
    }

    pub fn server_url(&self) -> String {
        // 環境変数を優先
        std::env::var(ENV_SERVER_URL).unwrap_or_else(|_| self.server_url.clone())
    }

    pub fn get_token(&self) -> Result<String> {
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            return Ok(token);
        }

        self.token.clone().ok_or(ScoreScanError::MissingToken)
    }

    pub fn set_token(&mut self, token: String) -> Result<()> {
        self.token = Some(token);
        self.save()
    }

    pub fn set_server_url(&mut self, url: String) -> Result<()> {
        self.server_url = url.trim_end_matches('/').to_string();
        self.save()
    }
}
