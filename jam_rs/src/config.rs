use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// セッション全体の設定
/// TOML で書いて、書かなかった項目は既定値になる
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JamConfig {
    /// バンドの持ち時間 (分)
    pub default_duration_minutes: u32,

    /// 自動生成でランダムに選ぶバンド人数の範囲
    pub min_band_size: usize,
    pub max_band_size: usize,

    /// 名前が尽きたときに番号付きの名前を試す回数
    pub name_retry_limit: usize,

    /// 自動バックアップの間隔 (秒)
    pub snapshot_interval_seconds: u64,

    /// バックアップを何世代残すか
    pub backup_history_limit: usize,

    /// キューにこれ以上バンドがあると警告する
    pub large_queue_warning: usize,

    /// 管理者用の共有 PIN
    pub admin_pin: String,

    /// バンド名の候補を差し替える場合に指定
    pub band_names: Option<Vec<String>>,
}

impl Default for JamConfig {
    fn default() -> Self {
        Self {
            default_duration_minutes: 6,
            min_band_size: 3,
            max_band_size: 6,
            name_retry_limit: 20,
            snapshot_interval_seconds: 5 * 60,
            backup_history_limit: 12,
            large_queue_warning: 15,
            admin_pin: "admin123".to_string(),
            band_names: None,
        }
    }
}

impl JamConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        // ドラム、ベース、コード楽器の 3 人は必ず入る
        if self.min_band_size < 3 || self.max_band_size < self.min_band_size {
            return Err(ConfigError::InvalidBandSize {
                min: self.min_band_size,
                max: self.max_band_size,
            });
        }

        Ok(())
    }

    pub fn check_pin(&self, pin: &str) -> bool {
        !pin.is_empty() && pin == self.admin_pin
    }
}
