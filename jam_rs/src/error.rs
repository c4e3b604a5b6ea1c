use std::fmt;

use thiserror::Error;

use crate::{BandId, Instrument, UserId};

/// バンド成立に必須の担当
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreRole {
    Drums,
    Bass,
    // ギターかキーボード
    Harmonic,
}

impl fmt::Display for CoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CoreRole::Drums => "drums",
            CoreRole::Bass => "bass",
            CoreRole::Harmonic => "guitar or keys",
        };
        f.write_str(label)
    }
}

/// バンド生成の失敗
/// どちらも名簿を見直せば再実行できる
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerateError {
    #[error("at least 3 active musicians are required, found {active}")]
    InsufficientRoster { active: usize },

    #[error("no active musician available for {0}")]
    CoreRoleUnfillable(CoreRole),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("band {0} is not in the queue")]
    BandNotFound(BandId),

    #[error("user {user} cannot play {role}")]
    RoleNotPlayable { user: UserId, role: Instrument },

    #[error("queue index {index} is out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },
}

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("storage i/o failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed json: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid band size range {min}..={max}")]
    InvalidBandSize { min: usize, max: usize },
}
