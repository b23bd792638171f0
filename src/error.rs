//! エラーハンドリング
//!
//! バッファ操作そのものはエラーを返さない（範囲外の位置はすべてクランプされる）。
//! 回復可能なエラーは設定の読み込み・検証の境界にのみ存在する。
//! 内部不変条件の違反は構築時の欠陥として即座に panic する。

use thiserror::Error;

/// クレート全体のエラー型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RopebufError {
    /// 設定エラー
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IOエラー
    #[error("IO error: {message}")]
    Io { message: String },
}

/// 設定固有のエラー
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Failed to parse configuration: {message}")]
    Parse { message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: &str, value: impl ToString) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }
    }
}

// std::io::Error から RopebufError への変換
impl From<std::io::Error> for RopebufError {
    fn from(error: std::io::Error) -> Self {
        RopebufError::Io {
            message: error.to_string(),
        }
    }
}

// serde_json::Error から ConfigError への変換
impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse {
            message: error.to_string(),
        }
    }
}

/// プロジェクト標準のResult型
pub type Result<T> = std::result::Result<T, RopebufError>;
