//! バッファ設定
//!
//! チャンクサイズ・再バランス方針・履歴上限などの調整値を保持する。
//! JSON から読み込み可能で、読み込み時に検証される。

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 葉ノードの既定最大文字数
pub const DEFAULT_MAX_CHUNK_SIZE: usize = 2048;

/// 低速編集とみなす既定しきい値（ミリ秒）
pub const DEFAULT_SLOW_EDIT_THRESHOLD_MS: u64 = 1;

/// 編集後の再バランス方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RebalancePolicy {
    /// 編集のたびに葉から木を再構築する
    Always,
    /// 木の深さが `max_depth` を超えた場合のみ再構築する
    DepthExceeds { max_depth: usize },
}

impl RebalancePolicy {
    /// 指定の深さの木を再構築すべきか
    pub fn should_rebalance(&self, depth: usize) -> bool {
        match self {
            RebalancePolicy::Always => true,
            RebalancePolicy::DepthExceeds { max_depth } => depth > *max_depth,
        }
    }
}

impl Default for RebalancePolicy {
    fn default() -> Self {
        RebalancePolicy::Always
    }
}

/// テキストバッファの設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BufferConfig {
    /// 葉ノードの最大文字数
    pub max_chunk_size: usize,
    /// 再バランス方針
    pub rebalance: RebalancePolicy,
    /// アンドゥ履歴の上限（None で無制限）
    pub history_limit: Option<usize>,
    /// 低速編集警告のしきい値（ミリ秒）
    pub slow_edit_threshold_ms: u64,
}

impl Default for BufferConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: DEFAULT_MAX_CHUNK_SIZE,
            rebalance: RebalancePolicy::default(),
            history_limit: None,
            slow_edit_threshold_ms: DEFAULT_SLOW_EDIT_THRESHOLD_MS,
        }
    }
}

impl BufferConfig {
    /// JSON文字列から設定を読み込む
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: BufferConfig = serde_json::from_str(json).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// JSONファイルから設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        log::debug!("loading buffer config from {}", path.as_ref().display());
        Self::from_json_str(&content)
    }

    /// 設定値を検証
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::invalid("max_chunk_size", self.max_chunk_size).into());
        }

        if let RebalancePolicy::DepthExceeds { max_depth } = self.rebalance {
            if max_depth == 0 {
                return Err(ConfigError::invalid("rebalance.max_depth", max_depth).into());
            }
        }

        if self.history_limit == Some(0) {
            return Err(ConfigError::invalid("history_limit", 0).into());
        }

        Ok(())
    }

    /// チャンクサイズを変更
    pub fn with_max_chunk_size(mut self, size: usize) -> Self {
        self.max_chunk_size = size;
        self
    }

    /// 再バランス方針を変更
    pub fn with_rebalance(mut self, policy: RebalancePolicy) -> Self {
        self.rebalance = policy;
        self
    }

    /// 履歴上限を変更
    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn slow_edit_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_edit_threshold_ms)
    }
}
