// =============================================================================
// 共通設定・定数モジュール
// =============================================================================
// クライアント全体で使用する共通の設定値・定数を定義
// =============================================================================

use std::time::Duration;

/// YouTube Data API v3 のベースURL
pub const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// HTTPリクエストのデフォルトタイムアウト（秒）
///
/// ネットワーク状況が悪い場合でも適切にタイムアウトし、
/// ポーリングサイクルが止まらないようにする。
pub const HTTP_TIMEOUT_SECS: u64 = 10;

/// liveChatMessages.list の1回あたり最大取得件数（APIの上限値）
pub const MAX_CHAT_RESULTS: u32 = 2000;

/// HTTPリクエストのデフォルトタイムアウト（Duration）
pub fn http_timeout() -> Duration {
    Duration::from_secs(HTTP_TIMEOUT_SECS)
}

/// 既読ウォーターマークの適用範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WatermarkScope {
    /// 全チャットストリームで1つのウォーターマークを共有する
    #[default]
    Shared,
    /// チャットストリームごとに個別のウォーターマークを持つ
    PerStream,
}

/// LiveChatの設定
#[derive(Debug, Clone)]
pub struct LiveChatConfig {
    /// APIのベースURL（テストやプロキシ経由で差し替え可能）
    pub api_base: String,
    pub http_timeout: Duration,
    pub max_results: u32,
    pub watermark_scope: WatermarkScope,
}

impl Default for LiveChatConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            http_timeout: http_timeout(),
            max_results: MAX_CHAT_RESULTS,
            watermark_scope: WatermarkScope::default(),
        }
    }
}

impl LiveChatConfig {
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        // 末尾のスラッシュはURL組み立て時に二重になるため除去
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// 最大取得件数を設定（1〜2000に丸める）
    pub fn with_max_results(mut self, max_results: u32) -> Self {
        self.max_results = max_results.clamp(1, MAX_CHAT_RESULTS);
        self
    }

    pub fn with_watermark_scope(mut self, scope: WatermarkScope) -> Self {
        self.watermark_scope = scope;
        self
    }
}
