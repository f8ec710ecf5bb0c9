use std::sync::Arc;

use thiserror::Error;

/// YouTube連携のエラー
///
/// 同じエラーをイベントとして通知しつつ呼び出し元にも返すため `Clone` を実装する。
#[derive(Error, Debug, Clone)]
pub enum YouTubeError {
    #[error("HTTP request failed: {0}")]
    HttpError(Arc<reqwest::Error>),

    /// 200以外のレスポンス（ボディはそのまま保持）
    #[error("API returned status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Can not find live.")]
    LiveNotFound,

    #[error("Live ids are not valid.")]
    LiveIdsInvalid,

    #[error("Can not find chat for stream {0}")]
    ChatNotFound(String),

    #[error("No chat could be resolved for any live stream")]
    NoChatsResolved,

    #[error("Chat id is invalid.")]
    ChatIdsInvalid,

    #[error("Poller is already running")]
    PollerAlreadyRunning,

    #[error("Polling interval must be greater than zero")]
    InvalidInterval,
}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeError::HttpError(Arc::new(err))
    }
}

impl From<YouTubeError> for String {
    fn from(err: YouTubeError) -> String {
        err.to_string()
    }
}
