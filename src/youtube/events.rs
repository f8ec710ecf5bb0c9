use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::errors::YouTubeError;

/// LiveChatが発行するイベント
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// エラー発生（解決・取得は停止せず、そのまま継続する）
    Error(YouTubeError),

    /// 少なくとも1つのチャットIDが解決できた
    Ready,

    /// チャットストリーム1つ分のレスポンス（受信したJSONのまま、重複排除前）
    Json { live_chat_id: String, response: Value },

    /// 新着メッセージ1件（レスポンスの `items` 要素そのまま）
    ///
    /// 型付きで扱う場合は `LiveChatMessageItem::from_value` を使う。
    Message { live_chat_id: String, item: Value },
}

/// イベントコールバックを共有するためのラッパー
#[derive(Clone)]
pub struct EventEmitter {
    callback: Arc<dyn Fn(ChatEvent) + Send + Sync>,
}

impl EventEmitter {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(ChatEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
        }
    }

    pub fn emit(&self, event: ChatEvent) {
        (self.callback)(event);
    }

    /// エラーをログに残してから通知し、呼び出し元に返せるよう同じ値を返す
    pub fn error(&self, err: YouTubeError) -> YouTubeError {
        log::warn!("{}", err);
        self.emit(ChatEvent::Error(err.clone()));
        err
    }
}

impl fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter").finish_non_exhaustive()
    }
}
