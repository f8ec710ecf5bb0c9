use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::watch;

use super::errors::YouTubeError;
use crate::config::WatermarkScope;

/// チャンネル → ライブ → チャットID の解決状態
#[derive(Debug, Clone, Default)]
pub enum ResolutionState {
    /// 未解決
    #[default]
    Unresolved,
    /// ライブ動画IDまで解決済み
    BroadcastsResolved { live_ids: Vec<String> },
    /// チャットIDまで解決済み（chat_idsは空にならない）
    ChatsResolved {
        live_ids: Vec<String>,
        chat_ids: Vec<String>,
    },
    /// 解決失敗（再解決するまでポーリング不可）
    Failed(YouTubeError),
}

impl ResolutionState {
    pub fn live_ids(&self) -> Option<&[String]> {
        match self {
            Self::BroadcastsResolved { live_ids } | Self::ChatsResolved { live_ids, .. } => {
                Some(live_ids)
            }
            _ => None,
        }
    }

    pub fn chat_ids(&self) -> Option<&[String]> {
        match self {
            Self::ChatsResolved { chat_ids, .. } => Some(chat_ids),
            _ => None,
        }
    }

    /// これ以上状態が進まない（成功または失敗）かどうか
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::ChatsResolved { .. } | Self::Failed(_))
    }
}

/// 解決状態の共有ハンドル
///
/// watchチャネルで保持し、`wait_settled` で解決完了を待てるようにする。
#[derive(Debug, Clone)]
pub struct ResolutionStateManager {
    sender: Arc<watch::Sender<ResolutionState>>,
}

impl ResolutionStateManager {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ResolutionState::default());
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 現在の状態を取得
    pub fn get(&self) -> ResolutionState {
        self.sender.borrow().clone()
    }

    pub fn set(&self, state: ResolutionState) {
        log::debug!("Resolution state -> {:?}", state);
        self.sender.send_replace(state);
    }

    pub fn chat_ids(&self) -> Option<Vec<String>> {
        self.sender.borrow().chat_ids().map(|ids| ids.to_vec())
    }

    pub fn live_ids(&self) -> Option<Vec<String>> {
        self.sender.borrow().live_ids().map(|ids| ids.to_vec())
    }

    /// ChatsResolved または Failed になるまで待機
    pub async fn wait_settled(&self) -> ResolutionState {
        let mut receiver = self.sender.subscribe();
        // 借用中のRefを文末の一時値として残さない
        let settled = match receiver.wait_for(|state| state.is_settled()).await {
            Ok(state) => (*state).clone(),
            // senderは自身が保持しているため閉じることはない
            Err(_) => self.get(),
        };
        settled
    }
}

impl Default for ResolutionStateManager {
    fn default() -> Self {
        Self::new()
    }
}

/// ポーラーの状態
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PollerState {
    #[default]
    Idle,
    Polling,
}

/// 既読ウォーターマーク（publishedAtのミリ秒）
///
/// ウォーターマーク以前のメッセージは既読扱いで抑制する。
#[derive(Debug, Clone, Default)]
pub struct Watermark {
    scope: WatermarkScope,
    shared: Option<i64>,
    per_stream: HashMap<String, i64>,
}

impl Watermark {
    pub fn new(scope: WatermarkScope) -> Self {
        Self {
            scope,
            shared: None,
            per_stream: HashMap::new(),
        }
    }

    /// メッセージ時刻を記録し、新着ならtrueを返す
    ///
    /// 時刻がウォーターマークより厳密に大きい場合のみ新着とし、
    /// ウォーターマークをその時刻まで進める。
    pub fn observe(&mut self, live_chat_id: &str, published_at_millis: i64) -> bool {
        let last = match self.scope {
            WatermarkScope::Shared => self.shared,
            WatermarkScope::PerStream => self.per_stream.get(live_chat_id).copied(),
        };

        if last.is_some_and(|last| published_at_millis <= last) {
            return false;
        }

        match self.scope {
            WatermarkScope::Shared => self.shared = Some(published_at_millis),
            WatermarkScope::PerStream => {
                self.per_stream
                    .insert(live_chat_id.to_string(), published_at_millis);
            }
        }
        true
    }

    /// 指定チャットに適用されるウォーターマークを取得
    pub fn last_seen(&self, live_chat_id: &str) -> Option<i64> {
        match self.scope {
            WatermarkScope::Shared => self.shared,
            WatermarkScope::PerStream => self.per_stream.get(live_chat_id).copied(),
        }
    }

    pub fn reset(&mut self) {
        self.shared = None;
        self.per_stream.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watermark_suppresses_duplicates() {
        let mut watermark = Watermark::new(WatermarkScope::Shared);

        let emitted: Vec<i64> = [100, 250, 250, 400]
            .into_iter()
            .filter(|t| watermark.observe("chat", *t))
            .collect();

        assert_eq!(emitted, vec![100, 250, 400]);
        assert_eq!(watermark.last_seen("chat"), Some(400));
    }

    #[test]
    fn test_watermark_never_decreases() {
        let mut watermark = Watermark::new(WatermarkScope::Shared);
        assert!(watermark.observe("chat", 500));
        assert!(!watermark.observe("chat", 300));
        assert_eq!(watermark.last_seen("chat"), Some(500));
    }

    #[test]
    fn test_shared_watermark_spans_streams() {
        let mut watermark = Watermark::new(WatermarkScope::Shared);
        assert!(watermark.observe("a", 500));
        // 別ストリームの古いメッセージも抑制される
        assert!(!watermark.observe("b", 400));
    }

    #[test]
    fn test_per_stream_watermark() {
        let mut watermark = Watermark::new(WatermarkScope::PerStream);
        assert!(watermark.observe("a", 500));
        assert!(watermark.observe("b", 400));
        assert!(!watermark.observe("a", 450));
        assert_eq!(watermark.last_seen("b"), Some(400));
        assert_eq!(watermark.last_seen("c"), None);
    }

    #[test]
    fn test_watermark_reset() {
        let mut watermark = Watermark::new(WatermarkScope::Shared);
        assert!(watermark.observe("a", 500));
        watermark.reset();
        assert!(watermark.observe("a", 100));
    }

    #[test]
    fn test_resolution_state_accessors() {
        let state = ResolutionState::BroadcastsResolved {
            live_ids: vec!["v1".to_string()],
        };
        assert_eq!(state.live_ids(), Some(&["v1".to_string()][..]));
        assert_eq!(state.chat_ids(), None);
        assert!(!state.is_settled());

        assert_eq!(ResolutionState::Unresolved.live_ids(), None);
        assert!(ResolutionState::Failed(YouTubeError::LiveNotFound).is_settled());
    }

    #[tokio::test]
    async fn test_wait_settled() {
        let manager = ResolutionStateManager::new();
        let waiter = {
            let manager = manager.clone();
            tokio::spawn(async move { manager.wait_settled().await })
        };

        manager.set(ResolutionState::BroadcastsResolved {
            live_ids: vec!["v1".to_string()],
        });
        manager.set(ResolutionState::ChatsResolved {
            live_ids: vec!["v1".to_string()],
            chat_ids: vec!["c1".to_string()],
        });

        let settled = waiter.await.unwrap();
        assert_eq!(settled.chat_ids(), Some(&["c1".to_string()][..]));
    }
}
