use super::{
    client::YouTubeClient,
    errors::YouTubeError,
    events::{ChatEvent, EventEmitter},
    state::{PollerState, ResolutionStateManager, Watermark},
    types::{message_items, LiveChatMessageItem},
};
use crate::config::WatermarkScope;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, MutexGuard, PoisonError,
};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// 実行中のポーリングタスク
struct PollSession {
    handle: JoinHandle<()>,
    stop_signal: Arc<Notify>,
}

/// ポーリングタスクと共有する状態
struct PollerShared {
    client: YouTubeClient,
    resolution: ResolutionStateManager,
    events: EventEmitter,
    watermark: Mutex<Watermark>,
    /// 取得サイクルの排他（停止直後の再開や手動取得とタイマーが重ならないようにする）
    cycle: tokio::sync::Mutex<()>,
    /// 一度startすると立ち、stopしても下ろさない（新着判定を継続する）
    listening: AtomicBool,
}

/// YouTubeコメントポーリングマネージャー
///
/// 解決済みの全チャットIDから定期的にメッセージを取得し、
/// ウォーターマークより新しいものだけを `ChatEvent::Message` として通知する。
pub struct ChatPoller {
    shared: Arc<PollerShared>,
    session: Mutex<Option<PollSession>>,
}

impl ChatPoller {
    pub fn new(
        client: YouTubeClient,
        resolution: ResolutionStateManager,
        events: EventEmitter,
        watermark_scope: WatermarkScope,
    ) -> Self {
        Self {
            shared: Arc::new(PollerShared {
                client,
                resolution,
                events,
                watermark: Mutex::new(Watermark::new(watermark_scope)),
                cycle: tokio::sync::Mutex::new(()),
                listening: AtomicBool::new(false),
            }),
            session: Mutex::new(None),
        }
    }

    /// ポーリングを開始
    ///
    /// 最初の取得は `delay` 経過後。実行中に呼ぶと `PollerAlreadyRunning`。
    pub fn start(&self, delay: Duration) -> Result<(), YouTubeError> {
        if delay.is_zero() {
            return Err(self.shared.events.error(YouTubeError::InvalidInterval));
        }

        let mut session = self.lock_session();
        if session
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
        {
            return Err(self.shared.events.error(YouTubeError::PollerAlreadyRunning));
        }

        self.shared.listening.store(true, Ordering::SeqCst);

        let stop_signal = Arc::new(Notify::new());
        let shared = Arc::clone(&self.shared);
        let signal = Arc::clone(&stop_signal);
        let handle = tokio::spawn(async move {
            Self::polling_loop(shared, delay, signal).await;
        });

        *session = Some(PollSession {
            handle,
            stop_signal,
        });

        log::info!("Polling started (interval: {:?})", delay);
        Ok(())
    }

    /// ポーリングを停止
    ///
    /// タイマーのみ止める。取得中のサイクルは最後まで実行され、
    /// ウォーターマークはそのまま残る。
    pub fn stop(&self) {
        if let Some(session) = self.lock_session().take() {
            session.stop_signal.notify_one();
            log::info!("Polling stopped");
        }
    }

    pub fn state(&self) -> PollerState {
        match self.lock_session().as_ref() {
            Some(session) if !session.handle.is_finished() => PollerState::Polling,
            _ => PollerState::Idle,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == PollerState::Polling
    }

    /// 全チャットから1回分取得する
    ///
    /// 実行中のサイクルがあれば終わるまで待ってから取得する。
    /// 新たに通知したメッセージ数を返す
    pub async fn fetch_all_chats(&self) -> Result<usize, YouTubeError> {
        self.shared.fetch_all_chats().await
    }

    /// ウォーターマークをリセット（以降は全メッセージが新着扱い）
    pub fn reset_watermark(&self) {
        self.shared.lock_watermark().reset();
    }

    /// 指定チャットに適用中のウォーターマーク（ミリ秒）
    pub fn last_seen(&self, live_chat_id: &str) -> Option<i64> {
        self.shared.lock_watermark().last_seen(live_chat_id)
    }

    fn lock_session(&self) -> MutexGuard<'_, Option<PollSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// ポーリングループ（内部実装）
    ///
    /// 取得サイクルが間隔より長引いた場合、その間のtickは捨てる。
    /// サイクル自体は `cycle` ロックで直列化されるため、stop直後にstartしても重ならない。
    async fn polling_loop(shared: Arc<PollerShared>, delay: Duration, stop_signal: Arc<Notify>) {
        let mut ticker = interval_at(Instant::now() + delay, delay);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;
                _ = stop_signal.notified() => break,
                _ = ticker.tick() => {
                    // エラーはイベントで通知済み
                    if let Ok(count) = shared.fetch_all_chats().await {
                        log::debug!("Poll cycle emitted {} new message(s)", count);
                    }
                }
            }
        }

        log::info!("Polling loop ended");
    }
}

impl Drop for ChatPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

impl PollerShared {
    async fn fetch_all_chats(&self) -> Result<usize, YouTubeError> {
        let Some(chat_ids) = self.resolution.chat_ids() else {
            return Err(self.events.error(YouTubeError::ChatIdsInvalid));
        };

        let _cycle = self.cycle.lock().await;

        let mut emitted = 0;
        for live_chat_id in chat_ids {
            let response = match self.client.get_live_chat_messages(&live_chat_id).await {
                Ok(response) => response,
                Err(e) => {
                    // 1ストリームの失敗で残りを止めない
                    self.events.error(e);
                    continue;
                }
            };

            let new_items = if self.listening.load(Ordering::SeqCst) {
                self.collect_new_items(&live_chat_id, &response)
            } else {
                Vec::new()
            };

            self.events.emit(ChatEvent::Json {
                live_chat_id: live_chat_id.clone(),
                response,
            });

            for item in new_items {
                self.events.emit(ChatEvent::Message {
                    live_chat_id: live_chat_id.clone(),
                    item,
                });
                emitted += 1;
            }
        }

        Ok(emitted)
    }

    /// ウォーターマークより新しいメッセージを取り出し、ウォーターマークを進める
    ///
    /// 解釈できない要素（publishedAtの欠落など）はその要素だけ通知しない。
    fn collect_new_items(&self, live_chat_id: &str, response: &Value) -> Vec<Value> {
        let mut watermark = self.lock_watermark();
        message_items(response)
            .iter()
            .filter(|raw| {
                let item = match LiveChatMessageItem::from_value(raw) {
                    Ok(item) => item,
                    Err(e) => {
                        log::warn!("Skipping malformed message in chat {}: {}", live_chat_id, e);
                        return false;
                    }
                };
                match item.published_at_millis() {
                    Some(millis) => watermark.observe(live_chat_id, millis),
                    None => {
                        log::warn!(
                            "Failed to parse publishedAt for message {}: {:?}",
                            item.id,
                            item.snippet.published_at
                        );
                        false
                    }
                }
            })
            .cloned()
            .collect()
    }

    fn lock_watermark(&self) -> MutexGuard<'_, Watermark> {
        self.watermark.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
