//! チャンネル単位のライブチャット取得
//!
//! 生成と同時にチャットIDの解決を開始し、解決後に `start` でポーリングする。
//!
//! ```no_run
//! use std::time::Duration;
//! use yt_live_chat::{ChatEvent, LiveChat};
//!
//! # async fn run() -> Result<(), yt_live_chat::YouTubeError> {
//! let chat = LiveChat::new("UCxxxxxxxx", "api-key", |event| {
//!     if let ChatEvent::Message { item, .. } = event {
//!         println!("{}", item["snippet"]["displayMessage"]);
//!     }
//! })?;
//!
//! chat.wait_resolved().await?;
//! chat.start(Duration::from_secs(5))?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use super::{
    client::YouTubeClient,
    errors::YouTubeError,
    events::{ChatEvent, EventEmitter},
    poller::ChatPoller,
    resolver::Resolver,
    state::{PollerState, ResolutionState, ResolutionStateManager},
};
use crate::config::LiveChatConfig;

pub struct LiveChat {
    resolver: Arc<Resolver>,
    poller: ChatPoller,
    resolution: ResolutionStateManager,
}

impl LiveChat {
    /// 生成してバックグラウンドで解決を開始する
    ///
    /// 解決結果は `Ready` / `Error` イベントで通知される。
    ///
    /// # Panics
    /// tokioランタイム外で呼ぶとpanicする
    pub fn new<F>(
        channel_id: impl Into<String>,
        api_key: impl Into<String>,
        event_callback: F,
    ) -> Result<Self, YouTubeError>
    where
        F: Fn(ChatEvent) + Send + Sync + 'static,
    {
        Self::with_config(channel_id, api_key, LiveChatConfig::default(), event_callback)
    }

    pub fn with_config<F>(
        channel_id: impl Into<String>,
        api_key: impl Into<String>,
        config: LiveChatConfig,
        event_callback: F,
    ) -> Result<Self, YouTubeError>
    where
        F: Fn(ChatEvent) + Send + Sync + 'static,
    {
        let chat = Self::new_deferred(channel_id, api_key, config, event_callback)?;

        let resolver = Arc::clone(&chat.resolver);
        tokio::spawn(async move {
            // 失敗はイベントで通知済み
            if let Err(e) = resolver.resolve().await {
                log::warn!(
                    "Live chat resolution failed for channel {}: {}",
                    resolver.channel_id(),
                    e
                );
            }
        });

        Ok(chat)
    }

    /// 解決を開始せずに生成する（`resolve` を自分で呼ぶ場合）
    pub fn new_deferred<F>(
        channel_id: impl Into<String>,
        api_key: impl Into<String>,
        config: LiveChatConfig,
        event_callback: F,
    ) -> Result<Self, YouTubeError>
    where
        F: Fn(ChatEvent) + Send + Sync + 'static,
    {
        let channel_id = channel_id.into();
        let client = YouTubeClient::with_config(api_key.into(), &config)?;
        let events = EventEmitter::new(event_callback);
        let resolution = ResolutionStateManager::new();

        log::info!("Live chat created for channel {}", channel_id);

        Ok(Self {
            resolver: Arc::new(Resolver::new(
                client.clone(),
                channel_id,
                resolution.clone(),
                events.clone(),
            )),
            poller: ChatPoller::new(client, resolution.clone(), events, config.watermark_scope),
            resolution,
        })
    }

    pub fn channel_id(&self) -> &str {
        self.resolver.channel_id()
    }

    /// ライブ動画IDとチャットIDを解決し、チャットIDを返す
    pub async fn resolve(&self) -> Result<Vec<String>, YouTubeError> {
        self.resolver.resolve().await
    }

    pub async fn resolve_live_broadcasts(&self) -> Result<Vec<String>, YouTubeError> {
        self.resolver.resolve_live_broadcasts().await
    }

    pub async fn resolve_chat_ids(&self) -> Result<Vec<String>, YouTubeError> {
        self.resolver.resolve_chat_ids().await
    }

    /// 解決が成功または失敗するまで待つ
    ///
    /// `new_deferred` で生成し `resolve` を呼んでいない場合は返らない。
    pub async fn wait_resolved(&self) -> Result<Vec<String>, YouTubeError> {
        match self.resolution.wait_settled().await {
            ResolutionState::ChatsResolved { chat_ids, .. } => Ok(chat_ids),
            ResolutionState::Failed(err) => Err(err),
            // wait_settledは上記2つでしか返らない
            _ => Err(YouTubeError::ChatIdsInvalid),
        }
    }

    /// ポーリングを開始
    pub fn start(&self, delay: Duration) -> Result<(), YouTubeError> {
        self.poller.start(delay)
    }

    pub fn stop(&self) {
        self.poller.stop();
    }

    /// 手動で1回分取得する
    pub async fn fetch_all_chats(&self) -> Result<usize, YouTubeError> {
        self.poller.fetch_all_chats().await
    }

    pub fn reset_watermark(&self) {
        self.poller.reset_watermark();
    }

    pub fn live_ids(&self) -> Option<Vec<String>> {
        self.resolution.live_ids()
    }

    pub fn chat_ids(&self) -> Option<Vec<String>> {
        self.resolution.chat_ids()
    }

    pub fn resolution_state(&self) -> ResolutionState {
        self.resolution.get()
    }

    pub fn poller_state(&self) -> PollerState {
        self.poller.state()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }
}
