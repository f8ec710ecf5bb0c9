//! チャンネルIDからチャットIDまでの解決
//!
//! 1. search.list で配信中のライブ動画IDを取得
//! 2. videos.list で各動画のactiveLiveChatIdを順番に取得
//!
//! 2段目は1段目の結果が確定してから開始する。

use super::{
    client::YouTubeClient,
    errors::YouTubeError,
    events::{ChatEvent, EventEmitter},
    state::{ResolutionState, ResolutionStateManager},
};

/// チャンネル → ライブ → チャットID リゾルバー
#[derive(Debug)]
pub struct Resolver {
    client: YouTubeClient,
    channel_id: String,
    state: ResolutionStateManager,
    events: EventEmitter,
}

impl Resolver {
    pub fn new(
        client: YouTubeClient,
        channel_id: String,
        state: ResolutionStateManager,
        events: EventEmitter,
    ) -> Self {
        Self {
            client,
            channel_id,
            state,
            events,
        }
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// ライブ動画IDとチャットIDを順に解決する
    pub async fn resolve(&self) -> Result<Vec<String>, YouTubeError> {
        self.resolve_live_broadcasts().await?;
        self.resolve_chat_ids().await
    }

    /// 配信中のライブ動画IDを取得
    ///
    /// 1件も無い場合は `LiveNotFound` を通知し、ライブ動画IDは確定しない。
    pub async fn resolve_live_broadcasts(&self) -> Result<Vec<String>, YouTubeError> {
        let live_ids = match self.client.search_live_video_ids(&self.channel_id).await {
            Ok(ids) => ids,
            Err(e) => return Err(self.fail(e)),
        };

        if live_ids.is_empty() {
            log::info!("No live broadcast for channel {}", self.channel_id);
            return Err(self.fail(YouTubeError::LiveNotFound));
        }

        self.state.set(ResolutionState::BroadcastsResolved {
            live_ids: live_ids.clone(),
        });
        Ok(live_ids)
    }

    /// 各ライブ動画のチャットIDを取得
    ///
    /// 取得できなかった動画はエラーを通知してスキップする（部分的な成功を許容）。
    /// 1件以上取得できた場合に `Ready` を通知する。
    pub async fn resolve_chat_ids(&self) -> Result<Vec<String>, YouTubeError> {
        let Some(live_ids) = self.state.live_ids() else {
            return Err(self.events.error(YouTubeError::LiveIdsInvalid));
        };

        let mut chat_ids = Vec::with_capacity(live_ids.len());
        for video_id in &live_ids {
            match self.client.get_live_chat_id(video_id).await {
                Ok(chat_id) => chat_ids.push(chat_id),
                Err(e) => {
                    self.events.error(e);
                }
            }
        }

        if chat_ids.is_empty() {
            return Err(self.fail(YouTubeError::NoChatsResolved));
        }

        log::info!(
            "Resolved {} of {} live chat(s) for channel {}",
            chat_ids.len(),
            live_ids.len(),
            self.channel_id
        );

        self.state.set(ResolutionState::ChatsResolved {
            live_ids,
            chat_ids: chat_ids.clone(),
        });
        self.events.emit(ChatEvent::Ready);
        Ok(chat_ids)
    }

    fn fail(&self, err: YouTubeError) -> YouTubeError {
        self.state.set(ResolutionState::Failed(err.clone()));
        self.events.error(err)
    }
}
