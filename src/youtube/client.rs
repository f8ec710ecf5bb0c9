use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{errors::YouTubeError, types::*};
use crate::config::LiveChatConfig;
use crate::util::mask_api_key;

/// YouTube Data API v3 クライアント
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    client: Client,
    api_key: String,
    api_base: String,
    max_results: u32,
}

impl YouTubeClient {
    pub fn new(api_key: String) -> Result<Self, YouTubeError> {
        Self::with_config(api_key, &LiveChatConfig::default())
    }

    /// タイムアウト付きのHTTPクライアントを構築
    pub fn with_config(api_key: String, config: &LiveChatConfig) -> Result<Self, YouTubeError> {
        let client = Client::builder().timeout(config.http_timeout).build()?;

        log::debug!(
            "YouTube client created (api base: {}, key: {})",
            config.api_base,
            mask_api_key(&api_key)
        );

        Ok(Self {
            client,
            api_key,
            api_base: config.api_base.clone(),
            max_results: config.max_results,
        })
    }

    /// チャンネルの配信中ライブの動画IDを検索順で取得（search.list）
    pub async fn search_live_video_ids(&self, channel_id: &str) -> Result<Vec<String>, YouTubeError> {
        log::info!(
            "Searching live broadcasts for channel: {} (quota cost: 100 units)",
            channel_id
        );

        let data: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("eventType", "live"),
                    ("part", "id"),
                    ("channelId", channel_id),
                    ("type", "video"),
                ],
            )
            .await?;

        let ids: Vec<String> = data
            .items
            .into_iter()
            .filter_map(|item| item.id.video_id)
            .collect();

        log::info!("Found {} live broadcast(s) for channel {}", ids.len(), channel_id);
        Ok(ids)
    }

    /// 動画IDからactiveLiveChatIdを取得
    ///
    /// 動画が見つからない、またはライブ配信情報が無い場合は `ChatNotFound`
    pub async fn get_live_chat_id(&self, video_id: &str) -> Result<String, YouTubeError> {
        log::info!(
            "Fetching live chat ID for video: {} (quota cost: 1 unit)",
            video_id
        );

        let data: VideoResponse = self
            .get_json(
                "videos",
                &[("part", "liveStreamingDetails"), ("id", video_id)],
            )
            .await?;

        let chat_id = data
            .items
            .into_iter()
            .next()
            .and_then(|item| item.live_streaming_details)
            .and_then(|details| details.active_live_chat_id)
            .ok_or_else(|| YouTubeError::ChatNotFound(video_id.to_string()))?;

        log::info!("Live chat ID retrieved: {}", chat_id);
        Ok(chat_id)
    }

    /// ライブチャットメッセージ取得
    ///
    /// レスポンスは加工せずJSONのまま返す
    pub async fn get_live_chat_messages(&self, live_chat_id: &str) -> Result<Value, YouTubeError> {
        log::debug!(
            "Fetching live chat messages for chat ID: {} (quota cost: ~5 units)",
            live_chat_id
        );

        let max_results = self.max_results.to_string();
        let data: Value = self
            .get_json(
                "liveChat/messages",
                &[
                    ("liveChatId", live_chat_id),
                    ("part", "id,snippet,authorDetails"),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        log::debug!(
            "Fetched {} messages from chat {}",
            message_items(&data).len(),
            live_chat_id
        );
        Ok(data)
    }

    /// GETしてJSONをパースする
    ///
    /// 200以外はステータスとボディをそのまま `YouTubeError::Api` で返す
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, YouTubeError> {
        let url = format!("{}/{}", self.api_base, path);

        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if status != reqwest::StatusCode::OK {
            log::warn!("YouTube API {} returned status {}", path, status);
            return Err(YouTubeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to parse {} response: {}", path, e);
            YouTubeError::ParseError(e.to_string())
        })
    }
}
