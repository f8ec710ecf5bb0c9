use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 正規化したチャットメッセージ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub live_chat_id: String,
    pub message: String,
    pub author_name: String,       // → authorName (serde rename)
    pub author_channel_id: String, // → authorChannelId
    pub author_image_url: String,  // → authorImageUrl
    pub published_at: DateTime<Utc>, // → publishedAt
    pub is_owner: bool,            // → isOwner
    pub is_moderator: bool,        // → isModerator
    pub is_member: bool,           // → isMember (isChatSponsor)
    pub is_verified: bool,         // → isVerified
    pub message_type: MessageType, // → messageType
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum MessageType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "superChat")]
    SuperChat { amount: String, currency: String },
    #[serde(rename = "superSticker")]
    SuperSticker { sticker_id: String },
    #[serde(rename = "membership")]
    Membership { level: String },
    #[serde(rename = "membershipGift")]
    MembershipGift { count: u32 },
    /// 上記以外のイベント（snippet.typeをそのまま保持）
    #[serde(rename = "other")]
    Other { kind: String },
}

// YouTube API レスポンス型

/// search.list のレスポンス
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
pub struct SearchItem {
    pub id: SearchItemId,
}

#[derive(Debug, Deserialize)]
pub struct SearchItemId {
    #[serde(rename = "videoId")]
    pub video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoResponse {
    #[serde(default)]
    pub items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
pub struct VideoItem {
    #[serde(rename = "liveStreamingDetails")]
    pub live_streaming_details: Option<LiveStreamingDetails>,
}

#[derive(Debug, Deserialize)]
pub struct LiveStreamingDetails {
    #[serde(rename = "activeLiveChatId")]
    pub active_live_chat_id: Option<String>,
}

/// liveChatMessages.list のレスポンスからメッセージ配列を取り出す
///
/// レスポンスは受信したJSONのまま扱い、`items` が無ければ空とみなす。
pub fn message_items(response: &Value) -> &[Value] {
    response
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// liveChatMessage リソースの読み取り用ビュー
///
/// 新着判定と `ChatMessage` への変換にだけ使う。イベントには生のJSONを流す。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveChatMessageItem {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: MessageSnippet,
    #[serde(default)]
    pub author_details: Option<AuthorDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageSnippet {
    #[serde(rename = "type", default)]
    pub message_type: String,
    #[serde(default)]
    pub live_chat_id: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub display_message: Option<String>,
    #[serde(default)]
    pub super_chat_details: Option<SuperChatDetails>,
    #[serde(default)]
    pub super_sticker_details: Option<SuperStickerDetails>,
    #[serde(default)]
    pub new_sponsor_details: Option<NewSponsorDetails>,
    #[serde(default)]
    pub membership_gifting_details: Option<MembershipGiftingDetails>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperChatDetails {
    #[serde(default)]
    pub amount_display_string: String,
    #[serde(default)]
    pub currency: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperStickerDetails {
    #[serde(default)]
    pub super_sticker_metadata: Option<SuperStickerMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuperStickerMetadata {
    #[serde(default)]
    pub sticker_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSponsorDetails {
    #[serde(default)]
    pub member_level_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipGiftingDetails {
    #[serde(default)]
    pub gift_memberships_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthorDetails {
    pub channel_id: String,
    pub display_name: String,
    pub profile_image_url: String,
    pub is_verified: bool,
    pub is_chat_owner: bool,
    pub is_chat_sponsor: bool,
    pub is_chat_moderator: bool,
}

impl LiveChatMessageItem {
    /// 生のJSONから読み取る
    pub fn from_value(item: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(item)
    }

    /// publishedAtをUTC日時として取得（欠落・パース失敗時はNone）
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        let published_at = self.snippet.published_at.as_deref()?;
        DateTime::parse_from_rfc3339(published_at)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// publishedAtをエポックからのミリ秒で取得
    pub fn published_at_millis(&self) -> Option<i64> {
        self.published_at().map(|dt| dt.timestamp_millis())
    }

    /// snippet.typeからメッセージ種別を判定
    pub fn message_type(&self) -> MessageType {
        let snippet = &self.snippet;
        match snippet.message_type.as_str() {
            "textMessageEvent" => MessageType::Text,
            "superChatEvent" => {
                let details = snippet.super_chat_details.as_ref();
                MessageType::SuperChat {
                    amount: details
                        .map(|d| d.amount_display_string.clone())
                        .unwrap_or_default(),
                    currency: details.map(|d| d.currency.clone()).unwrap_or_default(),
                }
            }
            "superStickerEvent" => MessageType::SuperSticker {
                sticker_id: snippet
                    .super_sticker_details
                    .as_ref()
                    .and_then(|d| d.super_sticker_metadata.as_ref())
                    .map(|m| m.sticker_id.clone())
                    .unwrap_or_default(),
            },
            "newSponsorEvent" | "memberMilestoneChatEvent" => MessageType::Membership {
                level: snippet
                    .new_sponsor_details
                    .as_ref()
                    .map(|d| d.member_level_name.clone())
                    .unwrap_or_default(),
            },
            "membershipGiftingEvent" => MessageType::MembershipGift {
                count: snippet
                    .membership_gifting_details
                    .as_ref()
                    .map(|d| d.gift_memberships_count)
                    .unwrap_or(0),
            },
            other => MessageType::Other {
                kind: other.to_string(),
            },
        }
    }

    /// ChatMessageに変換
    ///
    /// publishedAtのパースに失敗した場合はNone
    pub fn to_chat_message(&self, live_chat_id: &str) -> Option<ChatMessage> {
        let published_at = self.published_at()?;
        let author = self.author_details.clone().unwrap_or_default();
        let live_chat_id = self
            .snippet
            .live_chat_id
            .clone()
            .unwrap_or_else(|| live_chat_id.to_string());

        Some(ChatMessage {
            id: self.id.clone(),
            live_chat_id,
            message: self.snippet.display_message.clone().unwrap_or_default(),
            author_name: author.display_name,
            author_channel_id: author.channel_id,
            author_image_url: author.profile_image_url,
            published_at,
            is_owner: author.is_chat_owner,
            is_moderator: author.is_chat_moderator,
            is_member: author.is_chat_sponsor,
            is_verified: author.is_verified,
            message_type: self.message_type(),
        })
    }
}
