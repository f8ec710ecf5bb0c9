//! YouTubeチャンネルの配信中ライブからチャットを取得するクライアント
//!
//! チャンネルID → ライブ動画ID → チャットID の順に解決し、
//! 一定間隔でメッセージを取得して新着のみを通知する。

pub mod config;
pub mod util; // doctestのためpubにする
pub mod youtube;

pub use config::{LiveChatConfig, WatermarkScope};
pub use youtube::{
    message_items, ChatEvent, ChatMessage, LiveChat, LiveChatMessageItem, MessageType,
    PollerState, ResolutionState, YouTubeError,
};
