pub mod client;
pub mod errors;
pub mod events;
pub mod live_chat;
pub mod poller;
pub mod resolver;
pub mod state;
pub mod types;

pub use client::YouTubeClient;
pub use errors::YouTubeError;
pub use events::{ChatEvent, EventEmitter};
pub use live_chat::LiveChat;
pub use poller::ChatPoller;
pub use resolver::Resolver;
pub use state::{PollerState, ResolutionState};
pub use types::{message_items, ChatMessage, LiveChatMessageItem, MessageType};
