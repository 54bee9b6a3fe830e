//! PoiQuest Protocol - Presence events exchanged over the realtime channel
//!
//! This crate contains the wire vocabulary shared by the presence server and its clients:
//! - `PresenceEvent` - the closed set of team join/leave notifications
//! - `decode` / `encode` - the text-frame codec with typed rejection reasons
//!
//! # Design Principles
//!
//! 1. **Minimal dependencies** - Only serde, serde_json, and thiserror
//! 2. **No business logic** - Pure data types and serialization
//! 3. **Closed event set** - anything that is not a recognized event is rejected at decode time

pub mod codec;
pub mod messages;

pub use codec::{decode, encode, CodecError};
pub use messages::{PresenceEvent, PresenceEventKind, TeamPresence};
