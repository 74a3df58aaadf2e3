//! Forward-compatible binary wire codec for game client/server packets.
//!
//! Packets are encoded as a sequence of `<key><value>` records, where the key
//! packs a field number and a [`wire::WireType`]. Every packet type describes
//! its fields once with a [`descriptor::MessageDescriptor`], and a single
//! generic engine drives decoding, encoding and size computation from that
//! table. Unknown fields are skipped so older peers keep working when newer
//! protocol versions add fields.
//!
//! ```ignore
//! #[derive(Debug, Default, PartialEq, Packet)]
//! pub struct ChatMessage {
//!     #[packet(tag = 1)]
//!     pub text: Option<String>,
//!     #[packet(tag = 2)]
//!     pub channel: u32,
//! }
//!
//! let bytes = msg.encode_to_bytes();
//! let decoded = ChatMessage::decode(&bytes)?;
//! ```

#![deny(clippy::as_conversions)]

pub mod buffer;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod leb128;
pub mod wire;

mod util;

pub use buffer::{ReadStream, WriteStream};
pub use codec::{Message, Repeated};
pub use error::{DecodeError, EncodeError};

#[cfg(feature = "derive")]
pub use packetwire_derive::Packet;
