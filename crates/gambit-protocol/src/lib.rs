//! Wire protocol for Gambit.
//!
//! This crate defines the "language" clients and the table server speak:
//!
//! - **Types** ([`Envelope`], [`Inbound`], [`Outbound`], [`Seat`], [`Role`],
//!   [`SoundCue`], [`Recipient`]): what travels on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong doing so.
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope) → Table (seats, turns, moves)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{Envelope, Inbound, Outbound, Recipient, Role, Seat, SoundCue};
