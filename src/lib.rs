//! Sphinx onion-routing packet core: cryptographic construction,
//! per-hop processing, and binary layout of mix packets.
//!
//! Module dependency order (leaves first): [`crypto`] → [`keys`] →
//! [`header`] → [`packet`]. [`constants`] and [`error`] are shared
//! across all of them.

pub mod cli;
pub mod config;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod header;
pub mod keys;
pub mod logging;
pub mod packet;

pub use constants::{ADDR, GROUP_ELEMENT, HMAC, MAX_RELAYS, PACKET_SIZE, PAYLOAD, ROUTING_INFO};
pub use crypto::{Point, Scalar};
pub use error::{Error, Result};
pub use header::Header;
pub use keys::SharedSecret;
pub use packet::{new_packet, process_packet, Packet, ProcessedHop, RelayContext};
