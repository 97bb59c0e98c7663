//! Error taxonomy for the Sphinx core (spec.md §7).
//!
//! Every variant surfaces only the kind of failure, never the offset,
//! derived secret, or which internal check tripped — a relay that rejects
//! a packet must not leak more than "this packet is bad" to its caller.

use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Zero relay keys supplied at construction.
    #[error("circuit must contain at least one relay")]
    EmptyCircuit,

    /// `n > MAX_RELAYS`.
    #[error("circuit exceeds the maximum of {max} relays")]
    CircuitTooLong { max: usize },

    /// An address exceeds `ADDR` bytes.
    #[error("address exceeds the maximum of {max} bytes")]
    AddressTooLong { max: usize },

    /// A received or supplied group element is not a valid point on the
    /// configured curve.
    #[error("group element is not a valid point on the configured curve")]
    InvalidGroupElement,

    /// `routing_info` MAC mismatch at a relay.
    #[error("routing info MAC is invalid")]
    MacInvalid,

    /// The derived per-hop tag was already present in the relay's
    /// processed-tag set.
    #[error("packet already processed")]
    Replay,

    /// A wire record had the wrong length or an unparseable group element.
    #[error("malformed wire record")]
    DecodeInvalid,

    /// A relay's configured private scalar cannot produce a valid public
    /// key (e.g. the zero scalar).
    #[error("invalid relay secret key")]
    InvalidSecretKey,
}

pub type Result<T> = std::result::Result<T, Error>;
