//! Fixed wire-format sizes. All of these are part of the wire contract
//! (spec.md §6) and MUST match between sender and every relay.

/// Next-hop / final-destination address slot, zero-padded.
pub const ADDR: usize = 46;

/// MAC over a header's routing info.
pub const HMAC: usize = 32;

/// `ADDR + HMAC`: one relay's slot in the routing info.
pub const RELAY_DATA: usize = ADDR + HMAC;

/// Maximum circuit length (Q2: 5, not the 15 seen in an older reference
/// version).
pub const MAX_RELAYS: usize = 5;

/// `MAX_RELAYS * RELAY_DATA`, invariant regardless of the real circuit
/// length (I1).
pub const ROUTING_INFO: usize = MAX_RELAYS * RELAY_DATA;

/// Size of the keystream drawn per hop to obfuscate `routing_info` and to
/// build the padding.
pub const STREAM: usize = ROUTING_INFO + RELAY_DATA;

/// Onion-encrypted payload size.
pub const PAYLOAD: usize = 256;

/// Output size of `hash`/ECDH/blinding-factor derivation.
pub const SHARED_SECRET: usize = 32;

/// SEC1 uncompressed encoding of a P-256 point: `0x04 || x(32) || y(32)`.
pub const GROUP_ELEMENT: usize = 65;

/// Protocol/version tag.
pub const REALM: usize = 1;

/// Default realm byte.
pub const DEFAULT_REALM: u8 = 0x01;

/// Total on-wire packet size: version + group element + routing info +
/// routing info MAC + payload.
pub const PACKET_SIZE: usize = REALM + GROUP_ELEMENT + ROUTING_INFO + HMAC + PAYLOAD;

/// The all-zero nonce used for every stream-cipher invocation. Safe because
/// each derived key is used exactly once (spec.md §4.1).
pub const ZERO_NONCE: [u8; 24] = [0u8; 24];

/// Domain-separation label for the per-hop encryption subkey.
pub const ENCRYPTION_LABEL: &[u8] = b"encryption";

/// Domain-separation label for the per-hop MAC subkey.
pub const HASH_LABEL: &[u8] = b"hash";
