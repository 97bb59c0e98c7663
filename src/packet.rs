//! PacketEngine (spec.md §4.4): onion payload encryption, packet
//! construction and per-hop processing, the relay's replay-tag state, and
//! the fixed-layout wire codec (§6).

use std::collections::HashSet;
use std::sync::Mutex;

use tracing::{debug, trace};

use crate::constants::{
    ADDR, DEFAULT_REALM, GROUP_ELEMENT, HMAC, PACKET_SIZE, PAYLOAD, REALM, ROUTING_INFO,
    ZERO_NONCE,
};
use crate::crypto::{self, Point, Scalar};
use crate::error::{Error, Result};
use crate::header::{self, Header};
use crate::keys::{self, SharedSecret};

/// A complete Sphinx mix packet (spec.md §3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub version: u8,
    pub header: Header,
    pub payload: [u8; PAYLOAD],
}

impl Packet {
    /// Convenience for callers that want to check the terminal marker
    /// before deciding whether to call [`process_packet`].
    pub fn is_exit(&self) -> bool {
        self.header.is_exit()
    }

    /// Encodes the packet to its fixed-length wire record (§6).
    pub fn to_bytes(&self) -> [u8; PACKET_SIZE] {
        let mut out = [0u8; PACKET_SIZE];
        let mut offset = 0;

        out[offset] = self.version;
        offset += REALM;

        out[offset..offset + GROUP_ELEMENT].copy_from_slice(&crypto::point_to_bytes(&self.header.group_element));
        offset += GROUP_ELEMENT;

        out[offset..offset + ROUTING_INFO].copy_from_slice(&self.header.routing_info);
        offset += ROUTING_INFO;

        out[offset..offset + HMAC].copy_from_slice(&self.header.routing_info_mac);
        offset += HMAC;

        out[offset..offset + PAYLOAD].copy_from_slice(&self.payload);

        out
    }

    /// Decodes a wire record, refusing anything whose length does not
    /// exactly match `PACKET_SIZE` (§6) or whose group element is not a
    /// valid curve point.
    pub fn from_bytes(bytes: &[u8]) -> Result<Packet> {
        if bytes.len() != PACKET_SIZE {
            return Err(Error::DecodeInvalid);
        }

        let mut offset = 0;
        let version = bytes[offset];
        offset += REALM;

        let group_element = crypto::point_from_bytes(&bytes[offset..offset + GROUP_ELEMENT])?;
        offset += GROUP_ELEMENT;

        let mut routing_info = [0u8; ROUTING_INFO];
        routing_info.copy_from_slice(&bytes[offset..offset + ROUTING_INFO]);
        offset += ROUTING_INFO;

        let mut routing_info_mac = [0u8; HMAC];
        routing_info_mac.copy_from_slice(&bytes[offset..offset + HMAC]);
        offset += HMAC;

        let mut payload = [0u8; PAYLOAD];
        payload.copy_from_slice(&bytes[offset..offset + PAYLOAD]);

        Ok(Packet {
            version,
            header: Header {
                group_element,
                routing_info,
                routing_info_mac,
            },
            payload,
        })
    }
}

/// Long-lived per-relay state (spec.md §3): a private scalar and the
/// monotonically growing set of shared-secret tags already processed.
pub struct RelayContext {
    priv_key: Scalar,
    processed_tags: Mutex<HashSet<[u8; 32]>>,
}

impl RelayContext {
    pub fn new(priv_key: Scalar) -> Self {
        Self {
            priv_key,
            processed_tags: Mutex::new(HashSet::new()),
        }
    }

    /// Derives the relay's public key from its configured private scalar.
    pub fn public_key(&self) -> Point {
        crypto::scalar_mul_base(&self.priv_key)
    }

    /// Size of the processed-tag set, for observability into its
    /// unbounded growth (§5); bounding it is out of scope here.
    pub fn processed_tag_count(&self) -> usize {
        self.processed_tags.lock().unwrap().len()
    }
}

/// Onion-encrypts (sender) or removes one layer (relay) of `payload`,
/// applied back-to-front across `secrets` during construction and once
/// per hop during processing (§4.4.1).
fn onion_xor(payload: &mut [u8; PAYLOAD], secret: &SharedSecret) {
    let stream = crypto::stream(secret, &ZERO_NONCE, PAYLOAD);
    for (p, s) in payload.iter_mut().zip(stream.iter()) {
        *p ^= s;
    }
}

/// Builds a packet for a chosen circuit.
///
/// `circuit_pubs[i]` is relay i's long-term public key; `relay_addrs[i]`
/// is the address at which to reach relay i+1 (carried in the header
/// slot peeled by relay i). `final_addr` is delivered to the exit relay.
pub fn new_packet(
    session_priv: &Scalar,
    circuit_pubs: &[Point],
    final_addr: &[u8],
    relay_addrs: &[Vec<u8>],
    payload: [u8; PAYLOAD],
) -> Result<Packet> {
    debug!(circuit_len = circuit_pubs.len(), "building packet");

    let secrets = keys::derive(session_priv, circuit_pubs)?;
    let built_header = header::construct(session_priv, final_addr, relay_addrs, &secrets)?;

    let mut enc_payload = payload;
    for secret in secrets.iter().rev() {
        onion_xor(&mut enc_payload, secret);
    }

    Ok(Packet {
        version: DEFAULT_REALM,
        header: built_header,
        payload: enc_payload,
    })
}

/// Outcome of processing one packet at one relay (§4.4.3).
#[derive(Debug)]
pub enum ProcessedHop {
    /// Not the exit hop: forward `packet` to `next_addr`.
    Forward { next_addr: [u8; ADDR], packet: Packet },
    /// This relay was the exit: `payload` is the recovered plaintext,
    /// addressed to `next_addr`.
    Exit { next_addr: [u8; ADDR], payload: [u8; PAYLOAD] },
}

/// Processes one hop of `packet` against `ctx`, the relay's long-lived
/// state. Never reveals which of `MacInvalid`, `Replay`, or
/// `InvalidGroupElement` caused a failure beyond the error kind itself.
pub fn process_packet(ctx: &RelayContext, packet: &Packet) -> Result<ProcessedHop> {
    let ge = packet.header.group_element;

    let secret = crypto::ecdh(&ge, &ctx.priv_key);
    let tag = crypto::hash(&secret);

    {
        let mut tags = ctx.processed_tags.lock().unwrap();
        if tags.contains(&tag) {
            debug!(tag_set_size = tags.len(), "rejecting replayed packet");
            return Err(Error::Replay);
        }
        tags.insert(tag);
        trace!(tag_set_size = tags.len(), "processing packet");
    }

    let peeled = header::peel(&packet.header, &secret)?;

    let mut payload = packet.payload;
    onion_xor(&mut payload, &secret);

    let blinding = crypto::scalar_from_bytes_mod_order(crypto::blinding_factor(&ge, &secret));
    let next_ge = crypto::scalar_mul(&ge, &blinding);

    if peeled.next_hmac.iter().all(|&b| b == 0) {
        debug!("packet reached exit hop");
        return Ok(ProcessedHop::Exit {
            next_addr: peeled.next_addr,
            payload,
        });
    }

    debug!("forwarding packet to next hop");
    Ok(ProcessedHop::Forward {
        next_addr: peeled.next_addr,
        packet: Packet {
            version: packet.version,
            header: Header {
                group_element: next_ge,
                routing_info: peeled.next_routing_info,
                routing_info_mac: peeled.next_hmac,
            },
            payload,
        },
    })
}
