//! HeaderEngine (spec.md §4.3): length-hiding padding generation, header
//! construction (sender side) and header peeling (relay side).

use tracing::{debug, trace};

use crate::constants::{
    ADDR, ENCRYPTION_LABEL, HASH_LABEL, HMAC, MAX_RELAYS, RELAY_DATA, ROUTING_INFO, STREAM,
    ZERO_NONCE,
};
use crate::crypto::{self, Point};
use crate::error::{Error, Result};
use crate::keys::SharedSecret;

/// The fixed-size, length-hiding header carried in every packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// The sender's ephemeral public key, blinded forward to this hop.
    pub group_element: Point,
    /// Routing info this hop must peel: always exactly `ROUTING_INFO` bytes.
    pub routing_info: [u8; ROUTING_INFO],
    /// MAC this hop must verify over `routing_info` (I2). All-zero marks
    /// the exit hop (I3).
    pub routing_info_mac: [u8; HMAC],
}

impl Header {
    /// True if `routing_info_mac` is the all-zero terminal marker (I3).
    pub fn is_exit(&self) -> bool {
        self.routing_info_mac.iter().all(|&b| b == 0)
    }
}

/// `(enc_i, mac_i)` derived from a hop's shared secret.
fn subkeys(secret: &SharedSecret) -> ([u8; 32], [u8; 32]) {
    let enc = crypto::mac(secret, ENCRYPTION_LABEL);
    let mac = crypto::mac(secret, HASH_LABEL);
    (enc, mac)
}

fn xor_into(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src.iter()) {
        *d ^= s;
    }
}

/// Builds the length-hiding filler: a buffer of `(n - 1) * RELAY_DATA`
/// bytes reproducing, bit-for-bit, what each intermediate relay's
/// right-shift will introduce into the trailing region of `routing_info`.
pub fn padding(secrets: &[SharedSecret]) -> Vec<u8> {
    let n = secrets.len();
    let mut pad: Vec<u8> = Vec::new();

    for i in 1..n {
        pad.extend(std::iter::repeat(0u8).take(RELAY_DATA));

        let (enc_key, _) = subkeys(&secrets[i - 1]);
        let stream = crypto::stream(&enc_key, &ZERO_NONCE, STREAM);
        let tail = &stream[stream.len() - pad.len()..];
        xor_into(&mut pad, tail);
    }

    pad
}

/// Constructs a header for a circuit of `n = shared_secrets.len()` relays.
///
/// `final_addr` and every entry of `relay_addrs` must be at most `ADDR`
/// bytes; `relay_addrs.len()` must equal `shared_secrets.len()` and be at
/// most `MAX_RELAYS`.
pub fn construct(
    session_priv: &crate::crypto::Scalar,
    final_addr: &[u8],
    relay_addrs: &[Vec<u8>],
    shared_secrets: &[SharedSecret],
) -> Result<Header> {
    let n = shared_secrets.len();
    if n == 0 {
        return Err(Error::EmptyCircuit);
    }
    if n > MAX_RELAYS {
        return Err(Error::CircuitTooLong { max: MAX_RELAYS });
    }
    if relay_addrs.len() != n {
        return Err(Error::DecodeInvalid);
    }
    if final_addr.len() > ADDR {
        return Err(Error::AddressTooLong { max: ADDR });
    }
    for a in relay_addrs {
        if a.len() > ADDR {
            return Err(Error::AddressTooLong { max: ADDR });
        }
    }

    debug!(circuit_len = n, "constructing header");

    let fill = padding(shared_secrets);

    let mut routing_info = [0u8; ROUTING_INFO];
    let mut hmac = [0u8; HMAC];
    let mut addr = [0u8; ADDR];
    addr[..final_addr.len()].copy_from_slice(final_addr);

    // Place the precomputed filler at the tail; every construction step
    // below re-derives it for the last hop and preserves it through the
    // remaining iterations (see the i == 0 step).
    if !fill.is_empty() {
        routing_info[ROUTING_INFO - fill.len()..].copy_from_slice(&fill);
    }

    for i in (0..n).rev() {
        let (enc_key, mac_key) = subkeys(&shared_secrets[i]);

        // All but the innermost (last-constructed) hop shifts the buffer
        // right by one relay slot first, truncating the tail (Q3).
        if i != n - 1 {
            let mut shifted = [0u8; ROUTING_INFO];
            shifted[RELAY_DATA..].copy_from_slice(&routing_info[..ROUTING_INFO - RELAY_DATA]);
            routing_info = shifted;
        }

        routing_info[..ADDR].copy_from_slice(&addr);
        routing_info[ADDR..RELAY_DATA].copy_from_slice(&hmac);

        let cipher = crypto::stream(&enc_key, &ZERO_NONCE, STREAM);
        xor_into(&mut routing_info, &cipher[..ROUTING_INFO]);

        if i == n - 1 && !fill.is_empty() {
            routing_info[ROUTING_INFO - fill.len()..].copy_from_slice(&fill);
        }

        hmac = crypto::mac(&mac_key, &routing_info);
        addr = [0u8; ADDR];
        addr[..relay_addrs[i].len()].copy_from_slice(&relay_addrs[i]);

        trace!(hop = i, "header layer constructed");
    }

    Ok(Header {
        group_element: crypto::scalar_mul_base(session_priv),
        routing_info,
        routing_info_mac: hmac,
    })
}

/// The result of peeling one layer off a header at a relay.
#[derive(Debug)]
pub struct Peeled {
    pub next_addr: [u8; ADDR],
    pub next_hmac: [u8; HMAC],
    pub next_routing_info: [u8; ROUTING_INFO],
}

/// Peels one layer off `header` using the relay's derived shared secret.
pub fn peel(header: &Header, secret: &SharedSecret) -> Result<Peeled> {
    debug!("peeling header");
    let (enc_key, mac_key) = subkeys(secret);

    let expected_mac = crypto::mac(&mac_key, &header.routing_info);
    if expected_mac != header.routing_info_mac {
        return Err(Error::MacInvalid);
    }

    // Extend with RELAY_DATA zero bytes: the inverse of the sender's
    // truncating shift.
    let mut padded = vec![0u8; ROUTING_INFO + RELAY_DATA];
    padded[..ROUTING_INFO].copy_from_slice(&header.routing_info);

    let cipher = crypto::stream(&enc_key, &ZERO_NONCE, STREAM);
    xor_into(&mut padded, &cipher);

    let mut next_addr = [0u8; ADDR];
    next_addr.copy_from_slice(&padded[..ADDR]);
    let mut next_hmac = [0u8; HMAC];
    next_hmac.copy_from_slice(&padded[ADDR..RELAY_DATA]);
    let mut next_routing_info = [0u8; ROUTING_INFO];
    next_routing_info.copy_from_slice(&padded[RELAY_DATA..]);

    trace!(exit = header.is_exit(), "header peeled");

    Ok(Peeled {
        next_addr,
        next_hmac,
        next_routing_info,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{random_scalar, scalar_mul_base};
    use crate::keys;

    fn build_circuit(n: usize) -> (crate::crypto::Scalar, Vec<crate::crypto::Scalar>, Vec<Point>) {
        let session = random_scalar();
        let privs: Vec<_> = (0..n).map(|_| random_scalar()).collect();
        let pubs: Vec<_> = privs.iter().map(scalar_mul_base).collect();
        (session, privs, pubs)
    }

    #[test]
    fn padding_length_matches_spec() {
        let secrets: Vec<SharedSecret> = vec![[1u8; 32], [2u8; 32], [3u8; 32]];
        let p = padding(&secrets);
        assert_eq!(p.len(), 2 * RELAY_DATA);
    }

    #[test]
    fn single_hop_padding_is_empty() {
        let secrets: Vec<SharedSecret> = vec![[9u8; 32]];
        assert!(padding(&secrets).is_empty());
    }

    #[test]
    fn construct_rejects_address_too_long() {
        let (session, _, _) = build_circuit(1);
        let secrets: Vec<SharedSecret> = vec![[0u8; 32]];
        let too_long = vec![0u8; ADDR + 1];
        let err = construct(&session, &too_long, &[vec![1]], &secrets).unwrap_err();
        assert_eq!(err, Error::AddressTooLong { max: ADDR });
    }

    #[test]
    fn single_hop_round_trips() {
        let (session, privs, pubs) = build_circuit(1);
        let secrets = keys::derive(&session, &pubs).unwrap();
        let final_addr = b"/ip4/127.0.0.1/udp/1234".to_vec();

        let header = construct(&session, &final_addr, &[vec![]], &secrets).unwrap();

        let secret_at_relay = crypto::ecdh(&header.group_element, &privs[0]);
        assert_eq!(secret_at_relay, secrets[0]);

        let peeled = peel(&header, &secret_at_relay).unwrap();
        assert!(peeled.next_hmac.iter().all(|&b| b == 0));
        assert_eq!(&peeled.next_addr[..final_addr.len()], &final_addr[..]);
    }

    #[test]
    fn three_hop_peels_reveal_addresses_in_order() {
        let (session, privs, pubs) = build_circuit(3);
        let secrets = keys::derive(&session, &pubs).unwrap();
        let relay_addrs = vec![b"relay0".to_vec(), b"relay1".to_vec(), b"relay2".to_vec()];
        let final_addr = b"final".to_vec();

        let header = construct(&session, &final_addr, &relay_addrs, &secrets).unwrap();

        let s0 = crypto::ecdh(&header.group_element, &privs[0]);
        assert_eq!(s0, secrets[0]);
        let peeled0 = peel(&header, &s0).unwrap();
        assert_eq!(&peeled0.next_addr[..relay_addrs[1].len()], &relay_addrs[1][..]);
        assert!(!peeled0.next_hmac.iter().all(|&b| b == 0));

        let blind0 = crypto::scalar_from_bytes_mod_order(crypto::blinding_factor(&header.group_element, &s0));
        let ge1 = crypto::scalar_mul(&header.group_element, &blind0);
        let header1 = Header {
            group_element: ge1,
            routing_info: peeled0.next_routing_info,
            routing_info_mac: peeled0.next_hmac,
        };

        let s1 = crypto::ecdh(&header1.group_element, &privs[1]);
        assert_eq!(s1, secrets[1]);
        let peeled1 = peel(&header1, &s1).unwrap();
        assert_eq!(&peeled1.next_addr[..relay_addrs[2].len()], &relay_addrs[2][..]);
        assert!(!peeled1.next_hmac.iter().all(|&b| b == 0));

        let blind1 = crypto::scalar_from_bytes_mod_order(crypto::blinding_factor(&header1.group_element, &s1));
        let ge2 = crypto::scalar_mul(&header1.group_element, &blind1);
        let header2 = Header {
            group_element: ge2,
            routing_info: peeled1.next_routing_info,
            routing_info_mac: peeled1.next_hmac,
        };

        let s2 = crypto::ecdh(&header2.group_element, &privs[2]);
        assert_eq!(s2, secrets[2]);
        let peeled2 = peel(&header2, &s2).unwrap();
        assert!(peeled2.next_hmac.iter().all(|&b| b == 0));
        assert_eq!(&peeled2.next_addr[..final_addr.len()], &final_addr[..]);
    }

    #[test]
    fn tampered_routing_info_fails_mac() {
        let (session, privs, pubs) = build_circuit(1);
        let secrets = keys::derive(&session, &pubs).unwrap();
        let mut header = construct(&session, b"dest", &[vec![]], &secrets).unwrap();
        header.routing_info[0] ^= 0x01;

        let secret_at_relay = crypto::ecdh(&header.group_element, &privs[0]);
        let err = peel(&header, &secret_at_relay).unwrap_err();
        assert_eq!(err, Error::MacInvalid);
    }

    #[test]
    fn max_length_circuit_has_no_long_trailing_zero_run() {
        let (session, _privs, pubs) = build_circuit(MAX_RELAYS);
        let secrets = keys::derive(&session, &pubs).unwrap();
        let relay_addrs: Vec<Vec<u8>> = (0..MAX_RELAYS).map(|i| vec![i as u8; 10]).collect();
        let header = construct(&session, b"final", &relay_addrs, &secrets).unwrap();

        let mut run = 0usize;
        let mut max_run = 0usize;
        for &b in header.routing_info.iter() {
            if b == 0 {
                run += 1;
                max_run = max_run.max(run);
            } else {
                run = 0;
            }
        }
        assert!(max_run < RELAY_DATA, "trailing zero run too long: {max_run}");
    }
}
