//! KeySchedule (spec.md §4.2): derives the ordered list of per-hop shared
//! secrets from a sender's session scalar and the circuit's relay public
//! keys, forward-blinding the group element at every hop.

use tracing::{debug, trace};

use crate::constants::MAX_RELAYS;
use crate::crypto::{self, Point, Scalar};
use crate::error::{Error, Result};

/// One hop's derived secret, 32 bytes, consumed to derive an encryption
/// subkey, a MAC subkey, and a blinding factor. Never transmitted.
pub type SharedSecret = [u8; 32];

/// Runs the Sphinx key schedule against an ordered circuit of relay public
/// keys, returning one shared secret per hop.
///
/// Every `circuit_pubs[i]` must already be a valid point on the curve —
/// callers receiving keys from the network should route them through
/// [`crate::crypto::point_from_bytes`] first, which performs that check.
pub fn derive(session_priv: &Scalar, circuit_pubs: &[Point]) -> Result<Vec<SharedSecret>> {
    if circuit_pubs.is_empty() {
        return Err(Error::EmptyCircuit);
    }
    if circuit_pubs.len() > MAX_RELAYS {
        return Err(Error::CircuitTooLong { max: MAX_RELAYS });
    }

    debug!(circuit_len = circuit_pubs.len(), "deriving key schedule");

    let mut secrets = Vec::with_capacity(circuit_pubs.len());

    // X = x * g, the sender's ephemeral public key, blinded forward at
    // every subsequent hop.
    let mut group_element = crypto::scalar_mul_base(session_priv);
    let mut priv_element = *session_priv;

    let s_1 = crypto::ecdh(&circuit_pubs[0], &priv_element);
    trace!(hop = 0, "shared secret derived");
    secrets.push(s_1);
    let mut blinding = crypto::scalar_from_bytes_mod_order(crypto::blinding_factor(&group_element, &s_1));

    for (i, pub_key) in circuit_pubs[1..].iter().enumerate() {
        priv_element = crypto::scalar_mul_mod_order(&priv_element, &blinding);
        group_element = crypto::scalar_mul_base(&priv_element);

        let s_i = crypto::ecdh(pub_key, &priv_element);
        trace!(hop = i + 1, "shared secret derived");
        secrets.push(s_i);
        blinding = crypto::scalar_from_bytes_mod_order(crypto::blinding_factor(&group_element, &s_i));
    }

    debug!(hops = secrets.len(), "key schedule complete");
    Ok(secrets)
}
