//! CryptoPrimitives (spec.md §4.1): hashing, keyed MAC, a deterministic
//! keystream generator, ECDH and group-element arithmetic on NIST P-256.
//!
//! The curve choice is fixed and monomorphic across the whole crate (see
//! SPEC_FULL.md §A) — there is no generic "any curve" abstraction here, on
//! purpose.

use chacha20::cipher::{KeyIvInit, StreamCipher};
use chacha20::{Key as ChaChaKey, XChaCha20, XNonce};
use hmac::{Hmac, Mac};
use p256::elliptic_curve::generic_array::GenericArray;
use p256::elliptic_curve::group::ff::Field;
use p256::elliptic_curve::ops::Reduce;
use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::elliptic_curve::Curve;
use p256::{AffinePoint, EncodedPoint, NistP256, ProjectivePoint};
use sha2::{Digest, Sha256};

use crate::constants::GROUP_ELEMENT;
use crate::error::{Error, Result};

/// A scalar mod the P-256 group order.
pub type Scalar = p256::Scalar;

/// A point on the configured curve. Only ever constructed through
/// [`point_from_bytes`], which performs the mandatory on-curve check (I4).
pub type Point = AffinePoint;

type HmacSha256 = Hmac<Sha256>;

/// 32-byte hash, SHA-256.
pub fn hash(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// Keyed MAC, HMAC-SHA-256.
pub fn mac(key: &[u8; 32], msg: &[u8]) -> [u8; 32] {
    let mut m = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
    m.update(msg);
    m.finalize().into_bytes().into()
}

/// Deterministic keystream of `n` bytes. `nonce` is always the fixed
/// all-zero 24-byte string in this crate; that is safe because every
/// derived key is used to generate exactly one keystream.
pub fn stream(key: &[u8; 32], nonce: &[u8; 24], n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    let mut cipher = XChaCha20::new(ChaChaKey::from_slice(key), XNonce::from_slice(nonce));
    cipher.apply_keystream(&mut buf);
    buf
}

/// Checks whether `bytes` is a valid SEC1-encoded point on the configured
/// curve. This is the mandatory pre-check of §4.1 and is what rejects a
/// forged/off-curve group element (P7, S6).
pub fn is_on_curve(bytes: &[u8]) -> bool {
    point_from_bytes(bytes).is_ok()
}

/// Parses a SEC1-encoded group element, rejecting anything that is not a
/// valid point on the curve.
///
/// A malformed encoding (wrong length, bad tag byte) is `DecodeInvalid`;
/// a structurally valid encoding whose coordinates don't satisfy the
/// curve equation is `InvalidGroupElement` (spec.md §7 treats these as
/// distinct failure kinds).
pub fn point_from_bytes(bytes: &[u8]) -> Result<Point> {
    let encoded = EncodedPoint::from_bytes(bytes).map_err(|_| Error::DecodeInvalid)?;
    Option::from(AffinePoint::from_encoded_point(&encoded)).ok_or(Error::InvalidGroupElement)
}

/// SEC1 uncompressed encoding of a group element.
pub fn point_to_bytes(p: &Point) -> [u8; GROUP_ELEMENT] {
    let encoded = p.to_encoded_point(false);
    let mut out = [0u8; GROUP_ELEMENT];
    out.copy_from_slice(encoded.as_bytes());
    out
}

/// `hash(x_coord(priv * pub))`.
pub fn ecdh(pub_point: &Point, priv_scalar: &Scalar) -> [u8; 32] {
    let shared = ProjectivePoint::from(*pub_point) * priv_scalar;
    let encoded = shared.to_affine().to_encoded_point(false);
    // x coordinate is bytes [1..33] of the uncompressed encoding.
    hash(&encoded.as_bytes()[1..33])
}

/// `hash(serialize(pub) || secret)`.
pub fn blinding_factor(pub_point: &Point, secret: &[u8; 32]) -> [u8; 32] {
    let mut buf = Vec::with_capacity(GROUP_ELEMENT + 32);
    buf.extend_from_slice(&point_to_bytes(pub_point));
    buf.extend_from_slice(secret);
    hash(&buf)
}

/// `s * g`.
pub fn scalar_mul_base(s: &Scalar) -> Point {
    (ProjectivePoint::GENERATOR * s).to_affine()
}

/// `s * P`.
pub fn scalar_mul(p: &Point, s: &Scalar) -> Point {
    (ProjectivePoint::from(*p) * s).to_affine()
}

/// `a * b mod q`.
pub fn scalar_mul_mod_order(a: &Scalar, b: &Scalar) -> Scalar {
    a * b
}

/// Reduces 32 arbitrary bytes to a scalar mod the group order. Used to turn
/// a blinding factor's hash output into the scalar used for the next hop's
/// private element.
pub fn scalar_from_bytes_mod_order(bytes: [u8; 32]) -> Scalar {
    let array: GenericArray<u8, <NistP256 as Curve>::FieldBytesSize> = GenericArray::from(bytes);
    Scalar::reduce_bytes(&array)
}

/// Draws a fresh random scalar, e.g. for a sender's ephemeral session key
/// or a relay's long-term private key.
pub fn random_scalar() -> Scalar {
    Scalar::random(rand::thread_rng())
}
