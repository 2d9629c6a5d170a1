//! Keyed confidentiality/integrity transform for the 9-byte frame body.
//!
//! Construction (encrypt-then-MAC, HMAC-SHA256 as the PRF):
//!
//! ```text
//! keystream  = HMAC(K, "CPE2-KS"  || type || device_id || nonce)[0..8]
//! ciphertext = plaintext XOR keystream
//! tag        = HMAC(K, "CPE2-TAG" || type || device_id || nonce || ciphertext)[0]
//! ```
//!
//! The one-byte tag bounds the forgery/false-accept probability at 1/256 per
//! attempt. The 8-bit nonce means keystreams repeat after 256 frames from the
//! same device and type; that limitation is inherent to the 12-byte format.

use std::fmt;
use std::str::FromStr;

use hmac::digest::Key as MacKey;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::codec::{HEADER_LEN, PAYLOAD_LEN};
use crate::error::{FrameError, KeyError, Result};

type HmacSha256 = Hmac<Sha256>;

/// Pre-shared key length in bytes.
pub const KEY_LEN: usize = 16;

/// Truncated integrity tag length in bytes.
pub const TAG_LEN: usize = 1;

const KEYSTREAM_DOMAIN: &[u8] = b"CPE2-KS";
const TAG_DOMAIN: &[u8] = b"CPE2-TAG";

/// The 16-byte symmetric key shared by every node of a deployment.
///
/// Debug output never shows key material.
#[derive(Clone, PartialEq, Eq)]
pub struct Key([u8; KEY_LEN]);

impl Key {
    pub const fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self(bytes)
    }

    /// Build a key from a slice that must be exactly [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, KeyError> {
        let bytes: [u8; KEY_LEN] = bytes
            .try_into()
            .map_err(|_| KeyError::BadLength { len: bytes.len() })?;
        Ok(Self(bytes))
    }

    /// Parse 32 hex digits. Surrounding whitespace is ignored.
    pub fn from_hex(text: &str) -> std::result::Result<Self, KeyError> {
        let raw = hex::decode(text.trim()).map_err(|e| KeyError::InvalidHex(e.to_string()))?;
        Self::from_slice(&raw)
    }

    /// HMAC zero-pads short keys to the block size, so the padded block
    /// keys the same MAC as the raw 16 bytes.
    fn mac(&self) -> HmacSha256 {
        let mut block = MacKey::<HmacSha256>::default();
        block[..KEY_LEN].copy_from_slice(&self.0);
        <HmacSha256 as Mac>::new(&block)
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Key")
            .field(&format_args!("<redacted:{} bytes>", KEY_LEN))
            .finish()
    }
}

/// Derive the payload keystream for a frame header.
pub fn keystream(key: &Key, header: &[u8; HEADER_LEN]) -> [u8; PAYLOAD_LEN] {
    let mut mac = key.mac();
    mac.update(KEYSTREAM_DOMAIN);
    mac.update(header);
    let digest = mac.finalize().into_bytes();

    let mut out = [0u8; PAYLOAD_LEN];
    out.copy_from_slice(&digest[..PAYLOAD_LEN]);
    out
}

/// Compute the truncated integrity tag over header and ciphertext.
pub fn tag(key: &Key, header: &[u8; HEADER_LEN], ciphertext: &[u8; PAYLOAD_LEN]) -> u8 {
    tag_mac(key, header, ciphertext).finalize().into_bytes()[0]
}

/// Encrypt `plaintext` and return `(ciphertext, tag)`.
pub fn seal(
    key: &Key,
    header: &[u8; HEADER_LEN],
    plaintext: &[u8; PAYLOAD_LEN],
) -> ([u8; PAYLOAD_LEN], u8) {
    let mut ciphertext = *plaintext;
    apply_keystream(key, header, &mut ciphertext);
    let tag = tag(key, header, &ciphertext);
    (ciphertext, tag)
}

/// Verify the tag, then decrypt. Nothing is decrypted on tag mismatch.
pub fn open(
    key: &Key,
    header: &[u8; HEADER_LEN],
    ciphertext: &[u8; PAYLOAD_LEN],
    tag: u8,
) -> Result<[u8; PAYLOAD_LEN]> {
    tag_mac(key, header, ciphertext)
        .verify_truncated_left(&[tag])
        .map_err(|_| FrameError::AuthFailed)?;

    let mut plaintext = *ciphertext;
    apply_keystream(key, header, &mut plaintext);
    Ok(plaintext)
}

fn apply_keystream(key: &Key, header: &[u8; HEADER_LEN], buf: &mut [u8; PAYLOAD_LEN]) {
    for (b, k) in buf.iter_mut().zip(keystream(key, header)) {
        *b ^= k;
    }
}

fn tag_mac(key: &Key, header: &[u8; HEADER_LEN], ciphertext: &[u8; PAYLOAD_LEN]) -> HmacSha256 {
    let mut mac = key.mac();
    mac.update(TAG_DOMAIN);
    mac.update(header);
    mac.update(ciphertext);
    mac
}
