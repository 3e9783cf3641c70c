//! Stateless slug codec: base62 link identifiers plus a truncated HMAC signature.
//!
//! A slug is `base62(id) ++ sig`, where `sig` is the first 8 bytes of
//! `HMAC-SHA256("{id}|{url}", secret)` encoded as unpadded base64url
//! (always 11 characters). There is no separator: the signature is recovered
//! by its fixed length.
//!
//! Because the destination URL is part of the signed message, changing a
//! link's stored URL invalidates every slug previously issued for it.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Length of the signature component in characters.
pub const SIG_LEN: usize = 11;

/// Number of MAC bytes kept in the signature.
const SIG_BYTES: usize = 8;

/// Errors produced while decoding slugs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlugError {
    #[error("invalid slug: {0}")]
    InvalidSlug(String),
}

/// Encodes a non-negative integer in base62, most significant digit first.
pub fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }

    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    digits.reverse();

    String::from_utf8(digits).unwrap_or_default()
}

/// Decodes a base62 string produced by [`encode_base62`].
///
/// # Errors
///
/// Returns [`SlugError::InvalidSlug`] for empty input, characters outside
/// `0-9A-Za-z`, or values that overflow `u64`.
pub fn decode_base62(s: &str) -> Result<u64, SlugError> {
    if s.is_empty() {
        return Err(SlugError::InvalidSlug("empty identifier".to_string()));
    }

    s.bytes().try_fold(0u64, |acc, c| {
        let digit = match c {
            b'0'..=b'9' => c - b'0',
            b'A'..=b'Z' => c - b'A' + 10,
            b'a'..=b'z' => c - b'a' + 36,
            _ => {
                return Err(SlugError::InvalidSlug(format!(
                    "character {:?} outside base62 alphabet",
                    c as char
                )));
            }
        };

        acc.checked_mul(62)
            .and_then(|v| v.checked_add(u64::from(digit)))
            .ok_or_else(|| SlugError::InvalidSlug("identifier overflow".to_string()))
    })
}

fn mac_for(id: u64, url: &str, secret: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts any key length");
    mac.update(format!("{}|{}", id, url).as_bytes());
    mac
}

/// Computes the 11-character signature binding `id` to `url`.
pub fn sign(id: u64, url: &str, secret: &[u8]) -> String {
    let tag = mac_for(id, url, secret).finalize().into_bytes();
    URL_SAFE_NO_PAD.encode(&tag[..SIG_BYTES])
}

/// Checks `sig` against the expected signature in constant time.
///
/// Signatures that are not valid 11-character base64url are rejected without
/// touching the MAC.
pub fn verify(id: u64, url: &str, secret: &[u8], sig: &str) -> bool {
    if sig.len() != SIG_LEN {
        return false;
    }

    let Ok(tag) = URL_SAFE_NO_PAD.decode(sig) else {
        return false;
    };
    if tag.len() != SIG_BYTES {
        return false;
    }

    mac_for(id, url, secret).verify_truncated_left(&tag).is_ok()
}

/// A freshly minted slug together with its two components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedSlug {
    pub slug: String,
    pub id_part: String,
    pub sig: String,
}

/// Builds the slug for a link id and its destination.
pub fn make_slug(id: u64, url: &str, secret: &[u8]) -> SignedSlug {
    let id_part = encode_base62(id);
    let sig = sign(id, url, secret);

    SignedSlug {
        slug: format!("{}{}", id_part, sig),
        id_part,
        sig,
    }
}

/// Splits a slug into `(id_part, sig)`: the last 11 characters are the signature.
///
/// Slugs of 11 characters or fewer yield an empty id part.
pub fn parse_slug(slug: &str) -> (&str, &str) {
    let char_count = slug.chars().count();
    if char_count <= SIG_LEN {
        return ("", slug);
    }

    let split_at = slug
        .char_indices()
        .nth(char_count - SIG_LEN)
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    slug.split_at(split_at)
}

/// Slug codec bound to the shared signing secret.
///
/// Rotating the secret invalidates every slug issued with the previous one.
#[derive(Clone)]
pub struct SlugCodec {
    secret: Vec<u8>,
}

impl SlugCodec {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn make_slug(&self, id: u64, url: &str) -> SignedSlug {
        make_slug(id, url, &self.secret)
    }

    pub fn sign(&self, id: u64, url: &str) -> String {
        sign(id, url, &self.secret)
    }

    pub fn verify(&self, id: u64, url: &str, sig: &str) -> bool {
        verify(id, url, &self.secret, sig)
    }
}

impl std::fmt::Debug for SlugCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlugCodec").finish_non_exhaustive()
    }
}
