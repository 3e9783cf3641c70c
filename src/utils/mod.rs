//! Utility functions for slug encoding, URL processing, and request handling.
//!
//! - [`slug_codec`] - Base62 identifiers and truncated HMAC signatures
//! - [`url_normalizer`] - URL normalization for link destinations
//! - [`client_ip`] - Client IP extraction from peer address and proxy headers

pub mod client_ip;
pub mod slug_codec;
pub mod url_normalizer;
