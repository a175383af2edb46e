//! Save file header: magic bytes, version, payload length and checksum.
//!
//! The header is 16 bytes, little-endian:
//!
//! ```text
//! [0..4]   magic bytes "AUXA"
//! [4..8]   format version (u32)
//! [8..12]  payload length in bytes (u32)
//! [12..16] xxHash32 of the payload (everything after the header)
//! ```

use xxhash_rust::xxh32::xxh32;

use crate::{SaveError, SaveResult};

/// Magic bytes identifying a scheduler save file.
pub const MAGIC: [u8; 4] = *b"AUXA";

/// Size of the file header in bytes.
pub const HEADER_SIZE: usize = 16;

/// Current payload format version.
pub const FORMAT_VERSION: u32 = 1;

const XXHASH_SEED: u32 = 0;

/// Prepend a header to `payload`.
pub fn wrap_with_header(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(&xxh32(payload, XXHASH_SEED).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Validate the header and return the payload it covers.
///
/// # Errors
///
/// - [`SaveError::BadMagic`] if the bytes do not start with `AUXA`.
/// - [`SaveError::NewerVersion`] for a file written by a newer format.
/// - [`SaveError::Truncated`] if the payload is shorter than the header says.
/// - [`SaveError::Checksum`] if the payload was modified or damaged.
pub fn unwrap_header(bytes: &[u8]) -> SaveResult<&[u8]> {
    if bytes.len() < MAGIC.len() || bytes[..4] != MAGIC {
        return Err(SaveError::BadMagic);
    }
    if bytes.len() < HEADER_SIZE {
        return Err(SaveError::Truncated(bytes.len()));
    }

    let word = |at: usize| u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
    let version = word(4);
    let len = word(8) as usize;
    let expected = word(12);

    if version > FORMAT_VERSION {
        return Err(SaveError::NewerVersion { found: version, supported: FORMAT_VERSION });
    }
    let payload = &bytes[HEADER_SIZE..];
    if payload.len() < len {
        return Err(SaveError::Truncated(bytes.len()));
    }
    if payload.len() > len {
        return Err(SaveError::TrailingBytes(payload.len() - len));
    }

    let computed = xxh32(payload, XXHASH_SEED);
    if computed != expected {
        return Err(SaveError::Checksum { expected, computed });
    }
    Ok(payload)
}
