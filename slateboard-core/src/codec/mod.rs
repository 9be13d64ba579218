/*
    codec - Compression codec for document blobs

    Reversible text <-> blob transform used on the wire and in storage:
    zlib deflate at maximum compression, then standard base64. Output is
    deterministic for identical input, which is what makes the
    compressed-form equality check in the echo guard sound.
*/

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use thiserror::Error;

/// Errors from compressing or decompressing a content blob
#[derive(Debug, Error)]
pub enum CodecError {
    /// Blob is not valid base64
    #[error("Invalid base64 blob: {0}")]
    Base64(String),

    /// Deflate stream is corrupt or truncated
    #[error("Corrupt deflate stream: {0}")]
    Deflate(String),

    /// Decompressed bytes are not valid UTF-8
    #[error("Decompressed content is not UTF-8: {0}")]
    Utf8(String),
}

/// Compress text into a base64-encoded deflate blob.
pub fn compress(text: &str) -> Result<String, CodecError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::best());
    encoder
        .write_all(text.as_bytes())
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    let compressed = encoder
        .finish()
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    Ok(BASE64.encode(compressed))
}

/// Decompress a base64-encoded deflate blob back into text.
pub fn decompress(blob: &str) -> Result<String, CodecError> {
    let compressed = BASE64
        .decode(blob)
        .map_err(|e| CodecError::Base64(e.to_string()))?;
    let mut decoder = ZlibDecoder::new(compressed.as_slice());
    let mut bytes = Vec::new();
    decoder
        .read_to_end(&mut bytes)
        .map_err(|e| CodecError::Deflate(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| CodecError::Utf8(e.to_string()))
}
