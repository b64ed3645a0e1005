/*!
Compression stage of the codec pipeline.

Gzip is the production algorithm; `NoCompression` passes bytes through for
tests and for callers that disable the stage entirely.
*/

use crate::{Result, SaveError};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use std::io::{Read, Write};

/// Compression abstraction for encoded save data.
pub trait Compressor {
    /// Compress the input bytes.
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Decompress a buffer previously produced by `compress`.
    ///
    /// Fails with `SaveError::Compression` on truncated or non-conformant
    /// input.
    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>>;

    /// Name of the algorithm, for logging.
    fn name(&self) -> &str;
}

/// Gzip compressor backed by flate2.
#[derive(Debug, Clone)]
pub struct GzipCompressor {
    level: Compression,
}

impl GzipCompressor {
    /// Default compression level (6).
    pub fn new() -> Self {
        Self {
            level: Compression::default(),
        }
    }

    /// Explicit compression level (0-9).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Compression::new(level),
        }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compressor for GzipCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut encoder = GzEncoder::new(Vec::new(), self.level);
        encoder
            .write_all(data)
            .map_err(|e| SaveError::compression(format!("failed to write gzip stream: {e}")))?;
        encoder
            .finish()
            .map_err(|e| SaveError::compression(format!("failed to finish gzip stream: {e}")))
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(data);
        let mut out = Vec::new();
        decoder
            .read_to_end(&mut out)
            .map_err(|e| SaveError::compression(format!("failed to read gzip stream: {e}")))?;
        Ok(out)
    }

    fn name(&self) -> &str {
        "gzip"
    }
}

/// Pass-through compressor.
#[derive(Debug, Clone, Default)]
pub struct NoCompression;

impl NoCompression {
    pub fn new() -> Self {
        Self
    }
}

impl Compressor for NoCompression {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        Ok(data.to_vec())
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_roundtrip() {
        let compressor = GzipCompressor::new();
        let original = b"slot data slot data slot data slot data".repeat(8);

        let compressed = compressor.compress(&original).unwrap();
        assert!(compressed.len() < original.len());

        let restored = compressor.decompress(&compressed).unwrap();
        assert_eq!(restored, original);
    }

    #[test]
    fn test_gzip_rejects_garbage() {
        let compressor = GzipCompressor::new();
        let result = compressor.decompress(b"definitely not a gzip stream");
        assert!(matches!(result, Err(SaveError::Compression(_))));
    }

    #[test]
    fn test_gzip_rejects_truncated_stream() {
        let compressor = GzipCompressor::new();
        let compressed = compressor.compress(b"some payload worth truncating").unwrap();

        let truncated = &compressed[..compressed.len() / 2];
        let result = compressor.decompress(truncated);
        assert!(matches!(result, Err(SaveError::Compression(_))));
    }

    #[test]
    fn test_no_compression_passthrough() {
        let compressor = NoCompression::new();
        let data = b"raw bytes";
        assert_eq!(compressor.compress(data).unwrap(), data);
        assert_eq!(compressor.decompress(data).unwrap(), data);
        assert_eq!(compressor.name(), "none");
    }
}
