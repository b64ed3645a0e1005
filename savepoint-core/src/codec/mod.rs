/*!
The reversible codec pipeline: serialize, then conditionally compress, then
conditionally encrypt. Decode runs the exact inverse.

The pipeline does not self-describe which stages were applied; the options
active at write time are a caller contract and must be presented again at
read time.
*/

pub mod compress;
pub mod crypto;

pub use compress::{Compressor, GzipCompressor, NoCompression};
pub use crypto::Cryptor;

use crate::{config::SaveConfig, record::SaveRecord, Result};
use tracing::trace;

/// Which optional stages are active. Must match between encode and decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    pub compress: bool,
    pub encrypt: bool,
}

impl CodecOptions {
    /// Plain serialization only.
    pub fn plain() -> Self {
        Self {
            compress: false,
            encrypt: false,
        }
    }
}

impl From<&SaveConfig> for CodecOptions {
    fn from(config: &SaveConfig) -> Self {
        Self {
            compress: config.compress_data,
            encrypt: config.use_encryption,
        }
    }
}

/// The transform chain between a `SaveRecord` and its on-disk bytes.
pub struct Codec<C: Compressor = GzipCompressor> {
    compressor: C,
    cryptor: Cryptor,
}

impl Codec<GzipCompressor> {
    /// Gzip-backed codec with the given passphrase.
    pub fn new(passphrase: &str) -> Result<Self> {
        Self::with_compressor(passphrase, GzipCompressor::new())
    }
}

impl<C: Compressor> Codec<C> {
    /// Codec with an explicit compression stage.
    pub fn with_compressor(passphrase: &str, compressor: C) -> Result<Self> {
        Ok(Self {
            compressor,
            cryptor: Cryptor::new(passphrase)?,
        })
    }

    /// Run serialize -> compress -> encrypt, honoring the options.
    ///
    /// The whole artifact is built in memory; nothing touches disk here.
    pub fn encode(&self, record: &SaveRecord, options: &CodecOptions) -> Result<Vec<u8>> {
        record.validate()?;
        let mut bytes = serde_json::to_vec(record)?;
        if options.compress {
            trace!(algorithm = self.compressor.name(), "compressing artifact");
            bytes = self.compressor.compress(&bytes)?;
        }
        if options.encrypt {
            bytes = self.cryptor.seal(&bytes)?;
        }
        Ok(bytes)
    }

    /// Run decrypt -> decompress -> deserialize, the exact inverse of
    /// `encode` under the same options.
    pub fn decode(&self, bytes: &[u8], options: &CodecOptions) -> Result<SaveRecord> {
        let mut bytes = bytes.to_vec();
        if options.encrypt {
            bytes = self.cryptor.open(&bytes)?;
        }
        if options.compress {
            bytes = self.compressor.decompress(&bytes)?;
        }
        let record: SaveRecord = serde_json::from_slice(&bytes)?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SaveError;
    use serde_json::json;

    fn sample_record() -> SaveRecord {
        let mut record = SaveRecord::new(321.5);
        record
            .sections
            .insert("player".into(), json!({"level": 9, "hp": 55.5}));
        record
            .sections
            .insert("world".into(), json!({"scene": "harbor", "weather": "rain"}));
        record
    }

    #[test]
    fn test_roundtrip_all_stages() {
        let codec = Codec::new("test key").unwrap();
        let options = CodecOptions {
            compress: true,
            encrypt: true,
        };

        let record = sample_record();
        let bytes = codec.encode(&record, &options).unwrap();
        let decoded = codec.decode(&bytes, &options).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_roundtrip_plain() {
        let codec = Codec::new("test key").unwrap();
        let record = sample_record();

        let bytes = codec.encode(&record, &CodecOptions::plain()).unwrap();
        // Plain artifacts are readable JSON
        assert!(serde_json::from_slice::<serde_json::Value>(&bytes).is_ok());

        let decoded = codec.decode(&bytes, &CodecOptions::plain()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_options_are_a_caller_contract() {
        let codec = Codec::new("test key").unwrap();
        let written = CodecOptions {
            compress: true,
            encrypt: true,
        };

        let bytes = codec.encode(&sample_record(), &written).unwrap();
        // Reading back with mismatched options must fail, not return garbage
        assert!(codec.decode(&bytes, &CodecOptions::plain()).is_err());
    }

    #[test]
    fn test_tampered_ciphertext_fails_decode() {
        let codec = Codec::new("test key").unwrap();
        let options = CodecOptions {
            compress: true,
            encrypt: true,
        };

        let mut bytes = codec.encode(&sample_record(), &options).unwrap();
        let idx = bytes.len() - 4;
        bytes[idx] ^= 0xFF;

        let result = codec.decode(&bytes, &options);
        assert!(matches!(result, Err(SaveError::Crypto(_))));
    }

    #[test]
    fn test_invalid_record_refused_at_encode() {
        let codec = Codec::new("test key").unwrap();
        let mut record = sample_record();
        record.format_version = String::new();

        assert!(codec.encode(&record, &CodecOptions::plain()).is_err());
    }
}
