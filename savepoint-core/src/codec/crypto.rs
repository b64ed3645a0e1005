/*!
Encryption stage of the codec pipeline.

AES-256-GCM with a fresh random 96-bit nonce per call, written as a prefix
of the sealed buffer. The AEAD tag makes any ciphertext modification fail at
`open` instead of surfacing as garbage further down the pipeline.
*/

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use rand::RngCore;

use crate::{Result, SaveError};

/// Cipher key length in bytes.
pub const KEY_LEN: usize = 32;
/// Nonce prefix length in bytes.
pub const NONCE_LEN: usize = 12;

/// Symmetric-key encryptor for encoded save artifacts.
pub struct Cryptor {
    cipher: Aes256Gcm,
}

impl Cryptor {
    /// Build a cryptor from a passphrase.
    ///
    /// The passphrase is stretched to the 32-byte key by cyclic repetition,
    /// so an empty passphrase is rejected outright.
    pub fn new(passphrase: &str) -> Result<Self> {
        if passphrase.is_empty() {
            return Err(SaveError::crypto("passphrase must not be empty"));
        }
        let key_bytes = derive_key(passphrase);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));
        Ok(Self { cipher })
    }

    /// Encrypt, producing `nonce || ciphertext` in one buffer.
    pub fn seal(&self, plain: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain)
            .map_err(|_| SaveError::crypto("encryption failed"))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Decrypt a buffer produced by `seal`.
    ///
    /// Fails with `SaveError::Crypto` on truncated input, a wrong key, or
    /// any tampered byte.
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(SaveError::crypto(format!(
                "sealed buffer too short: {} bytes, need at least {NONCE_LEN}",
                sealed.len()
            )));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SaveError::crypto("authentication failed: wrong key or corrupted data"))
    }
}

/// Stretch a passphrase to the cipher key length by cyclic repetition.
fn derive_key(passphrase: &str) -> [u8; KEY_LEN] {
    let mut key = [0u8; KEY_LEN];
    for (dst, src) in key.iter_mut().zip(passphrase.as_bytes().iter().cycle()) {
        *dst = *src;
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_roundtrip() {
        let cryptor = Cryptor::new("secret passphrase").unwrap();
        let plain = b"the save record payload";

        let sealed = cryptor.seal(plain).unwrap();
        assert!(sealed.len() > plain.len());

        let opened = cryptor.open(&sealed).unwrap();
        assert_eq!(opened, plain);
    }

    #[test]
    fn test_fresh_nonce_per_call() {
        let cryptor = Cryptor::new("secret").unwrap();
        let a = cryptor.seal(b"same input").unwrap();
        let b = cryptor.seal(b"same input").unwrap();
        assert_ne!(a, b);
        assert_ne!(&a[..NONCE_LEN], &b[..NONCE_LEN]);
    }

    #[test]
    fn test_tampered_byte_detected() {
        let cryptor = Cryptor::new("secret").unwrap();
        let mut sealed = cryptor.seal(b"payload to protect").unwrap();

        // Flip one byte in the ciphertext region, past the nonce prefix
        let idx = NONCE_LEN + (sealed.len() - NONCE_LEN) / 2;
        sealed[idx] ^= 0x01;

        let result = cryptor.open(&sealed);
        assert!(matches!(result, Err(SaveError::Crypto(_))));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let sealed = Cryptor::new("right key").unwrap().seal(b"data").unwrap();
        let result = Cryptor::new("wrong key").unwrap().open(&sealed);
        assert!(matches!(result, Err(SaveError::Crypto(_))));
    }

    #[test]
    fn test_truncated_input_rejected() {
        let cryptor = Cryptor::new("secret").unwrap();
        let result = cryptor.open(&[0u8; NONCE_LEN - 1]);
        assert!(matches!(result, Err(SaveError::Crypto(_))));
    }

    #[test]
    fn test_empty_passphrase_rejected() {
        assert!(matches!(Cryptor::new(""), Err(SaveError::Crypto(_))));
    }

    #[test]
    fn test_key_stretching_cycles_passphrase() {
        let key = derive_key("abc");
        assert_eq!(&key[..6], b"abcabc");
        assert_eq!(key[KEY_LEN - 1], b'b'); // index 31 -> second byte of the cycle
    }
}
