use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

const MAGIC: &[u8; 4] = b"CYK2";
const SALT_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + 12 + SALT_LEN + NONCE_LEN;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("decryption failed: wrong passphrase or corrupted data")]
    Decryption,
    #[error("invalid data format")]
    InvalidFormat,
}

/// Argon2id cost parameters, stored alongside the ciphertext.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    /// Memory in KiB.
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 65536,
            t_cost: 3,
            p_cost: 1,
        }
    }
}

impl KdfParams {
    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, CryptoError> {
        let params = Params::new(self.m_cost, self.t_cost, self.p_cost, Some(KEY_LEN))
            .map_err(|_| CryptoError::KeyDerivation)?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon2
            .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
            .map_err(|_| CryptoError::KeyDerivation)?;
        Ok(key)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32, CryptoError> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(CryptoError::InvalidFormat)
}

/// Encrypt `plaintext` under a key derived from `passphrase`.
///
/// Layout: `MAGIC (4) || m_cost (4) || t_cost (4) || p_cost (4) || salt (32) || nonce (12) || ciphertext`.
/// The header is authenticated as associated data, so tampered KDF
/// parameters fail like a wrong passphrase.
pub fn seal(passphrase: &str, plaintext: &[u8], kdf: KdfParams) -> Result<Vec<u8>, CryptoError> {
    let mut salt = [0u8; SALT_LEN];
    let mut nonce_bytes = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce_bytes);

    let mut output = Vec::with_capacity(HEADER_LEN + plaintext.len() + 16);
    output.extend_from_slice(MAGIC);
    output.extend_from_slice(&kdf.m_cost.to_le_bytes());
    output.extend_from_slice(&kdf.t_cost.to_le_bytes());
    output.extend_from_slice(&kdf.p_cost.to_le_bytes());
    output.extend_from_slice(&salt);
    output.extend_from_slice(&nonce_bytes);

    let key = kdf.derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CryptoError::Encryption)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce_bytes),
            Payload {
                msg: plaintext,
                aad: &output,
            },
        )
        .map_err(|_| CryptoError::Encryption)?;

    output.extend_from_slice(&ciphertext);
    Ok(output)
}

/// Decrypt a blob produced by [`seal`]. The returned buffer is wiped on drop.
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if sealed.len() < HEADER_LEN || sealed[..MAGIC.len()] != MAGIC[..] {
        return Err(CryptoError::InvalidFormat);
    }

    let kdf = KdfParams {
        m_cost: read_u32(sealed, 4)?,
        t_cost: read_u32(sealed, 8)?,
        p_cost: read_u32(sealed, 12)?,
    };
    let (header, ciphertext) = sealed.split_at(HEADER_LEN);
    let salt = &header[16..16 + SALT_LEN];
    let nonce_bytes = &header[16 + SALT_LEN..];

    let key = kdf.derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| CryptoError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce_bytes),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| CryptoError::Decryption)?;

    Ok(Zeroizing::new(plaintext))
}

#[cfg(test)]
pub(crate) const TEST_KDF: KdfParams = KdfParams {
    m_cost: 256,
    t_cost: 1,
    p_cost: 1,
};
