use std::fmt;
use std::fs;
use std::path::Path;

use thiserror::Error;

// The HMAC key lives at a fixed window of the factory key file
pub const KEY_OFFSET: usize = 0xB0;
pub const KEY_LEN: usize = 0x10;

#[derive(Error, Debug)]
pub enum KeyError {
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    #[error("factory key file is {0} bytes, need at least {len}", len = KEY_OFFSET + KEY_LEN)]
    TooShort(usize),
}

#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);

impl SigningKey {
    pub fn new(bytes: &[u8]) -> Self {
        SigningKey(bytes.to_vec())
    }

    // Extract the signing key out of a raw factory key blob
    pub fn from_factory_key(blob: &[u8]) -> Result<Self, KeyError> {
        blob.get(KEY_OFFSET..KEY_OFFSET + KEY_LEN)
            .map(SigningKey::new)
            .ok_or(KeyError::TooShort(blob.len()))
    }

    pub fn from_key_file(path: &Path) -> Result<Self, KeyError> {
        let blob = fs::read(path)?;
        Self::from_factory_key(&blob)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SigningKey").field(&"****").finish()
    }
}
