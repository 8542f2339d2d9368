use std::fmt;
use std::io::{self, Read};

use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::buf::for_each_block;
use crate::key::SigningKey;
use crate::source::FileSource;
use crate::spk::SpkError;

type HmacSha1 = Hmac<Sha1>;

pub const CHECKSUM_LEN: usize = 16;
pub const SIGNATURE_LEN: usize = 20;

// Fill pattern of the signature field when no key is configured
pub const UNSIGNED_FILL: u8 = 0xAA;

// MD5 of the file content
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Checksum([u8; CHECKSUM_LEN]);

// HMAC-SHA1 of the file content, or the unsigned fill pattern
#[derive(PartialEq, Eq, Clone, Copy)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Checksum {
    pub fn as_bytes(&self) -> &[u8; CHECKSUM_LEN] {
        &self.0
    }
}

impl Signature {
    pub fn unsigned() -> Self {
        Signature([UNSIGNED_FILL; SIGNATURE_LEN])
    }

    pub fn is_unsigned(&self) -> bool {
        *self == Self::unsigned()
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LEN] {
        &self.0
    }
}

impl From<[u8; CHECKSUM_LEN]> for Checksum {
    fn from(bytes: [u8; CHECKSUM_LEN]) -> Self {
        Checksum(bytes)
    }
}

impl From<[u8; SIGNATURE_LEN]> for Signature {
    fn from(bytes: [u8; SIGNATURE_LEN]) -> Self {
        Signature(bytes)
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({})", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", hex::encode(self.0))
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Digests {
    pub checksum: Checksum,
    pub signature: Signature,
}

/// Computes the per file checksum and (optionally keyed) signature.
///
/// With `skip_data` set the content is never read and both digests are
/// taken over empty input, mirroring the data-less test archives.
#[derive(Debug, Clone, Default)]
pub struct Digester {
    key: Option<SigningKey>,
    skip_data: bool,
}

impl Digester {
    pub fn new(key: Option<SigningKey>) -> Self {
        Digester {
            key,
            skip_data: false,
        }
    }

    pub fn skip_data(mut self, skip: bool) -> Self {
        self.skip_data = skip;
        self
    }

    pub fn is_signing(&self) -> bool {
        self.key.is_some()
    }

    // Digest a whole stream, returns the digests and the byte count seen
    pub fn digest<R: Read>(&self, reader: &mut R) -> io::Result<(Digests, u64)> {
        let mut md5_sum = md5::Context::new();
        let mut hmac_sum = match &self.key {
            None => None,
            Some(key) => Some(HmacSha1::new_from_slice(key.as_bytes()).map_err(|_| {
                io::Error::new(io::ErrorKind::InvalidInput, "unusable hmac key")
            })?),
        };

        let len = for_each_block(reader, |block| {
            md5_sum.consume(block);
            if let Some(mac) = hmac_sum.as_mut() {
                mac.update(block);
            }
        })?;

        let signature = match hmac_sum {
            None => Signature::unsigned(),
            Some(mac) => {
                let mut bytes = [0u8; SIGNATURE_LEN];
                bytes.copy_from_slice(&mac.finalize().into_bytes());
                Signature(bytes)
            }
        };

        Ok((
            Digests {
                checksum: Checksum(md5_sum.compute().0),
                signature,
            },
            len,
        ))
    }

    pub fn digest_source(
        &self,
        path: &str,
        source: &FileSource,
        expected: u64,
    ) -> Result<Digests, SpkError> {
        if self.skip_data {
            return Ok(self.digest(&mut io::empty())?.0);
        }

        let mut reader = source.open()?;
        let (digests, actual) = self.digest(&mut reader)?;

        if actual != expected {
            return Err(SpkError::LengthMismatch {
                path: path.to_string(),
                expected,
                actual,
            });
        }
        Ok(digests)
    }
}

#[cfg(test)]
mod test_digester {
    use super::*;

    fn digest(digester: &Digester, data: &[u8]) -> Digests {
        digester.digest(&mut &data[..]).unwrap().0
    }

    #[test]
    fn md5_known_answers() {
        let digester = Digester::default();

        assert_eq!(
            hex::encode(digest(&digester, b"").checksum.as_bytes()),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(
            hex::encode(digest(&digester, b"abc").checksum.as_bytes()),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }

    #[test]
    fn unsigned_fill() {
        let digests = digest(&Digester::new(None), b"Hello World!");

        assert!(digests.signature.is_unsigned());
        assert_eq!(digests.signature.as_bytes(), &[0xAA; 20]);
    }

    #[test]
    fn hmac_sha1_known_answer() {
        // RFC 2202 test case 2
        let digester = Digester::new(Some(SigningKey::new(b"Jefe")));
        let digests = digest(&digester, b"what do ya want for nothing?");

        assert_eq!(
            hex::encode(digests.signature.as_bytes()),
            "effcdf6ae5eb2fa2d27416d5f184df9c259a7c79"
        );
    }

    #[test]
    fn deterministic() {
        let digester = Digester::new(Some(SigningKey::new(&[7; 16])));

        assert_eq!(digest(&digester, b"payload"), digest(&digester, b"payload"));
    }

    #[test]
    fn one_byte_changes_checksum() {
        let digester = Digester::new(Some(SigningKey::new(&[7; 16])));
        let a = digest(&digester, b"payload");
        let b = digest(&digester, b"paylOad");

        assert_ne!(a.checksum, b.checksum);
        assert_ne!(a.signature, b.signature);
    }

    #[test]
    fn counts_bytes() {
        let data = vec![3u8; 100_000];
        let (_, len) = Digester::default().digest(&mut &data[..]).unwrap();

        assert_eq!(len, 100_000);
    }

    #[test]
    fn length_mismatch() {
        let source = FileSource::from(b"0123456789".to_vec());
        let err = Digester::default()
            .digest_source("a.bin", &source, 11)
            .unwrap_err();

        assert!(matches!(
            err,
            SpkError::LengthMismatch {
                expected: 11,
                actual: 10,
                ..
            }
        ));
    }

    #[test]
    fn skip_data_ignores_content() {
        let source = FileSource::from(b"0123456789".to_vec());
        let digests = Digester::default()
            .skip_data(true)
            .digest_source("a.bin", &source, 999)
            .unwrap();

        assert_eq!(
            hex::encode(digests.checksum.as_bytes()),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
    }
}
