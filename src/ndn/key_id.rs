//! Hash-based key identifiers
//!
//! See the documentation of [KeyId] for details.

use std::convert::TryInto;
use std::fmt;
use std::str::FromStr;

use base58check::{FromBase58Check, ToBase58Check};
use blake2::digest::{Update, VariableOutput};
use blake2::Blake2bVar;

const KEY_ID_LEN: usize = 8;

/// Identifier of a key, used as the `<key-id>` component of key and certificate names.
///
/// The `KeyId` wraps an 8-byte BLAKE2b digest of the public key. It is displayed using the
/// Base58check format so that it is a single printable name component.
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize, Default)]
pub struct KeyId([u8; KEY_ID_LEN]);

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.to_base58check(0))
    }
}

impl FromStr for KeyId {
    type Err = super::Error;

    /// Converts a base58check encoded string to the bytes of a `KeyId`
    fn from_str(id_str: &str) -> Result<Self, super::Error> {
        let (vsn, bytes) =
            id_str.from_base58check().map_err(|_| super::Error::TryFromStringError)?;
        if vsn != 0 {
            return Err(super::Error::TryFromStringError);
        }
        let bytes: [u8; KEY_ID_LEN] =
            bytes.as_slice().try_into().map_err(|_| super::Error::TryFromStringError)?;
        Ok(KeyId(bytes))
    }
}

impl KeyId {
    /// Derives the id of a public key by hashing its bytes
    pub fn new(public_key: &[u8]) -> KeyId {
        KeyId(hash(public_key))
    }

    /// Returns a slice to the contained byte array
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

fn hash(input: &[u8]) -> [u8; KEY_ID_LEN] {
    let mut buf = [0u8; KEY_ID_LEN];
    // An 8-byte output is always a valid BLAKE2b length
    if let Ok(mut hasher) = Blake2bVar::new(KEY_ID_LEN) {
        hasher.update(input);
        let _ = hasher.finalize_variable(&mut buf);
    }
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_round_trip() {
        let id = KeyId::new(b"some public key");
        let parsed: KeyId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_derivation_is_stable() {
        assert_eq!(KeyId::new(b"a"), KeyId::new(b"a"));
        assert_ne!(KeyId::new(b"a"), KeyId::new(b"b"));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!("not-base58-0OIl".parse::<KeyId>().is_err());
    }
}
