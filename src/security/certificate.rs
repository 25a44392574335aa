//! Certificates and the key/certificate naming conventions.
//!
//! A key is named `<identity>/KEY/<key-id>` and a certificate for it
//! `<identity>/KEY/<key-id>/<issuer-id>/<version>`. A certificate is an ordinary content
//! object under such a name whose content is the 32-byte public key.

use super::{Error, Result};
use crate::ndn::{Data, KeyId, Name, ValidityPeriod};

use ed25519_dalek::{PublicKey, Signature as Ed25519Signature, Verifier, PUBLIC_KEY_LENGTH};

use std::convert::TryFrom;
use std::fmt;

pub const KEY_COMPONENT: &str = "KEY";
/// Issuer id of self-signed certificates
pub const SELF_ISSUER: &str = "self";

pub fn is_valid_key_name(name: &Name) -> bool {
    name.len() >= 2 && name.get(-2) == Some(KEY_COMPONENT)
}

pub fn is_valid_certificate_name(name: &Name) -> bool {
    name.len() >= 4 && name.get(-4) == Some(KEY_COMPONENT)
}

pub fn make_key_name(identity: &Name, key_id: &KeyId) -> Name {
    identity.clone().append(KEY_COMPONENT).append(key_id.to_string())
}

pub fn make_certificate_name(key_name: &Name, issuer: &str, version: u32) -> Name {
    key_name.clone().append(issuer).append(version.to_string())
}

pub fn key_name_from_certificate_name(name: &Name) -> Option<Name> {
    if is_valid_certificate_name(name) {
        Some(name.get_prefix(-2))
    } else {
        None
    }
}

pub fn identity_from_key_name(name: &Name) -> Option<Name> {
    if is_valid_key_name(name) {
        Some(name.get_prefix(-2))
    } else {
        None
    }
}

/// A content object binding a public key to a key name.
#[derive(Clone, PartialEq, Eq)]
pub struct Certificate {
    data: Data,
    public_key: PublicKey,
}

impl Certificate {
    /// An unsigned certificate content object for `public_key`.
    pub fn unsigned(key_name: &Name, issuer: &str, version: u32, public_key: &PublicKey) -> Data {
        let name = make_certificate_name(key_name, issuer, version);
        Data::new(name, public_key.as_bytes().to_vec())
    }

    pub fn name(&self) -> &Name {
        &self.data.name
    }

    pub fn key_name(&self) -> Name {
        self.data.name.get_prefix(-2)
    }

    pub fn identity(&self) -> Name {
        self.data.name.get_prefix(-4)
    }

    pub fn issuer_id(&self) -> &str {
        self.data.name.get(-2).unwrap_or_default()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    pub fn data(&self) -> &Data {
        &self.data
    }

    pub fn into_data(self) -> Data {
        self.data
    }

    /// The name of the key which signed this certificate.
    pub fn signer(&self) -> Option<&Name> {
        self.data.key_locator()
    }

    pub fn validity(&self) -> Option<ValidityPeriod> {
        self.data.signature.as_ref().and_then(|s| s.info.validity)
    }

    pub fn is_self_signed(&self) -> bool {
        self.signer().map_or(false, |signer| signer.is_prefix_of(self.name()))
    }

    /// Whether this certificate can be the one a key locator refers to, the locator being
    /// either the key name or the full certificate name.
    pub fn is_located_by(&self, key_locator: &Name) -> bool {
        key_locator.is_prefix_of(self.name()) && key_locator.len() >= self.key_name().len()
    }

    /// Checks the signature of `data` against this certificate's public key.
    pub fn verify(&self, data: &Data) -> bool {
        let signature = match &data.signature {
            Some(signature) => signature,
            None => return false,
        };
        let signed = match data.signed_portion(&signature.info) {
            Ok(signed) => signed,
            Err(_) => return false,
        };
        match Ed25519Signature::try_from(signature.value.as_slice()) {
            Ok(sig) => self.public_key.verify(&signed, &sig).is_ok(),
            Err(_) => false,
        }
    }
}

impl TryFrom<Data> for Certificate {
    type Error = Error;

    fn try_from(data: Data) -> Result<Self> {
        if !is_valid_certificate_name(&data.name) {
            return Err(Error::MalformedCertificate(format!("invalid certificate name {}", data.name)));
        }
        if data.content.len() != PUBLIC_KEY_LENGTH {
            return Err(Error::MalformedCertificate(format!(
                "content of {} is {} bytes, not a public key",
                data.name,
                data.content.len()
            )));
        }
        let public_key = PublicKey::from_bytes(&data.content)
            .map_err(|e| Error::MalformedCertificate(format!("{}: {}", data.name, e)))?;
        Ok(Certificate { data, public_key })
    }
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Certificate({}", self.name())?;
        if let Some(signer) = self.signer() {
            write!(f, ", signer={}", signer)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::security::keychain::{KeyChain, SigningInfo};

    #[test]
    fn test_naming_conventions() {
        let cert_name = Name::from("/zoneA/test/prefix/KEY/k/self/7");
        assert!(is_valid_certificate_name(&cert_name));
        assert!(!is_valid_key_name(&cert_name));
        let key_name = key_name_from_certificate_name(&cert_name).unwrap();
        assert_eq!(key_name, Name::from("/zoneA/test/prefix/KEY/k"));
        assert!(is_valid_key_name(&key_name));
        assert_eq!(identity_from_key_name(&key_name), Some(Name::from("/zoneA/test/prefix")));
        assert_eq!(key_name_from_certificate_name(&key_name), None);
    }

    #[test]
    fn test_parse_rejects_non_certificates() {
        let not_a_name = Data::new(Name::from("/zoneA/test/prefix/1"), vec![0u8; 32]);
        assert!(Certificate::try_from(not_a_name).is_err());
        let short = Data::new(Name::from("/zoneA/KEY/k/self/1"), vec![1, 2, 3]);
        assert!(Certificate::try_from(short).is_err());
    }

    #[test]
    fn test_self_signed_certificate_verifies_itself() {
        let mut keychain = KeyChain::new();
        let cert = keychain.create_identity(&Name::from("/zoneA")).unwrap();
        assert!(cert.is_self_signed());
        assert_eq!(cert.issuer_id(), SELF_ISSUER);
        assert!(cert.verify(cert.data()));
        assert!(cert.is_located_by(&cert.key_name()));
        assert!(cert.is_located_by(cert.name()));
        assert!(!cert.is_located_by(&cert.identity()));

        let mut data = Data::new(Name::from("/zoneA/app/1"), b"hello".to_vec());
        keychain.sign(&mut data, &SigningInfo::Default).unwrap();
        assert!(cert.verify(&data));
        data.content = b"tampered".to_vec();
        assert!(!cert.verify(&data));
    }
}
