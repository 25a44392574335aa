//! In-memory store of the identities, keys and certificates a node owns.
//!
//! An identity holds one or more keys and names one of them as its default; every key holds
//! its certificates and names one of them as default. The protocol code only ever borrows
//! from the keychain.

use super::certificate::{self, Certificate, SELF_ISSUER};
use super::{Error, Result};
use crate::ndn::{Data, KeyId, Name, Signature, SignatureInfo, ValidityPeriod};

use ed25519_dalek::{Keypair, Signer};
use rand::rngs::OsRng;
use tai64::Tai64;

use std::convert::TryFrom;

const DEFAULT_VALIDITY_DAYS: u64 = 365;

/// Which key signs a content object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SigningInfo {
    /// The default key of the default identity
    Default,
    /// The default key of a specific identity
    Identity(Name),
}

pub struct Key {
    name: Name,
    keypair: Keypair,
    certificates: Vec<Certificate>,
    default_certificate: Name,
}

impl Key {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn default_certificate(&self) -> Option<&Certificate> {
        self.certificates.iter().find(|c| c.name() == &self.default_certificate)
    }
}

pub struct Identity {
    name: Name,
    keys: Vec<Key>,
    default_key: Name,
}

impl Identity {
    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key(&self, key_name: &Name) -> Option<&Key> {
        self.keys.iter().find(|k| &k.name == key_name)
    }

    pub fn default_key(&self) -> Option<&Key> {
        self.key(&self.default_key)
    }
}

pub struct KeyChain {
    identities: Vec<Identity>,
    default_identity: Option<Name>,
    validity_days: u64,
    /// Signing time; the wall clock when unset
    clock: Option<Tai64>,
}

impl KeyChain {
    pub fn new() -> Self {
        KeyChain { identities: vec![], default_identity: None, validity_days: DEFAULT_VALIDITY_DAYS, clock: None }
    }

    /// Sets the validity period stamped on every subsequent signature.
    pub fn set_validity_days(&mut self, days: u64) {
        self.validity_days = days;
    }

    /// Stamps later signatures as made at `now` instead of the wall clock.
    pub fn set_clock(&mut self, now: Option<Tai64>) {
        self.clock = now;
    }

    fn validity(&self) -> ValidityPeriod {
        ValidityPeriod::days_from(self.clock.unwrap_or_else(Tai64::now), self.validity_days)
    }

    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn identity(&self, name: &Name) -> Option<&Identity> {
        self.identities.iter().find(|i| &i.name == name)
    }

    pub fn default_identity(&self) -> Option<&Identity> {
        self.default_identity.as_ref().and_then(|name| self.identity(name))
    }

    /// Creates an identity with a fresh key and a self-signed certificate, which becomes the
    /// default certificate of the new key. The first identity created becomes the default.
    pub fn create_identity(&mut self, name: &Name) -> Result<Certificate> {
        let mut csprng = OsRng {};
        let keypair = Keypair::generate(&mut csprng);
        let key_name = certificate::make_key_name(name, &KeyId::new(keypair.public.as_bytes()));

        let mut data = Certificate::unsigned(&key_name, SELF_ISSUER, rand::random(), &keypair.public);
        let validity = self.validity();
        self.sign_with(&mut data, &keypair, &key_name, validity)?;
        let cert = Certificate::try_from(data)?;

        let key = Key {
            name: key_name.clone(),
            keypair,
            certificates: vec![cert.clone()],
            default_certificate: cert.name().clone(),
        };
        match self.identities.iter_mut().find(|i| &i.name == name) {
            Some(identity) => {
                identity.keys.push(key);
                identity.default_key = key_name;
            }
            None => self.identities.push(Identity {
                name: name.clone(),
                keys: vec![key],
                default_key: key_name,
            }),
        }
        if self.default_identity().is_none() {
            self.default_identity = Some(name.clone());
        }
        Ok(cert)
    }

    /// Removes an identity with all its keys and certificates. Returns whether it existed.
    pub fn delete_identity(&mut self, name: &Name) -> bool {
        let before = self.identities.len();
        self.identities.retain(|i| &i.name != name);
        if self.default_identity.as_ref() == Some(name) {
            self.default_identity = self.identities.first().map(|i| i.name.clone());
        }
        before != self.identities.len()
    }

    fn key(&self, key_name: &Name) -> Option<&Key> {
        self.identities.iter().flat_map(|i| i.keys.iter()).find(|k| &k.name == key_name)
    }

    fn key_mut(&mut self, key_name: &Name) -> Option<&mut Key> {
        self.identities.iter_mut().flat_map(|i| i.keys.iter_mut()).find(|k| &k.name == key_name)
    }

    /// Installs `cert` under its key, replacing a certificate of the same name, and makes it
    /// the key's default certificate.
    pub fn add_certificate(&mut self, cert: Certificate) -> Result<()> {
        let key_name = cert.key_name();
        let key = self.key_mut(&key_name).ok_or_else(|| Error::KeyNotFound(key_name.clone()))?;
        if key.keypair.public != *cert.public_key() {
            return Err(Error::MalformedCertificate(format!(
                "{} does not certify the key {}",
                cert.name(),
                key_name
            )));
        }
        key.certificates.retain(|c| c.name() != cert.name());
        key.default_certificate = cert.name().clone();
        key.certificates.push(cert);
        Ok(())
    }

    pub fn delete_certificate(&mut self, cert_name: &Name) -> bool {
        let key_name = match certificate::key_name_from_certificate_name(cert_name) {
            Some(key_name) => key_name,
            None => return false,
        };
        match self.key_mut(&key_name) {
            Some(key) => {
                let before = key.certificates.len();
                key.certificates.retain(|c| c.name() != cert_name);
                before != key.certificates.len()
            }
            None => false,
        }
    }

    pub fn default_certificate_for_key(&self, key_name: &Name) -> Option<&Certificate> {
        self.key(key_name).and_then(|k| k.default_certificate())
    }

    /// Resolves a request name to a certificate: a key name yields the key's default
    /// certificate, a certificate name yields that certificate.
    pub fn find_certificate(&self, name: &Name) -> Option<&Certificate> {
        if certificate::is_valid_key_name(name) {
            if let Some(cert) = self.default_certificate_for_key(name) {
                return Some(cert);
            }
        }
        self.identities
            .iter()
            .flat_map(|i| i.keys.iter())
            .flat_map(|k| k.certificates.iter())
            .find(|c| c.name() == name)
    }

    /// The default certificate of the default key of `identity`.
    pub fn default_certificate(&self, identity: &Name) -> Option<&Certificate> {
        self.identity(identity).and_then(|i| i.default_key()).and_then(|k| k.default_certificate())
    }

    fn signing_key(&self, info: &SigningInfo) -> Option<&Key> {
        let identity = match info {
            SigningInfo::Default => self.default_identity(),
            SigningInfo::Identity(name) => self.identity(name),
        };
        identity.and_then(|i| i.default_key())
    }

    /// Signs `data` in place, the key locator being the name of the signing key.
    pub fn sign(&self, data: &mut Data, info: &SigningInfo) -> Result<()> {
        let key = self.signing_key(info).ok_or_else(|| Error::NoSigningKey(signing_identity(info)))?;
        self.sign_with(data, &key.keypair, &key.name, self.validity())
    }

    /// Signs `data` with an explicit validity period.
    pub fn sign_for(&self, data: &mut Data, info: &SigningInfo, validity: ValidityPeriod) -> Result<()> {
        let key = self.signing_key(info).ok_or_else(|| Error::NoSigningKey(signing_identity(info)))?;
        self.sign_with(data, &key.keypair, &key.name, validity)
    }

    fn sign_with(&self, data: &mut Data, keypair: &Keypair, key_name: &Name, validity: ValidityPeriod) -> Result<()> {
        let info = SignatureInfo { key_locator: key_name.clone(), validity: Some(validity) };
        let signed = data.signed_portion(&info)?;
        let value = keypair.sign(&signed).to_bytes().to_vec();
        data.signature = Some(Signature { info, value });
        Ok(())
    }
}

fn signing_identity(info: &SigningInfo) -> Name {
    match info {
        SigningInfo::Default => Name::new(),
        SigningInfo::Identity(name) => name.clone(),
    }
}

impl Default for KeyChain {
    fn default() -> Self {
        KeyChain::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_identity() {
        let mut keychain = KeyChain::new();
        let zone = Name::from("/zoneA");
        let cert = keychain.create_identity(&zone).unwrap();
        assert_eq!(cert.identity(), zone);
        assert_eq!(keychain.default_identity().unwrap().name(), &zone);
        assert_eq!(keychain.default_certificate(&zone), Some(&cert));
        assert_eq!(keychain.find_certificate(&cert.key_name()), Some(&cert));
        assert_eq!(keychain.find_certificate(cert.name()), Some(&cert));
    }

    #[test]
    fn test_missing_identity_is_none() {
        let mut keychain = KeyChain::new();
        assert!(keychain.identity(&Name::from("/nope")).is_none());
        assert!(!keychain.delete_identity(&Name::from("/nope")));
        let mut data = Data::new(Name::from("/a"), vec![]);
        assert!(matches!(keychain.sign(&mut data, &SigningInfo::Default), Err(Error::NoSigningKey(_))));
    }

    #[test]
    fn test_signatures_follow_the_clock() {
        let mut keychain = KeyChain::new();
        keychain.set_clock(Some(Tai64(1_000)));
        let cert = keychain.create_identity(&Name::from("/zoneA")).unwrap();
        assert_eq!(cert.validity().unwrap().not_before, Tai64(1_000));

        keychain.set_clock(Some(Tai64(5_000)));
        let mut data = Data::new(Name::from("/zoneA/x"), vec![]);
        keychain.sign(&mut data, &SigningInfo::Default).unwrap();
        let validity = data.signature.unwrap().info.validity.unwrap();
        assert_eq!(validity, ValidityPeriod::days_from(Tai64(5_000), DEFAULT_VALIDITY_DAYS));
    }

    #[test]
    fn test_delete_then_recreate() {
        let mut keychain = KeyChain::new();
        let id = Name::from("/zoneA/test/prefix");
        let first = keychain.create_identity(&id).unwrap();
        assert!(keychain.delete_identity(&id));
        assert!(keychain.default_identity().is_none());
        let second = keychain.create_identity(&id).unwrap();
        assert_ne!(first.key_name(), second.key_name());
        assert_eq!(keychain.identity(&id).unwrap().keys().len(), 1);
    }

    #[test]
    fn test_add_certificate_replaces_default() {
        let mut anchor = KeyChain::new();
        anchor.create_identity(&Name::from("/zoneA")).unwrap();

        let mut producer = KeyChain::new();
        let id = Name::from("/zoneA/test/prefix");
        let self_signed = producer.create_identity(&id).unwrap();

        let mut data = Certificate::unsigned(&self_signed.key_name(), "anchor", 1, self_signed.public_key());
        anchor.sign(&mut data, &SigningInfo::Default).unwrap();
        let issued = Certificate::try_from(data).unwrap();

        producer.add_certificate(issued.clone()).unwrap();
        assert_eq!(producer.default_certificate(&id), Some(&issued));
        assert_eq!(producer.default_certificate_for_key(&self_signed.key_name()), Some(&issued));
        assert_eq!(producer.identity(&id).unwrap().default_key().unwrap().certificates().len(), 2);
    }

    #[test]
    fn test_add_certificate_for_unknown_key() {
        let mut other = KeyChain::new();
        let cert = other.create_identity(&Name::from("/zoneB")).unwrap();
        let mut keychain = KeyChain::new();
        assert!(matches!(keychain.add_certificate(cert), Err(Error::KeyNotFound(_))));
    }

    #[test]
    fn test_delete_certificate() {
        let mut keychain = KeyChain::new();
        let cert = keychain.create_identity(&Name::from("/zoneA")).unwrap();
        assert!(keychain.delete_certificate(cert.name()));
        assert!(!keychain.delete_certificate(cert.name()));
        assert!(keychain.default_certificate(&Name::from("/zoneA")).is_none());
    }
}
