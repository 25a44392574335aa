//! The certificate signing handshake.
//!
//! A producer expresses `<zone>/SIGN/<key-name>` until it holds a certificate issued by the
//! zone. The anchor fetches the named key, certifies it under a name of its choosing and
//! answers with `<zone>/SIGN/<original-certificate-name>`, whose content is the wire
//! encoding of the new certificate.

use super::face::{Face, Timer, TimerId};
use super::Result;

use crate::ndn::{Data, Interest, Name};
use crate::security::certificate::{self, Certificate};
use crate::security::{KeyChain, SigningInfo};

use colored::Colorize;
use tracing::{debug, info, warn};

use std::collections::HashSet;
use std::convert::TryFrom;
use std::time::Duration;

pub const SIGN_COMPONENT: &str = "SIGN";
/// Freshness of the signing response
pub const SIGN_FRESHNESS: Duration = Duration::from_millis(1);

pub fn sign_prefix(zone: &Name) -> Name {
    zone.clone().append(SIGN_COMPONENT)
}

pub fn signing_request_name(zone: &Name, key_name: &Name) -> Name {
    sign_prefix(zone).concat(key_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningState {
    Unsigned,
    AwaitingSignature,
    Signed,
}

/// The producer half: a heartbeat of signing requests until a certificate is installed.
pub struct SigningRequester {
    zone: Name,
    identity: Name,
    key_name: Name,
    lifetime: Duration,
    state: SigningState,
    heartbeat: Option<TimerId>,
}

impl SigningRequester {
    pub fn new(zone: &Name, identity: &Name, lifetime: Duration) -> Self {
        SigningRequester {
            zone: zone.clone(),
            identity: identity.clone(),
            key_name: Name::new(),
            lifetime,
            state: SigningState::Unsigned,
            heartbeat: None,
        }
    }

    pub fn state(&self) -> SigningState {
        self.state
    }

    /// Starts asking the anchor to certify `key_name`.
    pub fn start(&mut self, face: &mut Face, key_name: Name) {
        self.key_name = key_name;
        self.state = SigningState::AwaitingSignature;
        self.send(face);
    }

    pub fn on_heartbeat(&mut self, face: &mut Face) {
        self.heartbeat = None;
        if self.state == SigningState::AwaitingSignature {
            self.send(face);
        }
    }

    fn send(&mut self, face: &mut Face) {
        let name = signing_request_name(&self.zone, &self.key_name);
        debug!("[{}] requesting signature {}", "signing".cyan(), name);
        face.express(Interest::new(name, self.lifetime).can_be_prefix(true).must_be_fresh(true));
        if let Some(heartbeat) = self.heartbeat.take() {
            face.cancel(heartbeat);
        }
        self.heartbeat = Some(face.schedule(self.lifetime, Timer::SignHeartbeat));
    }

    /// Extracts the issued certificate from a signing response. `None` when the response is
    /// not for this producer or does not carry a certificate.
    pub fn unwrap_response(&self, data: &Data) -> Option<Certificate> {
        let suffix = data.name.strip_prefix(&sign_prefix(&self.zone))?;
        if !self.key_name.is_prefix_of(&suffix) {
            return None;
        }
        let inner = match Data::decode(&data.content) {
            Ok(inner) => inner,
            Err(err) => {
                warn!("[{}] undecodable signing response {}: {}", "signing".cyan(), data.name, err);
                return None;
            }
        };
        match Certificate::try_from(inner) {
            Ok(cert) if self.accepts(&cert) => Some(cert),
            Ok(cert) => {
                warn!("[{}] {} does not certify {}", "signing".cyan(), cert.name(), self.key_name);
                None
            }
            Err(err) => {
                warn!("[{}] {}: {}", "signing".cyan(), data.name, err);
                None
            }
        }
    }

    /// Whether `cert` is a zone-issued certificate for this producer's key.
    pub fn accepts(&self, cert: &Certificate) -> bool {
        self.state == SigningState::AwaitingSignature
            && cert.identity() == self.identity
            && cert.key_name() == self.key_name
            && !cert.is_self_signed()
    }

    /// Installs `cert` and stops the heartbeat.
    pub fn complete(&mut self, face: &mut Face, keychain: &mut KeyChain, cert: Certificate) -> Result<()> {
        info!("[{}] installing {} issued by {:?}", "signing".cyan(), cert.name(), cert.signer());
        keychain.add_certificate(cert)?;
        self.state = SigningState::Signed;
        if let Some(heartbeat) = self.heartbeat.take() {
            face.cancel(heartbeat);
        }
        Ok(())
    }
}

/// The anchor half: fetches keys named by signing requests and certifies them.
pub struct CertificateIssuer {
    zone: Name,
    issuer_id: String,
    lifetime: Duration,
    /// Keys requested for signing and not yet certified
    pending: HashSet<Name>,
}

impl CertificateIssuer {
    pub fn new(zone: &Name, issuer_id: &str, lifetime: Duration) -> Self {
        CertificateIssuer { zone: zone.clone(), issuer_id: issuer_id.to_owned(), lifetime, pending: HashSet::new() }
    }

    pub fn is_signing_request(&self, name: &Name) -> bool {
        sign_prefix(&self.zone).is_prefix_of(name)
    }

    /// Fetches the key a signing request names.
    pub fn on_signing_request(&mut self, face: &mut Face, interest: &Interest) {
        let key_name = match interest.name.strip_prefix(&sign_prefix(&self.zone)) {
            Some(key_name) if certificate::is_valid_key_name(&key_name) => key_name,
            _ => {
                warn!("[{}] malformed signing request {}", "signing".cyan(), interest.name);
                return;
            }
        };
        debug!("[{}] fetching {} for signing", "signing".cyan(), key_name);
        face.express(Interest::new(key_name.clone(), self.lifetime).can_be_prefix(true).must_be_fresh(true));
        self.pending.insert(key_name);
    }

    /// Certifies a fetched key and answers the signing request. Returns the identity that
    /// was certified, `None` when nobody asked for this key.
    pub fn on_certificate(&mut self, face: &mut Face, keychain: &KeyChain, cert: &Certificate) -> Result<Option<Name>> {
        let key_name = cert.key_name();
        if !self.pending.remove(&key_name) {
            return Ok(None);
        }

        let mut issued = Certificate::unsigned(&key_name, &self.issuer_id, rand::random(), cert.public_key());
        keychain.sign(&mut issued, &SigningInfo::Default)?;

        let name = sign_prefix(&self.zone).concat(cert.name());
        let mut response = Data::new(name, issued.encode()?).with_freshness(SIGN_FRESHNESS);
        keychain.sign(&mut response, &SigningInfo::Default)?;
        info!("[{}] certified {} as {}", "signing".cyan(), key_name, issued.name);
        face.put(response);
        Ok(Some(cert.identity()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::face::Action;

    fn take_interests(face: &mut Face) -> Vec<Interest> {
        face.drain()
            .into_iter()
            .filter_map(|a| match a {
                Action::Express(interest) => Some(interest),
                _ => None,
            })
            .collect()
    }

    fn take_data(face: &mut Face) -> Vec<Data> {
        face.drain()
            .into_iter()
            .filter_map(|a| match a {
                Action::Put(data) => Some(data),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_handshake() {
        let zone = Name::from("/zoneA");
        let identity = Name::from("/zoneA/test/prefix");
        let lifetime = Duration::from_secs(2);

        let mut anchor = KeyChain::new();
        let anchor_cert = anchor.create_identity(&zone).unwrap();
        let issuer_id = anchor_cert.key_name().get(-1).unwrap().to_owned();
        let mut producer = KeyChain::new();
        let self_signed = producer.create_identity(&identity).unwrap();

        let mut producer_face = Face::new();
        let mut anchor_face = Face::new();
        let mut requester = SigningRequester::new(&zone, &identity, lifetime);
        let mut issuer = CertificateIssuer::new(&zone, &issuer_id, lifetime);

        requester.start(&mut producer_face, self_signed.key_name());
        let request = take_interests(&mut producer_face).pop().unwrap();
        assert_eq!(request.name, signing_request_name(&zone, &self_signed.key_name()));
        assert!(issuer.is_signing_request(&request.name));

        issuer.on_signing_request(&mut anchor_face, &request);
        let fetch = take_interests(&mut anchor_face).pop().unwrap();
        assert_eq!(fetch.name, self_signed.key_name());
        assert!(fetch.can_be_prefix && fetch.must_be_fresh);

        let served = producer.find_certificate(&fetch.name).unwrap().clone();
        let certified = issuer.on_certificate(&mut anchor_face, &anchor, &served).unwrap();
        assert_eq!(certified, Some(identity.clone()));
        // Only once per request
        assert_eq!(issuer.on_certificate(&mut anchor_face, &anchor, &served).unwrap(), None);

        let response = take_data(&mut anchor_face).pop().unwrap();
        assert_eq!(response.name, sign_prefix(&zone).concat(self_signed.name()));
        assert!(request.matches(&response));
        assert!(anchor_cert.verify(&response));

        let cert = requester.unwrap_response(&response).unwrap();
        assert_eq!(cert.issuer_id(), issuer_id);
        assert_eq!(cert.signer(), Some(&anchor_cert.key_name()));
        assert!(anchor_cert.verify(cert.data()));

        requester.complete(&mut producer_face, &mut producer, cert.clone()).unwrap();
        assert_eq!(requester.state(), SigningState::Signed);
        assert_eq!(producer.default_certificate(&identity), Some(&cert));
        assert_eq!(producer_face.armed_timers(), 0);
        assert!(!requester.accepts(&cert));
    }

    #[test]
    fn test_heartbeat_repeats_until_signed() {
        let zone = Name::from("/zoneA");
        let key_name = Name::from("/zoneA/test/prefix/KEY/k");
        let mut face = Face::new();
        let mut requester = SigningRequester::new(&zone, &Name::from("/zoneA/test/prefix"), Duration::from_secs(2));
        requester.start(&mut face, key_name);
        for _ in 0..3 {
            let id = face
                .actions()
                .iter()
                .rev()
                .find_map(|a| match a {
                    Action::Schedule { id, after } if *after == Duration::from_secs(2) => Some(*id),
                    _ => None,
                })
                .unwrap();
            assert_eq!(face.take_timer(id), Some(Timer::SignHeartbeat));
            requester.on_heartbeat(&mut face);
        }
        assert_eq!(take_interests(&mut face).len(), 4);
        assert_eq!(face.armed_timers(), 1);
    }

    #[test]
    fn test_foreign_response_is_ignored() {
        let zone = Name::from("/zoneA");
        let mut face = Face::new();
        let mut requester = SigningRequester::new(&zone, &Name::from("/zoneA/test/prefix"), Duration::from_secs(2));
        requester.start(&mut face, Name::from("/zoneA/test/prefix/KEY/k"));
        let other = Data::new(Name::from("/zoneA/SIGN/zoneA/other/KEY/x/self/1"), vec![]);
        assert!(requester.unwrap_response(&other).is_none());
        let garbage = Data::new(Name::from("/zoneA/SIGN/zoneA/test/prefix/KEY/k/self/1"), vec![9]);
        assert!(requester.unwrap_response(&garbage).is_none());
    }
}
