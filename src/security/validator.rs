//! Rule-driven signature validation.
//!
//! A content object is checked against the first rule whose data pattern matches its name.
//! The rule constrains the key locator; the signer is then looked up among the trust anchors
//! and the previously verified certificates. An unknown signer is fetched and validated the
//! same way, so a chain of certificates is built from the content object up to an anchor.

use super::certificate::Certificate;
use crate::app::face::{Face, Timer};
use crate::fetch::{CertificateFetcher, CertificateRequest, FetchOutcome};
use crate::ndn::{Data, Nack, Name};
use crate::schema::{self, SchemaDocument, ValidationRule};

use colored::Colorize;
use tai64::Tai64;
use tracing::{debug, info};

use std::collections::HashMap;

pub const MAX_CHAIN_DEPTH: usize = 25;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// No rule applies to the name
    NoRule(Name),
    /// The key locator is missing or not allowed by the matching rule
    PolicyViolation { name: Name, rule: String, key_locator: Option<Name> },
    CannotRetrieveCertificate(Name),
    MalformedCertificate { name: Name, reason: String },
    InvalidSignature(Name),
    Expired(Name),
    /// The chain refers back to a certificate already in it
    Loop(Name),
    ExceededDepth(Name),
}

impl std::error::Error for ValidationError {}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Validation = std::result::Result<(), ValidationError>;

/// A validation waiting for the certificate of its topmost signer.
struct ValidationState {
    original: Data,
    /// Fetched certificates, the first one signed the original
    chain: Vec<Certificate>,
}

impl ValidationState {
    fn current(&self) -> &Data {
        self.chain.last().map(|c| c.data()).unwrap_or(&self.original)
    }
}

pub struct Validator {
    anchors: Vec<Certificate>,
    rules: Vec<ValidationRule>,
    verified: HashMap<Name, Certificate>,
    fetcher: CertificateFetcher,
    /// Validations waiting on a certificate fetch, by key locator
    pending: HashMap<Name, Vec<ValidationState>>,
    max_depth: usize,
}

impl Validator {
    pub fn new() -> Self {
        Validator {
            anchors: vec![],
            rules: vec![],
            verified: HashMap::new(),
            fetcher: CertificateFetcher::new(),
            pending: HashMap::new(),
            max_depth: MAX_CHAIN_DEPTH,
        }
    }

    /// Replaces the anchors and rules with those of `document` and forgets every verified
    /// certificate. Nothing changes when an anchor cannot be loaded.
    pub fn configure(&mut self, document: &SchemaDocument) -> schema::Result<()> {
        let anchors = document.trust_anchors().map(|record| record.load()).collect::<schema::Result<Vec<_>>>()?;
        self.anchors = anchors;
        self.rules = document.rules().cloned().collect();
        self.invalidate_verified_cache();
        debug!("[{}] {} anchors, {} rules", "validator".magenta(), self.anchors.len(), self.rules.len());
        Ok(())
    }

    pub fn anchors(&self) -> &[Certificate] {
        &self.anchors
    }

    pub fn rules(&self) -> &[ValidationRule] {
        &self.rules
    }

    pub fn is_verified(&self, cert_name: &Name) -> bool {
        self.verified.contains_key(cert_name)
    }

    /// Forgets the certificates verified so far; later validations walk their chains again.
    pub fn invalidate_verified_cache(&mut self) {
        self.verified.clear();
    }

    /// Number of validations waiting on a certificate.
    pub fn pending(&self) -> usize {
        self.pending.values().map(|v| v.len()).sum()
    }

    /// Validates `data`; `None` means a certificate is being fetched and the outcome will be
    /// returned by a later `on_data`, `on_nack` or `on_timer` call.
    pub fn validate(&mut self, face: &mut Face, data: &Data) -> Option<Validation> {
        let state = ValidationState { original: data.clone(), chain: vec![] };
        self.step(face, state)
    }

    /// Offers a received content object to the certificate fetcher. Returns the validations
    /// it completed, or `None` when it answered nothing the validator asked for.
    pub fn on_data(&mut self, face: &mut Face, data: &Data) -> Option<Vec<(Data, Validation)>> {
        let outcome = self.fetcher.on_data(face, data)?;
        Some(self.complete(face, outcome))
    }

    pub fn on_nack(&mut self, face: &mut Face, nack: &Nack) -> Option<Vec<(Data, Validation)>> {
        if !self.fetcher.is_pending(&nack.interest.name) {
            return None;
        }
        let completed = match self.fetcher.on_nack(face, nack) {
            Some(outcome) => self.complete(face, outcome),
            None => vec![],
        };
        Some(completed)
    }

    /// Handles a fetch timer; other timers are ignored.
    pub fn on_timer(&mut self, face: &mut Face, timer: &Timer) -> Vec<(Data, Validation)> {
        match self.fetcher.on_timer(face, timer) {
            Some(outcome) => self.complete(face, outcome),
            None => vec![],
        }
    }

    fn complete(&mut self, face: &mut Face, outcome: FetchOutcome) -> Vec<(Data, Validation)> {
        let states = self.pending.remove(outcome.name()).unwrap_or_default();
        let mut completed = vec![];
        for mut state in states {
            let original = state.original.clone();
            let result = match &outcome {
                FetchOutcome::Delivered { certificate, .. } => {
                    let seen = certificate.name() == &state.original.name
                        || state.chain.iter().any(|c| c.name() == certificate.name());
                    if seen {
                        Some(Err(ValidationError::Loop(certificate.name().clone())))
                    } else {
                        state.chain.push(certificate.clone());
                        self.step(face, state)
                    }
                }
                FetchOutcome::MalformedContent { name, reason } => {
                    Some(Err(ValidationError::MalformedCertificate { name: name.clone(), reason: reason.clone() }))
                }
                FetchOutcome::Exhausted(name) => Some(Err(ValidationError::CannotRetrieveCertificate(name.clone()))),
            };
            if let Some(result) = result {
                completed.push((original, result));
            }
        }
        completed
    }

    fn step(&mut self, face: &mut Face, state: ValidationState) -> Option<Validation> {
        let current = state.current();
        let rule = match self.rules.iter().find(|r| r.applies_to(&current.name)) {
            Some(rule) => rule,
            None => return Some(Err(ValidationError::NoRule(current.name.clone()))),
        };
        let key_locator = match current.key_locator() {
            Some(key_locator) if rule.key_locator.is_match(key_locator) => key_locator.clone(),
            key_locator => {
                return Some(Err(ValidationError::PolicyViolation {
                    name: current.name.clone(),
                    rule: rule.id.clone(),
                    key_locator: key_locator.cloned(),
                }))
            }
        };

        let signer = self
            .anchors
            .iter()
            .chain(self.verified.values())
            .find(|c| c.is_located_by(&key_locator))
            .cloned();
        if let Some(signer) = signer {
            return Some(self.verify_chain(state, &signer, face.clock()));
        }

        if state.chain.len() >= self.max_depth {
            return Some(Err(ValidationError::ExceededDepth(state.original.name.clone())));
        }
        let waiting = self.pending.entry(key_locator.clone()).or_insert_with(Vec::new);
        waiting.push(state);
        if !self.fetcher.is_pending(&key_locator) {
            debug!("[{}] fetching {}", "validator".magenta(), key_locator);
            self.fetcher.fetch(face, CertificateRequest::for_key_locator(&key_locator));
        }
        None
    }

    /// Verifies the chain from `signer` down to the original content object, caching every
    /// certificate that verifies.
    fn verify_chain(&mut self, state: ValidationState, signer: &Certificate, now: Tai64) -> Validation {
        let mut signer = signer.clone();
        for cert in state.chain.iter().rev() {
            check_signature(&signer, cert.data(), now)?;
            self.verified.insert(cert.name().clone(), cert.clone());
            signer = cert.clone();
        }
        check_signature(&signer, &state.original, now)?;
        info!("[{}] {} is valid", "validator".magenta(), state.original.name);
        Ok(())
    }
}

impl Default for Validator {
    fn default() -> Self {
        Validator::new()
    }
}

fn check_signature(signer: &Certificate, data: &Data, now: Tai64) -> Validation {
    if !signer.verify(data) {
        return Err(ValidationError::InvalidSignature(data.name.clone()));
    }
    let validity = data.signature.as_ref().and_then(|s| s.info.validity);
    if let Some(validity) = validity {
        if !validity.contains(now) {
            return Err(ValidationError::Expired(data.name.clone()));
        }
    }
    Ok(())
}
