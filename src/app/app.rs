use super::face::{Action, Face, Timer, TimerId};
use super::signing;
use super::Result;

use crate::ndn::{Data, Interest, Nack, Name};
use crate::schema::{SchemaDocument, SchemaStore};
use crate::security::certificate::{is_valid_certificate_name, is_valid_key_name};
use crate::security::{Certificate, KeyChain, SigningInfo, Validation, ValidationError, Validator};
use crate::sync::{SchemaSubscriber, SyncEvent};

use colored::Colorize;
use tai64::Tai64;
use tracing::{debug, info, warn};

use std::convert::TryFrom;
use std::time::Duration;

/// Per-node counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub interests_sent: u64,
    pub interests_received: u64,
    pub data_sent: u64,
    pub data_received: u64,
    pub nacks_received: u64,
    pub validations_succeeded: u64,
    pub validations_failed: u64,
    pub schema_reloads: u64,
}

/// The node state a role may touch from its callbacks.
pub struct Env<'a> {
    pub zone: &'a Name,
    pub face: &'a mut Face,
    pub keychain: &'a mut KeyChain,
    pub validator: &'a mut Validator,
    pub schema: &'a mut SchemaStore,
    pub stats: &'a mut NodeStats,
    /// Whether received content goes through the validator before delivery
    pub should_validate: &'a mut bool,
}

impl<'a> Env<'a> {
    /// Signs `data` and sends it.
    pub fn put_signed(&mut self, mut data: Data, info: &SigningInfo) -> Result<()> {
        self.keychain.sign(&mut data, info)?;
        self.face.put(data);
        Ok(())
    }

    /// Replies with the certificate a key or certificate name resolves to, if any.
    pub fn serve_certificate(&mut self, interest: &Interest) -> bool {
        match self.keychain.find_certificate(&interest.name) {
            Some(cert) => {
                debug!("[{}] serving {}", "app".green(), cert.name());
                self.face.put(cert.data().clone());
                true
            }
            None => false,
        }
    }
}

/// What distinguishes the trust anchor, producers and consumers.
pub trait Role {
    fn kind(&self) -> &'static str;

    fn start(&mut self, env: &mut Env) -> Result<()>;

    /// A request for a key, a certificate, or a signature under `<zone>/SIGN`.
    fn on_request_for_key(&mut self, env: &mut Env, interest: &Interest) -> Result<()>;

    fn on_request_for_content(&mut self, env: &mut Env, interest: &Interest) -> Result<()>;

    fn on_content_for_certificate(&mut self, env: &mut Env, cert: Certificate) -> Result<()>;

    fn on_content_for_application_data(&mut self, env: &mut Env, data: Data) -> Result<()>;

    fn on_validation_failed(&mut self, _env: &mut Env, data: &Data, error: &ValidationError) -> Result<()> {
        warn!("[{}] {} failed validation: {}", self.kind().green(), data.name, error);
        Ok(())
    }

    /// Role timers (`SignHeartbeat`, `ConsumeNext`).
    fn on_timer(&mut self, _env: &mut Env, _timer: &Timer) -> Result<()> {
        Ok(())
    }
}

/// Drives a role: dispatches packets and timers, validates content and keeps the schema
/// replica current.
pub struct App {
    label: String,
    zone: Name,
    face: Face,
    keychain: KeyChain,
    validator: Validator,
    schema: SchemaStore,
    initial_schema: Option<SchemaDocument>,
    subscriber: Option<SchemaSubscriber>,
    should_validate: bool,
    stats: NodeStats,
    role: Box<dyn Role>,
}

impl App {
    pub fn new<S: Into<String>>(label: S, zone: Name, role: Box<dyn Role>) -> Self {
        App {
            label: label.into(),
            zone,
            face: Face::new(),
            keychain: KeyChain::new(),
            validator: Validator::new(),
            schema: SchemaStore::new(),
            initial_schema: None,
            subscriber: None,
            should_validate: true,
            stats: NodeStats::default(),
            role,
        }
    }

    /// The schema installed on start, normally carrying the zone's trust anchor.
    pub fn with_schema(mut self, document: SchemaDocument) -> Self {
        self.initial_schema = Some(document);
        self
    }

    /// Keeps the schema replica in sync with the anchor.
    pub fn with_schema_sync(mut self, lifetime: Duration) -> Self {
        self.subscriber = Some(SchemaSubscriber::with_lifetime(&self.zone, lifetime));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> &'static str {
        self.role.kind()
    }

    pub fn zone(&self) -> &Name {
        &self.zone
    }

    pub fn keychain(&self) -> &KeyChain {
        &self.keychain
    }

    pub fn schema(&self) -> &SchemaStore {
        &self.schema
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    pub fn should_validate(&self) -> bool {
        self.should_validate
    }

    /// Runs the node on a clock starting at `epoch` rather than on the wall clock.
    pub fn set_epoch(&mut self, epoch: Tai64) {
        self.face.set_epoch(epoch);
    }

    fn tick(&mut self, now: Duration) {
        self.face.set_now(now);
        self.keychain.set_clock(self.face.host_time());
    }

    /// Hands the recorded actions to the host.
    pub fn drain_actions(&mut self) -> Vec<Action> {
        let actions = self.face.drain();
        for action in actions.iter() {
            match action {
                Action::Express(_) => self.stats.interests_sent += 1,
                Action::Put(_) => self.stats.data_sent += 1,
                _ => (),
            }
        }
        actions
    }

    fn split(&mut self) -> (&mut dyn Role, Env<'_>) {
        let env = Env {
            zone: &self.zone,
            face: &mut self.face,
            keychain: &mut self.keychain,
            validator: &mut self.validator,
            schema: &mut self.schema,
            stats: &mut self.stats,
            should_validate: &mut self.should_validate,
        };
        (self.role.as_mut(), env)
    }

    pub fn start(&mut self, now: Duration) -> Result<()> {
        self.tick(now);
        info!("[{}] starting {} in {}", self.role.kind().green(), self.label, self.zone);
        if let Some(document) = self.initial_schema.take() {
            self.schema.load(document);
            self.schema.reload(&mut self.validator)?;
        }
        let (role, mut env) = self.split();
        role.start(&mut env)?;
        if let Some(subscriber) = self.subscriber.as_mut() {
            subscriber.start(&mut self.face);
        }
        Ok(())
    }

    pub fn on_interest(&mut self, now: Duration, interest: Interest) -> Result<()> {
        self.tick(now);
        self.stats.interests_received += 1;
        debug!("[{}] {} <- {:?}", self.role.kind().green(), self.label, interest);
        let is_key = is_valid_key_name(&interest.name) || is_valid_certificate_name(&interest.name);
        let (role, mut env) = self.split();
        if is_key {
            role.on_request_for_key(&mut env, &interest)
        } else {
            role.on_request_for_content(&mut env, &interest)
        }
    }

    pub fn on_data(&mut self, now: Duration, data: Data) -> Result<()> {
        self.tick(now);
        self.stats.data_received += 1;
        debug!("[{}] {} <- {:?}", self.role.kind().green(), self.label, data);
        if let Some(completed) = self.validator.on_data(&mut self.face, &data) {
            return self.on_validated(completed);
        }
        if !self.should_validate {
            return self.deliver(data);
        }
        match self.validator.validate(&mut self.face, &data) {
            Some(result) => self.on_validated(vec![(data, result)]),
            None => Ok(()),
        }
    }

    pub fn on_nack(&mut self, now: Duration, nack: Nack) -> Result<()> {
        self.tick(now);
        self.stats.nacks_received += 1;
        match self.validator.on_nack(&mut self.face, &nack) {
            Some(completed) => self.on_validated(completed),
            None => {
                debug!("[{}] {} nack {:?} for {}", self.role.kind().green(), self.label, nack.reason, nack.interest.name);
                Ok(())
            }
        }
    }

    pub fn on_timer(&mut self, now: Duration, id: TimerId) -> Result<()> {
        self.tick(now);
        let timer = match self.face.take_timer(id) {
            Some(timer) => timer,
            // Canceled or superseded
            None => return Ok(()),
        };
        match timer {
            Timer::FetchTimeout(_) | Timer::FetchRetry(_) => {
                let completed = self.validator.on_timer(&mut self.face, &timer);
                self.on_validated(completed)
            }
            Timer::Subscribe => {
                if let Some(subscriber) = self.subscriber.as_mut() {
                    subscriber.on_timer(&mut self.face);
                }
                Ok(())
            }
            Timer::SignHeartbeat | Timer::ConsumeNext => {
                let (role, mut env) = self.split();
                role.on_timer(&mut env, &timer)
            }
        }
    }

    fn on_validated(&mut self, completed: Vec<(Data, Validation)>) -> Result<()> {
        for (data, result) in completed {
            match result {
                Ok(()) => {
                    self.stats.validations_succeeded += 1;
                    self.deliver(data)?;
                }
                Err(error) => {
                    self.stats.validations_failed += 1;
                    let (role, mut env) = self.split();
                    role.on_validation_failed(&mut env, &data, &error)?;
                }
            }
        }
        Ok(())
    }

    /// Hands accepted content to the schema replica or to the role.
    fn deliver(&mut self, data: Data) -> Result<()> {
        if let Some(subscriber) = self.subscriber.as_mut() {
            if subscriber.is_schema_data(&data.name) {
                match subscriber.on_data(&mut self.face, &data) {
                    Ok(Some(SyncEvent::Updated(document))) => {
                        self.schema.load(document);
                        match self.schema.reload(&mut self.validator) {
                            Ok(()) => self.stats.schema_reloads += 1,
                            Err(err) => {
                                warn!("[{}] {} kept its validator: {}", self.role.kind().green(), self.label, err)
                            }
                        }
                    }
                    Ok(_) => (),
                    Err(err) => {
                        warn!("[{}] {} ignored schema {}: {}", self.role.kind().green(), self.label, data.name, err)
                    }
                }
                return Ok(());
            }
        }

        let under_sign = signing::sign_prefix(&self.zone).is_prefix_of(&data.name);
        if !under_sign && is_valid_certificate_name(&data.name) {
            match Certificate::try_from(data) {
                Ok(cert) => {
                    let (role, mut env) = self.split();
                    role.on_content_for_certificate(&mut env, cert)
                }
                Err(err) => {
                    warn!("[{}] {} dropped malformed certificate: {}", self.role.kind().green(), self.label, err);
                    Ok(())
                }
            }
        } else {
            let (role, mut env) = self.split();
            role.on_content_for_application_data(&mut env, data)
        }
    }
}
