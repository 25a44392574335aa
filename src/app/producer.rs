//! A content producer that bootstraps its own certificate through the signing handshake.

use super::app::{Env, Role};
use super::face::Timer;
use super::signing::{self, SigningRequester, SigningState};
use super::Result;

use crate::ndn::{Data, Interest, Name};
use crate::security::certificate::is_valid_certificate_name;
use crate::security::{Certificate, SigningInfo, ValidationError};

use colored::Colorize;
use tracing::{debug, info, warn};

use std::time::Duration;

fn default_prefix() -> String {
    "/zoneA/test/prefix".to_string()
}
fn default_payload_size() -> usize {
    1024
}
fn default_sign_lifetime_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProducerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Identity to certify, the prefix when absent
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default = "default_payload_size")]
    pub payload_size: usize,
    #[serde(default)]
    pub freshness_ms: u64,
    /// Period of the signing request heartbeat
    #[serde(default = "default_sign_lifetime_ms")]
    pub sign_lifetime_ms: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        ProducerConfig {
            prefix: default_prefix(),
            identity: None,
            payload_size: default_payload_size(),
            freshness_ms: 0,
            sign_lifetime_ms: default_sign_lifetime_ms(),
        }
    }
}

pub struct Producer {
    prefix: Name,
    identity: Name,
    payload_size: usize,
    freshness: Duration,
    sign_lifetime: Duration,
    requester: Option<SigningRequester>,
}

impl Producer {
    pub fn new(config: ProducerConfig) -> Self {
        let prefix = Name::from(config.prefix.as_str());
        let identity = config.identity.as_deref().map(Name::from).unwrap_or_else(|| prefix.clone());
        Producer {
            prefix,
            identity,
            payload_size: config.payload_size,
            freshness: Duration::from_millis(config.freshness_ms),
            sign_lifetime: Duration::from_millis(config.sign_lifetime_ms),
            requester: None,
        }
    }

    pub fn signing_state(&self) -> SigningState {
        self.requester.as_ref().map_or(SigningState::Unsigned, |r| r.state())
    }

    /// Validates the certificate carried by a signing response, installing it when valid.
    fn on_signing_response(&mut self, env: &mut Env, data: &Data) -> Result<()> {
        let cert = match self.requester.as_ref().and_then(|r| r.unwrap_response(data)) {
            Some(cert) => cert,
            None => return Ok(()),
        };
        *env.should_validate = true;
        match env.validator.validate(env.face, cert.data()) {
            Some(Ok(())) => {
                env.stats.validations_succeeded += 1;
                self.install(env, cert)
            }
            Some(Err(error)) => {
                env.stats.validations_failed += 1;
                warn!("[{}] issued certificate rejected: {}", "producer".green(), error);
                *env.should_validate = false;
                Ok(())
            }
            None => {
                debug!("[{}] validating {}", "producer".green(), cert.name());
                Ok(())
            }
        }
    }

    fn install(&mut self, env: &mut Env, cert: Certificate) -> Result<()> {
        if let Some(requester) = self.requester.as_mut() {
            if requester.accepts(&cert) {
                requester.complete(env.face, env.keychain, cert)?;
                info!("[{}] {} is now certified by the zone", "producer".green(), self.identity);
            }
        }
        Ok(())
    }
}

impl Role for Producer {
    fn kind(&self) -> &'static str {
        "producer"
    }

    fn start(&mut self, env: &mut Env) -> Result<()> {
        env.keychain.delete_identity(&self.identity);
        let cert = env.keychain.create_identity(&self.identity)?;
        env.face.register(self.prefix.clone());
        env.face.register(cert.key_name());
        // Nobody can vouch for this node yet
        *env.should_validate = false;

        let mut requester = SigningRequester::new(env.zone, &self.identity, self.sign_lifetime);
        requester.start(env.face, cert.key_name());
        self.requester = Some(requester);
        Ok(())
    }

    fn on_request_for_key(&mut self, env: &mut Env, interest: &Interest) -> Result<()> {
        if !env.serve_certificate(interest) {
            debug!("[{}] no certificate for {}", "producer".green(), interest.name);
        }
        Ok(())
    }

    fn on_request_for_content(&mut self, env: &mut Env, interest: &Interest) -> Result<()> {
        if !self.prefix.is_prefix_of(&interest.name) {
            debug!("[{}] dropping {}", "producer".green(), interest.name);
            return Ok(());
        }
        let data = Data::new(interest.name.clone(), vec![0u8; self.payload_size]).with_freshness(self.freshness);
        env.put_signed(data, &SigningInfo::Identity(self.identity.clone()))
    }

    /// A validated certificate, which may be the one issued to this producer.
    fn on_content_for_certificate(&mut self, env: &mut Env, cert: Certificate) -> Result<()> {
        if *env.should_validate {
            self.install(env, cert)
        } else {
            Ok(())
        }
    }

    fn on_content_for_application_data(&mut self, env: &mut Env, data: Data) -> Result<()> {
        if signing::sign_prefix(env.zone).is_prefix_of(&data.name) {
            self.on_signing_response(env, &data)
        } else {
            debug!("[{}] ignoring {}", "producer".green(), data.name);
            Ok(())
        }
    }

    fn on_validation_failed(&mut self, env: &mut Env, data: &Data, error: &ValidationError) -> Result<()> {
        warn!("[{}] {} failed validation: {}", "producer".green(), data.name, error);
        if self.signing_state() == SigningState::AwaitingSignature && is_valid_certificate_name(&data.name) {
            *env.should_validate = false;
        }
        Ok(())
    }

    fn on_timer(&mut self, env: &mut Env, timer: &Timer) -> Result<()> {
        if let (Timer::SignHeartbeat, Some(requester)) = (timer, self.requester.as_mut()) {
            requester.on_heartbeat(env.face);
        }
        Ok(())
    }
}
