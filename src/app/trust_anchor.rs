//! The zone's trust anchor: owns the root certificate and the authoritative schema, certifies
//! producer keys and announces schema changes.

use super::app::{Env, Role};
use super::signing::{self, CertificateIssuer};
use super::Result;

use crate::ndn::{Data, Interest, Name};
use crate::schema::{TrustAnchorRecord, ValidationRule};
use crate::security::{cert_file, certificate, Certificate};
use crate::sync::{SchemaNames, SchemaPublisher};

use colored::Colorize;
use tracing::{debug, info, warn};

use std::path::PathBuf;
use std::time::Duration;

fn default_zone() -> String {
    "/zoneA".to_string()
}
fn default_sign_lifetime_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrustAnchorConfig {
    #[serde(default = "default_zone")]
    pub zone: String,
    /// Where the root certificate is written; inlined in the schema when absent
    #[serde(default)]
    pub cert_file: Option<PathBuf>,
    /// Where the schema is written after every change
    #[serde(default)]
    pub schema_file: Option<PathBuf>,
    /// Lifetime of the key fetches issued for signing requests
    #[serde(default = "default_sign_lifetime_ms")]
    pub sign_lifetime_ms: u64,
}

impl Default for TrustAnchorConfig {
    fn default() -> Self {
        TrustAnchorConfig {
            zone: default_zone(),
            cert_file: None,
            schema_file: None,
            sign_lifetime_ms: default_sign_lifetime_ms(),
        }
    }
}

/// `^<a><b>` followed by `<KEY>` and one to three more components.
fn key_pattern(identity: &Name) -> String {
    format!("^{}<{}><>{{1,3}}$", identity.to_pattern(), certificate::KEY_COMPONENT)
}

pub struct TrustAnchor {
    config: TrustAnchorConfig,
    issuer: Option<CertificateIssuer>,
    publisher: Option<SchemaPublisher>,
}

impl TrustAnchor {
    pub fn new(config: TrustAnchorConfig) -> Self {
        TrustAnchor { config, issuer: None, publisher: None }
    }

    fn persist_root(&self, cert: &Certificate) -> Result<TrustAnchorRecord> {
        match &self.config.cert_file {
            Some(path) => {
                cert_file::save(cert, path)?;
                info!("[{}] root certificate written to {}", "anchor".green(), path.display());
                Ok(TrustAnchorRecord::File(path.clone()))
            }
            None => Ok(TrustAnchorRecord::inline(cert)?),
        }
    }

    fn persist_schema(&self, env: &Env) -> Result<()> {
        if let Some(path) = &self.config.schema_file {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)?;
                }
            }
            std::fs::write(path, env.schema.serialize().to_string())?;
        }
        Ok(())
    }

    /// Authorizes `identity`'s key (certified by the zone) and its application content
    /// (signed by that key), then signals the change to every subscriber.
    pub fn add_producer_schema(&mut self, env: &mut Env, identity: &Name) -> Result<()> {
        let zone_key = key_pattern(env.zone);
        let own_key = key_pattern(identity);
        let rules = vec![
            ValidationRule::new(&format!("key:{}", identity), &own_key, &zone_key)?,
            ValidationRule::new(
                &format!("app:{}", identity),
                &format!("^{}[^<{}>]*$", identity.to_pattern(), certificate::KEY_COMPONENT),
                &own_key,
            )?,
        ];
        for rule in rules {
            if env.schema.contains_rule(&rule) {
                debug!("[{}] rule {} already present", "anchor".green(), rule.id);
                continue;
            }
            info!("[{}] adding rule {} {} {}", "anchor".green(), rule.id, rule.data, rule.key_locator);
            env.schema.add_rule(rule);
        }
        self.persist_schema(env)?;
        env.schema.reload(env.validator)?;
        if let Some(publisher) = self.publisher.as_mut() {
            publisher.notify(env.face, env.keychain)?;
        }
        Ok(())
    }
}

impl Role for TrustAnchor {
    fn kind(&self) -> &'static str {
        "anchor"
    }

    fn start(&mut self, env: &mut Env) -> Result<()> {
        let zone = env.zone.clone();
        if env.keychain.delete_identity(&zone) {
            debug!("[{}] replaced existing identity {}", "anchor".green(), zone);
        }
        let cert = env.keychain.create_identity(&zone)?;
        let record = self.persist_root(&cert)?;

        let zone_key = key_pattern(&zone);
        let names = SchemaNames::new(&zone);
        let sign_prefix = signing::sign_prefix(&zone);
        env.schema.clear();
        env.schema.add_trust_anchor(record);
        env.schema.add_rule(ValidationRule::new("sign", &format!("^{}<>*$", sign_prefix.to_pattern()), &zone_key)?);
        env.schema.add_rule(ValidationRule::new("schema", &format!("^{}<>*$", names.prefix.to_pattern()), &zone_key)?);
        self.persist_schema(env)?;
        env.schema.reload(env.validator)?;
        *env.should_validate = false;

        env.face.register(names.prefix.clone());
        env.face.register(sign_prefix);
        env.face.register(zone.clone().append(certificate::KEY_COMPONENT));

        let issuer_id = cert.key_name().get(-1).unwrap_or(certificate::SELF_ISSUER).to_owned();
        let lifetime = Duration::from_millis(self.config.sign_lifetime_ms);
        self.issuer = Some(CertificateIssuer::new(&zone, &issuer_id, lifetime));
        self.publisher = Some(SchemaPublisher::new(&zone));
        info!("[{}] zone {} anchored by {}", "anchor".green(), zone, cert.name());
        Ok(())
    }

    fn on_request_for_key(&mut self, env: &mut Env, interest: &Interest) -> Result<()> {
        if let Some(issuer) = self.issuer.as_mut() {
            if issuer.is_signing_request(&interest.name) {
                issuer.on_signing_request(env.face, interest);
                return Ok(());
            }
        }
        if !env.serve_certificate(interest) {
            debug!("[{}] no certificate for {}", "anchor".green(), interest.name);
        }
        Ok(())
    }

    fn on_request_for_content(&mut self, env: &mut Env, interest: &Interest) -> Result<()> {
        let handled = match self.publisher.as_mut() {
            Some(publisher) => publisher.on_interest(env.face, env.keychain, env.schema, interest)?,
            None => false,
        };
        if !handled {
            debug!("[{}] dropping {}", "anchor".green(), interest.name);
        }
        Ok(())
    }

    fn on_content_for_certificate(&mut self, env: &mut Env, cert: Certificate) -> Result<()> {
        let certified = match self.issuer.as_mut() {
            Some(issuer) => issuer.on_certificate(env.face, env.keychain, &cert)?,
            None => None,
        };
        match certified {
            Some(identity) => {
                if let Err(err) = self.add_producer_schema(env, &identity) {
                    warn!("[{}] could not authorize {}: {}", "anchor".green(), identity, err);
                }
                Ok(())
            }
            None => {
                debug!("[{}] unsolicited certificate {}", "anchor".green(), cert.name());
                Ok(())
            }
        }
    }

    fn on_content_for_application_data(&mut self, _env: &mut Env, data: Data) -> Result<()> {
        debug!("[{}] ignoring {}", "anchor".green(), data.name);
        Ok(())
    }
}
