use super::{Error, Result, CERTIFICATE_LIFETIME, CERTIFICATE_RETRIES, INITIAL_BACKOFF, MAX_BACKOFF};

use crate::app::face::{Face, Timer, TimerId};
use crate::ndn::{Data, Interest, Nack, Name};
use crate::security::Certificate;

use colored::Colorize;
use tracing::{debug, info, warn};

use std::collections::HashMap;
use std::convert::TryFrom;
use std::time::Duration;

/// What to fetch and how persistently.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub interest: Interest,
    /// Retries after the first attempt
    pub retries: i32,
    /// Delay before the first retry following a negative acknowledgement
    pub backoff: Duration,
}

impl CertificateRequest {
    /// A request for the certificate a key locator refers to, with the default budget.
    pub fn for_key_locator(key_locator: &Name) -> Self {
        CertificateRequest {
            interest: Interest::new(key_locator.clone(), CERTIFICATE_LIFETIME).can_be_prefix(true),
            retries: CERTIFICATE_RETRIES,
            backoff: INITIAL_BACKOFF,
        }
    }

    pub fn new(interest: Interest, retries: i32, backoff: Duration) -> Self {
        CertificateRequest { interest, retries, backoff }
    }

    pub fn name(&self) -> &Name {
        &self.interest.name
    }
}

/// The terminal result of a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Delivered { name: Name, certificate: Certificate },
    MalformedContent { name: Name, reason: String },
    Exhausted(Name),
}

impl FetchOutcome {
    /// The request name the outcome belongs to.
    pub fn name(&self) -> &Name {
        match self {
            FetchOutcome::Delivered { name, .. } => name,
            FetchOutcome::MalformedContent { name, .. } => name,
            FetchOutcome::Exhausted(name) => name,
        }
    }

    pub fn into_result(self) -> Result<Certificate> {
        match self {
            FetchOutcome::Delivered { certificate, .. } => Ok(certificate),
            FetchOutcome::MalformedContent { name, reason } => Err(Error::MalformedContent { name, reason }),
            FetchOutcome::Exhausted(name) => Err(Error::RetryBudgetExhausted(name)),
        }
    }
}

struct Outstanding {
    request: CertificateRequest,
    retries_left: i32,
    backoff: Duration,
    /// Nonce of the attempt currently in flight, `None` while backing off
    nonce: Option<u32>,
    timer: TimerId,
}

/// Tracks at most one outstanding request per name. Timeouts resend immediately, negative
/// acknowledgements resend after a doubling backoff, and either consumes one retry.
pub struct CertificateFetcher {
    outstanding: HashMap<Name, Outstanding>,
    max_backoff: Duration,
}

impl CertificateFetcher {
    pub fn new() -> Self {
        CertificateFetcher::with_max_backoff(MAX_BACKOFF)
    }

    pub fn with_max_backoff(max_backoff: Duration) -> Self {
        CertificateFetcher { outstanding: HashMap::new(), max_backoff }
    }

    pub fn is_pending(&self, name: &Name) -> bool {
        self.outstanding.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.outstanding.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outstanding.is_empty()
    }

    /// Sends `request`, replacing any request in flight for the same name.
    pub fn fetch(&mut self, face: &mut Face, request: CertificateRequest) {
        let name = request.name().clone();
        if let Some(previous) = self.outstanding.remove(&name) {
            debug!("[{}] superseding request for {}", "fetcher".cyan(), name);
            face.cancel(previous.timer);
        }
        let (nonce, timer) = send(face, &request.interest);
        let outstanding = Outstanding {
            retries_left: request.retries,
            backoff: request.backoff,
            nonce: Some(nonce),
            request,
            timer,
        };
        self.outstanding.insert(name, outstanding);
    }

    /// Consumes `data` when it answers an outstanding request.
    pub fn on_data(&mut self, face: &mut Face, data: &Data) -> Option<FetchOutcome> {
        let name = self
            .outstanding
            .iter()
            .find(|(_, o)| o.request.interest.matches(data))
            .map(|(name, _)| name.clone())?;
        let outstanding = self.outstanding.remove(&name)?;
        face.cancel(outstanding.timer);

        match Certificate::try_from(data.clone()) {
            Ok(certificate) => {
                debug!("[{}] retrieved {}", "fetcher".cyan(), certificate.name());
                Some(FetchOutcome::Delivered { name, certificate })
            }
            Err(err) => {
                warn!("[{}] malformed certificate {}: {}", "fetcher".cyan(), data.name, err);
                Some(FetchOutcome::MalformedContent { name, reason: err.to_string() })
            }
        }
    }

    /// Consumes a negative acknowledgement of the attempt in flight for its name.
    pub fn on_nack(&mut self, face: &mut Face, nack: &Nack) -> Option<FetchOutcome> {
        let name = nack.interest.name.clone();
        let outstanding = self.outstanding.get_mut(&name)?;
        if outstanding.nonce != Some(nack.interest.nonce) {
            debug!("[{}] ignoring stale nack for {}", "fetcher".cyan(), name);
            return None;
        }
        face.cancel(outstanding.timer);
        outstanding.nonce = None;
        outstanding.retries_left -= 1;
        if outstanding.retries_left < 0 {
            info!("[{}] {} exhausted after {:?}", "fetcher".cyan(), name, nack.reason);
            self.outstanding.remove(&name);
            return Some(FetchOutcome::Exhausted(name));
        }
        let max_backoff = self.max_backoff;
        let delay = outstanding.backoff.min(max_backoff);
        outstanding.backoff =
            outstanding.backoff.checked_mul(2).map_or(max_backoff, |doubled| doubled.min(max_backoff));
        debug!("[{}] {:?} for {}, retrying in {:?}", "fetcher".cyan(), nack.reason, name, delay);
        outstanding.timer = face.schedule(delay, Timer::FetchRetry(name));
        None
    }

    /// Handles a fired `FetchTimeout` or `FetchRetry` timer already claimed from the face.
    pub fn on_timer(&mut self, face: &mut Face, timer: &Timer) -> Option<FetchOutcome> {
        match timer {
            Timer::FetchTimeout(name) => {
                let outstanding = self.outstanding.get_mut(name)?;
                outstanding.retries_left -= 1;
                if outstanding.retries_left < 0 {
                    info!("[{}] {} timed out, no retries left", "fetcher".cyan(), name);
                    self.outstanding.remove(name);
                    return Some(FetchOutcome::Exhausted(name.clone()));
                }
                debug!("[{}] {} timed out, {} retries left", "fetcher".cyan(), name, outstanding.retries_left);
                let (nonce, timer) = send(face, &outstanding.request.interest);
                outstanding.nonce = Some(nonce);
                outstanding.timer = timer;
                None
            }
            Timer::FetchRetry(name) => {
                let outstanding = self.outstanding.get_mut(name)?;
                let (nonce, timer) = send(face, &outstanding.request.interest);
                outstanding.nonce = Some(nonce);
                outstanding.timer = timer;
                None
            }
            _ => None,
        }
    }
}

impl Default for CertificateFetcher {
    fn default() -> Self {
        CertificateFetcher::new()
    }
}

/// Expresses a fresh copy of `interest` and arms its lifetime timer.
fn send(face: &mut Face, interest: &Interest) -> (u32, TimerId) {
    let mut interest = interest.clone();
    interest.nonce = rand::random();
    let nonce = interest.nonce;
    let lifetime = interest.lifetime;
    let name = interest.name.clone();
    face.express(interest);
    (nonce, face.schedule(lifetime, Timer::FetchTimeout(name)))
}
