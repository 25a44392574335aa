//! One-shot certificate retrieval with retries.

mod fetcher;

pub use fetcher::{CertificateFetcher, CertificateRequest, FetchOutcome};

use crate::ndn::Name;

use std::time::Duration;

/// Lifetime of a certificate request issued on behalf of the validator
pub const CERTIFICATE_LIFETIME: Duration = Duration::from_secs(1);
/// Retries granted to a certificate request after the first attempt
pub const CERTIFICATE_RETRIES: i32 = 3;
/// Delay before the first retry after a negative acknowledgement
pub const INITIAL_BACKOFF: Duration = Duration::from_millis(500);
/// Upper bound of the doubling backoff
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The response could not be parsed as a certificate; never retried
    MalformedContent { name: Name, reason: String },
    /// Every attempt timed out or was negatively acknowledged
    RetryBudgetExhausted(Name),
}

impl std::error::Error for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
