//! Schema synchronisation by polling.
//!
//! Every participant keeps one subscribe request pending under `<zone>/SCHEMA/SUBSCRIBE`.
//! The anchor answers those requests only when its schema changes, with an empty signal;
//! a participant receiving the signal subscribes again and fetches `<zone>/SCHEMA/CONTENT`.

mod publisher;
mod subscriber;

pub use publisher::SchemaPublisher;
pub use subscriber::{SchemaSubscriber, SyncEvent};

use crate::ndn::Name;
use crate::schema;
use crate::security;

use std::time::Duration;

pub const SCHEMA_COMPONENT: &str = "SCHEMA";
pub const SUBSCRIBE_COMPONENT: &str = "SUBSCRIBE";
pub const CONTENT_COMPONENT: &str = "CONTENT";

/// Lifetime of subscribe and content requests
pub const DEFAULT_SUBSCRIBE_LIFETIME: Duration = Duration::from_secs(2);
/// Freshness of signals and documents, short enough that no cache serves a stale schema
pub const SCHEMA_FRESHNESS: Duration = Duration::from_millis(1);

/// The names of the schema protocol within a zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaNames {
    pub prefix: Name,
    pub subscribe: Name,
    pub content: Name,
}

impl SchemaNames {
    pub fn new(zone: &Name) -> Self {
        let prefix = zone.clone().append(SCHEMA_COMPONENT);
        SchemaNames {
            subscribe: prefix.clone().append(SUBSCRIBE_COMPONENT),
            content: prefix.clone().append(CONTENT_COMPONENT),
            prefix,
        }
    }
}

#[derive(Debug)]
pub enum Error {
    Security(security::Error),
    Schema(schema::Error),
}

impl std::error::Error for Error {}

impl std::convert::From<security::Error> for Error {
    fn from(error: security::Error) -> Self {
        Error::Security(error)
    }
}

impl std::convert::From<schema::Error> for Error {
    fn from(error: schema::Error) -> Self {
        Error::Schema(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
