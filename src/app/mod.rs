//! Node roles and the driver shared by all of them.

mod app;
pub mod consumer;
pub mod face;
pub mod producer;
pub mod signing;
pub mod trust_anchor;

pub use app::{App, Env, NodeStats, Role};
pub use consumer::{Consumer, ConsumerConfig, Randomize};
pub use face::{Action, Face, Timer, TimerId};
pub use producer::{Producer, ProducerConfig};
pub use trust_anchor::{TrustAnchor, TrustAnchorConfig};

use crate::schema;
use crate::security;
use crate::sync;

#[derive(Debug)]
pub enum Error {
    Security(security::Error),
    Schema(schema::Error),
    Sync(sync::Error),
    IO(std::io::Error),
}

impl std::error::Error for Error {}

impl std::convert::From<security::Error> for Error {
    fn from(error: security::Error) -> Self {
        Error::Security(error)
    }
}

impl std::convert::From<security::cert_file::Error> for Error {
    fn from(error: security::cert_file::Error) -> Self {
        Error::Security(security::Error::CertFile(error))
    }
}

impl std::convert::From<schema::Error> for Error {
    fn from(error: schema::Error) -> Self {
        Error::Schema(error)
    }
}

impl std::convert::From<sync::Error> for Error {
    fn from(error: sync::Error) -> Self {
        Error::Sync(error)
    }
}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl std::convert::From<crate::ndn::Error> for Error {
    fn from(error: crate::ndn::Error) -> Self {
        Error::Security(security::Error::Ndn(error))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
