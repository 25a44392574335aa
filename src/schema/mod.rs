//! The trust schema: trust anchor records and ordered validation rules.

mod document;
mod store;

pub use document::{SchemaDocument, SchemaEntry, TrustAnchorRecord, ValidationRule};
pub use store::SchemaStore;

use crate::ndn;
use crate::security::cert_file;

#[derive(Debug)]
pub enum Error {
    Ndn(ndn::Error),
    CertFile(cert_file::Error),
    Hex(hex::FromHexError),
    /// A line of a schema document that is neither a rule nor a trust anchor
    InvalidLine { line: usize, text: String },
    /// The document is not valid UTF-8
    InvalidEncoding,
}

impl std::error::Error for Error {}

impl std::convert::From<ndn::Error> for Error {
    fn from(error: ndn::Error) -> Self {
        Error::Ndn(error)
    }
}

impl std::convert::From<cert_file::Error> for Error {
    fn from(error: cert_file::Error) -> Self {
        Error::CertFile(error)
    }
}

impl std::convert::From<hex::FromHexError> for Error {
    fn from(error: hex::FromHexError) -> Self {
        Error::Hex(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
