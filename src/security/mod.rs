//! Certificates, the local keychain and the signature validation engine.

pub mod cert_file;
pub mod certificate;
pub mod keychain;
pub mod validator;

pub use certificate::Certificate;
pub use keychain::{KeyChain, SigningInfo};
pub use validator::{Validation, ValidationError, Validator};

use crate::ndn::{self, Name};

#[derive(Debug)]
pub enum Error {
    Ndn(ndn::Error),
    CertFile(cert_file::Error),
    /// The content object cannot be interpreted as a certificate
    MalformedCertificate(String),
    /// No key is available for the requested signing info
    NoSigningKey(Name),
    /// A certificate was added for a key the keychain does not hold
    KeyNotFound(Name),
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

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
