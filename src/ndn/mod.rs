//! Names, packets and name patterns of the content-centric network.

pub mod key_id;
pub mod name;
pub mod packet;
pub mod pattern;

pub use key_id::KeyId;
pub use name::Name;
pub use packet::{Data, Interest, Nack, NackReason, Signature, SignatureInfo, ValidityPeriod};
pub use pattern::NamePattern;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The supplied string is not a valid name URI
    InvalidName(String),
    /// The supplied string is not a valid name pattern
    InvalidPattern(String),
    /// Error caused by converting from a `String` to a `KeyId`
    TryFromStringError,
    Bincode(String),
}

impl std::error::Error for Error {}

impl std::convert::From<Box<bincode::ErrorKind>> for Error {
    fn from(error: Box<bincode::ErrorKind>) -> Self {
        Error::Bincode(format!("{:?}", error))
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
