use super::certificate::Certificate;
use crate::ndn::{self, Data};

use derive_more::{Display, Error, From};
use pem::{Pem, PemError};

use std::convert::TryFrom;
use std::{fs, path::Path};

const PEM_TAG: &str = "NDN CERTIFICATE";

/// Persists `cert` to `cert_file`, creating the parent directory when needed
pub fn save(cert: &Certificate, cert_file: &Path) -> Result<()> {
    if let Some(dir) = cert_file.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let bytes = cert.data().encode()?;
    fs::write(cert_file, to_pem(&bytes))?;
    Ok(())
}

/// Reads a certificate back from `cert_file`
pub fn load(cert_file: &Path) -> Result<Certificate> {
    let pem = pem::parse(fs::read(cert_file)?)?;
    if pem.tag != PEM_TAG {
        return Err(Error::UnexpectedTag);
    }
    from_bytes(&pem.contents)
}

/// Decodes a certificate from its wire encoding
pub fn from_bytes(bytes: &[u8]) -> Result<Certificate> {
    let data = Data::decode(bytes)?;
    Certificate::try_from(data).map_err(|_| Error::NotACertificate)
}

/// Convenience wrapper around `pem::encode(&Pem)`
#[inline]
fn to_pem(contents: &[u8]) -> String {
    let pem = Pem { tag: String::from(PEM_TAG), contents: contents.to_owned() };
    pem::encode(&pem)
}

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Display, From)]
pub enum Error {
    IoError(std::io::Error),
    CertificateReadError(PemError),
    DecodeError(ndn::Error),
    #[from(ignore)]
    UnexpectedTag,
    #[from(ignore)]
    NotACertificate,
}
