//! The flat text form of a trust schema.
//!
//! One entry per line, in precedence order:
//!
//! ```text
//! trust-anchor file /var/lib/bootsec/zoneA.cert
//! trust-anchor hex 0a1b2c...
//! rule sign ^<zoneA><SIGN><>*$ ^<zoneA><KEY><>{1,3}$
//! ```
//!
//! A rule line is `rule <id> <data-pattern> <key-locator-pattern>`; a file path runs to the
//! end of its line. Blank lines and lines starting with `#` are ignored.

use super::{Error, Result};
use crate::ndn::{Name, NamePattern};
use crate::security::{cert_file, Certificate};

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Content whose name matches `data` must be signed by a key whose name matches
/// `key_locator`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationRule {
    pub id: String,
    pub data: NamePattern,
    pub key_locator: NamePattern,
}

impl ValidationRule {
    pub fn new(id: &str, data: &str, key_locator: &str) -> Result<Self> {
        if id.is_empty() || id.contains(char::is_whitespace) {
            return Err(Error::InvalidLine { line: 0, text: id.to_owned() });
        }
        Ok(ValidationRule {
            id: id.to_owned(),
            data: NamePattern::parse(data)?,
            key_locator: NamePattern::parse(key_locator)?,
        })
    }

    pub fn applies_to(&self, name: &Name) -> bool {
        self.data.is_match(name)
    }
}

/// Where the root certificate of the zone is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustAnchorRecord {
    File(PathBuf),
    /// The wire encoding of the certificate, written as hex
    Inline(Vec<u8>),
}

impl TrustAnchorRecord {
    pub fn inline(cert: &Certificate) -> Result<Self> {
        Ok(TrustAnchorRecord::Inline(cert.data().encode()?))
    }

    pub fn load(&self) -> Result<Certificate> {
        let cert = match self {
            TrustAnchorRecord::File(path) => cert_file::load(path)?,
            TrustAnchorRecord::Inline(bytes) => cert_file::from_bytes(bytes)?,
        };
        Ok(cert)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaEntry {
    TrustAnchor(TrustAnchorRecord),
    Rule(ValidationRule),
}

impl fmt::Display for SchemaEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchemaEntry::TrustAnchor(TrustAnchorRecord::File(path)) => {
                write!(f, "trust-anchor file {}", path.display())
            }
            SchemaEntry::TrustAnchor(TrustAnchorRecord::Inline(bytes)) => {
                write!(f, "trust-anchor hex {}", hex::encode(bytes))
            }
            SchemaEntry::Rule(rule) => write!(f, "rule {} {} {}", rule.id, rule.data, rule.key_locator),
        }
    }
}

/// An ordered sequence of schema entries; earlier entries take precedence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemaDocument {
    entries: Vec<SchemaEntry>,
}

impl SchemaDocument {
    pub fn new(entries: Vec<SchemaEntry>) -> Self {
        SchemaDocument { entries }
    }

    pub fn entries(&self) -> &[SchemaEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<SchemaEntry> {
        self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &ValidationRule> {
        self.entries.iter().filter_map(|e| match e {
            SchemaEntry::Rule(rule) => Some(rule),
            _ => None,
        })
    }

    pub fn trust_anchors(&self) -> impl Iterator<Item = &TrustAnchorRecord> {
        self.entries.iter().filter_map(|e| match e {
            SchemaEntry::TrustAnchor(record) => Some(record),
            _ => None,
        })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let mut entries = vec![];
        for (i, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = || Error::InvalidLine { line: i + 1, text: line.to_owned() };
            if let Some(path) = file_path(line) {
                entries.push(SchemaEntry::TrustAnchor(TrustAnchorRecord::File(PathBuf::from(path))));
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            let entry = match fields.as_slice() {
                ["trust-anchor", "hex", blob] => SchemaEntry::TrustAnchor(TrustAnchorRecord::Inline(hex::decode(blob)?)),
                ["rule", id, data, key_locator] => SchemaEntry::Rule(ValidationRule::new(id, data, key_locator)?),
                _ => return Err(invalid()),
            };
            entries.push(entry);
        }
        Ok(SchemaDocument { entries })
    }

    /// Decodes the content of a schema content object.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| Error::InvalidEncoding)?;
        SchemaDocument::parse(text)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

/// The path of a `trust-anchor file` line, which may contain spaces.
fn file_path(line: &str) -> Option<&str> {
    let mut fields = line.splitn(3, ' ');
    match (fields.next(), fields.next(), fields.next()) {
        (Some("trust-anchor"), Some("file"), Some(path)) if !path.is_empty() => Some(path),
        _ => None,
    }
}

impl fmt::Display for SchemaDocument {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for entry in self.entries.iter() {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromStr for SchemaDocument {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self> {
        SchemaDocument::parse(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let text = "# zoneA\n\
                    trust-anchor file /tmp/zoneA.cert\n\
                    \n\
                    rule sign ^<zoneA><SIGN><>*$ ^<zoneA><KEY><>{1,3}$\n\
                    trust-anchor hex 00ff\n";
        let doc = SchemaDocument::parse(text).unwrap();
        assert_eq!(doc.entries().len(), 3);
        assert_eq!(doc.rules().count(), 1);
        assert_eq!(
            doc.trust_anchors().cloned().collect::<Vec<_>>(),
            vec![TrustAnchorRecord::File(PathBuf::from("/tmp/zoneA.cert")), TrustAnchorRecord::Inline(vec![0, 255])]
        );
        let rule = doc.rules().next().unwrap();
        assert_eq!(rule.id, "sign");
        assert!(rule.applies_to(&Name::from("/zoneA/SIGN/x")));
    }

    #[test]
    fn test_text_form_is_stable() {
        let doc = SchemaDocument::new(vec![
            SchemaEntry::Rule(ValidationRule::new("app", "^<a>[^<KEY>]*$", "^<a><KEY><>{1,3}$").unwrap()),
            SchemaEntry::TrustAnchor(TrustAnchorRecord::Inline(vec![1, 2, 3])),
        ]);
        let text = doc.to_string();
        assert_eq!(text, "rule app ^<a>[^<KEY>]*$ ^<a><KEY><>{1,3}$\ntrust-anchor hex 010203\n");
        assert_eq!(SchemaDocument::from_bytes(&doc.to_bytes()).unwrap(), doc);
    }

    #[test]
    fn test_paths_with_spaces() {
        let doc = SchemaDocument::new(vec![
            SchemaEntry::TrustAnchor(TrustAnchorRecord::File(PathBuf::from("/tmp/my zone/zoneA.cert"))),
            SchemaEntry::Rule(ValidationRule::new("sign", "^<zoneA><SIGN><>*$", "^<zoneA><KEY><>{1,3}$").unwrap()),
        ]);
        assert_eq!(SchemaDocument::parse(&doc.to_string()).unwrap(), doc);
        assert!(matches!(SchemaDocument::parse("trust-anchor file "), Err(Error::InvalidLine { line: 1, .. })));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(SchemaDocument::parse("rule only-id"), Err(Error::InvalidLine { line: 1, .. })));
        assert!(matches!(SchemaDocument::parse("\nbogus"), Err(Error::InvalidLine { line: 2, .. })));
        assert!(matches!(SchemaDocument::parse("rule r <a ^<b>$"), Err(Error::Ndn(_))));
        assert!(matches!(SchemaDocument::parse("trust-anchor hex zz"), Err(Error::Hex(_))));
        assert!(matches!(SchemaDocument::from_bytes(&[0xff, 0xfe]), Err(Error::InvalidEncoding)));
        assert!(SchemaDocument::parse("").unwrap().is_empty());
    }
}
