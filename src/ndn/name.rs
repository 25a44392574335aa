//! Hierarchical names.
//!
//! A [Name] is the only addressing primitive of the network: request names, content names,
//! key names and certificate names are all names related to each other by prefixing.

use super::{Error, Result};

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use std::fmt;
use std::str::FromStr;

/// Bytes escaped in the text form of a component: separators, pattern syntax and whitespace.
const COMPONENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'$')
    .add(b'*')
    .add(b'+')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'#');

/// The text form of a component, as it appears in URIs and name patterns.
pub fn escape_component(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

pub fn unescape_component(text: &str) -> String {
    percent_decode_str(text).decode_utf8_lossy().into_owned()
}

/// An ordered sequence of opaque components, displayed in URI form (`/a/b/c`).
#[derive(Hash, Eq, PartialEq, Ord, PartialOrd, Clone, Serialize, Deserialize, Default)]
pub struct Name(Vec<String>);

impl Name {
    /// The empty name `/`.
    pub fn new() -> Self {
        Name(vec![])
    }

    pub fn from_components<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Name(components.into_iter().map(|c| c.into()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn components(&self) -> &[String] {
        &self.0
    }

    /// Returns the component at `i`, a negative index counts from the end.
    pub fn get(&self, i: isize) -> Option<&str> {
        let index = if i < 0 { self.0.len() as isize + i } else { i };
        if index < 0 {
            return None;
        }
        self.0.get(index as usize).map(|c| c.as_str())
    }

    /// Appends a component, consuming and returning the name.
    pub fn append<S: Into<String>>(mut self, component: S) -> Self {
        self.0.push(component.into());
        self
    }

    pub fn push<S: Into<String>>(&mut self, component: S) {
        self.0.push(component.into());
    }

    /// Lexical concatenation `self + other`.
    pub fn concat(&self, other: &Name) -> Name {
        let mut components = self.0.clone();
        components.extend(other.0.iter().cloned());
        Name(components)
    }

    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.0.len() <= other.0.len() && self.0.iter().zip(other.0.iter()).all(|(a, b)| a == b)
    }

    /// The first `n` components; a negative `n` drops `|n|` components from the end.
    pub fn get_prefix(&self, n: isize) -> Name {
        let len = self.0.len() as isize;
        let end = if n < 0 { len + n } else { n.min(len) };
        if end <= 0 {
            return Name::new();
        }
        Name(self.0[..end as usize].to_vec())
    }

    /// Extracts `len` components starting at `start`, clamped to the size of the name.
    pub fn sub_name(&self, start: usize, len: usize) -> Name {
        if start >= self.0.len() {
            return Name::new();
        }
        let end = start.saturating_add(len).min(self.0.len());
        Name(self.0[start..end].to_vec())
    }

    /// Everything after `prefix`, or `None` when `prefix` is not a prefix of this name.
    pub fn strip_prefix(&self, prefix: &Name) -> Option<Name> {
        if prefix.is_prefix_of(self) {
            Some(self.sub_name(prefix.len(), self.len() - prefix.len()))
        } else {
            None
        }
    }

    /// Builds the pattern text matching exactly this name: `/a/b` becomes `<a><b>`.
    pub fn to_pattern(&self) -> String {
        self.0.iter().map(|c| format!("<{}>", escape_component(c))).collect::<Vec<String>>().concat()
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for component in self.0.iter() {
            write!(f, "/{}", escape_component(component))?;
        }
        Ok(())
    }
}

impl FromStr for Name {
    type Err = Error;

    /// Parses a URI, which must be absolute (`/` or `/a/b`).
    fn from_str(uri: &str) -> Result<Self> {
        if !uri.starts_with('/') {
            return Err(Error::InvalidName(uri.to_owned()));
        }
        Ok(Name::from(uri))
    }
}

impl From<&str> for Name {
    /// Lenient conversion: the leading `/` is optional, empty components are skipped and
    /// percent-escapes are decoded.
    fn from(uri: &str) -> Self {
        Name(uri.split('/').filter(|c| !c.is_empty()).map(unescape_component).collect())
    }
}

impl From<String> for Name {
    fn from(uri: String) -> Self {
        Name::from(uri.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_parse() {
        let name: Name = "/zoneA/test/prefix".parse().unwrap();
        assert_eq!(name.len(), 3);
        assert_eq!(name.to_string(), "/zoneA/test/prefix");
        assert_eq!(Name::new().to_string(), "/");
        assert_eq!("/".parse::<Name>().unwrap(), Name::new());
        assert_eq!("zoneA".parse::<Name>(), Err(Error::InvalidName("zoneA".to_owned())));
        assert_eq!(Name::from("zoneA//b/"), Name::from_components(vec!["zoneA", "b"]));
    }

    #[test]
    fn test_prefix_relations() {
        let zone = Name::from("/zoneA");
        let sign = zone.clone().append("SIGN");
        let key = Name::from("/zoneA/test/prefix/KEY/abc");
        let request = sign.concat(&key);
        assert!(sign.is_prefix_of(&request));
        assert!(zone.is_prefix_of(&request));
        assert!(!key.is_prefix_of(&request));
        assert!(request.is_prefix_of(&request));
        assert_eq!(request.strip_prefix(&sign), Some(key.clone()));
        assert_eq!(key.strip_prefix(&sign), None);
    }

    #[test]
    fn test_sub_ranges() {
        let name = Name::from("/a/b/c/d/e");
        assert_eq!(name.get(0), Some("a"));
        assert_eq!(name.get(-1), Some("e"));
        assert_eq!(name.get(-6), None);
        assert_eq!(name.get_prefix(2), Name::from("/a/b"));
        assert_eq!(name.get_prefix(-2), Name::from("/a/b/c"));
        assert_eq!(name.get_prefix(-9), Name::new());
        assert_eq!(name.sub_name(1, 2), Name::from("/b/c"));
        assert_eq!(name.sub_name(3, 100), Name::from("/d/e"));
        assert_eq!(name.sub_name(7, 1), Name::new());
    }

    #[test]
    fn test_to_pattern() {
        assert_eq!(Name::from("/a/b").to_pattern(), "<a><b>");
        assert_eq!(Name::new().to_pattern(), "");
    }

    #[test]
    fn test_components_are_escaped() {
        let name = Name::from_components(vec!["zoneA", "test node", "a/b", "<x>", "50%"]);
        assert_eq!(name.to_string(), "/zoneA/test%20node/a%2Fb/%3Cx%3E/50%25");
        assert_eq!(name.to_string().parse::<Name>().unwrap(), name);
        assert_eq!(Name::from("/zoneA/test node").to_string(), "/zoneA/test%20node");
        assert_eq!(Name::from_components(vec!["[k]"]).to_pattern(), "<%5Bk%5D>");
    }
}
