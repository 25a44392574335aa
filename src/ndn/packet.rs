//! Request, content and negative acknowledgement packets.

use super::name::Name;
use super::Result;

use std::fmt;
use std::time::Duration;

use tai64::Tai64;

/// A request for named content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: Name,
    pub lifetime: Duration,
    /// The request is satisfied by any content whose name starts with `name`.
    pub can_be_prefix: bool,
    /// Cached content past its freshness period must not satisfy the request.
    pub must_be_fresh: bool,
    pub nonce: u32,
}

impl Interest {
    pub fn new(name: Name, lifetime: Duration) -> Self {
        Interest { name, lifetime, can_be_prefix: false, must_be_fresh: false, nonce: rand::random() }
    }

    pub fn can_be_prefix(mut self, can_be_prefix: bool) -> Self {
        self.can_be_prefix = can_be_prefix;
        self
    }

    pub fn must_be_fresh(mut self, must_be_fresh: bool) -> Self {
        self.must_be_fresh = must_be_fresh;
        self
    }

    /// Whether `data` satisfies this request.
    pub fn matches(&self, data: &Data) -> bool {
        if self.can_be_prefix {
            self.name.is_prefix_of(&data.name)
        } else {
            self.name == data.name
        }
    }
}

impl fmt::Debug for Interest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}?lifetime={}ms", self.name, self.lifetime.as_millis())?;
        if self.can_be_prefix {
            write!(f, "&prefix")?;
        }
        if self.must_be_fresh {
            write!(f, "&fresh")?;
        }
        write!(f, "&nonce={}", self.nonce)
    }
}

/// The interval during which a signature is valid, in TAI64 seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityPeriod {
    pub not_before: Tai64,
    pub not_after: Tai64,
}

impl ValidityPeriod {
    /// A period starting now and lasting `days`.
    pub fn days_from_now(days: u64) -> Self {
        ValidityPeriod::days_from(Tai64::now(), days)
    }

    pub fn days_from(start: Tai64, days: u64) -> Self {
        ValidityPeriod { not_before: start, not_after: Tai64(start.0.saturating_add(days * 24 * 60 * 60)) }
    }

    pub fn contains(&self, t: Tai64) -> bool {
        self.not_before <= t && t <= self.not_after
    }
}

/// Metadata covered by the signature of a content object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    /// Name of the key (or certificate) whose private half produced the signature.
    pub key_locator: Name,
    pub validity: Option<ValidityPeriod>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub info: SignatureInfo,
    pub value: Vec<u8>,
}

/// A named, signed content object.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Data {
    pub name: Name,
    pub freshness: Duration,
    pub content: Vec<u8>,
    pub signature: Option<Signature>,
}

impl Data {
    pub fn new(name: Name, content: Vec<u8>) -> Self {
        Data { name, freshness: Duration::from_millis(0), content, signature: None }
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }

    pub fn key_locator(&self) -> Option<&Name> {
        self.signature.as_ref().map(|s| &s.info.key_locator)
    }

    /// The bytes covered by a signature carrying `info`.
    pub fn signed_portion(&self, info: &SignatureInfo) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(&(&self.name, &self.freshness, &self.content, info))?;
        Ok(bytes)
    }

    /// The wire encoding of the whole packet.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Data> {
        let data = bincode::deserialize(bytes)?;
        Ok(data)
    }
}

impl fmt::Debug for Data {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} ({} bytes", self.name, self.content.len())?;
        if let Some(key_locator) = self.key_locator() {
            write!(f, ", key-locator={}", key_locator)?;
        }
        write!(f, ")")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NackReason {
    NoRoute,
    Congestion,
    Duplicate,
}

/// An explicit negative acknowledgement of an interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nack {
    pub interest: Interest,
    pub reason: NackReason,
}

impl Nack {
    pub fn new(interest: Interest, reason: NackReason) -> Self {
        Nack { interest, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interest_matching() {
        let data = Data::new(Name::from("/zoneA/test/prefix/KEY/k/self/1"), vec![]);
        let exact = Interest::new(Name::from("/zoneA/test/prefix/KEY/k"), Duration::from_secs(1));
        assert!(!exact.matches(&data));
        let prefix = exact.clone().can_be_prefix(true);
        assert!(prefix.matches(&data));
        let same = Interest::new(data.name.clone(), Duration::from_secs(1));
        assert!(same.matches(&data));
    }

    #[test]
    fn test_signed_portion_covers_content() {
        let info = SignatureInfo { key_locator: Name::from("/a/KEY/k"), validity: None };
        let a = Data::new(Name::from("/a/b"), vec![1, 2, 3]);
        let mut b = a.clone();
        b.content.push(4);
        assert_ne!(a.signed_portion(&info).unwrap(), b.signed_portion(&info).unwrap());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(Data::decode(&[0xff, 0x01]).is_err());
    }

    #[test]
    fn test_validity_period() {
        let period = ValidityPeriod::days_from_now(1);
        assert!(period.contains(Tai64::now()));
        assert!(!period.contains(Tai64(period.not_after.0 + 1)));
    }
}
