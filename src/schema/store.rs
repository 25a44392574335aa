use super::document::{SchemaDocument, SchemaEntry, TrustAnchorRecord, ValidationRule};
use super::Result;
use crate::security::Validator;

use colored::Colorize;
use tracing::info;

/// The schema a node currently holds. New entries go to the front so that the most recent
/// rule is the first one matched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaStore {
    entries: Vec<SchemaEntry>,
}

impl SchemaStore {
    pub fn new() -> Self {
        SchemaStore::default()
    }

    /// Replaces the whole rule set.
    pub fn load(&mut self, document: SchemaDocument) {
        self.entries = document.into_entries();
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn add_rule(&mut self, rule: ValidationRule) {
        self.entries.insert(0, SchemaEntry::Rule(rule));
    }

    pub fn add_trust_anchor(&mut self, record: TrustAnchorRecord) {
        self.entries.insert(0, SchemaEntry::TrustAnchor(record));
    }

    pub fn contains_rule(&self, rule: &ValidationRule) -> bool {
        self.entries.iter().any(|e| matches!(e, SchemaEntry::Rule(r) if r == rule))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn serialize(&self) -> SchemaDocument {
        SchemaDocument::new(self.entries.clone())
    }

    /// Pushes the current entries into `validator`, replacing its anchors and rules.
    pub fn reload(&self, validator: &mut Validator) -> Result<()> {
        validator.configure(&self.serialize())?;
        info!("[{}] reloaded {} schema entries", "schema".yellow(), self.entries.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ndn::Name;

    use std::path::PathBuf;

    fn rule(id: &str, data: &str) -> ValidationRule {
        ValidationRule::new(id, data, "^<zoneA><KEY><>{1,3}$").unwrap()
    }

    #[test]
    fn test_serialize_then_load() {
        let mut store = SchemaStore::new();
        store.add_trust_anchor(TrustAnchorRecord::File(PathBuf::from("/tmp/my zone/zoneA.cert")));
        store.add_rule(rule("sign", "^<zoneA><SIGN><>*$"));
        let spaced = Name::from_components(vec!["zoneA", "test node"]);
        store.add_rule(rule("app:/zoneA/test%20node", &format!("^{}<>*$", spaced.to_pattern())));
        store.add_trust_anchor(TrustAnchorRecord::Inline(vec![7, 7]));
        store.add_rule(rule("schema", "^<zoneA><SCHEMA><>*$"));

        let text = store.serialize().to_string();
        let mut replica = SchemaStore::new();
        replica.load(SchemaDocument::parse(&text).unwrap());
        assert_eq!(replica, store);
        assert_eq!(replica.serialize().entries()[0], SchemaEntry::Rule(rule("schema", "^<zoneA><SCHEMA><>*$")));
    }

    #[test]
    fn test_most_recent_rule_wins() {
        let mut store = SchemaStore::new();
        store.add_rule(rule("r1", "^<zoneA><>*$"));
        store.add_rule(rule("r2", "^<zoneA><test><>*$"));
        let name = Name::from("/zoneA/test/prefix/1");
        let doc = store.serialize();
        let first = doc.rules().find(|r| r.applies_to(&name)).unwrap();
        assert_eq!(first.id, "r2");
    }

    #[test]
    fn test_load_replaces_and_clear_empties() {
        let mut store = SchemaStore::new();
        store.add_rule(rule("r1", "^<a>$"));
        assert!(store.contains_rule(&rule("r1", "^<a>$")));
        store.load(SchemaDocument::new(vec![SchemaEntry::Rule(rule("r2", "^<b>$"))]));
        assert!(!store.contains_rule(&rule("r1", "^<a>$")));
        assert_eq!(store.len(), 1);
        store.clear();
        assert!(store.is_empty());
    }
}
