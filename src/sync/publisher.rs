use super::{Result, SchemaNames, SCHEMA_FRESHNESS};
use crate::app::face::Face;
use crate::ndn::{Data, Interest, Name};
use crate::schema::SchemaStore;
use crate::security::{KeyChain, SigningInfo};

use colored::Colorize;
use tracing::{debug, info};

/// The anchor side of schema synchronisation. Subscribe requests stay pending in the
/// network until `notify` answers all of them with one signal.
pub struct SchemaPublisher {
    names: SchemaNames,
    pending_subscribers: usize,
}

impl SchemaPublisher {
    pub fn new(zone: &Name) -> Self {
        SchemaPublisher { names: SchemaNames::new(zone), pending_subscribers: 0 }
    }

    pub fn names(&self) -> &SchemaNames {
        &self.names
    }

    /// Subscribe requests seen since the last signal.
    pub fn pending_subscribers(&self) -> usize {
        self.pending_subscribers
    }

    /// Answers a request under the schema prefix. Returns false for other names.
    pub fn on_interest(
        &mut self,
        face: &mut Face,
        keychain: &KeyChain,
        store: &SchemaStore,
        interest: &Interest,
    ) -> Result<bool> {
        if self.names.subscribe.is_prefix_of(&interest.name) {
            self.pending_subscribers += 1;
            debug!("[{}] holding subscribe request ({} pending)", "sync".blue(), self.pending_subscribers);
            Ok(true)
        } else if self.names.content.is_prefix_of(&interest.name) {
            let document = store.serialize();
            let mut data = Data::new(self.names.content.clone(), document.to_bytes()).with_freshness(SCHEMA_FRESHNESS);
            keychain.sign(&mut data, &SigningInfo::Default)?;
            info!("[{}] serving schema with {} entries", "sync".blue(), document.entries().len());
            face.put(data);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Emits the change signal, satisfying every pending subscribe request.
    pub fn notify(&mut self, face: &mut Face, keychain: &KeyChain) -> Result<()> {
        let mut signal = Data::new(self.names.subscribe.clone(), vec![]).with_freshness(SCHEMA_FRESHNESS);
        keychain.sign(&mut signal, &SigningInfo::Default)?;
        info!("[{}] signaling schema change to {} subscribers", "sync".blue(), self.pending_subscribers);
        self.pending_subscribers = 0;
        face.put(signal);
        Ok(())
    }
}
