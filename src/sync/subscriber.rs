use super::{Result, SchemaNames, DEFAULT_SUBSCRIBE_LIFETIME};
use crate::app::face::{Face, Timer, TimerId};
use crate::ndn::{Data, Interest, Name};
use crate::schema::SchemaDocument;

use colored::Colorize;
use tracing::{debug, info};

use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    /// The anchor signaled a change; the new document has been requested
    Signaled,
    /// A full document arrived
    Updated(SchemaDocument),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    NotSubscribed,
    Subscribed,
}

/// The participant side of schema synchronisation.
pub struct SchemaSubscriber {
    names: SchemaNames,
    lifetime: Duration,
    state: State,
    timer: Option<TimerId>,
}

impl SchemaSubscriber {
    pub fn new(zone: &Name) -> Self {
        SchemaSubscriber::with_lifetime(zone, DEFAULT_SUBSCRIBE_LIFETIME)
    }

    pub fn with_lifetime(zone: &Name, lifetime: Duration) -> Self {
        SchemaSubscriber { names: SchemaNames::new(zone), lifetime, state: State::NotSubscribed, timer: None }
    }

    pub fn names(&self) -> &SchemaNames {
        &self.names
    }

    pub fn is_subscribed(&self) -> bool {
        self.state == State::Subscribed
    }

    /// Subscribes as soon as the host runs the node's timers.
    pub fn start(&mut self, face: &mut Face) {
        if let Some(timer) = self.timer.take() {
            face.cancel(timer);
        }
        self.timer = Some(face.schedule(Duration::from_secs(0), Timer::Subscribe));
    }

    /// The subscription timer fired: the previous request expired unanswered.
    pub fn on_timer(&mut self, face: &mut Face) {
        self.timer = None;
        self.subscribe(face);
    }

    pub fn is_schema_data(&self, name: &Name) -> bool {
        self.names.prefix.is_prefix_of(name)
    }

    /// Handles content under the schema prefix; anything else yields `Ok(None)`.
    pub fn on_data(&mut self, face: &mut Face, data: &Data) -> Result<Option<SyncEvent>> {
        if self.names.subscribe.is_prefix_of(&data.name) {
            info!("[{}] schema changed, requesting {}", "sync".blue(), self.names.content);
            self.subscribe(face);
            face.express(Interest::new(self.names.content.clone(), self.lifetime).must_be_fresh(true));
            Ok(Some(SyncEvent::Signaled))
        } else if self.names.content.is_prefix_of(&data.name) {
            let document = SchemaDocument::from_bytes(&data.content)?;
            info!("[{}] received schema with {} entries", "sync".blue(), document.entries().len());
            Ok(Some(SyncEvent::Updated(document)))
        } else {
            Ok(None)
        }
    }

    fn subscribe(&mut self, face: &mut Face) {
        if let Some(timer) = self.timer.take() {
            face.cancel(timer);
        }
        debug!("[{}] subscribing to {}", "sync".blue(), self.names.subscribe);
        face.express(Interest::new(self.names.subscribe.clone(), self.lifetime).must_be_fresh(true));
        self.timer = Some(face.schedule(self.lifetime, Timer::Subscribe));
        self.state = State::Subscribed;
    }
}
