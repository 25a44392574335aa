//! Hosts a zone on the actix runtime: one actor per node and one forwarder between them.

mod forwarder;
mod node;

pub use forwarder::{Connect, Forwarder, Outbound, Register};
pub use node::{Deliver, GetStatus, NodeActor, NodeStatus};

use crate::app::{App, Consumer, Producer, TrustAnchor};
use crate::ndn::Name;
use crate::sim::ZoneConfig;

use actix::{Actor, Addr};
use colored::Colorize;
use rand::Rng;
use tracing::info;

use std::time::Duration;

#[derive(Debug)]
pub enum Error {
    Actix(actix::MailboxError),
}

impl std::error::Error for Error {}

impl std::convert::From<actix::MailboxError> for Error {
    fn from(error: actix::MailboxError) -> Self {
        Error::Actix(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct LiveZone {
    pub forwarder: Addr<Forwarder>,
    pub anchor: Addr<NodeActor>,
    pub producers: Vec<Addr<NodeActor>>,
    pub consumers: Vec<Addr<NodeActor>>,
}

impl LiveZone {
    pub fn nodes(&self) -> impl Iterator<Item = &Addr<NodeActor>> + '_ {
        std::iter::once(&self.anchor).chain(self.producers.iter()).chain(self.consumers.iter())
    }

    pub async fn status(&self) -> Result<Vec<NodeStatus>> {
        let mut statuses = vec![];
        for node in self.nodes() {
            statuses.push(node.send(GetStatus).await?);
        }
        Ok(statuses)
    }
}

/// Starts the anchor, waits for its schema, then starts the producers and consumers with
/// that schema as their initial replica. Consumers begin requesting after a delay drawn from
/// the configured start window.
pub async fn launch(config: ZoneConfig) -> Result<LiveZone> {
    let zone = Name::from(config.anchor.zone.as_str());
    let forwarder =
        Forwarder::new(Duration::from_millis(config.hop_delay_ms)).with_loss(config.loss, config.seed).start();

    let mut next_id = 0;
    let anchor = {
        let app = App::new("anchor", zone.clone(), Box::new(TrustAnchor::new(config.anchor.clone())));
        NodeActor::new(next_id, app, forwarder.clone()).start()
    };
    next_id += 1;
    let schema = anchor.send(GetStatus).await?.schema;
    let subscribe_lifetime = Duration::from_millis(config.subscribe_lifetime_ms);

    let mut producers = vec![];
    for i in 0..config.producers {
        let app = App::new(format!("producer-{}", i), zone.clone(), Box::new(Producer::new(config.producer.clone())))
            .with_schema(schema.clone())
            .with_schema_sync(subscribe_lifetime);
        producers.push(NodeActor::new(next_id, app, forwarder.clone()).start());
        next_id += 1;
    }

    let (from, to) = config.consumer_start_ms;
    let mut consumers = vec![];
    for i in 0..config.consumers {
        let mut consumer = config.consumer.clone();
        consumer.start_delay_ms = if to > from { rand::thread_rng().gen_range(from, to) } else { from };
        let app = App::new(format!("consumer-{}", i), zone.clone(), Box::new(Consumer::new(consumer)))
            .with_schema(schema.clone())
            .with_schema_sync(subscribe_lifetime);
        consumers.push(NodeActor::new(next_id, app, forwarder.clone()).start());
        next_id += 1;
    }

    info!("[{}] {} live with {} node(s)", "runtime".white(), zone, next_id);
    Ok(LiveZone { forwarder, anchor, producers, consumers })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::ProducerConfig;

    #[actix_rt::test]
    async fn test_live_signing() {
        let config = ZoneConfig {
            producer: ProducerConfig { sign_lifetime_ms: 300, ..ProducerConfig::default() },
            consumers: 0,
            hop_delay_ms: 1,
            subscribe_lifetime_ms: 1000,
            ..ZoneConfig::default()
        };
        let zone = launch(config).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let statuses = zone.status().await.unwrap();
        let anchor = &statuses[0];
        let producer = &statuses[1];
        let anchor_cert = anchor.certificate.clone().unwrap();
        let producer_cert = producer.certificate.clone().unwrap();
        assert_eq!(producer.kind, "producer");
        assert!(!producer_cert.is_self_signed());
        assert_eq!(producer_cert.signer(), Some(&anchor_cert.key_name()));
        assert!(producer.should_validate);
        assert_eq!(producer.schema, anchor.schema);
    }
}
