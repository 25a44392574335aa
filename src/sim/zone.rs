//! Builds a zone (one trust anchor, some producers and consumers) on a [Simulator].

use super::network::{Network, NodeId};
use super::simulator::Simulator;
use super::Result;

use crate::app::{App, Consumer, ConsumerConfig, NodeStats, Producer, ProducerConfig, Randomize, TrustAnchor, TrustAnchorConfig};
use crate::ndn::Name;
use crate::sync::DEFAULT_SUBSCRIBE_LIFETIME;

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use std::time::Duration;

fn default_producers() -> usize {
    1
}
fn default_consumers() -> usize {
    1
}
fn default_anchor_start_ms() -> u64 {
    50
}
fn default_producer_start_ms() -> u64 {
    100
}
fn default_consumer_start_ms() -> (u64, u64) {
    (200, 750)
}
fn default_hop_delay_ms() -> u64 {
    5
}
fn default_subscribe_lifetime_ms() -> u64 {
    DEFAULT_SUBSCRIBE_LIFETIME.as_millis() as u64
}
fn default_producer() -> ProducerConfig {
    ProducerConfig { payload_size: 1480, freshness_ms: 2000, ..ProducerConfig::default() }
}
fn default_consumer() -> ConsumerConfig {
    ConsumerConfig { frequency: 10.0, lifetime_ms: 1000, randomize: Randomize::Uniform, ..ConsumerConfig::default() }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ZoneConfig {
    #[serde(default)]
    pub anchor: TrustAnchorConfig,
    #[serde(default = "default_producer")]
    pub producer: ProducerConfig,
    #[serde(default = "default_consumer")]
    pub consumer: ConsumerConfig,
    #[serde(default = "default_producers")]
    pub producers: usize,
    #[serde(default = "default_consumers")]
    pub consumers: usize,
    #[serde(default = "default_anchor_start_ms")]
    pub anchor_start_ms: u64,
    #[serde(default = "default_producer_start_ms")]
    pub producer_start_ms: u64,
    /// Each consumer starts at a uniformly drawn time in this window
    #[serde(default = "default_consumer_start_ms")]
    pub consumer_start_ms: (u64, u64),
    #[serde(default = "default_hop_delay_ms")]
    pub hop_delay_ms: u64,
    #[serde(default)]
    pub loss: f64,
    #[serde(default)]
    pub seed: u64,
    #[serde(default = "default_subscribe_lifetime_ms")]
    pub subscribe_lifetime_ms: u64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            anchor: TrustAnchorConfig::default(),
            producer: default_producer(),
            consumer: default_consumer(),
            producers: default_producers(),
            consumers: default_consumers(),
            anchor_start_ms: default_anchor_start_ms(),
            producer_start_ms: default_producer_start_ms(),
            consumer_start_ms: default_consumer_start_ms(),
            hop_delay_ms: default_hop_delay_ms(),
            loss: 0.0,
            seed: 0,
            subscribe_lifetime_ms: default_subscribe_lifetime_ms(),
        }
    }
}

pub struct Zone {
    sim: Simulator,
    anchor: NodeId,
    producers: Vec<NodeId>,
    consumers: Vec<NodeId>,
}

impl Zone {
    /// Starts the anchor, then hands its schema to every other node as their initial replica.
    pub fn build(config: ZoneConfig) -> Result<Zone> {
        let zone = Name::from(config.anchor.zone.as_str());
        let network = Network::new(Duration::from_millis(config.hop_delay_ms)).with_loss(config.loss, config.seed);
        let mut sim = Simulator::new(network);

        let anchor_start = Duration::from_millis(config.anchor_start_ms);
        let anchor = sim.add_node(
            App::new("anchor", zone.clone(), Box::new(TrustAnchor::new(config.anchor.clone()))),
            anchor_start,
        );
        sim.run_until(anchor_start)?;
        let schema = match sim.node(anchor) {
            Some(app) => app.schema().serialize(),
            None => return Err(super::Error::UnknownNode(anchor)),
        };
        let subscribe_lifetime = Duration::from_millis(config.subscribe_lifetime_ms);

        let mut producers = vec![];
        for i in 0..config.producers {
            let app = App::new(format!("producer-{}", i), zone.clone(), Box::new(Producer::new(config.producer.clone())))
                .with_schema(schema.clone())
                .with_schema_sync(subscribe_lifetime);
            producers.push(sim.add_node(app, Duration::from_millis(config.producer_start_ms)));
        }

        let (from, to) = config.consumer_start_ms;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut consumers = vec![];
        for i in 0..config.consumers {
            let start = if to > from { rng.gen_range(from, to) } else { from };
            let app = App::new(format!("consumer-{}", i), zone.clone(), Box::new(Consumer::new(config.consumer.clone())))
                .with_schema(schema.clone())
                .with_schema_sync(subscribe_lifetime);
            consumers.push(sim.add_node(app, Duration::from_millis(start)));
        }

        info!(
            "[{}] {} with {} producer(s) and {} consumer(s)",
            "zone".white(),
            zone,
            producers.len(),
            consumers.len()
        );
        Ok(Zone { sim, anchor, producers, consumers })
    }

    pub fn simulator(&self) -> &Simulator {
        &self.sim
    }

    pub fn enable_trace(&mut self) {
        self.sim.enable_trace();
    }

    pub fn run_for(&mut self, duration: Duration) -> Result<()> {
        self.sim.run_for(duration)
    }

    pub fn anchor(&self) -> Option<&App> {
        self.sim.node(self.anchor)
    }

    pub fn producers(&self) -> impl Iterator<Item = &App> + '_ {
        self.producers.iter().filter_map(move |id| self.sim.node(*id))
    }

    pub fn consumers(&self) -> impl Iterator<Item = &App> + '_ {
        self.consumers.iter().filter_map(move |id| self.sim.node(*id))
    }

    /// Counters of every node, by label.
    pub fn stats(&self) -> Vec<(String, NodeStats)> {
        self.sim.nodes().iter().map(|app| (app.label().to_owned(), app.stats().clone())).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_reference_zone() {
        let zone = Zone::build(ZoneConfig { producers: 2, consumers: 3, ..ZoneConfig::default() }).unwrap();
        assert_eq!(zone.simulator().now(), Duration::from_millis(50));
        let anchor = zone.anchor().unwrap();
        assert_eq!(anchor.kind(), "anchor");
        assert_eq!(anchor.schema().len(), 3);
        assert_eq!(zone.producers().count(), 2);
        assert_eq!(zone.consumers().count(), 3);
        for consumer in zone.consumers() {
            assert_eq!(consumer.kind(), "consumer");
        }
        let labels: Vec<String> = zone.stats().into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["anchor", "producer-0", "producer-1", "consumer-0", "consumer-1", "consumer-2"]);
    }
}
