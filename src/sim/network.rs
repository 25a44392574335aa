//! A single forwarder connecting every node of a zone.

use crate::ndn::{Data, Interest, Nack, NackReason, Name};

use colored::Colorize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use std::time::Duration;

pub type NodeId = usize;

pub const DEFAULT_HOP_DELAY: Duration = Duration::from_millis(5);

/// A packet on its way to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Interest { to: NodeId, interest: Interest },
    Data { to: NodeId, data: Data },
    Nack { to: NodeId, nack: Nack },
}

impl Delivery {
    pub fn to(&self) -> NodeId {
        match self {
            Delivery::Interest { to, .. } | Delivery::Data { to, .. } | Delivery::Nack { to, .. } => *to,
        }
    }
}

#[derive(Debug, Clone)]
struct PitEntry {
    interest: Interest,
    from: NodeId,
    expires: Duration,
}

/// FIB and PIT of the forwarder.
pub struct Network {
    fib: Vec<(Name, NodeId)>,
    pit: Vec<PitEntry>,
    hop_delay: Duration,
    loss: f64,
    rng: StdRng,
    dropped: u64,
}

impl Network {
    pub fn new(hop_delay: Duration) -> Self {
        Network { fib: vec![], pit: vec![], hop_delay, loss: 0.0, rng: StdRng::from_entropy(), dropped: 0 }
    }

    /// Drops each delivery with probability `loss`, drawing from a generator seeded with `seed`.
    pub fn with_loss(mut self, loss: f64, seed: u64) -> Self {
        self.loss = loss.max(0.0).min(1.0);
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn hop_delay(&self) -> Duration {
        self.hop_delay
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn pending_interests(&self) -> usize {
        self.pit.len()
    }

    pub fn register(&mut self, node: NodeId, prefix: Name) {
        if !self.fib.iter().any(|(p, n)| *p == prefix && *n == node) {
            debug!("[{}] route {} -> node {}", "network".white(), prefix, node);
            self.fib.push((prefix, node));
        }
    }

    /// Nodes registered under the longest prefix of `name`, the sender excluded.
    pub fn routes(&self, name: &Name, from: NodeId) -> Vec<NodeId> {
        let candidates: Vec<&(Name, NodeId)> =
            self.fib.iter().filter(|(prefix, node)| *node != from && prefix.is_prefix_of(name)).collect();
        let longest = match candidates.iter().map(|(prefix, _)| prefix.len()).max() {
            Some(longest) => longest,
            None => return vec![],
        };
        let mut nodes: Vec<NodeId> =
            candidates.iter().filter(|(prefix, _)| prefix.len() == longest).map(|(_, node)| *node).collect();
        nodes.sort_unstable();
        nodes.dedup();
        nodes
    }

    pub fn forward_interest(&mut self, now: Duration, from: NodeId, interest: Interest) -> Vec<Delivery> {
        self.expire(now);
        let routes = self.routes(&interest.name, from);
        if routes.is_empty() {
            debug!("[{}] no route for {}", "network".white(), interest.name);
            return vec![Delivery::Nack { to: from, nack: Nack::new(interest, NackReason::NoRoute) }];
        }
        self.pit.push(PitEntry { interest: interest.clone(), from, expires: now + interest.lifetime });
        let deliveries = routes.into_iter().map(|to| Delivery::Interest { to, interest: interest.clone() }).collect();
        self.lossy(deliveries)
    }

    /// Satisfies every unexpired pending interest the data matches; unsolicited data goes nowhere.
    pub fn forward_data(&mut self, now: Duration, from: NodeId, data: Data) -> Vec<Delivery> {
        self.expire(now);
        let mut targets = vec![];
        self.pit.retain(|entry| {
            if entry.from != from && entry.interest.matches(&data) {
                targets.push(entry.from);
                false
            } else {
                true
            }
        });
        if targets.is_empty() {
            debug!("[{}] unsolicited {}", "network".white(), data.name);
        }
        targets.sort_unstable();
        targets.dedup();
        let deliveries = targets.into_iter().map(|to| Delivery::Data { to, data: data.clone() }).collect();
        self.lossy(deliveries)
    }

    fn expire(&mut self, now: Duration) {
        self.pit.retain(|entry| entry.expires > now);
    }

    fn lossy(&mut self, deliveries: Vec<Delivery>) -> Vec<Delivery> {
        if self.loss <= 0.0 {
            return deliveries;
        }
        let mut kept = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            if self.rng.gen_bool(self.loss) {
                self.dropped += 1;
            } else {
                kept.push(delivery);
            }
        }
        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interest(name: &str) -> Interest {
        Interest::new(Name::from(name), Duration::from_secs(1))
    }

    #[test]
    fn test_longest_prefix_match() {
        let mut network = Network::new(DEFAULT_HOP_DELAY);
        network.register(0, Name::from("/zoneA"));
        network.register(1, Name::from("/zoneA/test/prefix"));
        network.register(2, Name::from("/zoneA/test/prefix"));
        network.register(2, Name::from("/zoneA/test/prefix"));
        network.register(1, Name::from("/zoneA/test/prefix/KEY/k1"));

        assert_eq!(network.routes(&Name::from("/zoneA/test/prefix/3"), 5), vec![1, 2]);
        assert_eq!(network.routes(&Name::from("/zoneA/test/prefix/3"), 1), vec![2]);
        assert_eq!(network.routes(&Name::from("/zoneA/test/prefix/KEY/k1"), 5), vec![1]);
        assert_eq!(network.routes(&Name::from("/zoneA/other"), 5), vec![0]);
        assert!(network.routes(&Name::from("/zoneB"), 5).is_empty());
    }

    #[test]
    fn test_no_route_nack() {
        let mut network = Network::new(DEFAULT_HOP_DELAY);
        let request = interest("/nowhere");
        let deliveries = network.forward_interest(Duration::from_secs(0), 3, request.clone());
        assert_eq!(deliveries, vec![Delivery::Nack { to: 3, nack: Nack::new(request, NackReason::NoRoute) }]);
        assert_eq!(network.pending_interests(), 0);
    }

    #[test]
    fn test_data_follows_pit() {
        let mut network = Network::new(DEFAULT_HOP_DELAY);
        network.register(0, Name::from("/zoneA/test"));
        let now = Duration::from_secs(0);
        network.forward_interest(now, 1, interest("/zoneA/test/1"));
        network.forward_interest(now, 2, interest("/zoneA/test/1"));
        network.forward_interest(now, 3, interest("/zoneA/test/2"));

        let data = Data::new(Name::from("/zoneA/test/1"), vec![]);
        let deliveries = network.forward_data(Duration::from_millis(10), 0, data.clone());
        let to: Vec<NodeId> = deliveries.iter().map(|d| d.to()).collect();
        assert_eq!(to, vec![1, 2]);
        // Consumed
        assert!(network.forward_data(Duration::from_millis(20), 0, data).is_empty());

        // Expired
        let late = Data::new(Name::from("/zoneA/test/2"), vec![]);
        assert!(network.forward_data(Duration::from_secs(2), 0, late).is_empty());
        assert_eq!(network.pending_interests(), 0);
    }

    #[test]
    fn test_total_loss() {
        let mut network = Network::new(DEFAULT_HOP_DELAY).with_loss(1.0, 7);
        network.register(0, Name::from("/zoneA"));
        assert!(network.forward_interest(Duration::from_secs(0), 1, interest("/zoneA/x")).is_empty());
        assert_eq!(network.dropped(), 1);
    }
}
