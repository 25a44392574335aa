use super::network::{Delivery, Network, NodeId};
use super::{Error, Result};

use crate::app::{Action, App, TimerId};
use crate::ndn::Name;

use colored::Colorize;
use priority_queue::PriorityQueue;
use tai64::Tai64;
use tracing::debug;

use std::cmp::Reverse;
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Sent,
    Received,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketKind {
    Interest,
    Data,
    Nack,
}

/// One packet leaving or reaching a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRecord {
    pub at: Duration,
    pub node: NodeId,
    pub direction: Direction,
    pub kind: PacketKind,
    pub name: Name,
}

#[derive(Debug)]
enum Event {
    Start(NodeId),
    Deliver(Delivery),
    Timer(NodeId, TimerId),
}

/// A discrete-event host for a set of nodes sharing one forwarder.
///
/// Events run in `(time, insertion order)` order on a virtual clock, so a scenario unfolds
/// the same way whatever the speed of the machine running it.
pub struct Simulator {
    now: Duration,
    /// Absolute time of virtual time zero, shared by every node
    epoch: Tai64,
    seq: u64,
    queue: PriorityQueue<u64, Reverse<(Duration, u64)>>,
    events: HashMap<u64, Event>,
    timers: HashMap<(NodeId, TimerId), u64>,
    nodes: Vec<App>,
    network: Network,
    processed: u64,
    trace: Option<Vec<TraceRecord>>,
}

impl Simulator {
    pub fn new(network: Network) -> Self {
        Simulator {
            now: Duration::from_secs(0),
            epoch: Tai64::now(),
            seq: 0,
            queue: PriorityQueue::new(),
            events: HashMap::new(),
            timers: HashMap::new(),
            nodes: vec![],
            network,
            processed: 0,
            trace: None,
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn epoch(&self) -> Tai64 {
        self.epoch
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn nodes(&self) -> &[App] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&App> {
        self.nodes.get(id)
    }

    /// Number of events run so far.
    pub fn processed(&self) -> u64 {
        self.processed
    }

    /// Records every packet sent or received from now on.
    pub fn enable_trace(&mut self) {
        if self.trace.is_none() {
            self.trace = Some(vec![]);
        }
    }

    pub fn trace(&self) -> &[TraceRecord] {
        self.trace.as_deref().unwrap_or(&[])
    }

    fn record(&mut self, node: NodeId, direction: Direction, kind: PacketKind, name: &Name) {
        let at = self.now;
        if let Some(trace) = self.trace.as_mut() {
            trace.push(TraceRecord { at, node, direction, kind, name: name.clone() });
        }
    }

    /// Adds a node that starts at `at`.
    pub fn add_node(&mut self, mut app: App, at: Duration) -> NodeId {
        app.set_epoch(self.epoch);
        let id = self.nodes.len();
        self.nodes.push(app);
        self.push(at, Event::Start(id));
        id
    }

    fn push(&mut self, at: Duration, event: Event) -> u64 {
        let seq = self.seq;
        self.seq += 1;
        self.events.insert(seq, event);
        self.queue.push(seq, Reverse((at.max(self.now), seq)));
        seq
    }

    /// Runs every event due at or before `deadline`, then leaves the clock at `deadline`.
    pub fn run_until(&mut self, deadline: Duration) -> Result<()> {
        loop {
            let due = match self.queue.peek() {
                Some((_, Reverse((at, _)))) => *at <= deadline,
                None => false,
            };
            if !due {
                break;
            }
            self.step()?;
        }
        self.now = self.now.max(deadline);
        Ok(())
    }

    pub fn run_for(&mut self, duration: Duration) -> Result<()> {
        let deadline = self.now + duration;
        self.run_until(deadline)
    }

    /// Runs the next event. `false` once the queue is empty.
    pub fn step(&mut self) -> Result<bool> {
        let (seq, Reverse((at, _))) = match self.queue.pop() {
            Some(next) => next,
            None => return Ok(false),
        };
        let event = match self.events.remove(&seq) {
            Some(event) => event,
            None => return Ok(true),
        };
        self.now = at;
        self.processed += 1;

        let node = match &event {
            Event::Start(node) | Event::Timer(node, _) => *node,
            Event::Deliver(delivery) => delivery.to(),
        };
        match &event {
            Event::Deliver(Delivery::Interest { interest, .. }) => {
                self.record(node, Direction::Received, PacketKind::Interest, &interest.name)
            }
            Event::Deliver(Delivery::Data { data, .. }) => self.record(node, Direction::Received, PacketKind::Data, &data.name),
            Event::Deliver(Delivery::Nack { nack, .. }) => {
                self.record(node, Direction::Received, PacketKind::Nack, &nack.interest.name)
            }
            _ => (),
        }
        let now = self.now;
        let app = self.nodes.get_mut(node).ok_or(Error::UnknownNode(node))?;
        match event {
            Event::Start(_) => app.start(now)?,
            Event::Timer(_, id) => {
                self.timers.remove(&(node, id));
                app.on_timer(now, id)?
            }
            Event::Deliver(Delivery::Interest { interest, .. }) => {
                debug!("[{}] {:?} -> {}", "sim".white(), interest, app.label());
                app.on_interest(now, interest)?
            }
            Event::Deliver(Delivery::Data { data, .. }) => {
                debug!("[{}] {:?} -> {}", "sim".white(), data, app.label());
                app.on_data(now, data)?
            }
            Event::Deliver(Delivery::Nack { nack, .. }) => {
                debug!("[{}] nack {:?} -> {}", "sim".white(), nack.reason, app.label());
                app.on_nack(now, nack)?
            }
        }
        self.execute(node);
        Ok(true)
    }

    fn execute(&mut self, node: NodeId) {
        let actions = match self.nodes.get_mut(node) {
            Some(app) => app.drain_actions(),
            None => return,
        };
        let arrival = self.now + self.network.hop_delay();
        for action in actions {
            match action {
                Action::Express(interest) => {
                    debug!("[{}] {} expresses {}", "sim".white(), node, interest.name);
                    self.record(node, Direction::Sent, PacketKind::Interest, &interest.name);
                    for delivery in self.network.forward_interest(self.now, node, interest) {
                        self.push(arrival, Event::Deliver(delivery));
                    }
                }
                Action::Put(data) => {
                    debug!("[{}] {} puts {}", "sim".white(), node, data.name);
                    self.record(node, Direction::Sent, PacketKind::Data, &data.name);
                    for delivery in self.network.forward_data(self.now, node, data) {
                        self.push(arrival, Event::Deliver(delivery));
                    }
                }
                Action::Register(prefix) => self.network.register(node, prefix),
                Action::Schedule { id, after } => {
                    let seq = self.push(self.now + after, Event::Timer(node, id));
                    self.timers.insert((node, id), seq);
                }
                Action::Cancel(id) => {
                    if let Some(seq) = self.timers.remove(&(node, id)) {
                        self.queue.remove(&seq);
                        self.events.remove(&seq);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Consumer, ConsumerConfig};
    use crate::ndn::Name;
    use crate::sim::network::DEFAULT_HOP_DELAY;

    #[test]
    fn test_consumer_without_producer() {
        let mut sim = Simulator::new(Network::new(DEFAULT_HOP_DELAY));
        let config = ConsumerConfig { frequency: 10.0, ..ConsumerConfig::default() };
        let consumer = App::new("consumer", Name::from("/zoneA"), Box::new(Consumer::new(config)));
        let id = sim.add_node(consumer, Duration::from_millis(100));

        sim.run_until(Duration::from_millis(99)).unwrap();
        assert_eq!(sim.processed(), 0);
        assert_eq!(sim.now(), Duration::from_millis(99));

        sim.run_until(Duration::from_millis(1000)).unwrap();
        let stats = sim.node(id).unwrap().stats();
        // Requests at 100, 200, ... 1000 ms, each refused for lack of a route
        assert_eq!(stats.interests_sent, 10);
        assert_eq!(stats.nacks_received, 9);
        assert_eq!(sim.now(), Duration::from_millis(1000));
    }

    #[test]
    fn test_trace() {
        let mut sim = Simulator::new(Network::new(DEFAULT_HOP_DELAY));
        sim.enable_trace();
        let config = ConsumerConfig { frequency: 10.0, max_requests: Some(1), ..ConsumerConfig::default() };
        let consumer = App::new("consumer", Name::from("/zoneA"), Box::new(Consumer::new(config)));
        let id = sim.add_node(consumer, Duration::from_millis(100));
        sim.run_until(Duration::from_secs(1)).unwrap();

        let trace = sim.trace();
        assert_eq!(trace.len(), 2);
        assert_eq!((trace[0].at, trace[0].node), (Duration::from_millis(100), id));
        assert_eq!((trace[0].direction, trace[0].kind), (Direction::Sent, PacketKind::Interest));
        assert_eq!(trace[1].at, Duration::from_millis(100) + DEFAULT_HOP_DELAY);
        assert_eq!((trace[1].direction, trace[1].kind), (Direction::Received, PacketKind::Nack));
        assert_eq!(trace[0].name, trace[1].name);
    }

    #[test]
    fn test_run_for_advances_clock() {
        let mut sim = Simulator::new(Network::new(DEFAULT_HOP_DELAY));
        sim.run_for(Duration::from_secs(3)).unwrap();
        sim.run_for(Duration::from_secs(2)).unwrap();
        assert_eq!(sim.now(), Duration::from_secs(5));
        assert!(!sim.step().unwrap());
    }
}
