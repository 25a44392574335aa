use super::node::Deliver;

use crate::ndn::{Data, Interest, Name};
use crate::sim::network::{Delivery, Network, NodeId};

use actix::{Actor, AsyncContext, Context, Handler, Recipient};
use colored::Colorize;
use tracing::{debug, warn};

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Forwards packets between node actors with the same FIB and PIT rules as the simulator,
/// on the wall clock.
pub struct Forwarder {
    network: Network,
    nodes: HashMap<NodeId, Recipient<Deliver>>,
    epoch: Instant,
}

impl Forwarder {
    pub fn new(hop_delay: Duration) -> Self {
        Forwarder { network: Network::new(hop_delay), nodes: HashMap::new(), epoch: Instant::now() }
    }

    pub fn with_loss(mut self, loss: f64, seed: u64) -> Self {
        self.network = self.network.with_loss(loss, seed);
        self
    }

    fn dispatch(&mut self, ctx: &mut Context<Self>, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            ctx.run_later(self.network.hop_delay(), move |act, _ctx| {
                let to = delivery.to();
                match act.nodes.get(&to) {
                    Some(recipient) => {
                        if let Err(err) = recipient.do_send(Deliver(delivery)) {
                            warn!("[{}] node {} unreachable: {}", "forwarder".white(), to, err);
                        }
                    }
                    None => warn!("[{}] unknown node {}", "forwarder".white(), to),
                }
            });
        }
    }
}

impl Actor for Forwarder {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Context<Self>) {
        debug!("[{}] started", "forwarder".white());
    }
}

#[derive(Message)]
#[rtype(result = "()")]
pub struct Connect {
    pub node: NodeId,
    pub recipient: Recipient<Deliver>,
}

impl Handler<Connect> for Forwarder {
    type Result = ();

    fn handle(&mut self, msg: Connect, _ctx: &mut Context<Self>) -> Self::Result {
        self.nodes.insert(msg.node, msg.recipient);
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct Register {
    pub node: NodeId,
    pub prefix: Name,
}

impl Handler<Register> for Forwarder {
    type Result = ();

    fn handle(&mut self, msg: Register, _ctx: &mut Context<Self>) -> Self::Result {
        self.network.register(msg.node, msg.prefix);
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub enum Outbound {
    Interest { from: NodeId, interest: Interest },
    Data { from: NodeId, data: Data },
}

impl Handler<Outbound> for Forwarder {
    type Result = ();

    fn handle(&mut self, msg: Outbound, ctx: &mut Context<Self>) -> Self::Result {
        let now = self.epoch.elapsed();
        let deliveries = match msg {
            Outbound::Interest { from, interest } => self.network.forward_interest(now, from, interest),
            Outbound::Data { from, data } => self.network.forward_data(now, from, data),
        };
        self.dispatch(ctx, deliveries);
    }
}
