use super::forwarder::{Connect, Forwarder, Outbound, Register};

use crate::app::{Action, App, NodeStats, TimerId};
use crate::schema::SchemaDocument;
use crate::security::Certificate;
use crate::sim::network::{Delivery, NodeId};

use actix::{Actor, Addr, AsyncContext, Context, Handler, SpawnHandle};
use colored::Colorize;
use tracing::{error, info};

use std::collections::HashMap;
use std::time::Instant;

/// Hosts one [App] on the actix runtime. Timers become `run_later` futures and are
/// canceled through their `SpawnHandle`.
pub struct NodeActor {
    id: NodeId,
    app: App,
    forwarder: Addr<Forwarder>,
    epoch: Instant,
    timers: HashMap<TimerId, SpawnHandle>,
}

impl NodeActor {
    pub fn new(id: NodeId, app: App, forwarder: Addr<Forwarder>) -> Self {
        NodeActor { id, app, forwarder, epoch: Instant::now(), timers: HashMap::new() }
    }

    fn on_timer(&mut self, ctx: &mut Context<Self>, id: TimerId) {
        self.timers.remove(&id);
        let now = self.epoch.elapsed();
        if let Err(err) = self.app.on_timer(now, id) {
            error!("[{}] {} timer: {}", "node".white(), self.app.label(), err);
        }
        self.execute(ctx);
    }

    fn execute(&mut self, ctx: &mut Context<Self>) {
        for action in self.app.drain_actions() {
            match action {
                Action::Express(interest) => self.forwarder.do_send(Outbound::Interest { from: self.id, interest }),
                Action::Put(data) => self.forwarder.do_send(Outbound::Data { from: self.id, data }),
                Action::Register(prefix) => self.forwarder.do_send(Register { node: self.id, prefix }),
                Action::Schedule { id, after } => {
                    let handle = ctx.run_later(after, move |act, ctx| act.on_timer(ctx, id));
                    self.timers.insert(id, handle);
                }
                Action::Cancel(id) => {
                    if let Some(handle) = self.timers.remove(&id) {
                        ctx.cancel_future(handle);
                    }
                }
            }
        }
    }
}

impl Actor for NodeActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Context<Self>) {
        self.forwarder.do_send(Connect { node: self.id, recipient: ctx.address().recipient() });
        self.epoch = Instant::now();
        match self.app.start(self.epoch.elapsed()) {
            Ok(()) => info!("[{}] {} started", "node".white(), self.app.label()),
            Err(err) => error!("[{}] {} failed to start: {}", "node".white(), self.app.label(), err),
        }
        self.execute(ctx);
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "()")]
pub struct Deliver(pub Delivery);

impl Handler<Deliver> for NodeActor {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Context<Self>) -> Self::Result {
        let now = self.epoch.elapsed();
        let result = match msg.0 {
            Delivery::Interest { interest, .. } => self.app.on_interest(now, interest),
            Delivery::Data { data, .. } => self.app.on_data(now, data),
            Delivery::Nack { nack, .. } => self.app.on_nack(now, nack),
        };
        if let Err(err) = result {
            error!("[{}] {}: {}", "node".white(), self.app.label(), err);
        }
        self.execute(ctx);
    }
}

#[derive(Debug, Clone, Message)]
#[rtype(result = "NodeStatus")]
pub struct GetStatus;

#[derive(Debug, Clone, MessageResponse)]
pub struct NodeStatus {
    pub label: String,
    pub kind: &'static str,
    pub stats: NodeStats,
    pub should_validate: bool,
    pub schema: SchemaDocument,
    /// Default certificate of the default identity
    pub certificate: Option<Certificate>,
}

impl Handler<GetStatus> for NodeActor {
    type Result = NodeStatus;

    fn handle(&mut self, _msg: GetStatus, _ctx: &mut Context<Self>) -> Self::Result {
        let keychain = self.app.keychain();
        let certificate = keychain
            .default_identity()
            .and_then(|identity| keychain.default_certificate(identity.name()))
            .cloned();
        NodeStatus {
            label: self.app.label().to_owned(),
            kind: self.app.kind(),
            stats: self.app.stats().clone(),
            should_validate: self.app.should_validate(),
            schema: self.app.schema().serialize(),
            certificate,
        }
    }
}
