//! A deterministic discrete-event host for whole zones.

pub mod network;
mod simulator;
pub mod zone;

pub use network::{Delivery, Network, NodeId};
pub use simulator::{Direction, PacketKind, Simulator, TraceRecord};
pub use zone::{Zone, ZoneConfig};

use crate::app;

#[derive(Debug)]
pub enum Error {
    App(app::Error),
    UnknownNode(NodeId),
}

impl std::error::Error for Error {}

impl std::convert::From<app::Error> for Error {
    fn from(error: app::Error) -> Self {
        Error::App(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
