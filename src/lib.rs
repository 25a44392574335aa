#[macro_use]
extern crate serde_derive;
#[macro_use(Message, MessageResponse)]
extern crate actix_derive;
extern crate colored;

pub mod app;
pub mod fetch;
pub mod integration_test;
pub mod ndn;
pub mod runtime;
pub mod schema;
pub mod security;
pub mod server;
pub mod sim;
pub mod sync;

#[derive(Debug)]
pub enum Error {
    IO(std::io::Error),
    Config(config::ConfigError),
    Actix(actix::MailboxError),

    Ndn(ndn::Error),
    Security(security::Error),
    Fetch(fetch::Error),
    Schema(schema::Error),
    Sync(sync::Error),
    App(app::Error),
    Sim(sim::Error),
    Runtime(runtime::Error),
}

impl std::error::Error for Error {}

impl std::convert::From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl std::convert::From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl std::convert::From<actix::MailboxError> for Error {
    fn from(error: actix::MailboxError) -> Self {
        Error::Actix(error)
    }
}

impl std::convert::From<ndn::Error> for Error {
    fn from(error: ndn::Error) -> Self {
        Error::Ndn(error)
    }
}

impl std::convert::From<security::Error> for Error {
    fn from(error: security::Error) -> Self {
        Error::Security(error)
    }
}

impl std::convert::From<fetch::Error> for Error {
    fn from(error: fetch::Error) -> Self {
        Error::Fetch(error)
    }
}

impl std::convert::From<schema::Error> for Error {
    fn from(error: schema::Error) -> Self {
        Error::Schema(error)
    }
}

impl std::convert::From<sync::Error> for Error {
    fn from(error: sync::Error) -> Self {
        Error::Sync(error)
    }
}

impl std::convert::From<app::Error> for Error {
    fn from(error: app::Error) -> Self {
        Error::App(error)
    }
}

impl std::convert::From<sim::Error> for Error {
    fn from(error: sim::Error) -> Self {
        Error::Sim(error)
    }
}

impl std::convert::From<runtime::Error> for Error {
    fn from(error: runtime::Error) -> Self {
        Error::Runtime(error)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
