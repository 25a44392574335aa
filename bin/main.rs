use tracing::info;
use tracing_subscriber;

use clap::{value_t, App, Arg};

use bootsec::server::{node, Settings};
use bootsec::Result;

fn cli<'a, 'b>(name: &str, about: &'b str) -> App<'a, 'b> {
    App::new(name.to_owned())
        .version("0.1")
        .about(about)
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("CONFIG_FILE")
                .takes_value(true)
                .required(false),
        )
        .arg(
            Arg::with_name("producers")
                .short("p")
                .long("producers")
                .value_name("PRODUCERS")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("consumers")
                .short("n")
                .long("consumers")
                .value_name("CONSUMERS")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("duration")
                .short("d")
                .long("duration")
                .value_name("SECONDS")
                .takes_value(true),
        )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_level(false)
        .with_target(false)
        .without_time()
        .compact()
        .with_max_level(tracing::Level::INFO)
        .init();

    let matches = cli("bootsec-node", "Runs a trust zone on the actor runtime").get_matches();

    let mut settings = Settings::new(matches.value_of("config"))?;
    if matches.is_present("producers") {
        settings.zone.producers = value_t!(matches.value_of("producers"), usize).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("consumers") {
        settings.zone.consumers = value_t!(matches.value_of("consumers"), usize).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("duration") {
        settings.duration_secs = value_t!(matches.value_of("duration"), u64).unwrap_or_else(|e| e.exit());
    }

    let sys = actix::System::new();
    sys.block_on(async move {
        if let Err(err) = node::run(settings) {
            tracing::error!("{}", err);
            actix::System::current().stop();
            return;
        }

        let sig = if cfg!(unix) {
            use futures::future::FutureExt;
            use tokio::signal::unix::{signal, SignalKind};

            let mut sigint = match signal(SignalKind::interrupt()) {
                Ok(sigint) => sigint,
                Err(_) => return actix::System::current().stop(),
            };
            let mut sigterm = match signal(SignalKind::terminate()) {
                Ok(sigterm) => sigterm,
                Err(_) => return actix::System::current().stop(),
            };

            futures::select! {
                _ = sigint.recv().fuse() => "SIGINT",
                _ = sigterm.recv().fuse() => "SIGTERM"
            }
        } else {
            let _ = tokio::signal::ctrl_c().await;
            "Ctrl+C"
        };
        info!(target: "bootsec", "Got {}, stopping...", sig);

        actix::System::current().stop();
    });
    sys.run()?;

    Ok(())
}
