use tracing_subscriber;

use clap::{value_t, App, Arg};

use bootsec::server::{node, Settings};
use bootsec::Result;

fn main() -> Result<()> {
    let matches = App::new("bootsec-simulate")
        .version("0.1")
        .about("Runs a trust zone on a virtual clock and reports per-node counters")
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
        .arg(Arg::with_name("verbose").short("v").long("verbose"))
        .get_matches();

    let level = if matches.is_present("verbose") { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt().with_level(false).with_target(false).without_time().compact().with_max_level(level).init();

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

    node::simulate(settings)
}
