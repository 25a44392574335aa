use super::app::{Env, Role};
use super::face::Timer;
use super::Result;

use crate::ndn::{Data, Interest, Name};
use crate::security::Certificate;

use colored::Colorize;
use rand::Rng;
use tracing::{debug, info};

use std::time::Duration;

/// How the gap between two requests is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Randomize {
    /// Exactly `1/frequency`
    None,
    /// Uniform on `[0, 2/frequency]`
    Uniform,
    /// Exponential with mean `1/frequency`, redrawn above `50/frequency`
    Exponential,
}

impl Default for Randomize {
    fn default() -> Self {
        Randomize::None
    }
}

fn default_prefix() -> String {
    "/zoneA/test/prefix".to_string()
}
fn default_frequency() -> f64 {
    1.0
}
fn default_lifetime_ms() -> u64 {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConsumerConfig {
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Requests per second
    #[serde(default = "default_frequency")]
    pub frequency: f64,
    #[serde(default = "default_lifetime_ms")]
    pub lifetime_ms: u64,
    #[serde(default)]
    pub randomize: Randomize,
    #[serde(default)]
    pub start_delay_ms: u64,
    /// Stop after this many requests
    #[serde(default)]
    pub max_requests: Option<u64>,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        ConsumerConfig {
            prefix: default_prefix(),
            frequency: default_frequency(),
            lifetime_ms: default_lifetime_ms(),
            randomize: Randomize::None,
            start_delay_ms: 0,
            max_requests: None,
        }
    }
}

/// Requests `<prefix>/<seq>` at a steady or randomized rate and validates every answer.
pub struct Consumer {
    prefix: Name,
    frequency: f64,
    lifetime: Duration,
    randomize: Randomize,
    start_delay: Duration,
    max_requests: Option<u64>,
    seq: u64,
    received: u64,
}

impl Consumer {
    pub fn new(config: ConsumerConfig) -> Self {
        Consumer {
            prefix: Name::from(config.prefix.as_str()),
            frequency: if config.frequency > 0.0 { config.frequency } else { default_frequency() },
            lifetime: Duration::from_millis(config.lifetime_ms),
            randomize: config.randomize,
            start_delay: Duration::from_millis(config.start_delay_ms),
            max_requests: config.max_requests,
            seq: 0,
            received: 0,
        }
    }

    /// The delay before the next request.
    pub fn next_gap(&self) -> Duration {
        let period = 1.0 / self.frequency;
        let mut rng = rand::thread_rng();
        let secs = match self.randomize {
            Randomize::None => period,
            Randomize::Uniform => rng.gen_range(0.0, 2.0 * period),
            Randomize::Exponential => loop {
                let u: f64 = rng.gen();
                let gap = -period * (1.0 - u).ln();
                if gap <= 50.0 * period {
                    break gap;
                }
            },
        };
        Duration::from_secs_f64(secs)
    }
}

impl Role for Consumer {
    fn kind(&self) -> &'static str {
        "consumer"
    }

    fn start(&mut self, env: &mut Env) -> Result<()> {
        *env.should_validate = true;
        env.face.schedule(self.start_delay, Timer::ConsumeNext);
        Ok(())
    }

    fn on_request_for_key(&mut self, _env: &mut Env, _interest: &Interest) -> Result<()> {
        Ok(())
    }

    fn on_request_for_content(&mut self, _env: &mut Env, _interest: &Interest) -> Result<()> {
        Ok(())
    }

    fn on_content_for_certificate(&mut self, _env: &mut Env, cert: Certificate) -> Result<()> {
        debug!("[{}] ignoring {}", "consumer".green(), cert.name());
        Ok(())
    }

    fn on_content_for_application_data(&mut self, _env: &mut Env, data: Data) -> Result<()> {
        if self.prefix.is_prefix_of(&data.name) {
            self.received += 1;
            info!("[{}] received {} ({} so far)", "consumer".green(), data.name, self.received);
        }
        Ok(())
    }

    fn on_timer(&mut self, env: &mut Env, timer: &Timer) -> Result<()> {
        if *timer != Timer::ConsumeNext {
            return Ok(());
        }
        if self.max_requests.map_or(false, |max| self.seq >= max) {
            return Ok(());
        }
        let name = self.prefix.clone().append(self.seq.to_string());
        self.seq += 1;
        env.face.express(Interest::new(name, self.lifetime));
        env.face.schedule(self.next_gap(), Timer::ConsumeNext);
        Ok(())
    }
}
