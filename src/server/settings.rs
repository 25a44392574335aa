use crate::sim::ZoneConfig;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use std::fmt;

// For explanation, see issue: https://github.com/serde-rs/serde/issues/368
fn default_duration_secs() -> u64 {
    10
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub zone: ZoneConfig,
    /// How long a simulated zone runs, or how long before a live zone reports
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u64,
}

const CONFIG_FILE_PATH: &str = "src/server/settings/Default.json";
const CONFIG_FILE_PREFIX: &str = "src/server/settings/";

#[derive(Clone, Debug, Deserialize)]
pub enum ENV {
    Testing,
    Development,
    Production,
}

impl fmt::Display for ENV {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ENV::Testing => write!(f, "Testing"),
            ENV::Production => write!(f, "Production"),
            ENV::Development => write!(f, "Development"),
        }
    }
}

impl From<&str> for ENV {
    fn from(env: &str) -> Self {
        match env {
            "Testing" => ENV::Testing,
            "Production" => ENV::Production,
            _ => ENV::Development,
        }
    }
}

impl Settings {
    /// Layers the default file, the `RUN_ENV` file and `extra` (when given), later sources
    /// overriding earlier ones.
    pub fn new(extra: Option<&str>) -> Result<Self, ConfigError> {
        let env = ENV::from(std::env::var("RUN_ENV").unwrap_or_else(|_| "Development".into()).as_str());
        let mut builder = Config::builder()
            .set_default("env", env.to_string())?
            .add_source(File::with_name(CONFIG_FILE_PATH).required(false))
            .add_source(File::with_name(&format!("{}{}", CONFIG_FILE_PREFIX, env)).required(false));
        if let Some(path) = extra {
            builder = builder.add_source(File::with_name(path));
        }
        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Randomize;

    #[test]
    fn test_defaults() {
        let settings: Settings = Config::builder().build().unwrap().try_deserialize().unwrap();
        assert_eq!(settings.duration_secs, 10);
        assert_eq!(settings.zone.anchor.zone, "/zoneA");
        assert_eq!(settings.zone.producer.payload_size, 1480);
        assert_eq!(settings.zone.consumer.randomize, Randomize::Uniform);
        assert_eq!(settings.zone.consumer_start_ms, (200, 750));
    }

    #[test]
    fn test_file_overrides() {
        let path = std::env::temp_dir().join(format!("bootsec-settings-{}.json", rand::random::<u32>()));
        std::fs::write(
            &path,
            r#"{ "duration_secs": 30, "zone": { "producers": 3, "consumer": { "frequency": 2.5, "randomize": "exponential" } } }"#,
        )
        .unwrap();
        let settings = Settings::new(path.to_str()).unwrap();
        assert_eq!(settings.duration_secs, 30);
        assert_eq!(settings.zone.producers, 3);
        assert_eq!(settings.zone.consumers, 1);
        assert_eq!(settings.zone.consumer.frequency, 2.5);
        assert_eq!(settings.zone.consumer.randomize, Randomize::Exponential);
        // Nested defaults come from the field defaults, not the zone's
        assert_eq!(settings.zone.consumer.lifetime_ms, 2000);
    }
}
