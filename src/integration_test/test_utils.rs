use crate::app::App;
use crate::ndn::Name;
use crate::security::Certificate;
use crate::sim::{Zone, ZoneConfig};

use std::time::Duration;

pub fn zone_name() -> Name {
    Name::from("/zoneA")
}

/// The reference zone with `producers` producers and `consumers` consumers.
pub fn reference_zone(producers: usize, consumers: usize) -> Zone {
    Zone::build(ZoneConfig { producers, consumers, ..ZoneConfig::default() }).unwrap()
}

/// Runs `zone` until the virtual clock reads `at`.
pub fn run_until(zone: &mut Zone, at: Duration) {
    let now = zone.simulator().now();
    if at > now {
        zone.run_for(at - now).unwrap();
    }
}

/// The default certificate of the node's default identity.
pub fn default_certificate(app: &App) -> Option<&Certificate> {
    let keychain = app.keychain();
    keychain.default_identity().and_then(|identity| keychain.default_certificate(identity.name()))
}

pub fn anchor_certificate(zone: &Zone) -> Certificate {
    let anchor = zone.anchor().unwrap();
    anchor.keychain().default_certificate(&zone_name()).unwrap().clone()
}

pub fn rule_ids(app: &App) -> Vec<String> {
    app.schema().serialize().rules().map(|rule| rule.id.clone()).collect()
}
