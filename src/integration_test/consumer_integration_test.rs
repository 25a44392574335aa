use super::test_utils::*;

use crate::app::{ConsumerConfig, Randomize};
use crate::sim::{Zone, ZoneConfig};

use std::time::Duration;

#[test]
fn test_consumers_validate_certified_content() {
    let mut zone = reference_zone(1, 2);
    run_until(&mut zone, Duration::from_secs(8));
    for consumer in zone.consumers() {
        let stats = consumer.stats();
        assert!(consumer.should_validate());
        assert!(stats.data_received > 0);
        // Everything after the producer is certified and the rules have arrived validates
        assert!(stats.validations_succeeded > 20, "{}: {:?}", consumer.label(), stats);
    }
}

#[test]
fn test_uncertified_content_is_rejected() {
    let mut zone = reference_zone(1, 1);
    run_until(&mut zone, Duration::from_secs(2));
    let consumer = zone.consumers().next().unwrap();
    // Requests started between 200 and 750 ms, the producer is not certified before 2 s
    assert!(consumer.stats().interests_sent > 0);
    assert_eq!(consumer.stats().validations_succeeded, 0);
    assert_eq!(consumer.stats().schema_reloads, 0);
    assert!(consumer.stats().validations_failed > 0);
}

#[test]
fn test_exponential_consumer() {
    let config = ZoneConfig {
        consumers: 1,
        consumer: ConsumerConfig { frequency: 20.0, randomize: Randomize::Exponential, ..ConsumerConfig::default() },
        ..ZoneConfig::default()
    };
    let mut zone = Zone::build(config).unwrap();
    run_until(&mut zone, Duration::from_secs(8));
    let consumer = zone.consumers().next().unwrap();
    assert!(consumer.stats().validations_succeeded > 0);
}
