use super::test_utils::*;

use crate::sim::{Zone, ZoneConfig};

use std::time::Duration;

#[test]
fn test_producer_bootstrap() {
    let mut zone = reference_zone(1, 0);
    let anchor_cert = anchor_certificate(&zone);
    let anchor_key_id = anchor_cert.key_name().get(-1).unwrap().to_owned();

    // The first issued certificate arrives before the rules that make it acceptable
    run_until(&mut zone, Duration::from_secs(1));
    {
        let producer = zone.producers().next().unwrap();
        assert!(default_certificate(producer).unwrap().is_self_signed());
        assert!(!producer.should_validate());
        assert!(producer.stats().validations_failed >= 1);
        assert_eq!(producer.stats().schema_reloads, 1);
    }

    // The next heartbeat succeeds
    run_until(&mut zone, Duration::from_secs(3));
    let producer = zone.producers().next().unwrap();
    let cert = default_certificate(producer).unwrap();
    assert!(!cert.is_self_signed());
    assert_eq!(cert.identity(), crate::ndn::Name::from("/zoneA/test/prefix"));
    assert_eq!(cert.issuer_id(), anchor_key_id);
    assert_eq!(cert.signer(), Some(&anchor_cert.key_name()));
    assert!(anchor_cert.verify(cert.data()));
    assert!(producer.should_validate());

    let anchor = zone.anchor().unwrap();
    assert_eq!(rule_ids(anchor), vec!["app:/zoneA/test/prefix", "key:/zoneA/test/prefix", "schema", "sign"]);
}

#[test]
fn test_heartbeat_stops_once_signed() {
    let mut zone = reference_zone(1, 0);
    run_until(&mut zone, Duration::from_secs(3));
    let sent = zone.producers().next().unwrap().stats().interests_sent;
    run_until(&mut zone, Duration::from_secs(9));
    let producer = zone.producers().next().unwrap();
    // Only schema subscriptions remain: one every two seconds
    assert!(producer.stats().interests_sent - sent <= 4);
    assert!(!default_certificate(producer).unwrap().is_self_signed());
}

#[test]
fn test_producers_sharing_an_identity() {
    let mut zone = reference_zone(2, 0);
    run_until(&mut zone, Duration::from_secs(3));
    let anchor_cert = anchor_certificate(&zone);
    let certs: Vec<_> = zone.producers().map(|p| default_certificate(p).unwrap().clone()).collect();
    assert_eq!(certs.len(), 2);
    assert_ne!(certs[0].key_name(), certs[1].key_name());
    for cert in certs.iter() {
        assert_eq!(cert.signer(), Some(&anchor_cert.key_name()));
    }
    // Rules are added once per identity
    assert_eq!(rule_ids(zone.anchor().unwrap()).len(), 4);
}

#[test]
fn test_bootstrap_over_lossy_network() {
    let config = ZoneConfig { producers: 1, consumers: 0, loss: 0.05, seed: 11, ..ZoneConfig::default() };
    let mut zone = Zone::build(config).unwrap();
    run_until(&mut zone, Duration::from_secs(40));
    let producer = zone.producers().next().unwrap();
    assert!(!default_certificate(producer).unwrap().is_self_signed());
    assert!(producer.should_validate());
}

#[test]
fn test_identity_with_reserved_characters() {
    let mut config = ZoneConfig { producers: 1, consumers: 1, ..ZoneConfig::default() };
    config.producer.prefix = "/zoneA/test node".to_string();
    config.consumer.prefix = "/zoneA/test node".to_string();
    let mut zone = Zone::build(config).unwrap();
    run_until(&mut zone, Duration::from_secs(4));

    let producer = zone.producers().next().unwrap();
    let cert = default_certificate(producer).unwrap();
    assert!(!cert.is_self_signed());
    assert_eq!(cert.identity(), crate::ndn::Name::from_components(vec!["zoneA", "test node"]));

    let anchor = zone.anchor().unwrap();
    assert_eq!(rule_ids(anchor), vec!["app:/zoneA/test%20node", "key:/zoneA/test%20node", "schema", "sign"]);
    let consumer = zone.consumers().next().unwrap();
    assert_eq!(consumer.schema().serialize(), anchor.schema().serialize());
    assert!(consumer.stats().validations_succeeded > 0);
}
