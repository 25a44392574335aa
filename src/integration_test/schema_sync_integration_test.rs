use super::test_utils::*;

use crate::ndn::Name;
use crate::schema::SchemaDocument;
use crate::sim::{Direction, PacketKind};

use std::collections::HashSet;
use std::str::FromStr;
use std::time::Duration;

#[test]
fn test_replicas_converge() {
    let mut zone = reference_zone(2, 2);
    run_until(&mut zone, Duration::from_secs(6));
    let authoritative = zone.anchor().unwrap().schema().serialize();
    assert_eq!(authoritative.rules().count(), 4);

    for app in zone.producers().chain(zone.consumers()) {
        assert_eq!(app.schema().serialize(), authoritative, "{}", app.label());
        assert!(app.stats().schema_reloads >= 1, "{}", app.label());
        // The replica drives validation too
        assert_eq!(app.validator().rules().len(), 4, "{}", app.label());
    }
}

#[test]
fn test_signal_is_followed_within_a_round_trip() {
    let mut zone = reference_zone(2, 2);
    zone.enable_trace();
    run_until(&mut zone, Duration::from_secs(6));
    let sim = zone.simulator();
    let hop = sim.network().hop_delay();
    let subscribe = Name::from("/zoneA/SCHEMA/SUBSCRIBE");
    let content = Name::from("/zoneA/SCHEMA/CONTENT");

    let signals: Vec<Duration> = sim
        .trace()
        .iter()
        .filter(|r| r.direction == Direction::Sent && r.kind == PacketKind::Data && r.name == subscribe)
        .map(|r| r.at)
        .collect();
    assert!(!signals.is_empty());

    let mut signaled = HashSet::new();
    for received in sim
        .trace()
        .iter()
        .filter(|r| r.direction == Direction::Received && r.kind == PacketKind::Data && r.name == subscribe)
    {
        signaled.insert(received.node);
        let request = sim
            .trace()
            .iter()
            .find(|r| {
                r.node == received.node && r.direction == Direction::Sent && r.name == content && r.at >= received.at
            })
            .unwrap();
        let signal = signals.iter().rev().find(|at| **at <= received.at).unwrap();
        // The content request reaches the anchor one round trip after its signal left
        assert!(request.at + hop <= *signal + hop * 2, "{} at {:?}", received.node, request.at);
    }
    // Every replica heard at least one signal
    assert_eq!(signaled.len(), 4);
}

#[test]
fn test_initial_replica_carries_the_trust_anchor() {
    let zone = reference_zone(1, 1);
    let anchor_cert = anchor_certificate(&zone);
    let text = zone.anchor().unwrap().schema().serialize().to_string();
    let document = SchemaDocument::from_str(&text).unwrap();
    let loaded = document.trust_anchors().next().unwrap().load().unwrap();
    assert_eq!(loaded, anchor_cert);
    assert_eq!(rule_ids(zone.anchor().unwrap()), vec!["schema", "sign"]);
}
