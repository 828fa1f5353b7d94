//! Scénarios de liveness : démotion sur timeout, récupération explicite,
//! alerte agrégée "tous devices déconnectés".

use faro_bridge::{Reach, RequestKind, Variable};
use faro_devkit::{EventBuilder, TestHarness};

// Ping à t=0, scan à t=10 avec seuil 3 → unreachable.
#[tokio::test]
async fn stale_device_is_demoted_by_the_monitor() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;
    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Reachable);

    harness.advance_secs(10);
    harness.tick().await;

    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);
}

#[tokio::test]
async fn fresh_ping_survives_the_tick() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;

    harness.advance_secs(2); // sous le seuil de 3s
    harness.tick().await;

    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Reachable);
}

// Aucune récupération spontanée, seul un ping positif re-promeut.
#[tokio::test]
async fn recovery_requires_an_explicit_positive_ping() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;
    harness.advance_secs(10);
    harness.tick().await;
    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);

    // Des scans supplémentaires ne changent rien
    harness.advance_secs(60);
    harness.tick().await;
    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);

    // Un rapport d'état n'est pas un signe de vie
    harness.send_event("nairo", EventBuilder::state(true)).await;
    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);

    harness.send_event("nairo", EventBuilder::ping(true)).await;
    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Reachable);
}

#[tokio::test]
async fn negative_ping_demotes_immediately_without_timeout() {
    let harness = TestHarness::new();
    harness.send_event("alejandro", EventBuilder::ping(true)).await;

    harness.send_event("alejandro", EventBuilder::ping(false)).await;

    assert_eq!(harness.bridge.device_snapshot("alejandro").reach, Reach::Unreachable);
}

// Tous les devices non-joignables à un tick → chaque
// conversation en attente reçoit exactement une alerte agrégée.
#[tokio::test]
async fn all_down_alert_reaches_every_waiting_chat_once() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;
    // alejandro reste Unknown : compte comme non-joignable

    harness.bridge.begin_request(11, RequestKind::Measurement(Variable::Temperature));
    harness.bridge.begin_request(11, RequestKind::OutputState("nairo".into()));
    harness.bridge.begin_request(12, RequestKind::OutputState("alejandro".into()));

    harness.advance_secs(10);
    harness.tick().await;

    let mut chats: Vec<_> = harness.chat.deliveries().iter().map(|(c, _)| *c).collect();
    chats.sort_unstable();
    assert_eq!(chats, vec![11, 12]);
    for (_, text) in harness.chat.deliveries() {
        assert!(text.contains("all devices disconnected"));
    }
    assert!(harness.bridge.waiting_chats().is_empty());

    // Tick suivant : les attentes sont vidées, aucune nouvelle livraison
    harness.advance_secs(10);
    harness.tick().await;
    assert_eq!(harness.chat.deliveries().len(), 2);
}

#[tokio::test]
async fn all_down_without_waiter_only_logs() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;

    harness.advance_secs(10);
    harness.tick().await;

    assert!(harness.chat.deliveries().is_empty());
}

#[tokio::test]
async fn no_alert_while_any_device_remains_reachable() {
    let harness = TestHarness::new();
    harness.send_event("nairo", EventBuilder::ping(true)).await;
    harness.send_event("alejandro", EventBuilder::ping(true)).await;
    harness.bridge.begin_request(1, RequestKind::Measurement(Variable::Humidity));

    // nairo expire, alejandro re-pingue juste avant le scan
    harness.advance_secs(10);
    harness.send_event("alejandro", EventBuilder::ping(true)).await;
    harness.tick().await;

    assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);
    assert_eq!(harness.bridge.device_snapshot("alejandro").reach, Reach::Reachable);
    assert!(harness.chat.deliveries().is_empty());
    assert_eq!(harness.bridge.waiting_chats(), vec![1]);
}
