/*!
Test Harness pour le pont FARO

Assemble un Bridge complet sur collaborateurs mockés :
- bus stub (aucun broker requis)
- chat et audit enregistreurs
- horloge pilotable pour les scénarios de timeout
*/

use crate::bus_stub::MockBus;
use crate::mocks::{MockChat, MockClock, RecordingAudit};
use faro_bridge::bridge::Bridge;
use faro_bridge::config::BridgeConfig;
use serde_json::Value;
use std::sync::Arc;

/// Harness de test complet : pont + handles vers chaque mock.
pub struct TestHarness {
    pub bridge: Arc<Bridge>,
    pub bus: Arc<MockBus>,
    pub chat: Arc<MockChat>,
    pub clock: Arc<MockClock>,
    pub audit: Arc<RecordingAudit>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default())
    }

    pub fn with_config(cfg: BridgeConfig) -> Self {
        env_logger::try_init().ok(); // Init logging pour tests

        let bus = Arc::new(MockBus::new());
        let chat = Arc::new(MockChat::new());
        let clock = Arc::new(MockClock::new());
        let audit = Arc::new(RecordingAudit::new());

        let bridge = Arc::new(Bridge::new(
            cfg,
            bus.clone(),
            chat.clone(),
            audit.clone(),
            clock.clone(),
        ));

        Self { bridge, bus, chat, clock, audit }
    }

    /// Topic d'événement d'un device de la config (panique si absent :
    /// erreur d'écriture du test, pas du code testé).
    pub fn event_topic(&self, device: &str) -> String {
        self.bridge
            .config()
            .devices
            .get(device)
            .unwrap_or_else(|| panic!("device inconnu dans la config de test: {device}"))
            .event_topic()
    }

    pub fn command_topic(&self, device: &str) -> String {
        self.bridge
            .config()
            .devices
            .get(device)
            .unwrap_or_else(|| panic!("device inconnu dans la config de test: {device}"))
            .command_topic()
    }

    /// Simule l'arrivée d'un événement device sur le bus.
    pub async fn send_event(&self, device: &str, payload: Value) {
        let topic = self.event_topic(device);
        let bytes = serde_json::to_vec(&payload).expect("payload de test sérialisable");
        self.bridge.handle_inbound(&topic, &bytes).await;
    }

    /// Un scan du monitor de liveness à l'heure courante de l'horloge mockée.
    pub async fn tick(&self) {
        self.bridge.liveness_tick().await;
    }

    /// Avance l'horloge mockée.
    pub fn advance_secs(&self, secs: i64) {
        self.clock.advance_secs(secs);
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus_stub::EventBuilder;
    use faro_bridge::models::Reach;

    #[tokio::test]
    async fn harness_wires_a_working_bridge() {
        let harness = TestHarness::new();

        harness.send_event("nairo", EventBuilder::ping(true)).await;
        assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Reachable);

        // Chaque message bus passe par l'audit
        assert_eq!(harness.audit.records().len(), 1);

        // Le ping seul ne produit aucune livraison chat
        assert!(harness.chat.deliveries().is_empty());
    }

    #[tokio::test]
    async fn harness_tick_uses_the_mock_clock() {
        let harness = TestHarness::new();
        harness.send_event("nairo", EventBuilder::ping(true)).await;

        harness.advance_secs(10);
        harness.tick().await;

        assert_eq!(harness.bridge.device_snapshot("nairo").reach, Reach::Unreachable);
    }
}
