/*!
Stub du bus de commandes pour développement sans broker

Implémente le trait CommandBus du pont en enregistrant toutes les
publications, avec un mode panne pour tester les chemins d'échec.
*/

use async_trait::async_trait;
use faro_bridge::ports::CommandBus;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct PublishedMessage {
    pub topic: String,
    pub payload: String,
}

/// Bus mocké : collecte les publications au lieu de les émettre.
#[derive(Default)]
pub struct MockBus {
    published: Arc<Mutex<Vec<PublishedMessage>>>,
    failing: AtomicBool,
}

impl MockBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fait échouer toutes les publications suivantes (panne transport).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Toutes les publications enregistrées (pour assertions de tests).
    pub fn published(&self) -> Vec<PublishedMessage> {
        self.published.lock().clone()
    }

    pub fn find_by_topic(&self, topic: &str) -> Vec<PublishedMessage> {
        self.published.lock().iter().filter(|m| m.topic == topic).cloned().collect()
    }

    /// Parse le dernier message d'un topic en JSON.
    pub fn last_json(&self, topic: &str) -> Option<Value> {
        self.find_by_topic(topic)
            .last()
            .and_then(|m| serde_json::from_str(&m.payload).ok())
    }

    pub fn clear(&self) {
        self.published.lock().clear();
    }
}

#[async_trait]
impl CommandBus for MockBus {
    async fn publish(&self, topic: &str, payload: String) -> anyhow::Result<()> {
        if self.failing.load(Ordering::Relaxed) {
            anyhow::bail!("mock bus en panne");
        }
        log::info!("📤 [MOCK] Published to {}: {} bytes", topic, payload.len());
        self.published.lock().push(PublishedMessage { topic: topic.to_string(), payload });
        Ok(())
    }
}

/// Builders de payloads conformes au contrat d'événements device.
pub struct EventBuilder;

impl EventBuilder {
    /// Rapport d'état de sortie
    pub fn state(on: bool) -> Value {
        serde_json::json!({ "action": "state", "on": on })
    }

    /// Lecture de télémétrie
    pub fn telemetry(variable: &str, value: f64) -> Value {
        serde_json::json!({ "action": "telemetry", "variable": variable, "value": value })
    }

    /// Ping de liveness
    pub fn ping(alive: bool) -> Value {
        serde_json::json!({ "action": "ping", "alive": alive })
    }

    /// Action libre (part en Generic côté classifier)
    pub fn generic(action: &str) -> Value {
        serde_json::json!({ "action": action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_bus_records_publishes() {
        let bus = MockBus::new();
        bus.publish("faro/devices/nairo/command@v1", r#"{"action":"status"}"#.into())
            .await
            .unwrap();

        let messages = bus.find_by_topic("faro/devices/nairo/command@v1");
        assert_eq!(messages.len(), 1);
        assert_eq!(bus.last_json("faro/devices/nairo/command@v1").unwrap()["action"], "status");
    }

    #[tokio::test]
    async fn failing_mode_rejects_publishes() {
        let bus = MockBus::new();
        bus.set_failing(true);
        assert!(bus.publish("t", "p".into()).await.is_err());
        assert!(bus.published().is_empty());
    }

    #[test]
    fn event_builders_match_the_wire_contract() {
        assert_eq!(EventBuilder::state(true)["on"], true);
        let t = EventBuilder::telemetry("temperature", 21.5);
        assert_eq!(t["action"], "telemetry");
        assert_eq!(t["value"], 21.5);
        assert_eq!(EventBuilder::ping(false)["alive"], false);
    }
}
