/*!
Mocks des collaborateurs du coeur : chat, horloge, audit.

L'horloge mockée rend les timeouts de liveness déterministes en test ;
le chat et l'audit enregistrent ce que le coeur leur confie.
*/

use async_trait::async_trait;
use faro_bridge::models::ChatId;
use faro_bridge::ports::{AuditLog, ChatSink, Clock};
use parking_lot::Mutex;
use std::sync::Arc;
use time::OffsetDateTime;

/// Chat mocké : collecte les livraisons.
#[derive(Default)]
pub struct MockChat {
    deliveries: Arc<Mutex<Vec<(ChatId, String)>>>,
}

impl MockChat {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deliveries(&self) -> Vec<(ChatId, String)> {
        self.deliveries.lock().clone()
    }

    pub fn texts_for(&self, chat: ChatId) -> Vec<String> {
        self.deliveries
            .lock()
            .iter()
            .filter(|(c, _)| *c == chat)
            .map(|(_, t)| t.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.deliveries.lock().clear();
    }
}

#[async_trait]
impl ChatSink for MockChat {
    async fn deliver(&self, chat: ChatId, text: &str) {
        log::info!("💬 [MOCK] deliver to {chat}: {text}");
        self.deliveries.lock().push((chat, text.to_string()));
    }
}

/// Horloge pilotable à la main.
pub struct MockClock {
    now: Mutex<OffsetDateTime>,
}

impl MockClock {
    pub fn new() -> Self {
        // Origine arbitraire mais fixe pour des assertions stables
        Self { now: Mutex::new(time::macros::datetime!(2025-01-01 00:00:00 UTC)) }
    }

    pub fn current(&self) -> OffsetDateTime {
        *self.now.lock()
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock();
        *now += time::Duration::seconds(secs);
    }

    pub fn set(&self, ts: OffsetDateTime) {
        *self.now.lock() = ts;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> OffsetDateTime {
        self.current()
    }
}

/// Audit mocké : garde chaque (topic, payload brut).
#[derive(Default)]
pub struct RecordingAudit {
    records: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingAudit {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<(String, String)> {
        self.records.lock().clone()
    }
}

impl AuditLog for RecordingAudit {
    fn record(&self, topic: &str, raw: &str) {
        self.records.lock().push((topic.to_string(), raw.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances() {
        let clock = MockClock::new();
        let t0 = clock.current();
        clock.advance_secs(42);
        assert_eq!(clock.current() - t0, time::Duration::seconds(42));
    }

    #[tokio::test]
    async fn mock_chat_collects_deliveries() {
        let chat = MockChat::new();
        chat.deliver(7, "hello").await;
        chat.deliver(8, "world").await;
        assert_eq!(chat.texts_for(7), vec!["hello".to_string()]);
        assert_eq!(chat.deliveries().len(), 2);
    }
}
