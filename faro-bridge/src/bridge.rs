/**
 * BRIDGE - Contexte central du pont bus ↔ chat
 *
 * RÔLE :
 * Possède l'état coeur (registry + attentes) sous un unique mutex et les
 * handles vers les collaborateurs (chat, bus, audit, horloge). Les trois
 * boucles concurrentes (bus entrant, front-end chat, monitor de liveness)
 * ne se parlent qu'à travers cet objet.
 *
 * FONCTIONNEMENT :
 * - Les sections critiques ne font que muter l'état et calculer les
 *   livraisons ; tout await (chat, bus) se fait verrou relâché
 * - Construction explicite via new(), pas d'état global : les tests
 *   instancient des ponts indépendants
 */

use crate::config::BridgeConfig;
use crate::models::{ChatId, DeviceSnapshot, Variable};
use crate::pending::RequestKind;
use crate::ports::{AuditLog, ChatSink, Clock, CommandBus};
use crate::registry::{CoreState, Delivery};
use parking_lot::Mutex;
use std::sync::Arc;

pub struct Bridge {
    pub(crate) state: Mutex<CoreState>,
    pub(crate) cfg: BridgeConfig,
    pub(crate) chat: Arc<dyn ChatSink>,
    pub(crate) bus: Arc<dyn CommandBus>,
    pub(crate) audit: Arc<dyn AuditLog>,
    pub(crate) clock: Arc<dyn Clock>,
}

impl Bridge {
    pub fn new(
        cfg: BridgeConfig,
        bus: Arc<dyn CommandBus>,
        chat: Arc<dyn ChatSink>,
        audit: Arc<dyn AuditLog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = CoreState::new(cfg.devices.keys().cloned());
        Self { state: Mutex::new(state), cfg, chat, bus, audit, clock }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.cfg
    }

    /// Vue figée d'un device ; ne bloque pas, n'échoue jamais.
    pub fn device_snapshot(&self, name: &str) -> DeviceSnapshot {
        self.state.lock().device_snapshot(name)
    }

    pub fn last_measurement(&self, variable: Variable) -> Option<f64> {
        self.state.lock().last_measurement(variable)
    }

    /// Enregistre une conversation en attente d'un type de réponse.
    pub fn begin_request(&self, chat: ChatId, kind: RequestKind) {
        self.state.lock().begin_request(chat, kind);
    }

    /// Équivalent lecture seule du peek() du tracker.
    pub fn waiting_chats(&self) -> Vec<ChatId> {
        self.state.lock().waiting_chats()
    }

    /// Remet une série de livraisons calculées sous verrou. À appeler
    /// uniquement verrou relâché.
    pub(crate) async fn deliver_all(&self, deliveries: Vec<Delivery>) {
        for delivery in deliveries {
            self.chat.deliver(delivery.chat, &delivery.text).await;
        }
    }
}

pub type SharedBridge = Arc<Bridge>;
