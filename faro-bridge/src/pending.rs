/**
 * PENDING REQUESTS - Tracker des questions chat en attente de réponse device
 *
 * RÔLE :
 * Mémorise "qui attend quoi" entre l'émission d'une commande/requête vers un
 * device et l'arrivée de la réponse asynchrone sur le bus.
 *
 * FONCTIONNEMENT :
 * - Indexé par type de requête (sortie d'un device, variable de télémétrie)
 * - Plusieurs conversations peuvent attendre le même type sans s'écraser
 * - resolve() vide les waiters du type ; sans waiter c'est un no-op
 * - Aucun timeout individuel : une attente vit jusqu'à résolution
 */

use crate::models::{ChatId, Variable};
use std::collections::HashMap;

/// Type de réponse attendue par une conversation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RequestKind {
    OutputState(String),
    Measurement(Variable),
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestKind::OutputState(device) => write!(f, "output:{device}"),
            RequestKind::Measurement(variable) => write!(f, "measurement:{variable}"),
        }
    }
}

#[derive(Debug, Default)]
pub struct PendingRequests {
    waiters: HashMap<RequestKind, Vec<ChatId>>,
}

impl PendingRequests {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enregistre une conversation en attente d'un type de réponse.
    /// Une même conversation n'est jamais dupliquée pour un même type.
    pub fn begin(&mut self, chat: ChatId, kind: RequestKind) {
        let entry = self.waiters.entry(kind).or_default();
        if !entry.contains(&chat) {
            entry.push(chat);
        }
    }

    /// Retire et retourne les conversations en attente de ce type.
    /// Vide = personne n'attendait (réponse tardive ou dupliquée, cas normal).
    pub fn resolve(&mut self, kind: &RequestKind) -> Vec<ChatId> {
        self.waiters.remove(kind).unwrap_or_default()
    }

    /// Vide toutes les attentes, une entrée par conversation distincte.
    /// Chemin de l'alerte agrégée du monitor.
    pub fn drain_all(&mut self) -> Vec<ChatId> {
        let mut chats: Vec<ChatId> = self.waiters.drain().flat_map(|(_, c)| c).collect();
        chats.sort_unstable();
        chats.dedup();
        chats
    }

    /// Lecture seule : conversations actuellement en attente.
    pub fn waiting_chats(&self) -> Vec<ChatId> {
        let mut chats: Vec<ChatId> = self.waiters.values().flatten().copied().collect();
        chats.sort_unstable();
        chats.dedup();
        chats
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }
}
