/**
 * PORTS - Interfaces vers les collaborateurs externes du coeur
 *
 * RÔLE :
 * Le coeur de corrélation/liveness ne possède ni le transport chat, ni le
 * transport bus, ni le stockage d'audit. Il ne les voit qu'à travers ces
 * traits, ce qui permet de les substituer par les stubs du devkit en test.
 */

use crate::models::ChatId;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Remise d'un message à une conversation chat. Fire-and-forget :
/// un échec est loggé par l'implémentation, jamais remonté au coeur.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn deliver(&self, chat: ChatId, text: &str);
}

/// Publication d'une commande sur le bus. L'échec est log-only côté
/// appelant : une seule tentative, pas de retry.
#[async_trait]
pub trait CommandBus: Send + Sync {
    async fn publish(&self, topic: &str, payload: String) -> anyhow::Result<()>;
}

/// Persistance best-effort des messages bus bruts.
pub trait AuditLog: Send + Sync {
    fn record(&self, topic: &str, raw: &str);
}

/// Horloge injectable pour tester les timeouts de façon déterministe.
pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Audit muet, utilisé quand le fichier d'audit n'a pas pu être ouvert.
pub struct NullAudit;

impl AuditLog for NullAudit {
    fn record(&self, _topic: &str, _raw: &str) {}
}
