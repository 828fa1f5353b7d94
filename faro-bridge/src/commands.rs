/**
 * COMMANDS - Encodeur des requêtes/commandes sortantes vers les devices
 *
 * RÔLE :
 * Construit les payloads de contrôle et décide, par requête, si le device
 * cible est joignable avant d'émettre. Interroger un device injoignable
 * laisserait l'attente pendre pour toujours : ces chemins court-circuitent
 * le bus et répondent immédiatement à la conversation.
 *
 * FONCTIONNEMENT :
 * - check joignabilité + enregistrement de l'attente dans la même section
 *   critique, publication ensuite, verrou relâché
 * - une seule tentative de publication, échec loggé sans retry
 */

use crate::bridge::Bridge;
use crate::models::{rfc3339, ChatId, DeviceCommand, OutputState, Reach, Variable};
use crate::pending::RequestKind;

impl Bridge {
    /// Diffuse une requête de status à tous les devices connus, sans
    /// condition. Les réponses reviennent en broadcast et sont corrélées
    /// par le classifier, pas par identifiant de requête.
    pub async fn request_device_status(&self) {
        let now = self.clock.now();
        for (name, conf) in &self.cfg.devices {
            let payload = match serde_json::to_string(&DeviceCommand::status(now)) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("[commands] encodage status pour {name} impossible: {e}");
                    continue;
                }
            };
            if let Err(e) = self.bus.publish(&conf.command_topic(), payload).await {
                eprintln!("[commands] publish status vers {name} échoué: {e}");
            }
        }
    }

    /// Demande une lecture de télémétrie au device capteur. Si celui-ci
    /// n'est pas joignable, répond immédiatement avec son dernier ping
    /// connu au lieu d'émettre sur le bus.
    pub async fn request_measurement(&self, chat: ChatId, variable: Variable) {
        let sensor = self.cfg.sensor_device.clone();

        let unreachable = {
            let mut state = self.state.lock();
            let snap = state.device_snapshot(&sensor);
            if snap.reach == Reach::Reachable {
                state.begin_request(chat, RequestKind::Measurement(variable));
                None
            } else {
                Some(snap)
            }
        };

        match unreachable {
            Some(snap) => {
                self.chat.deliver(chat, &unreachable_text(&snap.name, snap.last_liveness)).await;
            }
            None => {
                let command = DeviceCommand::read(variable, self.clock.now());
                self.publish_to(&sensor, &command).await;
            }
        }
    }

    /// Bascule la sortie d'un device : commande l'inverse du dernier état
    /// connu (toggle optimiste, le device rapporte ensuite l'état réel qui
    /// satisfera l'attente). Même court-circuit d'injoignabilité.
    pub async fn toggle_output(&self, chat: ChatId, device: &str) {
        if !self.cfg.devices.contains_key(device) {
            self.chat.deliver(chat, &format!("❓ unknown device `{device}`")).await;
            return;
        }

        let decision = {
            let mut state = self.state.lock();
            let snap = state.device_snapshot(device);
            if snap.reach == Reach::Reachable {
                // Unknown bascule vers ON
                let desired = snap.last_output != OutputState::On;
                state.begin_request(chat, RequestKind::OutputState(device.to_string()));
                Ok(desired)
            } else {
                Err(snap)
            }
        };

        match decision {
            Ok(desired) => {
                let command = DeviceCommand::set(desired, self.clock.now());
                self.publish_to(device, &command).await;
            }
            Err(snap) => {
                self.chat.deliver(chat, &unreachable_text(device, snap.last_liveness)).await;
            }
        }
    }

    async fn publish_to(&self, device: &str, command: &DeviceCommand) {
        let Some(conf) = self.cfg.devices.get(device) else {
            eprintln!("[commands] device {device} absent de la config");
            return;
        };
        let payload = match serde_json::to_string(command) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("[commands] encodage commande pour {device} impossible: {e}");
                return;
            }
        };
        if let Err(e) = self.bus.publish(&conf.command_topic(), payload).await {
            eprintln!("[commands] publish vers {device} échoué: {e}");
        }
    }
}

/// Message informatif (pas une erreur : la connectivité intermittente est
/// une condition d'exploitation normale).
fn unreachable_text(device: &str, last_liveness: Option<time::OffsetDateTime>) -> String {
    match last_liveness {
        Some(ts) => format!("⚠️ {device} unreachable, last seen {}", rfc3339(ts)),
        None => format!("⚠️ {device} unreachable, no liveness record yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unreachable_text_mentions_last_seen_or_no_record() {
        let ts = time::macros::datetime!(2025-03-01 10:00:00 UTC);
        assert_eq!(
            unreachable_text("nairo", Some(ts)),
            "⚠️ nairo unreachable, last seen 2025-03-01T10:00:00Z"
        );
        assert_eq!(
            unreachable_text("nairo", None),
            "⚠️ nairo unreachable, no liveness record yet"
        );
    }
}
