/**
 * DEVICE REGISTRY - État partagé des devices, mesures et attentes chat
 *
 * RÔLE :
 * Source de vérité unique pour le dernier état connu de chaque device
 * (sortie, connectivité, dernier ping) et de chaque variable de télémétrie.
 *
 * FONCTIONNEMENT :
 * - Toute mutation passe par les opérations set_* : c'est là que se joue
 *   le "check-then-act" registry + slot d'attente, en une section critique
 * - Les set_* retournent les livraisons chat produites ; l'appelant les
 *   envoie après avoir relâché le verrou (jamais d'I/O sous le mutex)
 * - Les devices sont créés au démarrage et jamais supprimés
 */

use crate::models::{ChatId, DeviceSnapshot, OutputState, Reach, Variable};
use crate::pending::{PendingRequests, RequestKind};
use std::collections::HashMap;
use time::OffsetDateTime;

/// Un message chat à remettre, calculé sous verrou, envoyé hors verrou.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub chat: ChatId,
    pub text: String,
}

#[derive(Debug)]
struct DeviceState {
    last_output: OutputState,
    reach: Reach,
    last_liveness: Option<OffsetDateTime>,
}

impl DeviceState {
    fn unknown() -> Self {
        Self { last_output: OutputState::Unknown, reach: Reach::Unknown, last_liveness: None }
    }
}

/// Résultat d'un scan du monitor de liveness.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Devices démotés pendant ce tick, avec l'âge du dernier ping.
    pub demoted: Vec<(String, time::Duration)>,
    /// Vrai si plus aucun device n'est joignable après le scan.
    pub all_down: bool,
    /// Alerte agrégée à remettre (vide si personne n'attendait).
    pub alert_deliveries: Vec<Delivery>,
}

/// L'état coeur du pont : un seul domaine d'exclusion mutuelle pour
/// devices + mesures + attentes, afin que résolution et enregistrement
/// d'une attente ne puissent pas s'entrelacer.
#[derive(Debug)]
pub struct CoreState {
    devices: HashMap<String, DeviceState>,
    measurements: HashMap<Variable, Option<f64>>,
    pending: PendingRequests,
}

impl CoreState {
    pub fn new<I, S>(device_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let devices = device_names
            .into_iter()
            .map(|name| (name.into(), DeviceState::unknown()))
            .collect();
        let measurements = Variable::ALL.iter().map(|v| (*v, None)).collect();
        Self { devices, measurements, pending: PendingRequests::new() }
    }

    /// Snapshot d'un device ; un nom inconnu donne un snapshot "unknown",
    /// jamais d'erreur.
    pub fn device_snapshot(&self, name: &str) -> DeviceSnapshot {
        match self.devices.get(name) {
            Some(dev) => DeviceSnapshot {
                name: name.to_string(),
                last_output: dev.last_output,
                reach: dev.reach,
                last_liveness: dev.last_liveness,
            },
            None => DeviceSnapshot::unknown(name),
        }
    }

    pub fn last_measurement(&self, variable: Variable) -> Option<f64> {
        self.measurements.get(&variable).copied().flatten()
    }

    /// Rapport d'état autoritaire d'un device. Satisfait les attentes sur
    /// sa sortie dans la même section critique.
    pub fn set_output_state(&mut self, name: &str, on: bool) -> Vec<Delivery> {
        let Some(dev) = self.devices.get_mut(name) else {
            eprintln!("[registry] state report pour device inconnu {name}, ignoré");
            return Vec::new();
        };
        dev.last_output = if on { OutputState::On } else { OutputState::Off };

        let kind = RequestKind::OutputState(name.to_string());
        let text = format!("💡 {name}: {}", if on { "ON" } else { "OFF" });
        self.resolve_pending(&kind, &text)
    }

    /// Signal de liveness explicite. Positif : le device (re)devient
    /// joignable et son horodatage est rafraîchi. Négatif : injoignable
    /// immédiatement, indépendamment du timeout.
    pub fn set_liveness(&mut self, name: &str, alive: bool, now: OffsetDateTime) {
        let Some(dev) = self.devices.get_mut(name) else {
            eprintln!("[registry] ping pour device inconnu {name}, ignoré");
            return;
        };
        if alive {
            if dev.reach != Reach::Reachable {
                println!("[registry] {name} est joignable");
            }
            dev.reach = Reach::Reachable;
            dev.last_liveness = Some(now);
        } else {
            println!("[registry] {name} s'annonce injoignable");
            dev.reach = Reach::Unreachable;
        }
    }

    /// Enregistre une lecture de télémétrie et satisfait les attentes sur
    /// cette variable.
    pub fn set_measurement(&mut self, variable: Variable, value: f64) -> Vec<Delivery> {
        self.measurements.insert(variable, Some(value));
        let kind = RequestKind::Measurement(variable);
        let text = variable.format_reading(value);
        self.resolve_pending(&kind, &text)
    }

    pub fn begin_request(&mut self, chat: ChatId, kind: RequestKind) {
        self.pending.begin(chat, kind);
    }

    /// Lecture seule des conversations en attente (chemin d'alerte et tests).
    pub fn waiting_chats(&self) -> Vec<ChatId> {
        self.pending.waiting_chats()
    }

    fn resolve_pending(&mut self, kind: &RequestKind, text: &str) -> Vec<Delivery> {
        let chats = self.pending.resolve(kind);
        if chats.is_empty() {
            println!("[registry] réponse {kind} sans attente, écartée");
            return Vec::new();
        }
        chats.into_iter().map(|chat| Delivery { chat, text: text.to_string() }).collect()
    }

    /// Un scan du monitor : démotion des devices dont le ping a expiré,
    /// puis alerte agrégée sur un snapshot cohérent post-transitions.
    pub fn liveness_tick(&mut self, now: OffsetDateTime, threshold: time::Duration) -> TickReport {
        let mut report = TickReport::default();

        for (name, dev) in self.devices.iter_mut() {
            if dev.reach != Reach::Reachable {
                continue;
            }
            if let Some(last) = dev.last_liveness {
                let elapsed = now - last;
                if elapsed > threshold {
                    dev.reach = Reach::Unreachable;
                    report.demoted.push((name.clone(), elapsed));
                }
            }
        }

        // Unknown compte comme non-joignable pour l'alerte agrégée
        report.all_down =
            !self.devices.is_empty() && self.devices.values().all(|d| d.reach != Reach::Reachable);

        if report.all_down {
            report.alert_deliveries = self
                .pending
                .drain_all()
                .into_iter()
                .map(|chat| Delivery {
                    chat,
                    text: "⚠️ all devices disconnected, no controller is reachable".to_string(),
                })
                .collect();
        }

        report
    }
}
