/**
 * CLASSIFY - Décodage et routage des messages bus entrants
 *
 * RÔLE :
 * Transforme un message brut {topic, payload} en événement typé, une seule
 * fois à la frontière, puis le route vers le registry. Un payload illisible
 * est loggé et écarté, jamais propagé comme erreur fatale.
 *
 * FONCTIONNEMENT :
 * - Le device propriétaire est résolu depuis le topic (config)
 * - Actions connues : state, telemetry, ping ; tout le reste part en
 *   Generic vers le journal d'audit
 * - Chaque message, reconnu ou non, est aussi confié à l'audit
 */

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::models::{InboundEvent, Variable};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("topic inconnu: {0}")]
    UnknownTopic(String),
    #[error("payload JSON invalide: {0}")]
    Json(#[from] serde_json::Error),
    #[error("champ `action` manquant ou non-string")]
    MissingAction,
    #[error("payload `{action}` incomplet: champ {field} attendu")]
    BadPayload { action: String, field: &'static str },
}

/// Décode un message bus en événement typé. Pure, testable sans broker.
pub fn classify(cfg: &BridgeConfig, topic: &str, payload: &[u8]) -> Result<InboundEvent, DecodeError> {
    let device = cfg
        .device_for_event_topic(topic)
        .ok_or_else(|| DecodeError::UnknownTopic(topic.to_string()))?
        .to_string();

    let json: serde_json::Value = serde_json::from_slice(payload)?;
    let action = json
        .get("action")
        .and_then(|a| a.as_str())
        .ok_or(DecodeError::MissingAction)?;

    match action {
        "state" => {
            let on = json.get("on").and_then(|v| v.as_bool()).ok_or(DecodeError::BadPayload {
                action: "state".into(),
                field: "on",
            })?;
            Ok(InboundEvent::StateReport { device, on })
        }
        "telemetry" => {
            let variable = json
                .get("variable")
                .and_then(|v| v.as_str())
                .and_then(Variable::parse)
                .ok_or(DecodeError::BadPayload { action: "telemetry".into(), field: "variable" })?;
            let value = json.get("value").and_then(|v| v.as_f64()).ok_or(DecodeError::BadPayload {
                action: "telemetry".into(),
                field: "value",
            })?;
            Ok(InboundEvent::Telemetry { device, variable, value })
        }
        "ping" => {
            let alive = json.get("alive").and_then(|v| v.as_bool()).ok_or(DecodeError::BadPayload {
                action: "ping".into(),
                field: "alive",
            })?;
            Ok(InboundEvent::Liveness { device, alive })
        }
        other => Ok(InboundEvent::Generic { device, action: other.to_string() }),
    }
}

impl Bridge {
    /// Point d'entrée de la boucle bus : classifie puis applique un message.
    pub async fn handle_inbound(&self, topic: &str, payload: &[u8]) {
        // Tout message bus est journalisé, lisible ou non
        self.audit.record(topic, &String::from_utf8_lossy(payload));

        let event = match classify(&self.cfg, topic, payload) {
            Ok(event) => event,
            Err(e) => {
                eprintln!("[classify] message écarté ({topic}): {e}");
                return;
            }
        };

        let deliveries = {
            let mut state = self.state.lock();
            match event {
                InboundEvent::StateReport { device, on } => state.set_output_state(&device, on),
                InboundEvent::Telemetry { device, variable, value } => {
                    if device == self.cfg.sensor_device {
                        state.set_measurement(variable, value)
                    } else {
                        // La télémétrie ne fait foi que depuis le device capteur
                        println!("[classify] télémétrie {variable} depuis {device} ignorée (capteur: {})",
                                 self.cfg.sensor_device);
                        Vec::new()
                    }
                }
                InboundEvent::Liveness { device, alive } => {
                    state.set_liveness(&device, alive, self.clock.now());
                    Vec::new()
                }
                InboundEvent::Generic { device, action } => {
                    println!("[classify] action `{action}` de {device} journalisée, sans effet");
                    Vec::new()
                }
            }
        };

        self.deliver_all(deliveries).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BridgeConfig {
        BridgeConfig::default()
    }

    #[test]
    fn classify_state_report() {
        let event = classify(&cfg(), "faro/devices/nairo/event@v1", br#"{"action":"state","on":true}"#);
        assert_eq!(event.unwrap(), InboundEvent::StateReport { device: "nairo".into(), on: true });
    }

    #[test]
    fn classify_telemetry() {
        let event = classify(
            &cfg(),
            "faro/devices/nairo/event@v1",
            br#"{"action":"telemetry","variable":"humidity","value":48.5}"#,
        );
        assert_eq!(
            event.unwrap(),
            InboundEvent::Telemetry { device: "nairo".into(), variable: Variable::Humidity, value: 48.5 }
        );
    }

    #[test]
    fn classify_ping_polarity() {
        let event = classify(&cfg(), "faro/devices/alejandro/event@v1", br#"{"action":"ping","alive":false}"#);
        assert_eq!(event.unwrap(), InboundEvent::Liveness { device: "alejandro".into(), alive: false });
    }

    #[test]
    fn unknown_action_is_generic() {
        let event = classify(&cfg(), "faro/devices/nairo/event@v1", br#"{"action":"boot","fw":"1.2"}"#);
        assert_eq!(event.unwrap(), InboundEvent::Generic { device: "nairo".into(), action: "boot".into() });
    }

    #[test]
    fn malformed_payloads_are_errors() {
        let cfg = cfg();
        let topic = "faro/devices/nairo/event@v1";
        assert!(matches!(classify(&cfg, topic, b"not json"), Err(DecodeError::Json(_))));
        assert!(matches!(classify(&cfg, topic, br#"{"on":true}"#), Err(DecodeError::MissingAction)));
        assert!(matches!(
            classify(&cfg, topic, br#"{"action":"state"}"#),
            Err(DecodeError::BadPayload { .. })
        ));
        assert!(matches!(
            classify(&cfg, "faro/other", br#"{"action":"ping","alive":true}"#),
            Err(DecodeError::UnknownTopic(_))
        ));
    }
}
