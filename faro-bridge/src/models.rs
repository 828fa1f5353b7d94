use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Identifiant d'une conversation chat (format numérique côté front-end).
pub type ChatId = i64;

/// État de la sortie commandée d'un device (relais/LED).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputState {
    On,
    Off,
    Unknown,
}

/// Connectivité inférée d'un device, indépendante de sa sortie.
/// `Unreachable` n'arrive que par timeout du monitor ou ping négatif explicite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reach {
    Unknown,
    Reachable,
    Unreachable,
}

/// Variables de télémétrie suivies par le pont.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variable {
    Temperature,
    Humidity,
}

impl Variable {
    pub const ALL: [Variable; 2] = [Variable::Temperature, Variable::Humidity];

    pub fn name(&self) -> &'static str {
        match self {
            Variable::Temperature => "temperature",
            Variable::Humidity => "humidity",
        }
    }

    pub fn parse(s: &str) -> Option<Variable> {
        match s {
            "temperature" => Some(Variable::Temperature),
            "humidity" => Some(Variable::Humidity),
            _ => None,
        }
    }

    /// Texte chat pour une lecture de cette variable.
    pub fn format_reading(&self, value: f64) -> String {
        match self {
            Variable::Temperature => format!("🌡️ temperature: {value:.1} °C"),
            Variable::Humidity => format!("💧 humidity: {value:.1} %"),
        }
    }
}

impl std::fmt::Display for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Vue figée d'un device, retournée par le registry (jamais d'erreur,
/// un nom inconnu donne un snapshot "unknown").
#[derive(Debug, Clone, Serialize)]
pub struct DeviceSnapshot {
    pub name: String,
    pub last_output: OutputState,
    pub reach: Reach,
    #[serde(serialize_with = "ser_opt_rfc3339")]
    pub last_liveness: Option<OffsetDateTime>,
}

fn ser_opt_rfc3339<S: serde::Serializer>(
    ts: &Option<OffsetDateTime>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match ts {
        Some(ts) => serializer.serialize_some(&rfc3339(*ts)),
        None => serializer.serialize_none(),
    }
}

impl DeviceSnapshot {
    pub fn unknown(name: &str) -> Self {
        Self {
            name: name.to_string(),
            last_output: OutputState::Unknown,
            reach: Reach::Unknown,
            last_liveness: None,
        }
    }
}

/// Événement bus entrant, décodé une seule fois à la frontière (classify).
/// Le device propriétaire est résolu depuis le topic.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    StateReport { device: String, on: bool },
    Telemetry { device: String, variable: Variable, value: f64 },
    Liveness { device: String, alive: bool },
    Generic { device: String, action: String },
}

/// Commandes publiées vers les devices (pont → contrôleur).
/// Le command_id sert au traçage dans le journal d'audit, pas à la
/// corrélation : les réponses restent en broadcast premier-arrivé.
#[derive(Debug, Serialize)]
#[serde(tag = "action")]
pub enum DeviceCommand {
    #[serde(rename = "status")]
    Status { command_id: String, timestamp: String },
    #[serde(rename = "set")]
    Set { command_id: String, on: bool, timestamp: String },
    #[serde(rename = "read")]
    Read { command_id: String, variable: Variable, timestamp: String },
}

impl DeviceCommand {
    pub fn status(now: OffsetDateTime) -> Self {
        DeviceCommand::Status {
            command_id: uuid::Uuid::new_v4().to_string(),
            timestamp: rfc3339(now),
        }
    }

    pub fn set(on: bool, now: OffsetDateTime) -> Self {
        DeviceCommand::Set {
            command_id: uuid::Uuid::new_v4().to_string(),
            on,
            timestamp: rfc3339(now),
        }
    }

    pub fn read(variable: Variable, now: OffsetDateTime) -> Self {
        DeviceCommand::Read {
            command_id: uuid::Uuid::new_v4().to_string(),
            variable,
            timestamp: rfc3339(now),
        }
    }
}

/// Formatage RFC3339 best-effort (un timestamp illisible ne doit jamais
/// faire échouer une commande).
pub fn rfc3339(ts: OffsetDateTime) -> String {
    ts.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| ts.unix_timestamp().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variable_roundtrip() {
        assert_eq!(Variable::parse("temperature"), Some(Variable::Temperature));
        assert_eq!(Variable::parse("humidity"), Some(Variable::Humidity));
        assert_eq!(Variable::parse("pressure"), None);
    }

    #[test]
    fn readings_carry_units() {
        assert_eq!(Variable::Temperature.format_reading(21.57), "🌡️ temperature: 21.6 °C");
        assert_eq!(Variable::Humidity.format_reading(48.0), "💧 humidity: 48.0 %");
    }

    #[test]
    fn commands_serialize_with_action_tag() {
        let cmd = DeviceCommand::set(true, OffsetDateTime::UNIX_EPOCH);
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["action"], "set");
        assert_eq!(json["on"], true);
        assert_eq!(json["timestamp"], "1970-01-01T00:00:00Z");
    }
}
