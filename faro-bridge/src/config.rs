use serde::{Deserialize, Serialize};
use std::{collections::HashMap, path::Path};
use tokio::fs;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BridgeConfig {
    pub devices: HashMap<String, DeviceConf>,
    /// Device dont la télémétrie température/humidité fait foi.
    pub sensor_device: String,
    pub mqtt: Option<MqttConf>,
    #[serde(default)]
    pub liveness: LivenessConf,
    #[serde(default = "default_audit_log")]
    pub audit_log: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeviceConf {
    /// Topic de base du device, ex: "faro/devices/nairo"
    pub topic: String,
}

impl DeviceConf {
    /// Topic montant (device → pont).
    pub fn event_topic(&self) -> String {
        format!("{}/event@v1", self.topic)
    }

    /// Topic descendant (pont → device).
    pub fn command_topic(&self) -> String {
        format!("{}/command@v1", self.topic)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MqttConf {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LivenessConf {
    /// Âge max d'un ping avant démotion en unreachable (secondes).
    pub threshold_secs: u64,
    /// Période du scan du monitor (secondes).
    pub period_secs: u64,
}

impl Default for LivenessConf {
    fn default() -> Self {
        Self { threshold_secs: 3, period_secs: 10 }
    }
}

fn default_audit_log() -> String {
    "./faro-audit.jsonl".into()
}

impl Default for BridgeConfig {
    fn default() -> Self {
        let mut devices = HashMap::new();
        devices.insert("nairo".to_string(), DeviceConf { topic: "faro/devices/nairo".into() });
        devices.insert("alejandro".to_string(), DeviceConf { topic: "faro/devices/alejandro".into() });
        Self {
            devices,
            sensor_device: "nairo".into(),
            mqtt: Some(MqttConf { host: "localhost".into(), port: 1883 }),
            liveness: LivenessConf::default(),
            audit_log: default_audit_log(),
        }
    }
}

impl BridgeConfig {
    /// Retrouve le device propriétaire d'un topic d'événement.
    pub fn device_for_event_topic(&self, topic: &str) -> Option<&str> {
        self.devices
            .iter()
            .find(|(_, conf)| conf.event_topic() == topic)
            .map(|(name, _)| name.as_str())
    }

    pub fn threshold(&self) -> time::Duration {
        time::Duration::seconds(self.liveness.threshold_secs as i64)
    }
}

pub async fn load_config() -> BridgeConfig {
    let path = std::env::var("FARO_BRIDGE_CONFIG").unwrap_or_else(|_| "faro.yaml".into());
    load_config_from(&path).await
}

/// Charge une config depuis un chemin. Tout problème (fichier absent,
/// illisible, YAML invalide) est loggé et donne la config par défaut.
pub async fn load_config_from(path: &str) -> BridgeConfig {
    if !Path::new(path).exists() {
        eprintln!("[bridge] pas de {path}, usage config par défaut");
        return BridgeConfig::default();
    }
    let txt = match fs::read_to_string(path).await {
        Ok(txt) => txt,
        Err(e) => {
            eprintln!("[bridge] lecture {path} échouée: {e}");
            return BridgeConfig::default();
        }
    };
    if txt.trim().is_empty() {
        return BridgeConfig::default();
    }
    serde_yaml::from_str(&txt).unwrap_or_else(|e| {
        eprintln!("[bridge] config invalide: {e}");
        BridgeConfig::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_tracks_two_devices() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.devices.len(), 2);
        assert!(cfg.devices.contains_key(&cfg.sensor_device));
        assert_eq!(cfg.liveness.threshold_secs, 3);
        assert_eq!(cfg.liveness.period_secs, 10);
    }

    #[test]
    fn topics_are_versioned() {
        let conf = DeviceConf { topic: "faro/devices/nairo".into() };
        assert_eq!(conf.event_topic(), "faro/devices/nairo/event@v1");
        assert_eq!(conf.command_topic(), "faro/devices/nairo/command@v1");
    }

    #[test]
    fn event_topic_lookup() {
        let cfg = BridgeConfig::default();
        assert_eq!(cfg.device_for_event_topic("faro/devices/nairo/event@v1"), Some("nairo"));
        assert_eq!(cfg.device_for_event_topic("faro/devices/ghost/event@v1"), None);
    }

    #[test]
    fn yaml_roundtrip_with_defaults() {
        let yaml = r#"
devices:
  nairo: { topic: "faro/devices/nairo" }
sensor_device: nairo
mqtt: { host: "10.0.0.2", port: 1884 }
"#;
        let cfg: BridgeConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.mqtt.as_ref().unwrap().port, 1884);
        // Sections absentes -> valeurs par défaut
        assert_eq!(cfg.liveness.threshold_secs, 3);
        assert_eq!(cfg.audit_log, "./faro-audit.jsonl");
    }

    #[tokio::test]
    async fn unreadable_config_falls_back_to_default() {
        // Un répertoire existe mais n'est pas lisible comme fichier :
        // le chemin d'erreur de lecture doit donner la config par défaut
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(dir.path().to_str().unwrap()).await;
        assert_eq!(cfg.devices.len(), 2);
        assert_eq!(cfg.sensor_device, "nairo");
    }
}
