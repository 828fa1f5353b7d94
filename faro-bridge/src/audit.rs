use crate::models::rfc3339;
use crate::ports::AuditLog;
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use time::OffsetDateTime;

/// Journal d'audit local : une ligne JSON par message bus, en append.
/// Best-effort : un échec d'écriture est loggé et le pont continue.
pub struct FileAudit {
    file: Mutex<File>,
}

impl FileAudit {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        eprintln!("[audit] journal ouvert: {:?}", path.as_ref());
        Ok(Self { file: Mutex::new(file) })
    }
}

impl AuditLog for FileAudit {
    fn record(&self, topic: &str, raw: &str) {
        // Payload gardé en JSON natif quand il est lisible, en string sinon
        let payload = serde_json::from_str::<serde_json::Value>(raw)
            .unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
        let line = serde_json::json!({
            "ts": rfc3339(OffsetDateTime::now_utc()),
            "topic": topic,
            "payload": payload,
        });

        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{line}") {
            eprintln!("[audit] écriture échouée: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_are_appended_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.jsonl");
        let audit = FileAudit::open(&path).unwrap();

        audit.record("faro/devices/nairo/event@v1", r#"{"action":"ping","alive":true}"#);
        audit.record("faro/devices/nairo/event@v1", "not json at all");

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["topic"], "faro/devices/nairo/event@v1");
        assert_eq!(first["payload"]["action"], "ping");

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["payload"], "not json at all");
    }
}
