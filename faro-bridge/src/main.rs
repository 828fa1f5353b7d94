/**
 * FARO BRIDGE - Point d'entrée du pont bus ↔ chat
 *
 * RÔLE : Bootstrap complet : config, client MQTT, contexte Bridge, puis les
 * trois boucles concurrentes (bus entrant, monitor liveness, console chat).
 *
 * ARCHITECTURE : Event-driven via MQTT + état partagé sous un seul mutex +
 * monitor périodique. Aucune défaillance du coeur n'arrête le process.
 */

use faro_bridge::audit::FileAudit;
use faro_bridge::bridge::Bridge;
use faro_bridge::config::load_config;
use faro_bridge::console::{spawn_console, ConsoleChat};
use faro_bridge::monitor::spawn_liveness_monitor;
use faro_bridge::mqtt::{create_mqtt_client, spawn_bus_listener, MqttBus};
use faro_bridge::ports::{AuditLog, NullAudit, SystemClock};
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Charger les variables d'environnement depuis .env (si présent)
    dotenvy::dotenv().ok();

    let cfg = load_config().await;
    println!(
        "[bridge] {} devices suivis, capteur: {}",
        cfg.devices.len(),
        cfg.sensor_device
    );

    let audit: Arc<dyn AuditLog> = match FileAudit::open(&cfg.audit_log) {
        Ok(audit) => Arc::new(audit),
        Err(e) => {
            eprintln!("[bridge] audit {} inutilisable ({e}), journal désactivé", cfg.audit_log);
            Arc::new(NullAudit)
        }
    };

    let (client, eventloop) = create_mqtt_client(&cfg);

    let bridge = Arc::new(Bridge::new(
        cfg,
        Arc::new(MqttBus::new(client.clone())),
        Arc::new(ConsoleChat),
        audit,
        Arc::new(SystemClock),
    ));

    // Bus entrant + monitor tournent en tâches de fond
    spawn_bus_listener(bridge.clone(), client, eventloop);
    let monitor = spawn_liveness_monitor(bridge.clone());

    println!("[bridge] prêt, en attente de commandes console");

    // La console tient le process ; stdin fermé = extinction propre
    if let Err(e) = spawn_console(bridge).await {
        eprintln!("[bridge] console terminée anormalement: {e}");
    }
    monitor.abort();
    println!("[bridge] extinction");
}
