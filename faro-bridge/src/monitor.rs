/**
 * MONITOR - Surveillance périodique de la liveness des devices
 *
 * RÔLE :
 * L'absence de ping ne peut pas se détecter en réagissant aux messages :
 * seul un scan périodique du registry repère les devices dont le dernier
 * signe de vie a dépassé le seuil.
 *
 * FONCTIONNEMENT :
 * - un tick = démotion des expirés puis, sur le snapshot post-transitions,
 *   alerte agrégée si plus aucun device n'est joignable
 * - la re-promotion ne passe jamais par ici (uniquement ping positif)
 * - travail par tick en O(nombre de devices), sans I/O sous verrou
 */

use crate::bridge::SharedBridge;
use std::time::Duration;
use tokio::task::JoinHandle;

impl crate::bridge::Bridge {
    /// Un scan complet ; exposé pour pouvoir le déclencher en test avec
    /// une horloge injectée.
    pub async fn liveness_tick(&self) {
        let report = {
            let mut state = self.state.lock();
            state.liveness_tick(self.clock.now(), self.cfg.threshold())
        };

        for (name, elapsed) in &report.demoted {
            println!(
                "[monitor] {name} démoté unreachable ({}s sans ping)",
                elapsed.whole_seconds()
            );
        }

        if report.all_down {
            if report.alert_deliveries.is_empty() {
                println!("[monitor] tous les devices sont déconnectés, aucune conversation à alerter");
            } else {
                println!(
                    "[monitor] tous les devices sont déconnectés, alerte vers {} conversation(s)",
                    report.alert_deliveries.len()
                );
            }
        }

        self.deliver_all(report.alert_deliveries).await;
    }
}

/// Lance la boucle périodique du monitor. Le handle retourné permet au
/// propriétaire d'arrêter la boucle à l'extinction.
pub fn spawn_liveness_monitor(bridge: SharedBridge) -> JoinHandle<()> {
    let period = Duration::from_secs(bridge.config().liveness.period_secs.max(1));
    println!(
        "[monitor] scan toutes les {}s, seuil {}s",
        period.as_secs(),
        bridge.config().liveness.threshold_secs
    );

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // Le premier tick d'un interval part immédiatement, on le saute
        interval.tick().await;
        loop {
            interval.tick().await;
            bridge.liveness_tick().await;
        }
    })
}
