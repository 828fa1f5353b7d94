/**
 * CONSOLE - Front-end chat de substitution sur stdin/stdout
 *
 * RÔLE :
 * Le transport chat réel (Telegram & co) n'appartient pas au coeur ; le
 * binaire embarque cette console minimale derrière le seam ChatSink pour
 * pouvoir exploiter le pont sans transport externe.
 */

use crate::bridge::SharedBridge;
use crate::models::{ChatId, Variable};
use crate::ports::ChatSink;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

/// Conversation unique de la console.
pub const CONSOLE_CHAT: ChatId = 0;

pub struct ConsoleChat;

#[async_trait]
impl ChatSink for ConsoleChat {
    async fn deliver(&self, chat: ChatId, text: &str) {
        println!("[chat:{chat}] {text}");
    }
}

fn print_menu() {
    println!("── menu ──────────────────────────────");
    println!(" 💡 led <device>   bascule une sortie");
    println!(" 🌡️ temp           lit la température");
    println!(" 💧 hum            lit l'humidité");
    println!(" 📡 status         rafraîchit l'état de tous les devices");
    println!(" ℹ️  info <device>  dernier snapshot connu");
    println!("──────────────────────────────────────");
}

/// Boucle de lecture des commandes console. Une ligne = une interaction.
pub fn spawn_console(bridge: SharedBridge) -> JoinHandle<()> {
    tokio::spawn(async move {
        print_menu();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break, // stdin fermé
                Err(e) => {
                    eprintln!("[console] lecture stdin échouée: {e}");
                    break;
                }
            };

            let mut parts = line.split_whitespace();
            match (parts.next(), parts.next()) {
                (Some("led"), Some(device)) => bridge.toggle_output(CONSOLE_CHAT, device).await,
                (Some("led"), None) => println!("[console] usage: led <device>"),
                (Some("temp"), _) => {
                    bridge.request_measurement(CONSOLE_CHAT, Variable::Temperature).await
                }
                (Some("hum"), _) => {
                    bridge.request_measurement(CONSOLE_CHAT, Variable::Humidity).await
                }
                (Some("status"), _) => bridge.request_device_status().await,
                (Some("info"), Some(device)) => {
                    let snap = bridge.device_snapshot(device);
                    match serde_json::to_string_pretty(&snap) {
                        Ok(json) => println!("{json}"),
                        Err(e) => eprintln!("[console] snapshot illisible: {e}"),
                    }
                }
                (Some("menu" | "help"), _) => print_menu(),
                (None, _) => {}
                (Some(other), _) => println!("[console] commande inconnue `{other}` (menu pour l'aide)"),
            }
        }
    })
}
