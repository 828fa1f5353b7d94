/**
 * FARO DEVICE SIM - Simulateur d'un contrôleur de terrain
 *
 * RÔLE :
 * Joue le rôle d'un device réel sur le bus : pings de liveness périodiques,
 * réponses aux requêtes status/read, exécution des commandes set. Permet de
 * faire tourner le pont en bout-en-bout contre un vrai broker.
 *
 * COMMUNICATION MQTT :
 * Écoute: faro/devices/{id}/command@v1
 * Publie: faro/devices/{id}/event@v1
 */

use rand::Rng;
use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use tokio::time::{sleep, Duration};

#[derive(Serialize, Debug)]
#[serde(tag = "action")]
enum DeviceEvent {
    #[serde(rename = "state")]
    State { on: bool, ts: String },
    #[serde(rename = "telemetry")]
    Telemetry { variable: &'static str, value: f64, ts: String },
    #[serde(rename = "ping")]
    Ping { alive: bool, ts: String },
}

/// État simulé du contrôleur.
struct SimState {
    led: bool,
    temperature: f64,
    humidity: f64,
}

fn now_rfc3339() -> String {
    humantime::format_rfc3339(SystemTime::now()).to_string()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

async fn publish_event(client: &AsyncClient, topic: &str, event: &DeviceEvent) {
    match serde_json::to_vec(event) {
        Ok(payload) => {
            if let Err(e) = client.publish(topic, QoS::AtLeastOnce, false, payload).await {
                eprintln!("[sim] publish {topic} échoué: {e:?}");
            }
        }
        Err(e) => eprintln!("[sim] event non sérialisable: {e}"),
    }
}

/// Répond à une commande du pont. Format inconnu = ignoré avec log,
/// comme un firmware tolérant.
async fn handle_command(
    client: &AsyncClient,
    event_topic: &str,
    state: &Arc<Mutex<SimState>>,
    is_sensor: bool,
    payload: &[u8],
) {
    let json: serde_json::Value = match serde_json::from_slice(payload) {
        Ok(json) => json,
        Err(e) => {
            eprintln!("[sim] commande illisible: {e}");
            return;
        }
    };
    let action = json.get("action").and_then(|a| a.as_str()).unwrap_or("");

    match action {
        "status" => {
            let (led, temperature, humidity) = {
                let st = state.lock().unwrap();
                (st.led, st.temperature, st.humidity)
            };
            publish_event(client, event_topic, &DeviceEvent::State { on: led, ts: now_rfc3339() }).await;
            if is_sensor {
                publish_event(
                    client,
                    event_topic,
                    &DeviceEvent::Telemetry { variable: "temperature", value: temperature, ts: now_rfc3339() },
                )
                .await;
                publish_event(
                    client,
                    event_topic,
                    &DeviceEvent::Telemetry { variable: "humidity", value: humidity, ts: now_rfc3339() },
                )
                .await;
            }
        }
        "set" => {
            let on = json.get("on").and_then(|v| v.as_bool()).unwrap_or(false);
            state.lock().unwrap().led = on;
            println!("[sim] sortie basculée: {}", if on { "ON" } else { "OFF" });
            // Rapport d'état authentique, comme un firmware réel
            publish_event(client, event_topic, &DeviceEvent::State { on, ts: now_rfc3339() }).await;
        }
        "read" => {
            let variable = json.get("variable").and_then(|v| v.as_str()).unwrap_or("");
            let value = {
                let st = state.lock().unwrap();
                match variable {
                    "temperature" => Some(("temperature", st.temperature)),
                    "humidity" => Some(("humidity", st.humidity)),
                    _ => None,
                }
            };
            match value {
                Some((variable, value)) => {
                    publish_event(
                        client,
                        event_topic,
                        &DeviceEvent::Telemetry { variable, value, ts: now_rfc3339() },
                    )
                    .await;
                }
                None => eprintln!("[sim] variable inconnue demandée: {variable}"),
            }
        }
        other => eprintln!("[sim] action inconnue `{other}`, ignorée"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Identité du device simulé
    let device_id = env_or(
        "FARO_SIM_DEVICE",
        &gethostname::gethostname().to_string_lossy(),
    );
    let base_topic = env_or("FARO_SIM_TOPIC", &format!("faro/devices/{device_id}"));
    let event_topic = format!("{base_topic}/event@v1");
    let command_topic = format!("{base_topic}/command@v1");
    let broker = env_or("FARO_SIM_BROKER", "localhost");
    let port: u16 = env_or("FARO_SIM_PORT", "1883").parse().unwrap_or(1883);
    let ping_secs: u64 = env_or("FARO_SIM_PING_SECS", "2").parse().unwrap_or(2);
    let is_sensor = env_or("FARO_SIM_SENSOR", "1") == "1";

    println!("[sim] device `{device_id}` sur {broker}:{port} (ping {ping_secs}s, capteur: {is_sensor})");

    let state = Arc::new(Mutex::new(SimState { led: false, temperature: 21.0, humidity: 50.0 }));

    let mut opts = MqttOptions::new(format!("faro-device-sim-{device_id}"), broker, port);
    opts.set_keep_alive(Duration::from_secs(30));
    let (client, mut eventloop) = AsyncClient::new(opts, 10);

    // Boucle d'événements MQTT (réception des commandes). L'abonnement est
    // (ré)émis à chaque ConnAck pour survivre aux reconnexions broker.
    let client_for_loop = client.clone();
    let state_for_loop = state.clone();
    let event_topic_for_loop = event_topic.clone();
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    if let Err(e) =
                        client_for_loop.subscribe(command_topic.clone(), QoS::AtLeastOnce).await
                    {
                        eprintln!("[sim] subscribe {command_topic} échoué: {e:?}");
                    }
                }
                Ok(Event::Incoming(Incoming::Publish(p))) => {
                    handle_command(
                        &client_for_loop,
                        &event_topic_for_loop,
                        &state_for_loop,
                        is_sensor,
                        &p.payload,
                    )
                    .await;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("[sim] MQTT loop erreur: {e:?}");
                    sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });

    // Boucle de liveness : dérive des mesures + ping périodique
    loop {
        {
            let mut st = state.lock().unwrap();
            let mut rng = rand::thread_rng();
            st.temperature = (st.temperature + rng.gen_range(-0.3..0.3)).clamp(15.0, 30.0);
            st.humidity = (st.humidity + rng.gen_range(-1.0..1.0)).clamp(35.0, 75.0);
        }

        publish_event(&client, &event_topic, &DeviceEvent::Ping { alive: true, ts: now_rfc3339() }).await;
        sleep(Duration::from_secs(ping_secs)).await;
    }
}
