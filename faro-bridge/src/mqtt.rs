use crate::bridge::SharedBridge;
use crate::config::BridgeConfig;
use crate::ports::CommandBus;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, MqttOptions, QoS};
use std::time::Duration;
use tokio::task::JoinHandle;

pub fn create_mqtt_client(cfg: &BridgeConfig) -> (AsyncClient, EventLoop) {
    let mqtt = cfg.mqtt.clone().unwrap_or(crate::config::MqttConf {
        host: "localhost".into(),
        port: 1883,
    });
    let mut opts = MqttOptions::new("faro-bridge", &mqtt.host, mqtt.port);
    opts.set_keep_alive(Duration::from_secs(15));
    AsyncClient::new(opts, 10)
}

/// Implémentation bus de production par-dessus rumqttc.
pub struct MqttBus {
    client: AsyncClient,
}

impl MqttBus {
    pub fn new(client: AsyncClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CommandBus for MqttBus {
    async fn publish(&self, topic: &str, payload: String) -> anyhow::Result<()> {
        self.client.publish(topic, QoS::AtLeastOnce, false, payload).await?;
        Ok(())
    }
}

/// Topics d'événements à suivre, un par device configuré.
pub fn subscription_topics(cfg: &BridgeConfig) -> Vec<String> {
    cfg.devices.values().map(|conf| conf.event_topic()).collect()
}

async fn subscribe_all(cfg: &BridgeConfig, client: &AsyncClient) {
    for topic in subscription_topics(cfg) {
        if let Err(e) = client.subscribe(topic.clone(), QoS::AtLeastOnce).await {
            eprintln!("[mqtt] subscribe {topic} échoué: {e:?}");
        } else {
            println!("[mqtt] abonné à {topic}");
        }
    }
}

/// Boucle d'événements bus entrants : routage de chaque publish vers le
/// classifier. Les abonnements sont (ré)émis à chaque ConnAck, sinon une
/// reconnexion en session propre laisserait le pont sourd. Les erreurs de
/// connexion sont loggées et la boucle repart après une pause.
pub fn spawn_bus_listener(
    bridge: SharedBridge,
    client: AsyncClient,
    mut eventloop: EventLoop,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    subscribe_all(bridge.config(), &client).await;
                }
                Ok(Event::Incoming(Incoming::Publish(p))) => {
                    bridge.handle_inbound(&p.topic, &p.payload).await;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("[mqtt] erreur bus: {e:?}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_configured_device_gets_a_subscription() {
        let cfg = BridgeConfig::default();
        let mut topics = subscription_topics(&cfg);
        topics.sort();
        assert_eq!(
            topics,
            vec![
                "faro/devices/alejandro/event@v1".to_string(),
                "faro/devices/nairo/event@v1".to_string(),
            ]
        );
    }
}
