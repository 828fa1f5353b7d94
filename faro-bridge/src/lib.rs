/*!
# faro-bridge

Coeur du pont FARO entre le bus MQTT des contrôleurs de terrain et un
front-end chat : corrélation des requêtes chat avec les réponses device
asynchrones, suivi de connectivité par device, encodage des commandes
sortantes.

Le transport chat réel, le broker et le stockage relationnel restent des
collaborateurs externes derrière les traits de [`ports`].
*/

pub mod audit;
pub mod bridge;
pub mod classify;
pub mod commands;
pub mod config;
pub mod console;
pub mod models;
pub mod monitor;
pub mod mqtt;
pub mod pending;
pub mod ports;
pub mod registry;

pub use bridge::{Bridge, SharedBridge};
pub use config::BridgeConfig;
pub use models::{ChatId, OutputState, Reach, Variable};
pub use pending::RequestKind;
