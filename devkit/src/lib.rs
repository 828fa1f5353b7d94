/*!
# FARO DevKit - Stubs et Utilitaires pour Développement

Bibliothèque facilitant le développement et les tests du pont FARO avec:
- Stub du bus de commandes (sans broker MQTT)
- Mocks chat / horloge / audit pour les collaborateurs du coeur
- Builders de payloads conformes au contrat de bus
- Harness de test avec pont entièrement mocké
*/

pub mod bus_stub;
pub mod mocks;
pub mod test_utils;

pub use bus_stub::{EventBuilder, MockBus};
pub use mocks::{MockChat, MockClock, RecordingAudit};
pub use test_utils::TestHarness;
