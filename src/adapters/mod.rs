//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter       | Implements            | Connects to                  |
//! |---------------|-----------------------|------------------------------|
//! | `hardware`    | SwitchOutputPort      | Relay GPIOs                  |
//! |               | IndicatorPort         | Status LED GPIO              |
//! |               | ResetInputPort        | Reset button GPIO            |
//! |               | RfReceiverPort        | `rf_receiver` mailbox        |
//! |               | SystemPort            | esp_restart / esp_random     |
//! | `log_sink`    | EventSink             | Serial log output            |
//! | `mqtt`        | BrokerPort            | ESP-IDF MQTT client          |
//! | `nvs`         | StoragePort           | NVS / in-memory store        |
//! | `rf_receiver` | RfReceiverPort        | OOK decoder hand-off         |
//! | `time`        | -                     | ESP32 system timer           |
//! | `wifi`        | NetworkPort           | ESP-IDF WiFi STA             |

pub mod hardware;
pub mod log_sink;
pub mod mqtt;
pub mod nvs;
pub mod rf_receiver;
pub mod time;
pub(super) mod utils;
pub mod wifi;
