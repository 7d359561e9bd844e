//! Adapters: concrete implementations of the hexagonal port traits, plus
//! the network edge.
//!
//! | Adapter      | Implements   | Connects to                   |
//! |--------------|--------------|-------------------------------|
//! | `i2c_bus`    | RegisterBus  | embedded-hal I2C controller   |
//! | `flow_timer` | FlowTimer    | esp_timer / host thread       |
//! | `log_sink`   | EventSink    | Serial log output             |
//! | `http`       |              | TCP clients of the dashboard  |
//! | `wifi`       |              | ESP-IDF WiFi in AP mode       |

pub mod flow_timer;
pub mod http;
pub mod i2c_bus;
pub mod log_sink;
pub mod wifi;
