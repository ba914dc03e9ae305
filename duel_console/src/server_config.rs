use serde::{Deserialize, Serialize};

use crate::network;


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    // The one knob the app has: where to listen.
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    // Where the built client assets (page, stylesheet, wasm pkg) live.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_listen_port() -> u16 { network::PORT }
fn default_static_dir() -> String { "duel_console/assets".to_owned() }

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_port: default_listen_port(),
            static_dir: default_static_dir(),
        }
    }
}
