use serde::Deserialize;

/// Server configuration, read from the environment (a `.env` file is honored
/// when present).
///
/// * `BIND_ADDR` — listen address, defaults to `127.0.0.1:8080`.
/// * `JWT_SECRET` — secret for verifying session tokens at the WebSocket
///   handshake; when unset, connections are admitted without a token.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    pub jwt_secret: Option<String>,
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_owned()
}

pub fn load() -> Result<Config, envy::Error> {
    dotenvy::dotenv().ok();
    envy::from_env::<Config>()
}
