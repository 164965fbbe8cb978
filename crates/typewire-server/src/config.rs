use serde::Deserialize;

/// Server configuration, loaded from `typewire.toml` plus environment
/// overrides (source spec §10.2). Every field has a sane default so a
/// missing or partial config file degrades instead of failing to start.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub max_display_name_len: usize,
    pub countdown_secs: u64,
    pub expiration: ExpirationConfig,
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8090".to_string(),
            max_display_name_len: 16,
            countdown_secs: 5,
            expiration: ExpirationConfig::default(),
            limits: LimitsConfig::default(),
        }
    }
}

/// The "style-dependent function of declaredWordsCount" the source spec
/// leaves unspecified beyond "reproducible from style+count" (§4.5):
/// `base_secs + per_word_secs * declared_words_count`, with a style
/// multiplier applied on top (Hidden/Calculus take longer to type per item
/// than Regular).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ExpirationConfig {
    pub base_secs: f64,
    pub per_word_secs: f64,
    pub hidden_multiplier: f64,
    pub calculus_multiplier: f64,
}

impl Default for ExpirationConfig {
    fn default() -> Self {
        Self { base_secs: 10.0, per_word_secs: 3.0, hidden_multiplier: 1.3, calculus_multiplier: 1.15 }
    }
}

impl ExpirationConfig {
    pub fn duration_for(&self, style: typewire_core::game_descriptor::Style, declared_words_count: u32) -> std::time::Duration {
        use typewire_core::game_descriptor::Style;
        let raw = self.base_secs + self.per_word_secs * declared_words_count as f64;
        let scaled = match style {
            Style::Regular => raw,
            Style::Hidden => raw * self.hidden_multiplier,
            Style::Calculus => raw * self.calculus_multiplier,
        };
        std::time::Duration::from_secs_f64(scaled.max(1.0))
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    pub max_ws_per_ip: usize,
    pub outbound_queue_capacity: usize,
    /// Sustained connection attempts allowed per source IP per second; also
    /// doubles as the token bucket's burst capacity.
    pub ws_rate_limit_per_sec: f64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { max_ws_connections: 500, max_ws_per_ip: 20, outbound_queue_capacity: 64, ws_rate_limit_per_sec: 5.0 }
    }
}

impl ServerConfig {
    /// Reads `typewire.toml` from the current directory, falling back to
    /// defaults with a logged warning if it is absent or malformed, then
    /// applies environment-variable overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("typewire.toml") {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("loaded configuration from typewire.toml");
                    config
                },
                Err(err) => {
                    tracing::warn!(%err, "failed to parse typewire.toml, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("no typewire.toml found, using defaults");
                ServerConfig::default()
            },
        };

        if let Ok(addr) = std::env::var("TYPEWIRE_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Ok(v) = std::env::var("TYPEWIRE_MAX_DISPLAY_NAME_LEN")
            && let Ok(v) = v.parse()
        {
            config.max_display_name_len = v;
        }
        if let Ok(v) = std::env::var("TYPEWIRE_MAX_WS_CONNECTIONS")
            && let Ok(v) = v.parse()
        {
            config.limits.max_ws_connections = v;
        }

        config.validate();
        config
    }

    /// Exits the process on fatal misconfiguration, matching the teacher's
    /// `validate()` pattern — a server that can't bind or that has a
    /// nonsensical limit should fail fast at startup, not at the first
    /// request.
    pub fn validate(&self) {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            tracing::error!(listen_addr = %self.listen_addr, "invalid listen_addr");
            std::process::exit(1);
        }
        if self.max_display_name_len == 0 {
            tracing::error!("max_display_name_len must be nonzero");
            std::process::exit(1);
        }
        if self.limits.max_ws_connections == 0 {
            tracing::error!("limits.max_ws_connections must be nonzero");
            std::process::exit(1);
        }
        if self.countdown_secs == 0 {
            tracing::warn!("countdown_secs is zero; countdown broadcast and play will fire in the same tick");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate();
    }

    #[test]
    fn parses_minimal_toml() {
        let config: ServerConfig = toml::from_str(r#"listen_addr = "127.0.0.1:9000""#).unwrap();
        assert_eq!(config.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.max_display_name_len, 16);
    }

    #[test]
    fn parses_full_toml() {
        let toml_str = r#"
            listen_addr = "127.0.0.1:9000"
            max_display_name_len = 24
            countdown_secs = 3

            [expiration]
            base_secs = 5.0
            per_word_secs = 2.0
            hidden_multiplier = 1.5
            calculus_multiplier = 1.2

            [limits]
            max_ws_connections = 50
            max_ws_per_ip = 5
            outbound_queue_capacity = 32
        "#;
        let config: ServerConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.max_display_name_len, 24);
        assert_eq!(config.limits.max_ws_connections, 50);
    }

    #[test]
    fn expiration_scales_with_style_and_count() {
        let cfg = ExpirationConfig::default();
        let regular = cfg.duration_for(typewire_core::game_descriptor::Style::Regular, 5);
        let hidden = cfg.duration_for(typewire_core::game_descriptor::Style::Hidden, 5);
        assert!(hidden > regular);
    }
}
