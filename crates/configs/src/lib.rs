use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Table storage settings.
///
/// `connection_string` uses `key=value;` pairs, e.g. `UseDevelopmentStorage=true`
/// or `DataDirectory=data/tables;MaxSegmentSize=1000`.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub connection_string: String,
    #[serde(default = "default_table_name")]
    pub table_name: String,
    #[serde(default)]
    pub seed_on_startup: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { connection_string: String::new(), table_name: default_table_name(), seed_on_startup: false }
    }
}

fn default_table_name() -> String {
    "Restaurants".to_string()
}

pub fn config_path() -> String {
    std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string())
}

pub fn load_default() -> Result<AppConfig> {
    load_from_file(&config_path())
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Reads the config file when it exists, otherwise builds the config from the environment.
    pub fn load() -> Result<Self> {
        if std::path::Path::new(&config_path()).exists() {
            Self::load_and_validate()
        } else {
            Self::from_env()
        }
    }

    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Config used when no file is present: defaults plus environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut cfg = AppConfig::default();
        if let Ok(host) = std::env::var("SERVER_HOST") {
            cfg.server.host = host;
        }
        if let Some(port) = std::env::var("SERVER_PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            cfg.server.port = port;
        }
        cfg.server.worker_threads = std::env::var("TOKIO_WORKER_THREADS").ok().and_then(|v| v.parse::<usize>().ok());
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        // 若 TOML 中未提供连接串，则尝试从环境变量填充
        self.storage.normalize_from_env();
        self.storage.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl StorageConfig {
    pub fn normalize_from_env(&mut self) {
        if self.connection_string.trim().is_empty() {
            if let Ok(cs) = std::env::var("STORAGE_CONNECTION_STRING") {
                self.connection_string = cs;
            }
        }
        self.table_name = self.table_name.trim().to_string();
    }

    pub fn validate(&self) -> Result<()> {
        if self.connection_string.trim().is_empty() {
            return Err(anyhow!(
                "storage.connection_string is empty; set it in config.toml or STORAGE_CONNECTION_STRING"
            ));
        }
        if self.table_name.is_empty() {
            return Err(anyhow!("storage.table_name must not be empty"));
        }
        if !self.table_name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(anyhow!("storage.table_name must be alphanumeric: {}", self.table_name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let cfg = parse(
            r#"
            [server]
            host = "0.0.0.0"
            port = 9000

            [storage]
            connection_string = "UseDevelopmentStorage=true"
            table_name = "Tacos"
            seed_on_startup = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, None);
        assert_eq!(cfg.storage.table_name, "Tacos");
        assert!(cfg.storage.seed_on_startup);
    }

    #[test]
    fn storage_defaults_apply() {
        let cfg = parse("[storage]\nconnection_string = \"UseDevelopmentStorage=true\"\n").unwrap();
        assert_eq!(cfg.storage.table_name, "Restaurants");
        assert!(!cfg.storage.seed_on_startup);
        assert_eq!(cfg.server.host, "127.0.0.1");
    }

    #[test]
    fn rejects_bad_table_name() {
        let storage = StorageConfig {
            connection_string: "UseDevelopmentStorage=true".into(),
            table_name: "rest-aurants".into(),
            seed_on_startup: false,
        };
        assert!(storage.validate().is_err());
    }

    #[test]
    fn normalize_fills_worker_threads() {
        let mut server = ServerConfig { host: " ".into(), port: 8081, worker_threads: Some(0) };
        server.normalize().unwrap();
        assert_eq!(server.host, "127.0.0.1");
        assert_eq!(server.worker_threads, Some(4));
    }

    #[test]
    fn zero_port_is_rejected() {
        let mut server = ServerConfig { host: "127.0.0.1".into(), port: 0, worker_threads: None };
        assert!(server.normalize().is_err());
    }
}
