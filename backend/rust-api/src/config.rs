use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_name: String,
    pub lms_db_url: String,
    pub table_prefix: String,
    pub db_max_connections: u32,
    pub cache_capacity: u64,
    /// Serve a fallback payload instead of an error when a question cannot be read.
    pub degrade_on_error: bool,
    pub bind_addr: String,
    pub cors_origins: Vec<String>,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "Exam Delivery Service".to_string(),
            lms_db_url: "mysql://moodle:moodle@db/moodle".to_string(),
            table_prefix: "mdl_".to_string(),
            db_max_connections: 10,
            cache_capacity: 10_000,
            degrade_on_error: true,
            bind_addr: "0.0.0.0:8000".to_string(),
            cors_origins: vec!["http://localhost:8080".to_string()],
            static_dir: "static".to_string(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let defaults = Config::default();

        let app_name = settings
            .get_string("app.name")
            .or_else(|_| env::var("APP_NAME"))
            .unwrap_or(defaults.app_name);

        let lms_db_url = settings
            .get_string("database.url")
            .or_else(|_| env::var("LMS_DB_URL"))
            .unwrap_or_else(|_| {
                if env == "prod" {
                    eprintln!("WARNING: LMS_DB_URL not set, using the bundled Moodle default");
                }
                defaults.lms_db_url
            });

        let table_prefix = settings
            .get_string("database.table_prefix")
            .or_else(|_| env::var("LMS_TABLE_PREFIX"))
            .unwrap_or(defaults.table_prefix);

        let db_max_connections = match settings.get_int("database.max_connections") {
            Ok(value) => u32::try_from(value).map_err(|_| {
                config::ConfigError::Message(format!(
                    "database.max_connections out of range: {}",
                    value
                ))
            })?,
            Err(_) => parse_env("LMS_DB_MAX_CONNECTIONS")?.unwrap_or(defaults.db_max_connections),
        };

        let cache_capacity = match settings.get_int("cache.capacity") {
            Ok(value) => u64::try_from(value).map_err(|_| {
                config::ConfigError::Message(format!("cache.capacity out of range: {}", value))
            })?,
            Err(_) => parse_env("QUESTION_CACHE_CAPACITY")?.unwrap_or(defaults.cache_capacity),
        };

        let degrade_on_error = match settings.get_bool("exam.degrade_on_error") {
            Ok(value) => value,
            Err(_) => parse_env("DEGRADE_ON_ERROR")?.unwrap_or(defaults.degrade_on_error),
        };

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or(defaults.bind_addr);

        let cors_origins = settings
            .get_string("server.cors_origins")
            .or_else(|_| env::var("CORS_ORIGINS"))
            .map(|raw| split_list(&raw))
            .unwrap_or(defaults.cors_origins);

        let static_dir = settings
            .get_string("server.static_dir")
            .or_else(|_| env::var("STATIC_DIR"))
            .unwrap_or(defaults.static_dir);

        let config = Config {
            app_name,
            lms_db_url,
            table_prefix,
            db_max_connections,
            cache_capacity,
            degrade_on_error,
            bind_addr,
            cors_origins,
            static_dir,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.cache_capacity == 0 {
            return Err(config::ConfigError::Message(
                "cache capacity must be greater than zero".to_string(),
            ));
        }
        if self.db_max_connections == 0 {
            return Err(config::ConfigError::Message(
                "database max_connections must be greater than zero".to_string(),
            ));
        }
        // The prefix is spliced into SQL text, so only identifier characters are allowed
        if !self
            .table_prefix
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(config::ConfigError::Message(format!(
                "invalid table prefix: {:?}",
                self.table_prefix
            )));
        }
        Ok(())
    }
}

fn parse_env<T>(key: &str) -> Result<Option<T>, config::ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            config::ConfigError::Message(format!("invalid value for {}: {}", key, e))
        }),
        Err(_) => Ok(None),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
