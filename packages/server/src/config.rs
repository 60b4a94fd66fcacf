use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    /// Lifetime of a login session, in hours.
    pub session_ttl_hours: i64,
}

/// Institution-wide constants used by the provisioning workflows.
#[derive(Debug, Deserialize, Clone)]
pub struct InstitutionConfig {
    /// Domain appended to a student's lowercased registration number.
    pub email_domain: String,
    /// Fixed first-login password handed out to newly added faculty.
    pub faculty_initial_password: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub request_timeout_secs: u64,
}

/// Optional HOD account created on startup when absent.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct BootstrapConfig {
    pub hod_email: Option<String>,
    pub hod_password: Option<String>,
    pub hod_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LogConfig {
    pub level: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub institution: InstitutionConfig,
    pub store: StoreConfig,
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
    pub log: LogConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("database.url", "sqlite://records.db?mode=rwc")?
            .set_default("auth.session_ttl_hours", 168)?
            .set_default("institution.email_domain", "sngist.org")?
            .set_default("institution.faculty_initial_password", "Welcome@123")?
            .set_default("store.request_timeout_secs", 10)?
            .set_default("log.level", "info")?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., RECORDS__AUTH__JWT_SECRET)
            .add_source(
                Environment::with_prefix("RECORDS")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
