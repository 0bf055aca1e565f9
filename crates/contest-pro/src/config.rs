use anyhow::anyhow;
use clap::Parser;
use contest_pro_core::DEFAULT_CURRENCY;
use fern::colors::{Color, ColoredLevelConfig};
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use std::{
    env,
    fs::{self, File},
    io::{Read, Write},
    path::PathBuf,
};
use time::{format_description::well_known::Iso8601, OffsetDateTime};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to Settings.toml file holding configuration options
    #[arg(short, long)]
    pub config: Option<String>,

    /// Log level to run with the service (default: info)
    #[arg(short, long)]
    pub level: Option<String>,

    /// Address the http server binds to, 0.0.0.0 listens on every interface
    #[arg(long, env = "DOMAIN")]
    pub domain: Option<String>,

    /// Port the http server listens on
    #[arg(long, env = "PORT")]
    pub port: Option<String>,

    /// Secret used to sign and verify access tokens
    #[arg(long, env = "ACCESS_TOKEN_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Secret key for the Stripe api
    #[arg(long, env = "STRIPE_SECRET_KEY", hide_env_values = true)]
    pub stripe_secret_key: Option<String>,

    /// Folder holding the sqlite database files
    #[arg(long, env = "DATA_FOLDER")]
    pub data_folder: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub config: Option<String>,
    pub level: Option<String>,
    pub db_settings: DBSettings,
    pub api_settings: APISettings,
    pub auth_settings: AuthSettings,
    pub payment_settings: PaymentSettings,
}

impl ConfigurableSettings for Settings {
    fn apply_cli_overrides(&mut self, cli_settings: &CliSettings) {
        if let Some(level) = &cli_settings.level {
            self.level = Some(level.clone());
        }
        if let Some(domain) = &cli_settings.domain {
            self.api_settings.domain = domain.clone();
        }
        if let Some(port) = &cli_settings.port {
            self.api_settings.port = port.clone();
        }
        if let Some(secret) = &cli_settings.jwt_secret {
            self.auth_settings.jwt_secret = secret.clone();
        }
        if let Some(key) = &cli_settings.stripe_secret_key {
            self.payment_settings.secret_key = key.clone();
        }
        if let Some(folder) = &cli_settings.data_folder {
            self.db_settings.data_folder = folder.clone();
        }
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("./config/local.toml")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DBSettings {
    pub data_folder: String,
    pub read_max_connections: u32,
    pub read_min_connections: u32,
    pub write_max_connections: u32,
    pub write_min_connections: u32,
    pub idle_timeout_secs: u64,
    pub acquire_timeout_secs: u64,
    /// How long a writer waits for the write lock before giving up
    pub write_timeout_secs: u64,
    pub sqlite_config: SqliteConfigSerde,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SqliteConfigSerde {
    /// "ReadWriteCreate" for files on disk, "Memory" for throwaway databases
    pub mode: String,
    pub busy_timeout_ms: u32,
    pub journal_mode: String,
    pub synchronous: String,
    pub foreign_keys: bool,
}

impl Default for DBSettings {
    fn default() -> Self {
        DBSettings {
            data_folder: String::from("./data"),
            read_max_connections: 12,
            read_min_connections: 2,
            write_max_connections: 5,
            write_min_connections: 1,
            idle_timeout_secs: 600,   // 10 minutes
            acquire_timeout_secs: 15, // 15 seconds
            write_timeout_secs: 10,
            sqlite_config: SqliteConfigSerde::default(),
        }
    }
}

impl DBSettings {
    pub fn testing() -> Self {
        Self {
            read_max_connections: 2,
            read_min_connections: 1,
            write_max_connections: 1,
            acquire_timeout_secs: 5,
            sqlite_config: SqliteConfigSerde::testing(),
            ..Default::default()
        }
    }
}

impl Default for SqliteConfigSerde {
    fn default() -> Self {
        Self {
            mode: "ReadWriteCreate".to_string(),
            busy_timeout_ms: 5000,
            journal_mode: "WAL".to_string(),
            synchronous: "NORMAL".to_string(),
            foreign_keys: true,
        }
    }
}

impl SqliteConfigSerde {
    pub fn testing() -> Self {
        Self {
            mode: "Memory".to_string(),
            journal_mode: "MEMORY".to_string(),
            synchronous: "OFF".to_string(),
            busy_timeout_ms: 1000,
            ..Default::default()
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct APISettings {
    pub domain: String,
    pub port: String,
    pub origins: Vec<String>,
}

impl Default for APISettings {
    fn default() -> Self {
        APISettings {
            domain: String::from("127.0.0.1"),
            port: String::from("5000"),
            origins: vec![
                String::from("http://localhost:5173"),
                String::from("http://localhost:5000"),
            ],
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthSettings {
    /// HS256 secret shared by token issuance and verification
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
}

impl Default for AuthSettings {
    fn default() -> Self {
        AuthSettings {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PaymentSettings {
    /// Url of the Stripe api
    pub base_url: String,
    pub secret_key: String,
    pub currency: String,
    /// Use the in-process gateway instead of Stripe (debug builds or e2e-testing feature only)
    #[serde(default)]
    pub mock_enabled: bool,
}

impl Default for PaymentSettings {
    fn default() -> Self {
        PaymentSettings {
            base_url: String::from("https://api.stripe.com"),
            secret_key: String::new(),
            currency: String::from(DEFAULT_CURRENCY),
            mock_enabled: false,
        }
    }
}

pub fn get_settings() -> Result<Settings, anyhow::Error> {
    get_settings_with_cli(Cli::parse().into())
}

#[derive(Default)]
pub struct CliSettings {
    pub config: Option<String>,
    pub level: Option<String>,
    pub domain: Option<String>,
    pub port: Option<String>,
    pub jwt_secret: Option<String>,
    pub stripe_secret_key: Option<String>,
    pub data_folder: Option<String>,
}

impl From<Cli> for CliSettings {
    fn from(cli: Cli) -> Self {
        Self {
            config: cli.config,
            level: cli.level,
            domain: cli.domain,
            port: cli.port,
            jwt_secret: cli.jwt_secret,
            stripe_secret_key: cli.stripe_secret_key,
            data_folder: cli.data_folder,
        }
    }
}

pub trait ConfigurableSettings: Serialize + for<'de> Deserialize<'de> + Default {
    /// Apply CLI settings after loading from file
    fn apply_cli_overrides(&mut self, cli_settings: &CliSettings);

    /// Get the default config file path
    fn default_config_path() -> PathBuf {
        PathBuf::from("./config/settings.toml")
    }

    /// Get the config directory path
    fn config_directory() -> PathBuf {
        PathBuf::from("./config")
    }
}

pub fn get_settings_with_cli<T: ConfigurableSettings>(
    cli_settings: CliSettings,
) -> Result<T, anyhow::Error> {
    let mut settings: T = if let Some(config_path) = cli_settings.config.clone() {
        let path = PathBuf::from(config_path);
        let absolute_path = if path.is_absolute() {
            path
        } else {
            env::current_dir()?.join(path)
        };

        let mut file =
            File::open(absolute_path).map_err(|e| anyhow!("Failed to find file: {}", e))?;
        read_settings(&mut file)?
    } else {
        let default_path = T::default_config_path();
        match File::open(&default_path) {
            Ok(mut file) => read_settings(&mut file)?,
            Err(_) => write_default_settings(&default_path)?,
        }
    };

    settings.apply_cli_overrides(&cli_settings);

    Ok(settings)
}

fn read_settings<T: ConfigurableSettings>(file: &mut File) -> Result<T, anyhow::Error> {
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| anyhow!("Failed to read config: {}", e))?;
    toml::from_str(&content).map_err(|e| anyhow!("Failed to map config to settings: {}", e))
}

fn write_default_settings<T: ConfigurableSettings>(path: &PathBuf) -> Result<T, anyhow::Error> {
    let default_settings = T::default();

    fs::create_dir_all(T::config_directory())
        .map_err(|e| anyhow!("Failed to create config directory: {}", e))?;

    let toml_content = toml::to_string(&default_settings)
        .map_err(|e| anyhow!("Failed to serialize default settings: {}", e))?;

    let mut file =
        fs::File::create(path).map_err(|e| anyhow!("Failed to create config file: {}", e))?;
    file.write_all(toml_content.as_bytes())
        .map_err(|e| anyhow!("Failed to write default config: {}", e))?;

    Ok(default_settings)
}

pub fn setup_logger(
    level: Option<String>,
    filter_targets: Vec<String>,
) -> Result<(), fern::InitError> {
    let rust_log = get_log_level(level);
    let colors = ColoredLevelConfig::new()
        .trace(Color::White)
        .debug(Color::Cyan)
        .info(Color::Blue)
        .warn(Color::Yellow)
        .error(Color::Magenta);

    fern::Dispatch::new()
        .format(move |out, message, record| {
            let now = OffsetDateTime::now_utc()
                .format(&Iso8601::DEFAULT)
                .unwrap_or_default();
            out.finish(format_args!(
                "[{} {}] {}: {}",
                now,
                colors.color(record.level()),
                record.target(),
                message
            ));
        })
        .level(rust_log)
        .filter(move |metadata| {
            !filter_targets
                .iter()
                .any(|filter| metadata.target().starts_with(filter))
        })
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

pub fn get_log_level(level: Option<String>) -> LevelFilter {
    let level = level.unwrap_or_else(|| env::var("RUST_LOG").unwrap_or_default());
    match level.to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "info" => LevelFilter::Info,
        "warn" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        _ => LevelFilter::Info,
    }
}
