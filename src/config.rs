use std::time::Duration;

use clap::Parser;

// Data service defaults
pub const DEFAULT_BASE_URL: &str = "https://stat.ripe.net/data/";
pub const BASE_URL_ENV: &str = "STAT_URL";
pub const TOKEN_ENV: &str = "STAT_TOKEN";
pub const HTTP_TIMEOUT_SECONDS: u64 = 30;
pub const VISUALIZATION_URL: &str = "https://stat.ripe.net/";

// Session cookies carried by a stored token of the form <crowd>_<session>
pub const CROWD_COOKIE: &str = "crowd.token_key";
pub const STAT_COOKIE: &str = "stat-session";

// Widget execution
pub const DEFAULT_WIDGET_GROUP: &str = "@at-a-glance";
pub const ORDER_POLL_INTERVAL: Duration = Duration::from_millis(200);
pub const UNORDERED_KEY_WIDTH: usize = 20;

// Line server
pub const DEFAULT_WHOIS_PORT: u16 = 43;
pub const MAX_LINE_LENGTH: usize = 1024;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Settings read once from the environment at startup
#[derive(Debug, Clone)]
pub struct StatConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

impl Default for StatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            timeout: Duration::from_secs(HTTP_TIMEOUT_SECONDS),
        }
    }
}

impl StatConfig {
    /// Read `STAT_URL` and `STAT_TOKEN`, honouring a `.env` file
    pub fn from_env() -> Self {
        let _ = dotenv::dotenv();

        let base_url = std::env
            ::var(BASE_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let token = std::env
            ::var(TOKEN_ENV)
            .ok()
            .filter(|token| !token.trim().is_empty());

        Self { base_url, token, ..Default::default() }
    }
}

#[derive(Parser)]
#[command(
    name = "ripestat-whois",
    author,
    version,
    about = "Whois-style line server for RIPEstat widgets and data calls"
)]
pub struct ServerCli {
    /// Listen address (repeat to listen on several interfaces)
    #[arg(short = 'H', long = "host", default_value = "::")]
    pub hosts: Vec<String>,

    /// Listen port
    #[arg(short, long, default_value_t = DEFAULT_WHOIS_PORT)]
    pub port: u16,

    /// Data API base URL (overrides STAT_URL)
    #[arg(short, long)]
    pub base_url: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    pub debug: bool,

    /// Enable trace output (adds module paths)
    #[arg(short, long)]
    pub trace: bool,

    /// Log in journald field format
    #[arg(long)]
    pub journald: bool,

    /// Maximum concurrent connections
    #[arg(long, default_value_t = 100)]
    pub max_connections: usize,

    /// Idle timeout in seconds while waiting for the next line
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}
