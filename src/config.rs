use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Labport";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,labport_lib=debug".to_string()
}

/// Get the application data directory
/// ~/Labport/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Labport")
}

/// Runtime configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    /// Catalog document path. `None` means the built-in seed catalog.
    pub catalog_path: Option<PathBuf>,
    pub analysis_base_url: String,
    pub checkout_base_url: String,
    pub dispensary_base_url: String,
    /// Discount surfaced next to dispensary links. Deliberately a knob:
    /// the upstream material quotes conflicting literals (15 vs 25–30).
    pub dispensary_discount_percent: u8,
    pub max_upload_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr = std::env::var("LABPORT_BIND")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:8787".parse().expect("valid default bind addr"));

        let data_dir = std::env::var("LABPORT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_data_dir());

        let catalog_path = std::env::var("LABPORT_CATALOG").ok().map(PathBuf::from);

        let analysis_base_url = std::env::var("LABPORT_ANALYSIS_URL")
            .unwrap_or_else(|_| "http://localhost:8090".to_string());
        let checkout_base_url = std::env::var("LABPORT_CHECKOUT_URL")
            .unwrap_or_else(|_| "http://localhost:8091".to_string());
        let dispensary_base_url = std::env::var("LABPORT_DISPENSARY_URL")
            .unwrap_or_else(|_| "http://localhost:8092".to_string());

        let dispensary_discount_percent = std::env::var("LABPORT_DISPENSARY_DISCOUNT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(15);

        let max_upload_bytes = std::env::var("LABPORT_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10 * 1024 * 1024);

        Self {
            bind_addr,
            data_dir,
            catalog_path,
            analysis_base_url,
            checkout_base_url,
            dispensary_base_url,
            dispensary_discount_percent,
            max_upload_bytes,
        }
    }

    /// Directory for stored report uploads.
    pub fn uploads_dir(&self) -> PathBuf {
        self.data_dir.join("uploads")
    }

    /// SQLite database path.
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join("labport.db")
    }
}
