//! Shared application state.
//!
//! Constructed once at startup and shared via `Arc` with every handler.
//! The catalog is an explicitly injected immutable value — handlers and
//! tests receive the catalog they were given, never a global.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::analysis::AnalysisClient;
use crate::catalog::Catalog;
use crate::checkout::CheckoutClient;
use crate::config::AppConfig;
use crate::db;
use crate::dispensary::DispensaryClient;

pub struct AppState {
    pub config: AppConfig,
    pub catalog: Catalog,
    pub analysis: AnalysisClient,
    pub checkout: CheckoutClient,
    pub dispensary: DispensaryClient,
    db_path: PathBuf,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: Catalog) -> Self {
        let analysis = AnalysisClient::new(&config.analysis_base_url, 120);
        let checkout = CheckoutClient::new(&config.checkout_base_url, 30);
        let dispensary = DispensaryClient::new(&config.dispensary_base_url, 30);
        let db_path = config.db_path();
        Self {
            config,
            catalog,
            analysis,
            checkout,
            dispensary,
            db_path,
        }
    }

    /// Open a database connection. SQLite handles its own locking; each
    /// handler opens, uses, and drops a connection per request.
    pub fn open_db(&self) -> Result<Connection, db::DatabaseError> {
        db::open_database(&self.db_path)
    }
}
