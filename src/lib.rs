pub mod access; // Feature-access resolver: tenant context → capabilities
pub mod analysis; // Remote AI analysis client
pub mod api; // HTTP API: router, middleware, endpoints
pub mod catalog; // Catalog loading + pricing engine
pub mod checkout; // Payment checkout client
pub mod config;
pub mod db;
pub mod dispensary; // Dispensary account provisioning client
pub mod models;
pub mod state;
pub mod tenant; // Slug → clinic resolution
