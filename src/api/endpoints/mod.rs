//! API endpoint handlers.
//!
//! Each module corresponds to one surface of the portal: auth, catalog,
//! tenant resolution, clinic admin, reports, checkout, dispensary.

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod clinics;
pub mod dispensary;
pub mod health;
pub mod reports;
pub mod tenants;
