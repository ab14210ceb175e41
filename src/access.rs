//! Feature-access resolver.
//!
//! Maps a tenant context to the flat capability record consumed by UI
//! rendering and the dispensary/pricing display logic. Pure and
//! deterministic: same context in, same capabilities out. Exactly two
//! output variants exist — public (limited, paid-per-report) and clinic
//! (full, implied by an active subscription). There is no tiered clinic
//! entitlement beyond on/off.

use serde::Serialize;

use crate::models::Clinic;

/// Which tenant a request is served under. Closed variant — the resolver's
/// two branches are exhaustively checked at compile time.
#[derive(Debug, Clone)]
pub enum TenantContext {
    /// Direct-to-consumer mode, no clinic chrome.
    Public,
    Clinic(Clinic),
}

/// How report analysis is paid for under this tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMode {
    PayPerReport,
    SubscriptionCovered,
}

/// Fixed-shape capability record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Capabilities {
    /// Show per-supplement dosage detail in analysis output.
    pub detailed_dosage: bool,
    /// Advanced biomarker panels visible in the catalog.
    pub advanced_panels: bool,
    /// Affiliate storefront link, present only with dispensary access.
    pub dispensary_url: Option<String>,
    /// Discount surfaced next to dispensary links. Configuration, not a
    /// literal — the upstream material disagrees about the value.
    pub dispensary_discount_percent: u8,
    pub payment_mode: PaymentMode,
}

/// Resolve capabilities for a tenant context.
///
/// `discount_percent` comes from configuration and only applies where
/// dispensary access exists.
pub fn resolve(context: &TenantContext, discount_percent: u8) -> Capabilities {
    match context {
        TenantContext::Public => Capabilities {
            detailed_dosage: false,
            advanced_panels: false,
            dispensary_url: None,
            dispensary_discount_percent: 0,
            payment_mode: PaymentMode::PayPerReport,
        },
        TenantContext::Clinic(clinic) => {
            let entitled = clinic.subscription_status.entitled();
            let dispensary = clinic.has_dispensary_access();
            Capabilities {
                detailed_dosage: entitled,
                advanced_panels: entitled,
                dispensary_url: if dispensary {
                    clinic.dispensary_url.clone()
                } else {
                    None
                },
                dispensary_discount_percent: if dispensary { discount_percent } else { 0 },
                payment_mode: if entitled {
                    PaymentMode::SubscriptionCovered
                } else {
                    PaymentMode::PayPerReport
                },
            }
        }
    }
}
