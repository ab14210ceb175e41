use serde::{Deserialize, Serialize};

use super::enums::SpecimenType;

/// A catalog entry: a named lab test product composed of one or more
/// biomarkers. Immutable once loaded from the catalog document.
///
/// A panel carries either its own wholesale cost or a list of bundle
/// component ids — never both, never neither. The catalog loader
/// enforces that invariant before any panel is priced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabPanel {
    pub id: String,
    pub name: String,
    pub vendor_sku: String,
    pub category: String,
    pub specimen: SpecimenType,
    #[serde(default)]
    pub fasting_required: bool,
    /// Turnaround estimate in business days.
    pub turnaround_days: u32,
    #[serde(default)]
    pub marker_aliases: Vec<String>,
    /// Wholesale cost in minor currency units (cents). Absent for bundles.
    #[serde(default)]
    pub wholesale_cents: Option<i64>,
    /// Bundle component panel ids. Absent for plain panels.
    #[serde(default)]
    pub components: Vec<String>,
    pub strategy: PricingStrategy,
    /// External reference price in cents, when a comparable retail
    /// listing exists upstream.
    #[serde(default)]
    pub reference_cents: Option<i64>,
    /// Visible only to clinic tenants (gated by the access resolver).
    #[serde(default)]
    pub advanced: bool,
}

impl LabPanel {
    pub fn is_bundle(&self) -> bool {
        !self.components.is_empty()
    }
}

/// How a panel's retail price is derived from its wholesale cost.
/// Exactly one variant applies per panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PricingStrategy {
    /// `price = cost * (1 + percent/100)`
    MarkupPercentage { percent: f64 },
    /// `price = cost + fee_cents`
    FixedFee { fee_cents: i64 },
    /// `price = max(reference, cost * (1 + floor_percent/100))`.
    /// Degrades to the default markup when no reference price exists.
    MatchReference { floor_percent: f64 },
}

/// Fallback pricing parameters used when a strategy cannot apply
/// (a match-reference panel with no reference price).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingDefaults {
    pub markup_percentage: f64,
    pub fixed_fee_cents: i64,
}

/// Platform absorbed-fee schedule: a flat per-panel amount plus a
/// percentage of the strategy subtotal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeSchedule {
    pub flat_cents: i64,
    pub percentage: f64,
}
