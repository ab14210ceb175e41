//! Catalog pricing engine.
//!
//! Pure computation: wholesale cost + strategy → retail price in minor
//! currency units, with an auditable breakdown. No I/O, no hidden state;
//! identical inputs always produce identical output.
//!
//! Intermediates keep full `f64` precision. Rounding happens exactly once,
//! round-half-up to whole cents, at the very end — bundles aggregate exact
//! integer component sums before their strategy applies, so no rounding
//! error accumulates.

use serde::Serialize;

use crate::models::{FeeSchedule, PricingDefaults, PricingStrategy};

/// Retail price plus the numbers that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Priced {
    pub price_cents: i64,
    pub breakdown: PriceBreakdown,
}

/// Where the price came from. Recomputed on demand, never persisted
/// as authoritative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBreakdown {
    /// Wholesale cost basis (exact component sum for bundles).
    pub base_cost_cents: i64,
    /// Platform fee share, rounded to cents for display.
    pub absorbed_fees_cents: i64,
    /// Reference price consulted by a match-reference strategy.
    pub reference_used_cents: Option<i64>,
    /// Whether the final price came out above the external reference.
    pub above_reference: bool,
}

/// Round half-up to whole cents. All inputs are non-negative.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Compute the retail price for a single cost basis.
///
/// `match_reference` with no reference price degrades to the default
/// markup strategy — a defined degradation, not an error. The absorbed-fee
/// schedule applies uniformly after every strategy: flat cents plus a
/// percentage of the strategy subtotal.
pub fn compute_price(
    base_cost_cents: i64,
    reference_cents: Option<i64>,
    strategy: &PricingStrategy,
    defaults: &PricingDefaults,
    fees: &FeeSchedule,
) -> Priced {
    let base = base_cost_cents as f64;

    let (subtotal, reference_used) = match strategy {
        PricingStrategy::MarkupPercentage { percent } => {
            (base * (1.0 + percent / 100.0), None)
        }
        PricingStrategy::FixedFee { fee_cents } => (base + *fee_cents as f64, None),
        PricingStrategy::MatchReference { floor_percent } => match reference_cents {
            Some(reference) => {
                let floor = base * (1.0 + floor_percent / 100.0);
                ((reference as f64).max(floor), Some(reference))
            }
            // Degradation: no reference to match, fall back to the
            // catalog-wide default markup.
            None => (base * (1.0 + defaults.markup_percentage / 100.0), None),
        },
    };

    let absorbed = fees.flat_cents as f64 + subtotal * fees.percentage / 100.0;
    let price_cents = round_half_up(subtotal + absorbed);

    Priced {
        price_cents,
        breakdown: PriceBreakdown {
            base_cost_cents,
            absorbed_fees_cents: round_half_up(absorbed),
            reference_used_cents: reference_used,
            above_reference: reference_used.is_some_and(|r| price_cents > r),
        },
    }
}
