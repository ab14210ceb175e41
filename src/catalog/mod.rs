//! Catalog loading and validation.
//!
//! The catalog is a static JSON document loaded once at startup into an
//! immutable [`Catalog`] value and passed explicitly to whoever needs it —
//! there is no module-level singleton. Configuration errors (unknown
//! strategy tags, dangling or cyclic bundle references, cost conflicts)
//! are fatal at load; nothing is silently defaulted, and price computation
//! never has to guard against a malformed catalog.

pub mod pricing;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{FeeSchedule, LabPanel, PricingDefaults};
use pricing::{compute_price, Priced};

/// Seed catalog shipped with the binary. Exercised by tests; deployments
/// usually point `LABPORT_CATALOG` at their own document.
const BUILTIN_CATALOG: &str = include_str!("../../resources/catalog.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Cannot read catalog file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate panel id: {id}")]
    DuplicatePanel { id: String },

    #[error("Panel {id} must declare exactly one of wholesale_cents or components")]
    CostConflict { id: String },

    #[error("Bundle {panel} references unknown component: {component}")]
    UnknownComponent { panel: String, component: String },

    #[error("Cyclic bundle reference involving panel {panel}")]
    CyclicBundle { panel: String },
}

/// Raw document shape before validation.
#[derive(Deserialize)]
struct CatalogDoc {
    currency: String,
    default_fees: FeeSchedule,
    pricing_defaults: PricingDefaults,
    panels: Vec<LabPanel>,
}

/// Validated, immutable panel catalog.
#[derive(Debug)]
pub struct Catalog {
    currency: String,
    default_fees: FeeSchedule,
    pricing_defaults: PricingDefaults,
    panels: Vec<LabPanel>,
    index: HashMap<String, usize>,
}

/// A panel plus its computed retail price. A view artifact — recomputed
/// on demand, never persisted as authoritative.
#[derive(Debug, Clone, Serialize)]
pub struct PricedPanel {
    #[serde(flatten)]
    pub panel: LabPanel,
    pub price_cents: i64,
    pub breakdown: pricing::PriceBreakdown,
}

impl Catalog {
    /// Parse and validate a catalog document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let doc: CatalogDoc = serde_json::from_str(json)?;

        let mut index = HashMap::with_capacity(doc.panels.len());
        for (position, panel) in doc.panels.iter().enumerate() {
            if index.insert(panel.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicatePanel {
                    id: panel.id.clone(),
                });
            }
        }

        let catalog = Self {
            currency: doc.currency,
            default_fees: doc.default_fees,
            pricing_defaults: doc.pricing_defaults,
            panels: doc.panels,
            index,
        };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load a catalog from a file on disk.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    /// Reject cost conflicts, dangling component references, and bundle
    /// cycles. Runs once at load so that `base_cost_cents` can recurse
    /// without a cycle guard.
    fn validate(&self) -> Result<(), CatalogError> {
        for panel in &self.panels {
            let has_cost = panel.wholesale_cents.is_some();
            let has_components = !panel.components.is_empty();
            if has_cost == has_components {
                return Err(CatalogError::CostConflict {
                    id: panel.id.clone(),
                });
            }
            for component in &panel.components {
                if !self.index.contains_key(component) {
                    return Err(CatalogError::UnknownComponent {
                        panel: panel.id.clone(),
                        component: component.clone(),
                    });
                }
            }
        }

        // Three-color DFS over the bundle graph
        const WHITE: u8 = 0;
        const GRAY: u8 = 1;
        const BLACK: u8 = 2;
        let mut color = vec![WHITE; self.panels.len()];

        fn visit(
            catalog: &Catalog,
            position: usize,
            color: &mut [u8],
        ) -> Result<(), CatalogError> {
            color[position] = GRAY;
            for component in &catalog.panels[position].components {
                let next = catalog.index[component];
                match color[next] {
                    GRAY => {
                        return Err(CatalogError::CyclicBundle {
                            panel: catalog.panels[next].id.clone(),
                        })
                    }
                    WHITE => visit(catalog, next, color)?,
                    _ => {}
                }
            }
            color[position] = BLACK;
            Ok(())
        }

        for position in 0..self.panels.len() {
            if color[position] == WHITE {
                visit(self, position, &mut color)?;
            }
        }
        Ok(())
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn default_fees(&self) -> &FeeSchedule {
        &self.default_fees
    }

    pub fn pricing_defaults(&self) -> &PricingDefaults {
        &self.pricing_defaults
    }

    pub fn panels(&self) -> &[LabPanel] {
        &self.panels
    }

    pub fn panel(&self, id: &str) -> Option<&LabPanel> {
        self.index.get(id).map(|&position| &self.panels[position])
    }

    /// Wholesale cost basis in cents. For bundles this is the exact
    /// integer sum of component costs, resolved recursively — components
    /// are looked up, not re-priced. Termination is guaranteed by the
    /// load-time cycle check.
    pub fn base_cost_cents(&self, id: &str) -> Option<i64> {
        let panel = self.panel(id)?;
        if let Some(cents) = panel.wholesale_cents {
            return Some(cents);
        }
        let mut total = 0_i64;
        for component in &panel.components {
            total += self.base_cost_cents(component)?;
        }
        Some(total)
    }

    /// Price a single panel. `None` only for an unknown id; every panel
    /// in a validated catalog prices successfully.
    pub fn priced_panel(&self, id: &str) -> Option<PricedPanel> {
        let panel = self.panel(id)?;
        let base_cost = self.base_cost_cents(id)?;
        let Priced {
            price_cents,
            breakdown,
        } = compute_price(
            base_cost,
            panel.reference_cents,
            &panel.strategy,
            &self.pricing_defaults,
            &self.default_fees,
        );
        Some(PricedPanel {
            panel: panel.clone(),
            price_cents,
            breakdown,
        })
    }

    /// Price every panel, in catalog order.
    pub fn priced_panels(&self) -> Vec<PricedPanel> {
        self.panels
            .iter()
            .map(|panel| {
                self.priced_panel(&panel.id)
                    .expect("validated catalog panels always price")
            })
            .collect()
    }
}
