pub mod clinic;
pub mod enums;
pub mod order;
pub mod panel;
pub mod profile;
pub mod report;

pub use clinic::Clinic;
pub use enums::*;
pub use order::Order;
pub use panel::{FeeSchedule, LabPanel, PricingDefaults, PricingStrategy};
pub use profile::Profile;
pub use report::LabReport;
