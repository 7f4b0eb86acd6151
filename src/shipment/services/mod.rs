//! Application services for shipment lifecycle orchestration.

mod admission;
mod consolidation;
mod dwell;
mod estimator;
mod execution;
mod planning;
mod pricing;

pub use admission::{AdmissionError, AdmissionPolicy};
pub use consolidation::consolidate;
pub use dwell::{PendingDwell, dwell_before};
pub use estimator::{CostEstimator, EstimationError, LegEstimate};
pub use execution::{ContainerPosition, ExecutionError, ExecutionResult, ExecutionService};
pub use planning::{CreateLegInput, PlanningError, PlanningResult, PlanningService};
pub use pricing::PricingConfig;
