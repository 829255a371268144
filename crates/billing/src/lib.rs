//! Billing rules for the backoffice console.
//!
//! Per-seat plan pricing and the monthly recurring revenue derived from it.
//! Everything here is pure and total over the plan enumeration; callers
//! validate their inputs at the data-access boundary.

pub mod mrr;
pub mod pricing;

pub use mrr::{calculate_mrr, reprice};
pub use pricing::{format_plan, format_price, price_per_seat, PricingTable};
