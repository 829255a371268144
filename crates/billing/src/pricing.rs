//! Plan pricing table: price per seat per month for every plan and
//! subscription cadence, plus display helpers for prices and plans.

use backoffice_core::types::{Plan, SubscriptionType};
use serde::Serialize;

/// Per-seat monthly prices, in whole currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PricingTable {
    pub free: u64,
    pub pro_monthly: u64,
    pub pro_yearly: u64,
}

/// One row of the pricing table, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub plan: Plan,
    pub subscription_type: Option<SubscriptionType>,
    pub price_per_seat: u64,
}

impl PricingTable {
    pub const STANDARD: PricingTable = PricingTable {
        free: 0,
        pro_monthly: 29,
        pro_yearly: 23,
    };

    /// Price of one seat for one month. Monthly is assumed when a Pro plan
    /// has no subscription type.
    pub fn price_per_seat(&self, plan: Plan, subscription_type: Option<SubscriptionType>) -> u64 {
        match (plan, subscription_type) {
            (Plan::Free, _) => self.free,
            (Plan::Pro, Some(SubscriptionType::Yearly)) => self.pro_yearly,
            (Plan::Pro, Some(SubscriptionType::Monthly) | None) => self.pro_monthly,
        }
    }

    pub fn entries(&self) -> Vec<PriceEntry> {
        [
            (Plan::Free, None),
            (Plan::Pro, Some(SubscriptionType::Monthly)),
            (Plan::Pro, Some(SubscriptionType::Yearly)),
        ]
        .into_iter()
        .map(|(plan, subscription_type)| PriceEntry {
            plan,
            subscription_type,
            price_per_seat: self.price_per_seat(plan, subscription_type),
        })
        .collect()
    }

    /// Canonical subscription type for a plan: Free carries none, Pro
    /// falls back to monthly.
    pub fn normalize_subscription(
        plan: Plan,
        subscription_type: Option<SubscriptionType>,
    ) -> Option<SubscriptionType> {
        match plan {
            Plan::Free => None,
            Plan::Pro => Some(subscription_type.unwrap_or(SubscriptionType::Monthly)),
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Price per seat from the standard pricing table.
pub fn price_per_seat(plan: Plan, subscription_type: Option<SubscriptionType>) -> u64 {
    PricingTable::STANDARD.price_per_seat(plan, subscription_type)
}

pub fn format_price(amount: u64) -> String {
    format!("{amount}€")
}

pub fn format_plan(plan: Plan, subscription_type: Option<SubscriptionType>) -> String {
    match (plan, subscription_type) {
        (Plan::Free, _) => "Free".to_string(),
        (Plan::Pro, Some(SubscriptionType::Yearly)) => "Pro (Yearly)".to_string(),
        (Plan::Pro, _) => "Pro (Monthly)".to_string(),
    }
}
