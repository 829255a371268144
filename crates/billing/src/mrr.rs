//! Monthly recurring revenue of an organization.

use backoffice_core::types::{Organization, Plan, SubscriptionType};
use tracing::debug;

use crate::pricing::PricingTable;

/// MRR for `seat_count` seats on `plan`. Free plans never generate revenue.
pub fn calculate_mrr(plan: Plan, seat_count: u32, subscription_type: Option<SubscriptionType>) -> u64 {
    PricingTable::STANDARD.mrr(plan, seat_count, subscription_type)
}

impl PricingTable {
    pub fn mrr(
        &self,
        plan: Plan,
        seat_count: u32,
        subscription_type: Option<SubscriptionType>,
    ) -> u64 {
        match plan {
            Plan::Free => 0,
            Plan::Pro => self.price_per_seat(plan, subscription_type) * u64::from(seat_count),
        }
    }
}

/// Normalize the subscription type and re-derive the stored MRR from plan,
/// subscription type and seat count. Any MRR already on the record is
/// discarded.
pub fn reprice(org: &mut Organization) {
    org.subscription_type = PricingTable::normalize_subscription(org.plan, org.subscription_type);
    let mrr = calculate_mrr(org.plan, org.seat_count, org.subscription_type);
    if mrr != org.mrr {
        debug!(org_id = %org.id, previous = org.mrr, mrr, "Organization repriced");
    }
    org.mrr = mrr;
}

#[cfg(test)]
mod tests {
    use super::*;
    use backoffice_core::types::OrganizationStatus;
    use chrono::Utc;
    use uuid::Uuid;

    fn org(plan: Plan, seats: u32, subscription_type: Option<SubscriptionType>, mrr: u64) -> Organization {
        Organization {
            id: Uuid::new_v4(),
            name: "TechCorp".into(),
            seat_count: seats,
            status: OrganizationStatus::Active,
            created_at: Utc::now(),
            plan,
            subscription_type,
            mrr,
        }
    }

    #[test]
    fn test_calculate_mrr() {
        assert_eq!(calculate_mrr(Plan::Pro, 10, Some(SubscriptionType::Yearly)), 230);
        assert_eq!(calculate_mrr(Plan::Pro, 10, Some(SubscriptionType::Monthly)), 290);
        assert_eq!(calculate_mrr(Plan::Free, 10, Some(SubscriptionType::Yearly)), 0);
        assert_eq!(calculate_mrr(Plan::Pro, 0, Some(SubscriptionType::Monthly)), 0);
        assert_eq!(calculate_mrr(Plan::Pro, 3, None), 87);
    }

    #[test]
    fn test_calculate_mrr_is_repeatable() {
        let first = calculate_mrr(Plan::Pro, 42, Some(SubscriptionType::Yearly));
        let second = calculate_mrr(Plan::Pro, 42, Some(SubscriptionType::Yearly));
        assert_eq!(first, second);
    }

    #[test]
    fn test_reprice_discards_stale_mrr() {
        let mut record = org(Plan::Pro, 10, Some(SubscriptionType::Yearly), 230);
        record.seat_count = 12;
        reprice(&mut record);
        assert_eq!(record.mrr, calculate_mrr(Plan::Pro, 12, Some(SubscriptionType::Yearly)));
        assert_eq!(record.mrr, 276);

        let mut forged = org(Plan::Pro, 5, Some(SubscriptionType::Monthly), 9_999);
        reprice(&mut forged);
        assert_eq!(forged.mrr, 145);
    }

    #[test]
    fn test_reprice_normalizes_subscription() {
        let mut free = org(Plan::Free, 3, Some(SubscriptionType::Yearly), 69);
        reprice(&mut free);
        assert_eq!(free.subscription_type, None);
        assert_eq!(free.mrr, 0);

        let mut pro = org(Plan::Pro, 2, None, 0);
        reprice(&mut pro);
        assert_eq!(pro.subscription_type, Some(SubscriptionType::Monthly));
        assert_eq!(pro.mrr, 58);
    }
}
