use crate::error::MarketplaceError;
use crate::models::{EntitlementKind, Plan};

/// Purchasable plans
#[derive(Debug, Clone)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl PlanCatalog {
    pub fn new(plans: Vec<Plan>) -> Self {
        Self { plans }
    }

    /// Built-in plans used when the seed catalog lists none
    pub fn builtin() -> Self {
        let plan = |id: &str, kind, name: &str, duration_days, price_cents| Plan {
            id: id.to_string(),
            kind,
            name: name.to_string(),
            duration_days,
            price_cents,
        };

        Self::new(vec![
            plan("patient-monthly", EntitlementKind::Subscription, "Monthly subscription", 30, 1999),
            plan("patient-annual", EntitlementKind::Subscription, "Annual subscription", 365, 19999),
            plan("boost-weekly", EntitlementKind::Boost, "Weekly boost", 7, 999),
            plan("boost-monthly", EntitlementKind::Boost, "Monthly boost", 30, 2999),
        ])
    }

    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    /// Look up a plan of the given kind. Ids of the other kind are invalid too.
    pub fn get(&self, plan_id: &str, kind: EntitlementKind) -> Result<&Plan, MarketplaceError> {
        self.plans
            .iter()
            .find(|plan| plan.id == plan_id && plan.kind == kind)
            .ok_or_else(|| MarketplaceError::InvalidPlan(plan_id.to_string()))
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
