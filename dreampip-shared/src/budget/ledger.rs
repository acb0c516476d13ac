/// Budget ledger
///
/// Keeps each user's `used_budget` / `remaining_budget` consistent with the
/// task lists they own, and gates new allocations against the 100% ceiling.
///
/// Totals are always re-derived from the task lists, never adjusted
/// incrementally; the next recalculation repairs any stale total.
///
/// # Error policies
///
/// The three core operations treat storage failures differently:
///
/// | Operation                 | On storage error            |
/// |---------------------------|-----------------------------|
/// | `recalculate_user_budget` | logged, returned to caller  |
/// | `get_remaining_budget`    | logged, answers 100 (open)  |
/// | `validate_allocation`     | logged, answers false (closed) |
///
/// The open and closed policies are separate functions below and must not be
/// merged into one "default on error" helper.
///
/// # Concurrency
///
/// Nothing here locks. Two requests can both validate against the same
/// baseline and both persist, leaving a user above 100%. Recalculation then
/// reports `remaining_budget = 0`; the over-allocation itself is not undone.
///
/// # Example
///
/// ```no_run
/// use dreampip_shared::budget::{BudgetLedger, PgBudgetStore};
/// use sqlx::PgPool;
/// use std::sync::Arc;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, user_id: Uuid, list_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// let ledger = BudgetLedger::new(Arc::new(PgBudgetStore::new(pool)));
///
/// if ledger.validate_allocation(user_id, 35.0, Some(list_id)).await {
///     // persist the task list, then:
///     let totals = ledger.recalculate_user_budget(user_id).await?;
///     println!("{} used, {} left", totals.used_budget, totals.remaining_budget);
/// }
/// # Ok(())
/// # }
/// ```

use super::error::{BudgetError, BudgetResult, StoreResult};
use super::percentage::{BudgetPercentage, BUDGET_CEILING};
use super::store::BudgetStore;
use crate::models::task_list::BudgetAllocation;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Float slack when comparing stored totals with a fresh sum
const TOTALS_EPSILON: f64 = 1e-9;

/// Derived totals written onto the user
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetTotals {
    pub used_budget: f64,
    pub remaining_budget: f64,
}

impl BudgetTotals {
    /// Totals for a given usage; remaining is floored at 0
    pub fn from_used(used_budget: f64) -> Self {
        BudgetTotals {
            used_budget,
            remaining_budget: (BUDGET_CEILING - used_budget).max(0.0),
        }
    }

    pub fn is_over_allocated(&self) -> bool {
        self.used_budget > BUDGET_CEILING
    }

    /// Whether stored totals disagree with these beyond float rounding
    pub fn differs_from(&self, used_budget: f64, remaining_budget: f64) -> bool {
        (self.used_budget - used_budget).abs() > TOTALS_EPSILON
            || (self.remaining_budget - remaining_budget).abs() > TOTALS_EPSILON
    }
}

impl Default for BudgetTotals {
    fn default() -> Self {
        BudgetTotals::from_used(0.0)
    }
}

/// Outcome of an allocation check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationCheck {
    /// Whether the allocation fits under the ceiling
    pub allowed: bool,

    /// Usage of the other lists (the list being edited is excluded)
    pub current: f64,

    /// Percentage being asked for
    pub requested: f64,
}

impl AllocationCheck {
    fn evaluate(current: f64, requested: BudgetPercentage) -> Self {
        let requested = requested.value();
        AllocationCheck {
            allowed: current + requested <= BUDGET_CEILING,
            current,
            requested,
        }
    }

    /// Headroom left once this allocation is applied
    pub fn remaining_after(&self) -> f64 {
        (BUDGET_CEILING - self.current - self.requested).max(0.0)
    }
}

/// One task list's line in a [`BudgetSummary`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub task_list_id: Uuid,
    pub name: String,
    pub budget_percentage: f64,

    /// Share of `monthly_budget`, when the user has set one
    pub amount: Option<f64>,
}

/// Stored totals next to what the task lists currently add up to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetSummary {
    pub user_id: Uuid,

    /// As stored on the user (0 if never recalculated)
    pub used_budget: f64,

    /// As stored on the user (100 if never recalculated)
    pub remaining_budget: f64,

    /// Live sum over owned lists
    pub allocated: f64,

    /// Live sum exceeds the ceiling
    pub over_allocated: bool,

    /// Stored totals disagree with the live sum
    pub stale: bool,

    pub currency: String,

    pub monthly_budget: Option<f64>,

    pub allocations: Vec<AllocationLine>,
}

fn sum_allocations<'a>(
    allocations: impl IntoIterator<Item = &'a BudgetAllocation>,
    excluding: Option<Uuid>,
) -> f64 {
    allocations
        .into_iter()
        .filter(|a| Some(a.task_list_id) != excluding)
        .map(|a| a.budget_percentage.unwrap_or(0.0))
        .sum()
}

/// Fail-open policy for display reads: storage trouble reports the full budget
fn fail_open_remaining(user_id: Uuid, result: StoreResult<Option<f64>>) -> f64 {
    match result {
        Ok(Some(remaining)) => remaining,
        Ok(None) => BUDGET_CEILING,
        Err(e) => {
            error!(%user_id, error = %e, "Failed to read remaining budget, reporting full budget");
            BUDGET_CEILING
        }
    }
}

/// Fail-closed policy for allocation gates: storage trouble rejects
fn fail_closed_allocation(user_id: Uuid, result: BudgetResult<AllocationCheck>) -> bool {
    match result {
        Ok(check) => check.allowed,
        Err(e) => {
            error!(%user_id, error = %e, "Failed to validate budget allocation, rejecting");
            false
        }
    }
}

/// Budget accounting over a [`BudgetStore`]
#[derive(Clone)]
pub struct BudgetLedger {
    store: Arc<dyn BudgetStore>,
}

impl BudgetLedger {
    pub fn new(store: Arc<dyn BudgetStore>) -> Self {
        BudgetLedger { store }
    }

    /// Re-derives and persists the user's budget totals
    ///
    /// Sums `budget_percentage` over every list the user owns (missing values
    /// count as 0), then writes `used_budget` and
    /// `remaining_budget = max(0, 100 - used_budget)` in one update.
    /// Idempotent while the lists are unchanged.
    ///
    /// # Errors
    ///
    /// Storage errors are logged and returned; the stored totals may be stale
    /// in that case. `BudgetError::NotFound` if the user row is missing.
    pub async fn recalculate_user_budget(&self, user_id: Uuid) -> BudgetResult<BudgetTotals> {
        let allocations = self.store.owned_allocations(user_id).await.map_err(|e| {
            error!(%user_id, error = %e, "Failed to load task lists for budget recalculation");
            e
        })?;

        let totals = BudgetTotals::from_used(sum_allocations(&allocations, None));

        let written = self
            .store
            .write_totals(user_id, totals.used_budget, totals.remaining_budget)
            .await
            .map_err(|e| {
                error!(%user_id, error = %e, "Failed to write budget totals");
                e
            })?;

        if !written {
            warn!(%user_id, "Budget recalculation for unknown user");
            return Err(BudgetError::NotFound(format!("User {user_id}")));
        }

        if totals.is_over_allocated() {
            warn!(
                %user_id,
                used_budget = totals.used_budget,
                "User is over-allocated; remaining budget clamped to 0"
            );
        }

        info!(
            %user_id,
            lists = allocations.len(),
            used_budget = totals.used_budget,
            remaining_budget = totals.remaining_budget,
            "Recalculated user budget"
        );
        Ok(totals)
    }

    /// Stored remaining budget, or 100 when it is absent or unreadable
    pub async fn get_remaining_budget(&self, user_id: Uuid) -> f64 {
        fail_open_remaining(user_id, self.store.stored_remaining(user_id).await)
    }

    /// Whether `new_percentage` fits under the ceiling
    ///
    /// `current_list_id` is the list being edited; its existing percentage is
    /// left out of the baseline. An id the user does not own excludes nothing.
    /// Out-of-range percentages and storage errors both answer false.
    pub async fn validate_allocation(
        &self,
        user_id: Uuid,
        new_percentage: f64,
        current_list_id: Option<Uuid>,
    ) -> bool {
        let requested = match BudgetPercentage::new(new_percentage) {
            Ok(p) => p,
            Err(e) => {
                warn!(%user_id, error = %e, "Rejecting out-of-range budget allocation");
                return false;
            }
        };

        fail_closed_allocation(
            user_id,
            self.check_allocation(user_id, requested, current_list_id).await,
        )
    }

    /// Like [`validate_allocation`](Self::validate_allocation) but reports
    /// the baseline and propagates storage errors
    pub async fn check_allocation(
        &self,
        user_id: Uuid,
        requested: BudgetPercentage,
        current_list_id: Option<Uuid>,
    ) -> BudgetResult<AllocationCheck> {
        let allocations = self.store.owned_allocations(user_id).await?;
        let check = AllocationCheck::evaluate(sum_allocations(&allocations, current_list_id), requested);

        debug!(
            %user_id,
            current = check.current,
            requested = check.requested,
            allowed = check.allowed,
            "Checked budget allocation"
        );
        Ok(check)
    }

    /// Recalculates every user in `owner_ids`, stopping at the first failure
    pub async fn recalculate_owners(&self, owner_ids: &[Uuid]) -> BudgetResult<()> {
        for &owner_id in owner_ids {
            self.recalculate_user_budget(owner_id).await?;
        }
        Ok(())
    }

    /// Stored totals alongside the live allocation breakdown
    pub async fn summary(&self, user_id: Uuid) -> BudgetResult<BudgetSummary> {
        let user = self
            .store
            .find_user(user_id)
            .await?
            .ok_or_else(|| BudgetError::NotFound(format!("User {user_id}")))?;
        let lists = self.store.list_task_lists(user_id).await?;
        let settings = user.settings();

        let allocated: f64 = lists.iter().map(|list| list.contribution()).sum();
        let live = BudgetTotals::from_used(allocated);
        let used_budget = user.used_budget.unwrap_or(0.0);
        let remaining_budget = user.remaining_budget.unwrap_or(BUDGET_CEILING);

        let allocations = lists
            .into_iter()
            .map(|list| AllocationLine {
                task_list_id: list.id,
                amount: settings.allocated_amount(list.contribution()),
                budget_percentage: list.contribution(),
                name: list.name,
            })
            .collect();

        Ok(BudgetSummary {
            user_id,
            used_budget,
            remaining_budget,
            allocated,
            over_allocated: live.is_over_allocated(),
            stale: live.differs_from(used_budget, remaining_budget),
            currency: settings.currency().to_string(),
            monthly_budget: settings.monthly_budget,
            allocations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::error::StoreError;

    fn allocation(budget_percentage: Option<f64>) -> BudgetAllocation {
        BudgetAllocation {
            task_list_id: Uuid::new_v4(),
            budget_percentage,
        }
    }

    #[test]
    fn test_totals_clamp_remaining() {
        assert_eq!(BudgetTotals::from_used(0.0), BudgetTotals { used_budget: 0.0, remaining_budget: 100.0 });
        assert_eq!(BudgetTotals::from_used(100.0).remaining_budget, 0.0);

        let over = BudgetTotals::from_used(110.0);
        assert_eq!(over.remaining_budget, 0.0);
        assert!(over.is_over_allocated());
    }

    #[test]
    fn test_totals_ignore_summation_order() {
        let forward: f64 = [0.1, 0.2, 0.3].iter().sum();
        let backward: f64 = [0.3, 0.2, 0.1].iter().sum();
        assert_ne!(forward, backward);

        let live = BudgetTotals::from_used(forward);
        let stored = BudgetTotals::from_used(backward);
        assert!(!live.differs_from(stored.used_budget, stored.remaining_budget));
        assert!(live.differs_from(backward + 0.5, stored.remaining_budget - 0.5));
    }

    #[test]
    fn test_sum_treats_missing_as_zero() {
        let lists = vec![allocation(Some(40.0)), allocation(None), allocation(Some(25.5))];
        assert_eq!(sum_allocations(&lists, None), 65.5);
    }

    #[test]
    fn test_sum_excludes_current_list() {
        let lists = vec![allocation(Some(30.0)), allocation(Some(50.0))];
        assert_eq!(sum_allocations(&lists, Some(lists[0].task_list_id)), 50.0);
        assert_eq!(sum_allocations(&lists, Some(Uuid::new_v4())), 80.0);
    }

    #[test]
    fn test_allocation_check_boundary() {
        let exact = AllocationCheck::evaluate(50.0, BudgetPercentage::new(50.0).unwrap());
        assert!(exact.allowed);
        assert_eq!(exact.remaining_after(), 0.0);

        let over = AllocationCheck::evaluate(85.0, BudgetPercentage::new(20.0).unwrap());
        assert!(!over.allowed);
        assert_eq!(over.remaining_after(), 0.0);
    }

    #[test]
    fn test_fail_open_remaining() {
        let user_id = Uuid::new_v4();
        assert_eq!(fail_open_remaining(user_id, Ok(Some(42.0))), 42.0);
        assert_eq!(fail_open_remaining(user_id, Ok(None)), 100.0);
        let err = Err(StoreError::Unavailable("down".to_string()));
        assert_eq!(fail_open_remaining(user_id, err), 100.0);
    }

    #[test]
    fn test_fail_closed_allocation() {
        let user_id = Uuid::new_v4();
        let ok = AllocationCheck::evaluate(0.0, BudgetPercentage::ZERO);
        assert!(fail_closed_allocation(user_id, Ok(ok)));
        let err = Err(BudgetError::Store(StoreError::Unavailable("down".to_string())));
        assert!(!fail_closed_allocation(user_id, err));
    }
}
