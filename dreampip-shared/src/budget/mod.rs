/// Budget allocation accounting
///
/// Users split a notional 100% budget across the task lists they own. This
/// module keeps the per-user totals consistent with those lists and refuses
/// allocations that would take a user past 100%.
///
/// # Modules
///
/// - `ledger`: Recalculation, remaining-budget reads and allocation checks
/// - `service`: Task-list and settings writes that honour the ledger contract
/// - `store`: Storage trait the ledger runs on
/// - `postgres` / `memory`: Store implementations
/// - `percentage`: Range-checked budget share
/// - `error`: Error types

pub mod error;
pub mod ledger;
pub mod memory;
pub mod percentage;
pub mod postgres;
pub mod service;
pub mod store;

pub use error::{BudgetError, BudgetResult, StoreError, StoreResult};
pub use ledger::{AllocationCheck, AllocationLine, BudgetLedger, BudgetSummary, BudgetTotals};
pub use memory::MemoryBudgetStore;
pub use percentage::{BudgetPercentage, BUDGET_CEILING};
pub use postgres::PgBudgetStore;
pub use service::{NewTaskList, SettingsService, TaskListService};
pub use store::BudgetStore;
