/// Database models for DreamPip
///
/// Each model owns its SQL. Models do not keep derived data consistent on
/// their own: a task-list write must be paired with a budget recalculation,
/// which `budget::TaskListService` does for you.
///
/// # Models
///
/// - `user`: Accounts, denormalized budget totals and settings
/// - `task_list`: Shared task lists carrying a budget percentage

pub mod task_list;
pub mod user;
