/// API route handlers, one module per resource
///
/// - `health`: Liveness and storage probe
/// - `budget`: Budget summary, remaining budget, allocation checks
/// - `task_lists`: Task-list CRUD that keeps budget totals in step
/// - `settings`: Typed user settings

pub mod budget;
pub mod health;
pub mod settings;
pub mod task_lists;
