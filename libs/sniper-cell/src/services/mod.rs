pub mod check;
pub mod scheduler;

pub use check::CheckOrchestrator;
pub use scheduler::run_every;
