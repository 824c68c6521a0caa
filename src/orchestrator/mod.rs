//! Run orchestration: discovery, guarded sequential builds, assembly.

pub mod interrupt;
pub mod runner;
pub mod state;

pub use interrupt::Interrupt;
pub use runner::{Orchestrator, RunReport};
pub use state::RunState;
