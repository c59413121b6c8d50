//! AI systems

pub mod attacks;
pub mod fsm;


// Re-export all systems
pub use attacks::*;
pub use fsm::*;
