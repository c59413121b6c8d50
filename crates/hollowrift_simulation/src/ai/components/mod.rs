//! AI components

pub mod attacks;
pub mod fsm;


// Re-export all components
pub use attacks::*;
pub use fsm::*;
