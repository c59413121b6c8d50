//! Combat systems (damage pipeline, heal, death hook)

pub mod damage;

// Tests (separate files with _tests suffix)
#[cfg(test)]
mod damage_tests;

pub use damage::*;
