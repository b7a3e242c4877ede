//! Request-side services shared by handlers.

mod validation;
pub use validation::*;
