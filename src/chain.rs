// Thin re-export module: implementation is in `chain/core.rs` to allow
// progressive decomposition of chain responsibilities (validation,
// forest management, state transitions).

pub mod core;
pub use core::*;
