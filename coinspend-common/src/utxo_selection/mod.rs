//! Unspent output selection
//!
//! - `types.rs` - [`UnspentOutput`](types::UnspentOutput) and
//!   [`SelectionResult`](types::SelectionResult)
//! - `selector.rs` - [`OutputSelector`](selector::OutputSelector), the
//!   single-output-first, largest-first greedy selector
//!
//! Selection runs before any transaction exists. Its result is handed to the
//! transaction builder unchanged, and the number of selected outputs is what
//! fee previews are computed from.
//!
//! # Security Considerations
//!
//! - Preferring one output over several avoids linking addresses on-chain
//! - The selector never sees keys; owner paths are opaque strings to it

pub mod selector;
pub mod types;
