//! Unsigned transaction assembly
//!
//! - `types.rs` - [`PaymentRequest`](types::PaymentRequest) and
//!   [`BuiltTransaction`](types::BuiltTransaction)
//! - `script.rs` - standard locking script checks and address parsing
//! - `builder.rs` - [`TransactionBuilder`](builder::TransactionBuilder)
//!
//! The builder performs no I/O and never touches keys. Its output is handed to
//! an external signer together with the keys resolved for each input.

pub mod builder;
pub mod script;
pub mod types;
