//! **chatfn-rs**: expose Rust functions to chat models and drive the
//! function-calling conversation loop.
//!
//! ```rust,ignore
//! use chatfn::prelude::*;
//!
//! /// Adds two integers.
//! ///
//! /// # Arguments
//! /// * `a` - left operand
//! /// * `b` - right operand
//! #[function]
//! fn add(a: i64, b: i64) -> i64 {
//!     a + b
//! }
//!
//! let mut conversation = Conversation::new(backend);
//! conversation.add_function(add_function()?);
//! let answer = conversation.ask("What is 1 + 2?").await?;
//! ```

pub mod prelude;

pub use chatfn_core::*;
pub use chatfn_macros::{Describe, function};
