//! Pipeline engine.
//!
//! - `gate` — decides whether the market trades today.
//! - `universe` — builds the ranked instrument universe.
//! - `scanner` — drives a predicate over the universe.

pub mod gate;
pub mod scanner;
pub mod universe;
