//! Numeric analysis routines shared by the pattern predicates.
//!
//! Pure functions over price arrays: local-extrema detection, ordinary
//! least-squares trend fitting, and moving-average disparity.

pub mod extrema;
pub mod indicators;
pub mod trendline;

pub use extrema::local_minima;
pub use indicators::{disparity, sma};
pub use trendline::{fit_line, LineFit};
