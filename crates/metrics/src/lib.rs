//! Metrics for tortuga.
//!
//! Names live in [`definitions`]; record them with the re-exported `metrics`
//! facade macros. Nothing is exported until the host installs a recorder.
//!
//! ```rust,ignore
//! use tortuga_metrics::{counter, dispatch, labels};
//!
//! counter!(dispatch::EVENTS_TOTAL, labels::KIND => "slash").increment(1);
//! ```

mod definitions;

pub use definitions::*;

pub use metrics::{counter, gauge, histogram};
