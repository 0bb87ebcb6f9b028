//! Domain Services
//!
//! Pure rules over ticket snapshots. Nothing here performs I/O.

pub mod permissions;
pub mod workflow;
pub mod sla;
pub mod escalation;
pub mod tagging;

pub use permissions::*;
pub use workflow::*;
pub use sla::*;
pub use escalation::*;
pub use tagging::*;
