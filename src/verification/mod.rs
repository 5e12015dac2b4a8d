//! Partner review of submitted mission proof.
//!
//! A participant is reviewed as a whole: every mission log they hold in a campaign must be
//! waiting for verification before it can be approved or rejected. Approval is two
//! best-effort steps, flipping the logs and then crediting points, and a failure to credit
//! points does not undo the flip.

pub mod endpoints;
pub mod manager;
pub use endpoints::*;
