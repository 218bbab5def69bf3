//! Machine learning building blocks: scaling, splitting, the forest and its metrics.
//!
//! Everything here is deterministic given its seed so training runs can be reproduced.

pub mod evaluate;
pub mod forest;
pub mod metrics;
pub mod scaler;
pub mod split;
