pub mod classifier;
pub mod deployment;
pub mod distribution;
pub mod incidents;
pub mod reconcile;
pub mod resolution;
pub mod weekly;
