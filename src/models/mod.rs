pub mod deployment;
pub mod incident;
pub mod issue;
pub mod reconciliation;
pub mod report;
pub mod summary;
pub mod weekly;
