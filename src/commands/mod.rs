pub mod bugs;
pub mod deployment;
pub mod ingest;
pub mod output;
pub mod quality;
pub mod reports;
pub mod settings;
pub mod summary;
pub mod weekly;
