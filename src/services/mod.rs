pub mod analyzer;
pub mod processor;
pub mod status;
pub mod submission;
