pub mod aws;
pub mod config;
pub mod envelope;
pub mod health;
pub mod observability;
pub mod queue;
pub mod storage;
pub mod worker;
