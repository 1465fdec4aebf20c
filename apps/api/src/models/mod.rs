pub mod application;
pub mod chain;
pub mod job;
