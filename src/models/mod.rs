pub mod application;
pub mod audit_log;
pub mod job;
pub mod user;
