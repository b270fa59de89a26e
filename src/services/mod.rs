pub mod application_service;
pub mod audit_service;
pub mod feed_service;
pub mod job_service;
pub mod report_service;
pub mod upload_service;
pub mod user_service;
