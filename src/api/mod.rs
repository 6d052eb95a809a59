pub mod attendance;
pub mod audit_log;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod session;
