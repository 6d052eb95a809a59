pub mod attendance;
pub mod audit_log;
pub mod department;
pub mod employee;
pub mod role;
pub mod user;
