//! Pure presentation helpers: no store access, no errors.

pub mod dashboard;
pub mod employee;
pub mod format;
