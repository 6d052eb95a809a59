pub mod csv_export;
pub mod employee_filter;
