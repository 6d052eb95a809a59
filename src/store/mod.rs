//! Data access for the four domain tables, the audit log and refresh tokens.
//!
//! Handlers only see `dyn Store`; production uses [`mysql::MySqlStore`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use derive_more::Display;

use crate::model::{
    attendance::{Attendance, AttendanceFilter, AttendanceStatus, NewAttendance},
    audit_log::{AuditLog, AuditLogFilter, NewAuditLog},
    department::{Department, DepartmentFields},
    employee::{Employee, EmployeeFields},
    user::{NewUser, User},
};

pub mod mysql;

#[cfg(test)]
pub mod memory;

#[derive(Debug, Display)]
pub enum StoreError {
    /// A unique key already holds this value.
    #[display(fmt = "conflict: {}", _0)]
    Conflict(String),
    /// A foreign key points at a missing row.
    #[display(fmt = "invalid reference: {}", _0)]
    InvalidReference(String),
    /// A stored value could not be mapped onto the model.
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict("Duplicate entry".to_string());
            }
            if db_err.is_foreign_key_violation() {
                return StoreError::InvalidReference("Referenced record does not exist".to_string());
            }
        }
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Case-insensitive lookup.
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user(&self, id: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn store_refresh_token(
        &self,
        user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;

    /// Revokes an active, unexpired token. Returns false when the token was
    /// unknown, expired, or already revoked.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool>;
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// All employees joined with department and user, newest first.
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>>;
    async fn find_employee_by_user(&self, user_id: &str) -> StoreResult<Option<Employee>>;

    /// Inserts the login account and the employee that references it as one
    /// unit; on any failure neither row is kept.
    async fn create_employee_with_user(
        &self,
        user: NewUser,
        fields: EmployeeFields,
    ) -> StoreResult<(User, Employee)>;

    /// `None` when no employee has this id.
    async fn update_employee(
        &self,
        id: &str,
        fields: &EmployeeFields,
    ) -> StoreResult<Option<Employee>>;
    async fn delete_employee(&self, id: &str) -> StoreResult<bool>;

    async fn count_employees(&self) -> StoreResult<i64>;
    /// Employees joined on or after `since`, newest `created_at` first.
    async fn recent_hires(&self, since: NaiveDate, limit: i64) -> StoreResult<Vec<Employee>>;
}

#[async_trait]
pub trait DepartmentStore: Send + Sync {
    /// Ordered by name, with manager summary and head count.
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn create_department(&self, fields: &DepartmentFields) -> StoreResult<Department>;
    async fn update_department(
        &self,
        id: &str,
        fields: &DepartmentFields,
    ) -> StoreResult<Option<Department>>;
    async fn delete_department(&self, id: &str) -> StoreResult<bool>;
    async fn count_departments(&self) -> StoreResult<i64>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Newest date first.
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>>;
    async fn count_attendance(&self, date: NaiveDate, status: AttendanceStatus)
    -> StoreResult<i64>;
    /// One row per employee and date; a second record replaces the status.
    async fn record_attendance(&self, record: &NewAttendance) -> StoreResult<Attendance>;
}

#[async_trait]
pub trait AuditLogStore: Send + Sync {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> StoreResult<AuditLog>;
    /// Newest first, at most `filter.effective_limit()` rows.
    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> StoreResult<Vec<AuditLog>>;
}

pub trait Store:
    UserStore + SessionStore + EmployeeStore + DepartmentStore + AttendanceStore + AuditLogStore
{
}

impl<T> Store for T where
    T: UserStore + SessionStore + EmployeeStore + DepartmentStore + AttendanceStore + AuditLogStore
{
}
