use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::{FromRow, MySql, MySqlPool, QueryBuilder, types::Json};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use crate::model::{
    attendance::{Attendance, AttendanceFilter, AttendanceStatus, NewAttendance},
    audit_log::{AuditAction, AuditLog, AuditLogFilter, NewAuditLog, TargetType},
    department::{Department, DepartmentFields, DepartmentRef, ManagerRef},
    employee::{Employee, EmployeeFields},
    role::Role,
    user::{NewUser, User, UserRef},
};
use crate::store::{
    AttendanceStore, AuditLogStore, DepartmentStore, EmployeeStore, SessionStore, StoreError,
    StoreResult, UserStore,
};

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id, e.user_id, e.name, e.email, e.phone, e.department_id, e.job_title,
        e.salary, e.date_of_joining, e.created_at,
        d.name AS department_name,
        u.email AS user_email,
        u.role AS user_role
    FROM employees e
    LEFT JOIN departments d ON d.id = e.department_id
    LEFT JOIN users u ON u.id = e.user_id
"#;

const DEPARTMENT_SELECT: &str = r#"
    SELECT
        d.id, d.name, d.manager_id, d.created_at,
        m.name AS manager_name,
        m.email AS manager_email,
        (SELECT COUNT(*) FROM employees e WHERE e.department_id = d.id) AS employee_count
    FROM departments d
    LEFT JOIN employees m ON m.id = d.manager_id
"#;

fn parse<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = {value:?}")))
}

#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> StoreResult<Self> {
        Ok(User {
            role: parse("users.role", &row.role)?,
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct EmployeeRow {
    id: String,
    user_id: Option<String>,
    name: String,
    email: String,
    phone: Option<String>,
    department_id: Option<String>,
    job_title: Option<String>,
    salary: Option<f64>,
    date_of_joining: NaiveDate,
    created_at: DateTime<Utc>,
    department_name: Option<String>,
    user_email: Option<String>,
    user_role: Option<String>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> StoreResult<Self> {
        let department = match (&row.department_id, row.department_name) {
            (Some(id), Some(name)) => Some(DepartmentRef { id: id.clone(), name }),
            _ => None,
        };
        let user = match (&row.user_id, row.user_email, row.user_role) {
            (Some(id), Some(email), Some(role)) => Some(UserRef {
                id: id.clone(),
                email,
                role: parse::<Role>("users.role", &role)?,
            }),
            _ => None,
        };

        Ok(Employee {
            id: row.id,
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            department_id: row.department_id,
            job_title: row.job_title,
            salary: row.salary,
            date_of_joining: row.date_of_joining,
            created_at: row.created_at,
            department,
            user,
        })
    }
}

#[derive(FromRow)]
struct DepartmentRow {
    id: String,
    name: String,
    manager_id: Option<String>,
    created_at: DateTime<Utc>,
    manager_name: Option<String>,
    manager_email: Option<String>,
    employee_count: i64,
}

impl From<DepartmentRow> for Department {
    fn from(row: DepartmentRow) -> Self {
        let manager = match (&row.manager_id, row.manager_name, row.manager_email) {
            (Some(id), Some(name), Some(email)) => Some(ManagerRef {
                id: id.clone(),
                name,
                email,
            }),
            _ => None,
        };

        Department {
            id: row.id,
            name: row.name,
            manager_id: row.manager_id,
            created_at: row.created_at,
            manager,
            employee_count: Some(row.employee_count),
        }
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: String,
    employee_id: String,
    date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> StoreResult<Self> {
        Ok(Attendance {
            status: parse::<AttendanceStatus>("attendance.status", &row.status)?,
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct AuditLogRow {
    id: String,
    admin_id: String,
    action: String,
    target_type: String,
    target_id: Option<String>,
    details: Option<Json<Value>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AuditLogRow> for AuditLog {
    type Error = StoreError;

    fn try_from(row: AuditLogRow) -> StoreResult<Self> {
        Ok(AuditLog {
            action: parse::<AuditAction>("audit_logs.action", &row.action)?,
            target_type: parse::<TargetType>("audit_logs.target_type", &row.target_type)?,
            id: row.id,
            admin_id: row.admin_id,
            target_id: row.target_id,
            details: row.details.map(|json| json.0),
            created_at: row.created_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

fn push_clause(builder: &mut QueryBuilder<'_, MySql>, has_clause: &mut bool) {
    if *has_clause {
        builder.push(" AND ");
    } else {
        builder.push(" WHERE ");
        *has_clause = true;
    }
}

#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn fetch_department(&self, id: &str) -> StoreResult<Option<Department>> {
        let sql = format!("{DEPARTMENT_SELECT} WHERE d.id = ?");
        let row = sqlx::query_as::<_, DepartmentRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Department::from))
    }
}

#[async_trait]
impl UserStore for MySqlStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, password_hash, role, created_at
            FROM users
            WHERE LOWER(email) = LOWER(?)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        sqlx::query_as::<_, UserRow>(
            "SELECT id, email, password_hash, role, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(User::try_from)
        .transpose()
    }
}

#[async_trait]
impl SessionStore for MySqlStore {
    async fn store_refresh_token(
        &self,
        user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ? AND revoked = FALSE AND expires_at > UTC_TIMESTAMP()
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} ORDER BY e.created_at DESC");
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_employee_by_user(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.user_id = ? LIMIT 1");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn create_employee_with_user(
        &self,
        user: NewUser,
        fields: EmployeeFields,
    ) -> StoreResult<(User, Employee)> {
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
        };
        let employee_id = Uuid::new_v4().to_string();

        // Dropping the transaction on an early return rolls both inserts back.
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_ref())
        .bind(user.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("Email already exists".to_string()),
            other => other,
        })?;

        sqlx::query(
            r#"
            INSERT INTO employees
            (id, user_id, name, email, phone, department_id, job_title, salary, date_of_joining, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&employee_id)
        .bind(&user.id)
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.department_id)
        .bind(&fields.job_title)
        .bind(fields.salary)
        .bind(fields.date_of_joining)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(user_id = %user.id, employee_id = %employee_id, "Created employee with login");

        let employee = self.get_employee(&employee_id).await?.ok_or_else(|| {
            StoreError::Corrupt(format!("employee {employee_id} vanished after insert"))
        })?;

        Ok((user, employee))
    }

    async fn update_employee(
        &self,
        id: &str,
        fields: &EmployeeFields,
    ) -> StoreResult<Option<Employee>> {
        // MySQL reports zero affected rows for a no-op update, so existence
        // is checked separately.
        if self.get_employee(id).await?.is_none() {
            return Ok(None);
        }

        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, email = ?, phone = ?, department_id = ?, job_title = ?,
                salary = ?, date_of_joining = ?
            WHERE id = ?
            "#,
        )
        .bind(&fields.name)
        .bind(&fields.email)
        .bind(&fields.phone)
        .bind(&fields.department_id)
        .bind(&fields.job_title)
        .bind(fields.salary)
        .bind(fields.date_of_joining)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_employee(id).await
    }

    async fn delete_employee(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM employees WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_employees(&self) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn recent_hires(&self, since: NaiveDate, limit: i64) -> StoreResult<Vec<Employee>> {
        let sql = format!(
            "{EMPLOYEE_SELECT} WHERE e.date_of_joining >= ? ORDER BY e.created_at DESC LIMIT ?"
        );
        let rows = sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(since)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }
}

#[async_trait]
impl DepartmentStore for MySqlStore {
    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        let sql = format!("{DEPARTMENT_SELECT} ORDER BY d.name");
        let rows = sqlx::query_as::<_, DepartmentRow>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Department::from).collect())
    }

    async fn create_department(&self, fields: &DepartmentFields) -> StoreResult<Department> {
        let id = Uuid::new_v4().to_string();
        sqlx::query(
            r#"
            INSERT INTO departments (id, name, manager_id, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&fields.name)
        .bind(&fields.manager_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.fetch_department(&id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("department {id} vanished after insert")))
    }

    async fn update_department(
        &self,
        id: &str,
        fields: &DepartmentFields,
    ) -> StoreResult<Option<Department>> {
        if self.fetch_department(id).await?.is_none() {
            return Ok(None);
        }

        sqlx::query("UPDATE departments SET name = ?, manager_id = ? WHERE id = ?")
            .bind(&fields.name)
            .bind(&fields.manager_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.fetch_department(id).await
    }

    async fn delete_department(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM departments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_departments(&self) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM departments")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT id, employee_id, date, status, created_at FROM attendance",
        );
        let mut has_clause = false;
        if let Some(employee_id) = filter.employee_id.as_ref() {
            push_clause(&mut builder, &mut has_clause);
            builder.push("employee_id = ").push_bind(employee_id.clone());
        }
        if let Some(date) = filter.date {
            push_clause(&mut builder, &mut has_clause);
            builder.push("date = ").push_bind(date);
        }
        builder.push(" ORDER BY date DESC, created_at DESC");

        let rows = builder
            .build_query_as::<AttendanceRow>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    async fn count_attendance(
        &self,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM attendance WHERE date = ? AND status = ?",
        )
        .bind(date)
        .bind(status.as_ref())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    async fn record_attendance(&self, record: &NewAttendance) -> StoreResult<Attendance> {
        sqlx::query(
            r#"
            INSERT INTO attendance (id, employee_id, date, status, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE status = VALUES(status)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&record.employee_id)
        .bind(record.date)
        .bind(record.status.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, employee_id, date, status, created_at
            FROM attendance
            WHERE employee_id = ? AND date = ?
            "#,
        )
        .bind(&record.employee_id)
        .bind(record.date)
        .fetch_one(&self.pool)
        .await?;
        Attendance::try_from(row)
    }
}

#[async_trait]
impl AuditLogStore for MySqlStore {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> StoreResult<AuditLog> {
        let log = AuditLog {
            id: Uuid::new_v4().to_string(),
            admin_id: entry.admin_id.clone(),
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id.clone(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, admin_id, action, target_type, target_id, details, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&log.id)
        .bind(&log.admin_id)
        .bind(log.action.as_ref())
        .bind(log.target_type.as_ref())
        .bind(&log.target_id)
        .bind(log.details.clone().map(Json))
        .bind(log.created_at)
        .execute(&self.pool)
        .await?;

        Ok(log)
    }

    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> StoreResult<Vec<AuditLog>> {
        let mut builder: QueryBuilder<MySql> = QueryBuilder::new(
            "SELECT id, admin_id, action, target_type, target_id, details, created_at FROM audit_logs",
        );
        let mut has_clause = false;
        if let Some(action) = filter.action {
            push_clause(&mut builder, &mut has_clause);
            builder.push("action = ").push_bind(action.as_ref().to_string());
        }
        if let Some(target_type) = filter.target_type {
            push_clause(&mut builder, &mut has_clause);
            builder
                .push("target_type = ")
                .push_bind(target_type.as_ref().to_string());
        }
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(filter.effective_limit() as i64);

        let rows = builder
            .build_query_as::<AuditLogRow>()
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }
}
