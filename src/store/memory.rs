//! In-process store used by the handler and service tests.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::model::{
    attendance::{Attendance, AttendanceFilter, AttendanceStatus, NewAttendance},
    audit_log::{AuditLog, AuditLogFilter, NewAuditLog},
    department::{Department, DepartmentFields, DepartmentRef, ManagerRef},
    employee::{Employee, EmployeeFields},
    user::{NewUser, User, UserRef},
};
use crate::store::{
    AttendanceStore, AuditLogStore, DepartmentStore, EmployeeStore, SessionStore, StoreError,
    StoreResult, UserStore,
};

struct RefreshToken {
    jti: String,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    employees: Vec<Employee>,
    departments: Vec<Department>,
    attendance: Vec<Attendance>,
    audit_logs: Vec<AuditLog>,
    refresh_tokens: Vec<RefreshToken>,
    /// Monotonic clock so "newest first" orderings are deterministic.
    tick: i64,
}

impl State {
    fn now(&mut self) -> DateTime<Utc> {
        self.tick += 1;
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap_or_default()
            + Duration::seconds(self.tick)
    }

    fn joined(&self, employee: &Employee) -> Employee {
        let mut employee = employee.clone();
        employee.department = employee.department_id.as_ref().and_then(|id| {
            self.departments.iter().find(|d| &d.id == id).map(|d| DepartmentRef {
                id: d.id.clone(),
                name: d.name.clone(),
            })
        });
        employee.user = employee
            .user_id
            .as_ref()
            .and_then(|id| self.users.iter().find(|u| &u.id == id))
            .map(UserRef::from);
        employee
    }

    fn department_view(&self, department: &Department) -> Department {
        let mut department = department.clone();
        department.manager = department.manager_id.as_ref().and_then(|id| {
            self.employees.iter().find(|e| &e.id == id).map(|e| ManagerRef {
                id: e.id.clone(),
                name: e.name.clone(),
                email: e.email.clone(),
            })
        });
        department.employee_count = Some(
            self.employees
                .iter()
                .filter(|e| e.department_id.as_deref() == Some(department.id.as_str()))
                .count() as i64,
        );
        department
    }

    fn check_department(&self, department_id: &Option<String>) -> StoreResult<()> {
        match department_id {
            Some(id) if !self.departments.iter().any(|d| &d.id == id) => Err(
                StoreError::InvalidReference("Referenced record does not exist".to_string()),
            ),
            _ => Ok(()),
        }
    }

    fn check_manager(&self, manager_id: &Option<String>) -> StoreResult<()> {
        match manager_id {
            Some(id) if !self.employees.iter().any(|e| &e.id == id) => Err(
                StoreError::InvalidReference("Referenced record does not exist".to_string()),
            ),
            _ => Ok(()),
        }
    }
}

/// Rows live in a mutex; the fault switches make the next matching write fail.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_audit: AtomicBool,
    fail_employee_insert: AtomicBool,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory store poisoned")
    }

    fn check_reads(&self) -> StoreResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("reads disabled".to_string()))
        } else {
            Ok(())
        }
    }

    pub fn fail_audit_inserts(&self, fail: bool) {
        self.fail_audit.store(fail, Ordering::SeqCst);
    }

    pub fn fail_employee_inserts(&self, fail: bool) {
        self.fail_employee_insert.store(fail, Ordering::SeqCst);
    }

    pub fn fail_all_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn seed_user(&self, email: &str, password_hash: &str, role: crate::model::role::Role) -> User {
        let mut state = self.state();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            created_at: state.now(),
        };
        state.users.push(user.clone());
        user
    }

    pub fn seed_employee(&self, user_id: Option<&str>, fields: EmployeeFields) -> Employee {
        let mut state = self.state();
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            department_id: fields.department_id,
            job_title: fields.job_title,
            salary: fields.salary,
            date_of_joining: fields.date_of_joining,
            created_at: state.now(),
            department: None,
            user: None,
        };
        state.employees.push(employee.clone());
        state.joined(&employee)
    }

    pub fn users(&self) -> Vec<User> {
        self.state().users.clone()
    }

    pub fn employees(&self) -> Vec<Employee> {
        self.state().employees.clone()
    }

    pub fn departments(&self) -> Vec<Department> {
        self.state().departments.clone()
    }

    pub fn audit_logs(&self) -> Vec<AuditLog> {
        self.state().audit_logs.clone()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check_reads()?;
        let email = email.to_lowercase();
        Ok(self
            .state()
            .users
            .iter()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn find_user(&self, id: &str) -> StoreResult<Option<User>> {
        self.check_reads()?;
        Ok(self.state().users.iter().find(|u| u.id == id).cloned())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn store_refresh_token(
        &self,
        _user_id: &str,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        self.state().refresh_tokens.push(RefreshToken {
            jti: jti.to_string(),
            expires_at,
            revoked: false,
        });
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let mut state = self.state();
        let now = Utc::now();
        match state
            .refresh_tokens
            .iter_mut()
            .find(|t| t.jti == jti && !t.revoked && t.expires_at > now)
        {
            Some(token) => {
                token.revoked = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        self.check_reads()?;
        let state = self.state();
        let mut employees: Vec<Employee> =
            state.employees.iter().map(|e| state.joined(e)).collect();
        employees.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(employees)
    }

    async fn get_employee(&self, id: &str) -> StoreResult<Option<Employee>> {
        self.check_reads()?;
        let state = self.state();
        Ok(state.employees.iter().find(|e| e.id == id).map(|e| state.joined(e)))
    }

    async fn find_employee_by_user(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        self.check_reads()?;
        let state = self.state();
        Ok(state
            .employees
            .iter()
            .find(|e| e.user_id.as_deref() == Some(user_id))
            .map(|e| state.joined(e)))
    }

    async fn create_employee_with_user(
        &self,
        user: NewUser,
        fields: EmployeeFields,
    ) -> StoreResult<(User, Employee)> {
        let mut state = self.state();
        let email = user.email.to_lowercase();
        if state.users.iter().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::Conflict("Email already exists".to_string()));
        }
        // Both rows are validated before either is written.
        state.check_department(&fields.department_id)?;
        if self.fail_employee_insert.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("employee insert failed".to_string()));
        }

        let now = state.now();
        let user = User {
            id: Uuid::new_v4().to_string(),
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: now,
        };
        let employee = Employee {
            id: Uuid::new_v4().to_string(),
            user_id: Some(user.id.clone()),
            name: fields.name,
            email: fields.email,
            phone: fields.phone,
            department_id: fields.department_id,
            job_title: fields.job_title,
            salary: fields.salary,
            date_of_joining: fields.date_of_joining,
            created_at: now,
            department: None,
            user: None,
        };
        state.users.push(user.clone());
        state.employees.push(employee.clone());
        let employee = state.joined(&employee);
        Ok((user, employee))
    }

    async fn update_employee(
        &self,
        id: &str,
        fields: &EmployeeFields,
    ) -> StoreResult<Option<Employee>> {
        let mut state = self.state();
        state.check_department(&fields.department_id)?;
        let Some(employee) = state.employees.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        employee.name = fields.name.clone();
        employee.email = fields.email.clone();
        employee.phone = fields.phone.clone();
        employee.department_id = fields.department_id.clone();
        employee.job_title = fields.job_title.clone();
        employee.salary = fields.salary;
        employee.date_of_joining = fields.date_of_joining;
        let employee = employee.clone();
        Ok(Some(state.joined(&employee)))
    }

    async fn delete_employee(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.employees.len();
        state.employees.retain(|e| e.id != id);
        let deleted = state.employees.len() != before;
        if deleted {
            for department in state.departments.iter_mut() {
                if department.manager_id.as_deref() == Some(id) {
                    department.manager_id = None;
                }
            }
            state.attendance.retain(|a| a.employee_id != id);
        }
        Ok(deleted)
    }

    async fn count_employees(&self) -> StoreResult<i64> {
        self.check_reads()?;
        Ok(self.state().employees.len() as i64)
    }

    async fn recent_hires(&self, since: NaiveDate, limit: i64) -> StoreResult<Vec<Employee>> {
        let mut hires: Vec<Employee> = self
            .list_employees()
            .await?
            .into_iter()
            .filter(|e| e.date_of_joining >= since)
            .collect();
        hires.truncate(limit.max(0) as usize);
        Ok(hires)
    }
}

#[async_trait]
impl DepartmentStore for MemoryStore {
    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        self.check_reads()?;
        let state = self.state();
        let mut departments: Vec<Department> = state
            .departments
            .iter()
            .map(|d| state.department_view(d))
            .collect();
        departments.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(departments)
    }

    async fn create_department(&self, fields: &DepartmentFields) -> StoreResult<Department> {
        let mut state = self.state();
        state.check_manager(&fields.manager_id)?;
        let department = Department {
            id: Uuid::new_v4().to_string(),
            name: fields.name.clone(),
            manager_id: fields.manager_id.clone(),
            created_at: state.now(),
            manager: None,
            employee_count: None,
        };
        state.departments.push(department.clone());
        Ok(state.department_view(&department))
    }

    async fn update_department(
        &self,
        id: &str,
        fields: &DepartmentFields,
    ) -> StoreResult<Option<Department>> {
        let mut state = self.state();
        state.check_manager(&fields.manager_id)?;
        let Some(department) = state.departments.iter_mut().find(|d| d.id == id) else {
            return Ok(None);
        };
        department.name = fields.name.clone();
        department.manager_id = fields.manager_id.clone();
        let department = department.clone();
        Ok(Some(state.department_view(&department)))
    }

    async fn delete_department(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state();
        let before = state.departments.len();
        state.departments.retain(|d| d.id != id);
        let deleted = state.departments.len() != before;
        if deleted {
            for employee in state.employees.iter_mut() {
                if employee.department_id.as_deref() == Some(id) {
                    employee.department_id = None;
                }
            }
        }
        Ok(deleted)
    }

    async fn count_departments(&self) -> StoreResult<i64> {
        self.check_reads()?;
        Ok(self.state().departments.len() as i64)
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn list_attendance(&self, filter: &AttendanceFilter) -> StoreResult<Vec<Attendance>> {
        self.check_reads()?;
        let mut rows: Vec<Attendance> = self
            .state()
            .attendance
            .iter()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
        Ok(rows)
    }

    async fn count_attendance(
        &self,
        date: NaiveDate,
        status: AttendanceStatus,
    ) -> StoreResult<i64> {
        self.check_reads()?;
        Ok(self
            .state()
            .attendance
            .iter()
            .filter(|a| a.date == date && a.status == status)
            .count() as i64)
    }

    async fn record_attendance(&self, record: &NewAttendance) -> StoreResult<Attendance> {
        let mut state = self.state();
        if !state.employees.iter().any(|e| e.id == record.employee_id) {
            return Err(StoreError::InvalidReference(
                "Referenced record does not exist".to_string(),
            ));
        }
        if let Some(existing) = state
            .attendance
            .iter_mut()
            .find(|a| a.employee_id == record.employee_id && a.date == record.date)
        {
            existing.status = record.status;
            return Ok(existing.clone());
        }
        let row = Attendance {
            id: Uuid::new_v4().to_string(),
            employee_id: record.employee_id.clone(),
            date: record.date,
            status: record.status,
            created_at: state.now(),
        };
        state.attendance.push(row.clone());
        Ok(row)
    }
}

#[async_trait]
impl AuditLogStore for MemoryStore {
    async fn insert_audit_log(&self, entry: &NewAuditLog) -> StoreResult<AuditLog> {
        if self.fail_audit.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("audit log insert failed".to_string()));
        }
        let mut state = self.state();
        let log = AuditLog {
            id: Uuid::new_v4().to_string(),
            admin_id: entry.admin_id.clone(),
            action: entry.action,
            target_type: entry.target_type,
            target_id: entry.target_id.clone(),
            details: entry.details.clone(),
            created_at: state.now(),
        };
        state.audit_logs.push(log.clone());
        Ok(log)
    }

    async fn list_audit_logs(&self, filter: &AuditLogFilter) -> StoreResult<Vec<AuditLog>> {
        self.check_reads()?;
        let mut logs: Vec<AuditLog> = self
            .state()
            .audit_logs
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        logs.truncate(filter.effective_limit() as usize);
        Ok(logs)
    }
}
