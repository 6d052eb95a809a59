//! The only write path for employees and departments.
//!
//! Every successful mutation made by an admin is followed by one audit row.
//! The audit insert is best-effort: a failure is logged and the mutation
//! still succeeds.

use chrono::{NaiveDate, Utc};
use serde_json::{Value, json};
use tracing::{info, warn};
use validator::{Validate, validate_email};

use crate::api::department::DepartmentForm;
use crate::api::employee::EmployeeForm;
use crate::auth::auth::Viewer;
use crate::auth::password::hash_password;
use crate::error::{AppError, write_failure};
use crate::model::{
    audit_log::{AuditAction, NewAuditLog, TargetType},
    department::{Department, DepartmentFields},
    employee::{Employee, EmployeeFields},
    role::Role,
    user::NewUser,
};
use crate::store::Store;

#[derive(Debug, Clone)]
pub enum Mutation {
    CreateEmployee(EmployeeForm),
    UpdateEmployee { id: String, form: EmployeeForm },
    DeleteEmployee { id: String },
    CreateDepartment(DepartmentForm),
    UpdateDepartment { id: String, form: DepartmentForm },
    DeleteDepartment { id: String },
}

#[derive(Debug, Clone)]
pub enum MutationOutcome {
    Employee(Employee),
    Department(Department),
    Deleted { id: String },
}

/// What the audit row says about a completed mutation.
struct AuditEntry {
    action: AuditAction,
    target_type: TargetType,
    target_id: Option<String>,
    details: Value,
}

pub struct MutationService<'a> {
    store: &'a dyn Store,
    default_password: &'a str,
}

fn updated_fields(columns: &[&str]) -> Value {
    json!({ "updated_fields": columns })
}

impl<'a> MutationService<'a> {
    pub fn new(store: &'a dyn Store, default_password: &'a str) -> Self {
        Self {
            store,
            default_password,
        }
    }

    /// Runs `mutation` for `viewer`. Only admins may write.
    pub async fn apply(
        &self,
        viewer: &Viewer,
        mutation: Mutation,
    ) -> Result<MutationOutcome, AppError> {
        viewer.require_admin()?;

        let (outcome, audit) = match mutation {
            Mutation::CreateEmployee(form) => self.create_employee(form).await?,
            Mutation::UpdateEmployee { id, form } => self.update_employee(id, form).await?,
            Mutation::DeleteEmployee { id } => self.delete_employee(id).await?,
            Mutation::CreateDepartment(form) => self.create_department(form).await?,
            Mutation::UpdateDepartment { id, form } => self.update_department(id, form).await?,
            Mutation::DeleteDepartment { id } => self.delete_department(id).await?,
        };

        if let Viewer::Admin(admin) = viewer {
            self.record(&admin.user_id, audit).await;
        }

        Ok(outcome)
    }

    async fn record(&self, admin_id: &str, audit: AuditEntry) {
        let entry = NewAuditLog {
            admin_id: admin_id.to_string(),
            action: audit.action,
            target_type: audit.target_type,
            target_id: audit.target_id,
            details: Some(audit.details),
        };

        if let Err(e) = self.store.insert_audit_log(&entry).await {
            warn!(
                error = %e,
                action = %entry.action,
                target_id = ?entry.target_id,
                "Failed to record audit log"
            );
        }
    }

    async fn create_employee(
        &self,
        form: EmployeeForm,
    ) -> Result<(MutationOutcome, AuditEntry), AppError> {
        form.validate()?;
        let user_email = form
            .user_email
            .clone()
            .ok_or_else(|| AppError::Validation(vec!["user_email: required".to_string()]))?;
        if !validate_email(&user_email) {
            return Err(AppError::Validation(vec!["user_email: invalid email".to_string()]));
        }

        let password_hash = hash_password(self.default_password).map_err(|e| {
            tracing::error!(error = %e, "Failed to hash default password");
            AppError::Internal("Error saving employee".to_string())
        })?;
        let new_user = NewUser {
            email: user_email,
            password_hash,
            role: form.user_role.unwrap_or(Role::Employee),
        };
        let fields = form.to_fields(Some(Utc::now().date_naive()))?;

        let (user, employee) = self
            .store
            .create_employee_with_user(new_user, fields)
            .await
            .map_err(write_failure("saving employee"))?;

        info!(employee_id = %employee.id, user_id = %user.id, "Employee created");

        let audit = AuditEntry {
            action: AuditAction::CreateEmployee,
            target_type: TargetType::Employee,
            target_id: Some(user.id),
            details: json!({ "employee_data": form }),
        };
        Ok((MutationOutcome::Employee(employee), audit))
    }

    async fn update_employee(
        &self,
        id: String,
        form: EmployeeForm,
    ) -> Result<(MutationOutcome, AuditEntry), AppError> {
        form.validate()?;
        let fields = form.to_fields(None)?;

        let employee = self
            .store
            .update_employee(&id, &fields)
            .await
            .map_err(write_failure("saving employee"))?
            .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

        info!(employee_id = %id, "Employee updated");

        let audit = AuditEntry {
            action: AuditAction::UpdateEmployee,
            target_type: TargetType::Employee,
            target_id: Some(id),
            details: updated_fields(&EmployeeFields::COLUMNS),
        };
        Ok((MutationOutcome::Employee(employee), audit))
    }

    async fn delete_employee(&self, id: String) -> Result<(MutationOutcome, AuditEntry), AppError> {
        let deleted = self
            .store
            .delete_employee(&id)
            .await
            .map_err(write_failure("deleting employee"))?;
        if !deleted {
            return Err(AppError::NotFound("Employee not found".to_string()));
        }

        info!(employee_id = %id, "Employee deleted");

        let audit = AuditEntry {
            action: AuditAction::DeleteEmployee,
            target_type: TargetType::Employee,
            target_id: Some(id.clone()),
            details: json!({ "employee_id": id }),
        };
        Ok((MutationOutcome::Deleted { id }, audit))
    }

    async fn create_department(
        &self,
        form: DepartmentForm,
    ) -> Result<(MutationOutcome, AuditEntry), AppError> {
        form.validate()?;

        let department = self
            .store
            .create_department(&form.to_fields())
            .await
            .map_err(write_failure("saving department"))?;

        info!(department_id = %department.id, "Department created");

        let audit = AuditEntry {
            action: AuditAction::CreateDepartment,
            target_type: TargetType::Department,
            target_id: None,
            details: json!({ "department_data": form }),
        };
        Ok((MutationOutcome::Department(department), audit))
    }

    async fn update_department(
        &self,
        id: String,
        form: DepartmentForm,
    ) -> Result<(MutationOutcome, AuditEntry), AppError> {
        form.validate()?;

        let department = self
            .store
            .update_department(&id, &form.to_fields())
            .await
            .map_err(write_failure("saving department"))?
            .ok_or_else(|| AppError::NotFound("Department not found".to_string()))?;

        info!(department_id = %id, "Department updated");

        let audit = AuditEntry {
            action: AuditAction::UpdateDepartment,
            target_type: TargetType::Department,
            target_id: Some(id),
            details: updated_fields(&DepartmentFields::COLUMNS),
        };
        Ok((MutationOutcome::Department(department), audit))
    }

    async fn delete_department(
        &self,
        id: String,
    ) -> Result<(MutationOutcome, AuditEntry), AppError> {
        let deleted = self
            .store
            .delete_department(&id)
            .await
            .map_err(write_failure("deleting department"))?;
        if !deleted {
            return Err(AppError::NotFound("Department not found".to_string()));
        }

        info!(department_id = %id, "Department deleted");

        let audit = AuditEntry {
            action: AuditAction::DeleteDepartment,
            target_type: TargetType::Department,
            target_id: Some(id.clone()),
            details: json!({ "department_id": id }),
        };
        Ok((MutationOutcome::Deleted { id }, audit))
    }
}

/// `None` for a missing or blank optional text field.
pub fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub(crate) fn required_date(
    value: Option<NaiveDate>,
    default: Option<NaiveDate>,
) -> Result<NaiveDate, AppError> {
    value
        .or(default)
        .ok_or_else(|| AppError::Validation(vec!["date_of_joining: required".to_string()]))
}
