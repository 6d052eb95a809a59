use actix_web::{HttpResponse, http::header, web};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use tracing::{debug, error};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    auth::auth::{DataScope, Viewer},
    config::Config,
    error::{AppError, read_failure},
    model::{
        employee::{Employee, EmployeeFields},
        role::Role,
    },
    service::mutation::{Mutation, MutationOutcome, MutationService, non_blank, required_date},
    store::Store,
    utils::{csv_export::employees_to_csv, employee_filter::EmployeeFilter},
    view::employee::EmployeeDetails,
};

/// Treats `""` like a missing date, the way the form sends an untouched field.
fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Treats `""` as absent text, so an untouched input reads as `None`.
fn blank_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty()))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SalaryInput {
    Number(f64),
    Text(String),
}

/// Accepts a JSON number or the text of an input field; `""` means no salary.
fn blank_salary<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<SalaryInput>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SalaryInput::Number(value)) => Ok(Some(value)),
        Some(SalaryInput::Text(text)) => match text.trim() {
            "" => Ok(None),
            value => value
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid salary {value:?}"))),
        },
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct EmployeeForm {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[validate(email(message = "invalid email"))]
    #[schema(example = "jane.doe@company.com", format = "email")]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department_id: Option<String>,
    #[serde(default)]
    pub job_title: Option<String>,
    #[validate(range(min = 0.0, message = "must not be negative"))]
    #[serde(default, deserialize_with = "blank_salary")]
    #[schema(example = 75000.0)]
    pub salary: Option<f64>,
    /// Defaults to today when creating.
    #[serde(default, deserialize_with = "blank_date")]
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub date_of_joining: Option<NaiveDate>,
    /// Login email of the account created with the employee. Create only,
    /// ignored on update.
    #[serde(default, deserialize_with = "blank_text")]
    pub user_email: Option<String>,
    /// Create only, defaults to `employee`.
    #[serde(default)]
    pub user_role: Option<Role>,
}

impl EmployeeForm {
    /// Column values with blank optional text stored as NULL.
    pub fn to_fields(&self, default_date: Option<NaiveDate>) -> Result<EmployeeFields, AppError> {
        Ok(EmployeeFields {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: non_blank(&self.phone),
            department_id: non_blank(&self.department_id),
            job_title: non_blank(&self.job_title),
            salary: self.salary,
            date_of_joining: required_date(self.date_of_joining, default_date)?,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeListResponse {
    pub data: Vec<Employee>,
    #[schema(example = 10)]
    pub total: usize,
}

#[derive(Serialize, ToSchema)]
pub struct EmployeeDetailResponse {
    pub employee: Employee,
    pub details: EmployeeDetails,
}

/// Employees the viewer may see: everyone for admins, the linked record for
/// employees.
pub async fn visible_employees(store: &dyn Store, viewer: &Viewer) -> Result<Vec<Employee>, AppError> {
    match viewer.scope() {
        DataScope::All => store
            .list_employees()
            .await
            .map_err(read_failure("fetching employees")),
        DataScope::OwnRecord { user_id } => Ok(store
            .find_employee_by_user(&user_id)
            .await
            .map_err(read_failure("fetching employees"))?
            .into_iter()
            .collect()),
    }
}

#[utoipa::path(
    get,
    path = "/api/employees",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "Filtered employee list, newest first", body = EmployeeListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, AppError> {
    let employees = visible_employees(store.get_ref(), &viewer).await?;
    let data = query.apply(employees);
    debug!(total = data.len(), role = %viewer.role(), "Listed employees");

    Ok(HttpResponse::Ok().json(EmployeeListResponse {
        total: data.len(),
        data,
    }))
}

#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Employee found", body = EmployeeDetailResponse),
        (status = 403, description = "Another employee's record"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employee_id = path.into_inner();

    let employee = store
        .get_employee(&employee_id)
        .await
        .map_err(read_failure("fetching employee"))?
        .ok_or_else(|| AppError::NotFound("Employee not found".to_string()))?;

    if let DataScope::OwnRecord { user_id } = viewer.scope() {
        if employee.user_id.as_deref() != Some(user_id.as_str()) {
            return Err(AppError::Forbidden("Access denied".to_string()));
        }
    }

    Ok(HttpResponse::Ok().json(EmployeeDetailResponse {
        details: EmployeeDetails::from(&employee),
        employee,
    }))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeForm,
    responses(
        (status = 201, description = "Employee and login account created", body = Employee),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Login email already exists"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "error": "Error saving employee"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<EmployeeForm>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);

    match service
        .apply(&viewer, Mutation::CreateEmployee(payload.into_inner()))
        .await?
    {
        MutationOutcome::Employee(employee) => Ok(HttpResponse::Created().json(employee)),
        other => unexpected(other),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    request_body = EmployeeForm,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<EmployeeForm>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);
    let mutation = Mutation::UpdateEmployee {
        id: path.into_inner(),
        form: payload.into_inner(),
    };

    match service.apply(&viewer, mutation).await? {
        MutationOutcome::Employee(employee) => Ok(HttpResponse::Ok().json(employee)),
        other => unexpected(other),
    }
}

/// Delete Employee
#[utoipa::path(
    delete,
    path = "/api/employees/{employee_id}",
    params(("employee_id", Path, description = "Employee ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);
    let outcome = service
        .apply(&viewer, Mutation::DeleteEmployee { id: path.into_inner() })
        .await?;

    match outcome {
        MutationOutcome::Deleted { id } => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted",
            "id": id
        }))),
        other => unexpected(other),
    }
}

/// Export the filtered employee list as CSV
#[utoipa::path(
    get,
    path = "/api/employees/export",
    params(EmployeeFilter),
    responses(
        (status = 200, description = "employees.csv attachment", content_type = "text/csv", body = String),
        (status = 403, description = "Admin only")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn export_employees(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    query: web::Query<EmployeeFilter>,
) -> Result<HttpResponse, AppError> {
    viewer.require_admin()?;

    let employees = query.apply(visible_employees(store.get_ref(), &viewer).await?);
    let body = employees_to_csv(&employees).map_err(|e| {
        error!(error = %e, "Failed to render employee CSV");
        AppError::Internal("Error exporting employees".to_string())
    })?;

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"employees.csv\"",
        ))
        .body(body))
}

pub(crate) fn unexpected(outcome: MutationOutcome) -> Result<HttpResponse, AppError> {
    error!(?outcome, "Mutation returned an unexpected outcome");
    Err(AppError::Internal("Unexpected mutation result".to_string()))
}
