use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    api::employee::unexpected,
    auth::auth::Viewer,
    config::Config,
    error::{AppError, read_failure},
    model::department::{Department, DepartmentFields},
    service::mutation::{Mutation, MutationOutcome, MutationService, non_blank},
    store::Store,
};

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct DepartmentForm {
    #[validate(length(min = 1, message = "required"))]
    #[schema(example = "Engineering")]
    pub name: String,
    /// Employee id of the manager; blank clears it.
    #[serde(default)]
    pub manager_id: Option<String>,
}

impl DepartmentForm {
    pub fn to_fields(&self) -> DepartmentFields {
        DepartmentFields {
            name: self.name.trim().to_string(),
            manager_id: non_blank(&self.manager_id),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Departments ordered by name", body = [Department]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn list_departments(
    _viewer: Viewer,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let departments = store
        .list_departments()
        .await
        .map_err(read_failure("fetching departments"))?;

    Ok(HttpResponse::Ok().json(departments))
}

#[utoipa::path(
    post,
    path = "/api/departments",
    request_body = DepartmentForm,
    responses(
        (status = 201, description = "Department created", body = Department),
        (status = 400, description = "Validation failed or unknown manager"),
        (status = 403, description = "Admin only")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn create_department(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    payload: web::Json<DepartmentForm>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);

    match service
        .apply(&viewer, Mutation::CreateDepartment(payload.into_inner()))
        .await?
    {
        MutationOutcome::Department(department) => Ok(HttpResponse::Created().json(department)),
        other => unexpected(other),
    }
}

#[utoipa::path(
    put,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    request_body = DepartmentForm,
    responses(
        (status = 200, description = "Department updated", body = Department),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn update_department(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
    payload: web::Json<DepartmentForm>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);
    let mutation = Mutation::UpdateDepartment {
        id: path.into_inner(),
        form: payload.into_inner(),
    };

    match service.apply(&viewer, mutation).await? {
        MutationOutcome::Department(department) => Ok(HttpResponse::Ok().json(department)),
        other => unexpected(other),
    }
}

/// Employees of a deleted department keep their rows with no department.
#[utoipa::path(
    delete,
    path = "/api/departments/{department_id}",
    params(("department_id", Path, description = "Department ID")),
    responses(
        (status = 200, description = "Successfully deleted", body = Object, example = json!({
            "message": "Successfully deleted"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found")
    ),
    tag = "Department",
    security(("bearer_auth" = []))
)]
pub async fn delete_department(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    config: web::Data<Config>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let service = MutationService::new(store.get_ref(), &config.default_employee_password);

    match service
        .apply(&viewer, Mutation::DeleteDepartment { id: path.into_inner() })
        .await?
    {
        MutationOutcome::Deleted { id } => Ok(HttpResponse::Ok().json(json!({
            "message": "Successfully deleted",
            "id": id
        }))),
        other => unexpected(other),
    }
}
