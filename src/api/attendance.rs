use actix_web::{HttpResponse, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::{
    auth::auth::{DataScope, Viewer},
    error::{AppError, read_failure, write_failure},
    model::attendance::{Attendance, AttendanceFilter, AttendanceStatus, NewAttendance},
    store::Store,
};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceQuery {
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    /// Ignored for employees, who only see their own rows.
    pub employee_id: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AttendanceForm {
    #[validate(length(min = 1, message = "required"))]
    pub employee_id: String,
    /// Defaults to today.
    #[schema(example = "2026-01-05", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    pub status: AttendanceStatus,
}

#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Attendance rows, newest date first", body = [Attendance]),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn list_attendance(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    query: web::Query<AttendanceQuery>,
) -> Result<HttpResponse, AppError> {
    let query = query.into_inner();

    let employee_id = match viewer.scope() {
        DataScope::All => query.employee_id.filter(|id| !id.is_empty()),
        DataScope::OwnRecord { user_id } => {
            let own = store
                .find_employee_by_user(&user_id)
                .await
                .map_err(read_failure("fetching attendance"))?;
            match own {
                Some(employee) => Some(employee.id),
                None => return Ok(HttpResponse::Ok().json(Vec::<Attendance>::new())),
            }
        }
    };

    let filter = AttendanceFilter {
        employee_id,
        date: query.date,
    };
    let rows = store
        .list_attendance(&filter)
        .await
        .map_err(read_failure("fetching attendance"))?;

    Ok(HttpResponse::Ok().json(rows))
}

/// Records one employee's status for a day; recording again replaces it.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceForm,
    responses(
        (status = 200, description = "Stored row", body = Attendance),
        (status = 400, description = "Validation failed or unknown employee"),
        (status = 403, description = "Admin only")
    ),
    tag = "Attendance",
    security(("bearer_auth" = []))
)]
pub async fn record_attendance(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    payload: web::Json<AttendanceForm>,
) -> Result<HttpResponse, AppError> {
    viewer.require_admin()?;
    payload.validate()?;

    let form = payload.into_inner();
    let record = NewAttendance {
        employee_id: form.employee_id,
        date: form.date.unwrap_or_else(|| Utc::now().date_naive()),
        status: form.status,
    };

    let row = store
        .record_attendance(&record)
        .await
        .map_err(write_failure("saving attendance"))?;

    info!(employee_id = %row.employee_id, date = %row.date, status = %row.status, "Attendance recorded");
    Ok(HttpResponse::Ok().json(row))
}
