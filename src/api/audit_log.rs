use actix_web::{HttpResponse, web};

use crate::{
    auth::auth::Viewer,
    error::{AppError, read_failure},
    model::audit_log::{AuditLog, AuditLogFilter},
    store::Store,
};

#[utoipa::path(
    get,
    path = "/api/audit-logs",
    params(AuditLogFilter),
    responses(
        (status = 200, description = "Newest first, 100 rows unless `limit` is given (max 500)", body = [AuditLog]),
        (status = 403, description = "Admin only")
    ),
    tag = "Audit",
    security(("bearer_auth" = []))
)]
pub async fn list_audit_logs(
    viewer: Viewer,
    store: web::Data<dyn Store>,
    query: web::Query<AuditLogFilter>,
) -> Result<HttpResponse, AppError> {
    viewer.require_admin()?;

    let logs = store
        .list_audit_logs(&query)
        .await
        .map_err(read_failure("fetching audit logs"))?;

    Ok(HttpResponse::Ok().json(logs))
}
