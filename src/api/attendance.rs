use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::attendance::AttendanceRecord;
use crate::repository::MySqlStore;
use crate::service::attendance::{self, AttendanceSummary, BulkEntry};

#[derive(Debug, Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 3)]
    pub user_id: u64,
    #[schema(example = "2025-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = true)]
    pub present: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct BulkAttendance {
    #[schema(example = "2025-01-02", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub records: Vec<BulkEntry>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateAttendance {
    #[schema(example = false)]
    pub present: bool,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRangeQuery {
    /// Inclusive lower bound, YYYY-MM-DD
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound, YYYY-MM-DD
    pub end: Option<NaiveDate>,
}

/// Mark one student's attendance for a day
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Attendance marked", body = AttendanceRecord),
        (status = 403, description = "Admin/Teacher only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already marked, or the day is already billed")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let record = attendance::mark_attendance(
        store.get_ref(),
        payload.user_id,
        payload.date,
        payload.present,
    )
    .await?;
    Ok(HttpResponse::Created().json(record))
}

/// Mark attendance of many students for one day
///
/// Either every record is written or none is.
#[utoipa::path(
    post,
    path = "/api/attendance/bulk",
    request_body = BulkAttendance,
    responses(
        (status = 201, description = "All records written", body = [AttendanceRecord]),
        (status = 400, description = "At least one record was rejected; nothing was written"),
        (status = 403, description = "Admin/Teacher only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_bulk_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<BulkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let records =
        attendance::mark_bulk_attendance(store.get_ref(), payload.date, &payload.records).await?;
    Ok(HttpResponse::Created().json(records))
}

/// Get one attendance record
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    responses(
        (status = 200, description = "Record found", body = AttendanceRecord),
        (status = 403, description = "Not your record"),
        (status = 404, description = "Record not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn get_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let record = attendance::get_attendance(store.get_ref(), path.into_inner()).await?;
    auth.require_self_or_staff(record.user_id)?;

    Ok(HttpResponse::Ok().json(record))
}

/// Change present/absent on an unbilled day
#[utoipa::path(
    put,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    request_body = UpdateAttendance,
    responses(
        (status = 200, description = "Record updated", body = AttendanceRecord),
        (status = 403, description = "Admin/Teacher only"),
        (status = 404, description = "Record not found"),
        (status = 409, description = "The day is already billed")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn update_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<UpdateAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let record =
        attendance::update_attendance(store.get_ref(), path.into_inner(), payload.present).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Delete an attendance record on an unbilled day
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    params(("id" = u64, Path, description = "Attendance record id")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Record not found"),
        (status = 409, description = "The day is already billed")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn delete_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    attendance::delete_attendance(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Everyone's attendance on one day
#[utoipa::path(
    get,
    path = "/api/attendance/date/{date}",
    params(("date" = String, Path, description = "Day, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Records ordered by user id", body = [AttendanceRecord]),
        (status = 403, description = "Admin/Teacher only")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_on(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    auth.require_staff()?;

    let records = attendance::attendance_on(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// A user's attendance history
#[utoipa::path(
    get,
    path = "/api/attendance/user/{user_id}",
    params(
        ("user_id" = u64, Path, description = "User id"),
        DateRangeQuery
    ),
    responses(
        (status = 200, description = "Records ordered by date", body = [AttendanceRecord]),
        (status = 400, description = "end is before start"),
        (status = 403, description = "Not your records"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn user_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    query: web::Query<DateRangeQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_staff(user_id)?;

    let records =
        attendance::user_attendance(store.get_ref(), user_id, query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(records))
}

/// Monthly attendance with a running bill estimate
#[utoipa::path(
    get,
    path = "/api/attendance/user/{user_id}/summary/{year}/{month}",
    params(
        ("user_id" = u64, Path, description = "User id"),
        ("year" = i32, Path, description = "Calendar year"),
        ("month" = u32, Path, description = "Month, 1-12")
    ),
    responses(
        (status = 200, description = "Daily breakdown and estimate", body = AttendanceSummary),
        (status = 400, description = "Invalid month"),
        (status = 403, description = "Not your records"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn attendance_summary(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    path: web::Path<(u64, i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (user_id, year, month) = path.into_inner();
    auth.require_self_or_staff(user_id)?;

    let summary = attendance::attendance_summary(
        store.get_ref(),
        user_id,
        year,
        month,
        config.default_fixed_charge,
    )
    .await?;
    Ok(HttpResponse::Ok().json(summary))
}
