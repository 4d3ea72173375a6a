use actix_web::{HttpResponse, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::bill::{Bill, BillFilter};
use crate::repository::MySqlStore;
use crate::service::billing;

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateBill {
    #[schema(example = 3)]
    pub user_id: u64,
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub start_date: NaiveDate,
    #[schema(example = "2025-01-31", format = "date", value_type = String)]
    pub end_date: NaiveDate,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct GenerateMonthlyBill {
    #[schema(example = 3)]
    pub user_id: u64,
    #[schema(example = 2025)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BillQuery {
    /// Only bills of this user
    pub user_id: Option<u64>,
    /// Bills starting on or after this day, YYYY-MM-DD
    pub start_date: Option<NaiveDate>,
    /// Bills ending on or before this day, YYYY-MM-DD
    pub end_date: Option<NaiveDate>,
}

/// Generate a bill for an arbitrary period
#[utoipa::path(
    post,
    path = "/api/bills/generate",
    request_body = GenerateBill,
    responses(
        (status = 201, description = "Bill generated", body = Bill),
        (status = 400, description = "end_date is before start_date"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "A bill already covers part of this period")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn generate_bill(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    payload: web::Json<GenerateBill>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let bill = billing::generate_bill(
        store.get_ref(),
        &config.billing_policy(),
        payload.user_id,
        payload.start_date,
        payload.end_date,
        Utc::now().naive_utc(),
    )
    .await?;
    Ok(HttpResponse::Created().json(bill))
}

/// Generate a bill for a calendar month
#[utoipa::path(
    post,
    path = "/api/bills/generate/monthly",
    request_body = GenerateMonthlyBill,
    responses(
        (status = 201, description = "Bill generated", body = Bill),
        (status = 400, description = "Month or year out of range, or month not over yet"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "A bill already covers part of this month")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn generate_monthly_bill(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    payload: web::Json<GenerateMonthlyBill>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let bill = billing::generate_monthly_bill(
        store.get_ref(),
        &config.billing_policy(),
        payload.user_id,
        payload.year,
        payload.month,
        Utc::now().naive_utc(),
    )
    .await?;
    Ok(HttpResponse::Created().json(bill))
}

/// List bills
#[utoipa::path(
    get,
    path = "/api/bills",
    params(BillQuery),
    responses(
        (status = 200, description = "Bills, newest first", body = [Bill]),
        (status = 400, description = "end_date is before start_date"),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn list_bills(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<BillQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let filter = BillFilter {
        user_id: query.user_id,
        start: query.start_date,
        end: query.end_date,
    };
    let bills = billing::list_bills(store.get_ref(), &filter).await?;
    Ok(HttpResponse::Ok().json(bills))
}

/// Get a bill
#[utoipa::path(
    get,
    path = "/api/bills/{id}",
    params(("id" = u64, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill found", body = Bill),
        (status = 403, description = "Not your bill"),
        (status = 404, description = "Bill not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn get_bill(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let bill = billing::get_bill(store.get_ref(), path.into_inner()).await?;
    auth.require_self_or_admin(bill.user_id)?;

    Ok(HttpResponse::Ok().json(bill))
}

/// Bills of one user
#[utoipa::path(
    get,
    path = "/api/bills/user/{user_id}",
    params(("user_id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "Bills, newest first", body = [Bill]),
        (status = 403, description = "Not your bills"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn bills_for_user(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();
    auth.require_self_or_admin(user_id)?;

    let bills = billing::bills_for_user(store.get_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(bills))
}

/// Mark a bill as paid
///
/// Paying an already paid bill returns it unchanged.
#[utoipa::path(
    put,
    path = "/api/bills/{id}/pay",
    params(("id" = u64, Path, description = "Bill id")),
    responses(
        (status = 200, description = "Bill is paid", body = Bill),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Bill not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn mark_bill_paid(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let bill =
        billing::mark_bill_paid(store.get_ref(), path.into_inner(), Utc::now().naive_utc()).await?;
    Ok(HttpResponse::Ok().json(bill))
}

/// Delete an unpaid bill
#[utoipa::path(
    delete,
    path = "/api/bills/{id}",
    params(("id" = u64, Path, description = "Bill id")),
    responses(
        (status = 204, description = "Bill deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Bill not found"),
        (status = 409, description = "Bill is already paid")
    ),
    security(("bearer_auth" = [])),
    tag = "Bills"
)]
pub async fn delete_bill(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    billing::delete_bill(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
