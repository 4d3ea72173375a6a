use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::model::daily_menu::{DailyMenu, MealItem, MenuChanges};
use crate::repository::MySqlStore;
use crate::service::menu;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenu {
    #[schema(example = "2025-01-01", format = "date", value_type = String)]
    pub date: NaiveDate,
    /// Falls back to the configured default when omitted
    #[schema(example = "20.00", value_type = Option<String>)]
    pub fixed_charge: Option<Decimal>,
    #[serde(default)]
    pub meals: Vec<MealItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenu {
    #[schema(example = "25.00", value_type = Option<String>)]
    pub fixed_charge: Option<Decimal>,
    /// Replaces the whole meal list
    pub meals: Option<Vec<MealItem>>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuRangeQuery {
    /// First day, YYYY-MM-DD
    pub start: NaiveDate,
    /// Last day, YYYY-MM-DD
    pub end: NaiveDate,
}

/// Create the menu of a day
#[utoipa::path(
    post,
    path = "/api/menus",
    request_body = CreateMenu,
    responses(
        (status = 201, description = "Menu created", body = DailyMenu),
        (status = 400, description = "Negative amount or unnamed meal"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "The day already has a menu")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn create_menu(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    payload: web::Json<CreateMenu>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let menu = menu::create_menu(
        store.get_ref(),
        payload.date,
        payload.fixed_charge,
        &payload.meals,
        config.default_fixed_charge,
    )
    .await?;
    Ok(HttpResponse::Created().json(menu))
}

/// Menus in a date range
#[utoipa::path(
    get,
    path = "/api/menus/range",
    params(MenuRangeQuery),
    responses(
        (status = 200, description = "Menus ordered by date", body = [DailyMenu]),
        (status = 400, description = "end is before start")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn menus_in_range(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<MenuRangeQuery>,
) -> actix_web::Result<impl Responder> {
    let menus = menu::menus_in_range(store.get_ref(), query.start, query.end).await?;
    Ok(HttpResponse::Ok().json(menus))
}

/// The menu of one day
#[utoipa::path(
    get,
    path = "/api/menus/date/{date}",
    params(("date" = String, Path, description = "Day, YYYY-MM-DD")),
    responses(
        (status = 200, description = "Menu found", body = DailyMenu),
        (status = 404, description = "No menu for that day")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn menu_on(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<NaiveDate>,
) -> actix_web::Result<impl Responder> {
    let menu = menu::menu_on(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(menu))
}

/// Get a menu by id
#[utoipa::path(
    get,
    path = "/api/menus/{id}",
    params(("id" = u64, Path, description = "Menu id")),
    responses(
        (status = 200, description = "Menu found", body = DailyMenu),
        (status = 404, description = "Menu not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn get_menu(
    _auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let menu = menu::get_menu(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(menu))
}

/// Update a menu
///
/// Bills already generated keep the amounts they were computed with.
#[utoipa::path(
    put,
    path = "/api/menus/{id}",
    params(("id" = u64, Path, description = "Menu id")),
    request_body = UpdateMenu,
    responses(
        (status = 200, description = "Menu updated", body = DailyMenu),
        (status = 400, description = "Negative amount, unnamed meal or nothing to update"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Menu not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn update_menu(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    payload: web::Json<UpdateMenu>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let payload = payload.into_inner();
    let menu = menu::update_menu(
        store.get_ref(),
        path.into_inner(),
        MenuChanges {
            fixed_charge: payload.fixed_charge,
            meals: payload.meals,
        },
    )
    .await?;
    Ok(HttpResponse::Ok().json(menu))
}

/// Delete a menu
#[utoipa::path(
    delete,
    path = "/api/menus/{id}",
    params(("id" = u64, Path, description = "Menu id")),
    responses(
        (status = 204, description = "Menu deleted"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Menu not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Menus"
)]
pub async fn delete_menu(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    menu::delete_menu(store.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
