use crate::api::attendance::{BulkAttendance, MarkAttendance, UpdateAttendance};
use crate::api::billing::{GenerateBill, GenerateMonthlyBill};
use crate::api::menu::{CreateMenu, UpdateMenu};
use crate::api::users::ChangePassword;
use crate::auth::handlers::{LoginRequest, RegisterRequest, TokenResponse};
use crate::billing::calculator::BillTotals;
use crate::model::attendance::AttendanceRecord;
use crate::model::bill::Bill;
use crate::model::daily_menu::{DailyMenu, MealItem, MealType};
use crate::model::role::Role;
use crate::model::user::User;
use crate::service::attendance::{AttendanceSummary, BulkEntry, DailyCharge, DayStatus};
use crate::service::user::{CreateUser, UpdateUser};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Mess Management API",
        version = "1.0.0",
        description = r#"
## Hostel Mess Management System

Backend for running a hostel mess: daily menus, student attendance and the
bills that follow from them.

### 🔹 Key Features
- **Users**
  - Admins, teachers and students; students can self-register
- **Menus**
  - One menu per day with a fixed charge and priced meals
- **Attendance**
  - Daily present/absent marking, bulk marking, monthly summaries with a bill estimate
- **Bills**
  - Generate bills for a period or a past month, list them, mark them paid

### 💰 How a bill is computed
- Every day of the period costs that day's fixed charge, or the configured default
  when the day has no menu
- Every present day also costs the sum of that day's meal prices
- Once a period is billed, its attendance can no longer change

### 🔐 Security
All `/api` endpoints require a **JWT Bearer** access token from `/auth/login`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::users::me,
        crate::api::users::create_user,
        crate::api::users::list_users,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,
        crate::api::users::change_password,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::mark_bulk_attendance,
        crate::api::attendance::get_attendance,
        crate::api::attendance::update_attendance,
        crate::api::attendance::delete_attendance,
        crate::api::attendance::attendance_on,
        crate::api::attendance::user_attendance,
        crate::api::attendance::attendance_summary,

        crate::api::menu::create_menu,
        crate::api::menu::menus_in_range,
        crate::api::menu::menu_on,
        crate::api::menu::get_menu,
        crate::api::menu::update_menu,
        crate::api::menu::delete_menu,

        crate::api::billing::generate_bill,
        crate::api::billing::generate_monthly_bill,
        crate::api::billing::list_bills,
        crate::api::billing::get_bill,
        crate::api::billing::bills_for_user,
        crate::api::billing::mark_bill_paid,
        crate::api::billing::delete_bill
    ),
    components(
        schemas(
            RegisterRequest,
            LoginRequest,
            TokenResponse,
            Role,
            User,
            CreateUser,
            UpdateUser,
            ChangePassword,
            AttendanceRecord,
            MarkAttendance,
            BulkAttendance,
            BulkEntry,
            UpdateAttendance,
            AttendanceSummary,
            DailyCharge,
            DayStatus,
            MealType,
            MealItem,
            DailyMenu,
            CreateMenu,
            UpdateMenu,
            Bill,
            BillTotals,
            GenerateBill,
            GenerateMonthlyBill
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token APIs"),
        (name = "Users", description = "User management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Menus", description = "Daily menu APIs"),
        (name = "Bills", description = "Bill generation and payment APIs"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route_and_the_bearer_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/login",
            "/api/users/{id}/password",
            "/api/attendance/user/{user_id}/summary/{year}/{month}",
            "/api/menus/range",
            "/api/bills/{id}/pay",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
        assert!(components.schemas.contains_key("UpdateUser"));
    }
}
