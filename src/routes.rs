use crate::{
    api::{attendance, billing, menu, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        // per_ms and burst are both at least 1, which is all `finish` checks
        .expect("valid rate limiter configuration");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let refresh_limiter = Arc::new(build_limiter(config.rate_refresh_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(refresh_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes. Static segments are registered before `{id}`.
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(web::resource("/me").route(web::get().to(users::me)))
            .service(
                web::scope("/users")
                    // /users
                    .service(
                        web::resource("")
                            .route(web::post().to(users::create_user))
                            .route(web::get().to(users::list_users)),
                    )
                    // /users/{id}/password
                    .service(
                        web::resource("/{id}/password")
                            .route(web::post().to(users::change_password)),
                    )
                    // /users/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(users::get_user))
                            .route(web::put().to(users::update_user))
                            .route(web::delete().to(users::delete_user)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::post().to(attendance::mark_attendance)))
                    // /attendance/bulk
                    .service(
                        web::resource("/bulk")
                            .route(web::post().to(attendance::mark_bulk_attendance)),
                    )
                    // /attendance/date/{date}
                    .service(
                        web::resource("/date/{date}")
                            .route(web::get().to(attendance::attendance_on)),
                    )
                    // /attendance/user/{user_id}/summary/{year}/{month}
                    .service(
                        web::resource("/user/{user_id}/summary/{year}/{month}")
                            .route(web::get().to(attendance::attendance_summary)),
                    )
                    // /attendance/user/{user_id}
                    .service(
                        web::resource("/user/{user_id}")
                            .route(web::get().to(attendance::user_attendance)),
                    )
                    // /attendance/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(attendance::get_attendance))
                            .route(web::put().to(attendance::update_attendance))
                            .route(web::delete().to(attendance::delete_attendance)),
                    ),
            )
            .service(
                web::scope("/menus")
                    // /menus
                    .service(web::resource("").route(web::post().to(menu::create_menu)))
                    // /menus/range?start=..&end=..
                    .service(web::resource("/range").route(web::get().to(menu::menus_in_range)))
                    // /menus/date/{date}
                    .service(web::resource("/date/{date}").route(web::get().to(menu::menu_on)))
                    // /menus/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(menu::get_menu))
                            .route(web::put().to(menu::update_menu))
                            .route(web::delete().to(menu::delete_menu)),
                    ),
            )
            .service(
                web::scope("/bills")
                    // /bills
                    .service(web::resource("").route(web::get().to(billing::list_bills)))
                    // /bills/generate
                    .service(
                        web::resource("/generate").route(web::post().to(billing::generate_bill)),
                    )
                    // /bills/generate/monthly
                    .service(
                        web::resource("/generate/monthly")
                            .route(web::post().to(billing::generate_monthly_bill)),
                    )
                    // /bills/user/{user_id}
                    .service(
                        web::resource("/user/{user_id}")
                            .route(web::get().to(billing::bills_for_user)),
                    )
                    // /bills/{id}/pay
                    .service(
                        web::resource("/{id}/pay").route(web::put().to(billing::mark_bill_paid)),
                    )
                    // /bills/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(billing::get_bill))
                            .route(web::delete().to(billing::delete_bill)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /auth/refresh with refresh_token
//       └─ returns new access_token + refresh_token, old refresh_token revoked
