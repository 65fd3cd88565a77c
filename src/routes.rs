use crate::{
    api::{bulk_import, leave_request, staff},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        let cfg = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap();
        Governor::new(&cfg)
    }

    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
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

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::resource("/account/password")
                    .route(web::put().to(handlers::change_password)),
            )
            .service(
                web::scope("/staff")
                    // /staff
                    .service(
                        web::resource("")
                            .route(web::post().to(staff::create_staff))
                            .route(web::get().to(staff::list_staffs)),
                    )
                    // /staff/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(staff::update_staff))
                            .route(web::get().to(staff::get_staff)),
                    ),
            )
            .service(
                web::scope("/leave")
                    // /leave
                    .service(
                        web::resource("")
                            .route(web::get().to(leave_request::leave_list))
                            .route(web::post().to(leave_request::submit_leave)),
                    )
                    // /leave/queue
                    .service(
                        web::resource("/queue").route(web::get().to(leave_request::leave_queue)),
                    )
                    // /leave/balance
                    .service(
                        web::resource("/balance")
                            .route(web::get().to(leave_request::leave_balance)),
                    )
                    // /leave/bulk
                    .service(web::resource("/bulk").route(web::post().to(bulk_import::bulk_import)))
                    // /leave/{id}
                    .service(web::resource("/{id}").route(web::get().to(leave_request::get_leave)))
                    // /leave/{id}/recommend
                    .service(
                        web::resource("/{id}/recommend")
                            .route(web::put().to(leave_request::recommend_leave)),
                    )
                    // /leave/{id}/approve
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(leave_request::approve_leave)),
                    )
                    // /leave/{id}/reject
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            ),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)
//
// API REQUEST
//  └─ Authorization: Bearer access_token
//
// ACCESS EXPIRED
//  └─ POST /refresh with refresh_token
//       └─ returns new access_token
