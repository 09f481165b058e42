use crate::{
    api::{admin, attendance, leave_quota, requests, work_permit},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst size");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/work-permits")
                    // /work-permits
                    .service(
                        web::resource("")
                            .route(web::post().to(work_permit::submit_work_permit))
                            .route(web::get().to(work_permit::list_my_permits)),
                    )
                    // /work-permits/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::delete().to(work_permit::withdraw_work_permit)),
                    ),
            )
            .service(web::resource("/leave-quota").route(web::get().to(leave_quota::get_my_quota)))
            .service(
                web::resource("/notifications").route(web::get().to(requests::list_notifications)),
            )
            .service(web::resource("/requests").route(web::post().to(requests::submit_request)))
            .service(
                web::resource("/attendance")
                    .route(web::get().to(attendance::list_my_attendance))
                    .route(web::post().to(attendance::record_attendance)),
            )
            .service(
                web::scope("/admin")
                    // /admin/requests
                    .service(
                        web::resource("/requests")
                            .route(web::get().to(requests::list_pending_requests)),
                    )
                    // /admin/requests/{id}/approve
                    .service(
                        web::resource("/requests/{id}/approve")
                            .route(web::put().to(requests::approve_request)),
                    )
                    // /admin/requests/{id}/reject
                    .service(
                        web::resource("/requests/{id}/reject")
                            .route(web::put().to(requests::reject_request)),
                    )
                    .service(
                        web::resource("/work-permits").route(web::get().to(work_permit::list_permits)),
                    )
                    .service(
                        web::resource("/attendance")
                            .route(web::get().to(attendance::list_all_attendance)),
                    )
                    .service(
                        web::resource("/leave-quota/reset")
                            .route(web::post().to(leave_quota::reset_quotas)),
                    )
                    // /admin/leave-quota/{user_id}
                    .service(
                        web::resource("/leave-quota/{user_id}")
                            .route(web::put().to(leave_quota::adjust_quota)),
                    )
                    .service(
                        web::resource("/users/{id}/records")
                            .route(web::delete().to(admin::purge_user)),
                    ),
            ),
    );
}
