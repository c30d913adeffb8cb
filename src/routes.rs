use crate::{
    api::{attendance, leave_request, payroll},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::{Result, anyhow};

pub type ApiLimiter = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter shared by every worker.
pub fn build_limiter(requests_per_min: u32) -> Result<ApiLimiter> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} requests per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config, limiter: &ApiLimiter) {
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .configure(lifecycle),
    );
}

/// Attendance, leave and payroll routes, relative to the API prefix.
pub fn lifecycle(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            // /attendance
            .service(web::resource("").route(web::get().to(attendance::list_attendance)))
            // /attendance/check-in
            .service(web::resource("/check-in").route(web::post().to(attendance::check_in)))
            // /attendance/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(attendance::get_attendance))
                    .route(web::delete().to(attendance::delete_attendance)),
            )
            // /attendance/{id}/check-out
            .service(
                web::resource("/{id}/check-out").route(web::post().to(attendance::check_out)),
            ),
    )
    .service(
        web::scope("/leave")
            // /leave
            .service(
                web::resource("")
                    .route(web::get().to(leave_request::leave_list))
                    .route(web::post().to(leave_request::create_leave)),
            )
            // /leave/{id}
            .service(
                web::resource("/{id}")
                    .route(web::get().to(leave_request::get_leave))
                    .route(web::delete().to(leave_request::delete_leave)),
            )
            // /leave/{id}/approve
            .service(
                web::resource("/{id}/approve").route(web::put().to(leave_request::approve_leave)),
            )
            // /leave/{id}/deny
            .service(web::resource("/{id}/deny").route(web::put().to(leave_request::deny_leave))),
    )
    .service(
        web::scope("/payroll")
            // /payroll
            .service(web::resource("").route(web::get().to(payroll::list_payrolls)))
            // /payroll/generate
            .service(web::resource("/generate").route(web::post().to(payroll::generate_payroll)))
            // /payroll/{id}
            .service(web::resource("/{id}").route(web::get().to(payroll::get_payroll))),
    );
}
