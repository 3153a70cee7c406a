use crate::{api::attendance, config::Config};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::web;
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

    let mutate_limiter = Arc::new(build_limiter(config.rate_attendance_per_min));
    let query_limiter = Arc::new(build_limiter(config.rate_query_per_min));

    cfg.service(
        web::scope(&config.api_prefix).service(
            web::scope("/v1/attendance")
                // /attendance: clock in / clock out
                .service(
                    web::resource("")
                        .wrap(mutate_limiter.clone())
                        .route(web::post().to(attendance::clock_in))
                        .route(web::put().to(attendance::clock_out)),
                )
                // /attendance/breaks: start / end break
                .service(
                    web::resource("/breaks")
                        .wrap(mutate_limiter)
                        .route(web::post().to(attendance::start_break))
                        .route(web::put().to(attendance::end_break)),
                )
                .service(
                    web::resource("/today")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::today)),
                )
                .service(
                    web::resource("/history")
                        .wrap(query_limiter.clone())
                        .route(web::get().to(attendance::history)),
                )
                .service(
                    web::resource("/week")
                        .wrap(query_limiter)
                        .route(web::get().to(attendance::week)),
                ),
        ),
    );
}
