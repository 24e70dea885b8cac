use crate::{api::attendance, config::Config, error::AttendanceError};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg: GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> =
            GovernorConfigBuilder::default()
                .per_millisecond(per_ms)
                .burst_size(requests_per_min.max(1))
                .key_extractor(PeerIpKeyExtractor)
                .finish()
                .unwrap_or_default();
        Governor::new(&cfg)
    }

    // Malformed JSON gets the same {code, reason} body as every other 400.
    let json_config = web::JsonConfig::default()
        .error_handler(|err, _req| AttendanceError::InvalidInput(err.to_string()).into());

    cfg.service(
        web::scope(&config.api_prefix)
            .app_data(json_config)
            .service(
                web::scope("/attendance")
                    // /attendance
                    .service(web::resource("").route(web::get().to(attendance::list_attendance)))
                    // /attendance/submit
                    .service(
                        web::resource("/submit")
                            .wrap(build_limiter(config.rate_scan_per_min))
                            .route(web::post().to(attendance::submit_scan)),
                    )
                    // /attendance/{user_id}/today
                    .service(
                        web::resource("/{user_id}/today")
                            .route(web::get().to(attendance::today_attendance)),
                    ),
            )
            .service(
                web::scope("/users")
                    // /users/{user_id}/shift
                    .service(
                        web::resource("/{user_id}/shift")
                            .route(web::get().to(attendance::effective_shift)),
                    ),
            ),
    );
}
