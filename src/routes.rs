use crate::{
    api::{attendance, company, declaration, employee, masters},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};

/// CRUD routes shared by every name-keyed master resource. The kind rides
/// along as scope-local data so one set of handlers serves them all.
fn master_scope(path: &str, kind: masters::MasterKind) -> Scope {
    web::scope(path)
        .app_data(web::Data::new(kind))
        .service(
            web::resource("")
                .route(web::get().to(masters::list))
                .route(web::post().to(masters::create)),
        )
        .service(
            web::resource("/{id}")
                .route(web::put().to(masters::update))
                .route(web::delete().to(masters::delete)),
        )
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    // Helper to build per-route limiter
    fn build_limiter(requests_per_min: u32) -> GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            60_000 / requests_per_min as u64
        };
        GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min)
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap()
    }

    let login_limiter = build_limiter(config.rate_login_per_min);
    let register_limiter = build_limiter(config.rate_register_per_min);
    let refresh_limiter = build_limiter(config.rate_refresh_per_min);
    let protected_limiter = build_limiter(config.rate_protected_per_min);

    // Public routes
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(Governor::new(&register_limiter))
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(Governor::new(&refresh_limiter))
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(Governor::new(&login_limiter))
                    .route(web::post().to(handlers::logout)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(Governor::new(&protected_limiter)) // rate limiting
            .service(handlers::protected)
            .service(
                web::scope("/employees")
                    // fixed segments before /{id}
                    .service(
                        web::resource("/import")
                            .route(web::post().to(employee::import_employees)),
                    )
                    .service(
                        web::resource("/export")
                            .route(web::get().to(employee::export_employees)),
                    )
                    // /employees
                    .service(
                        web::resource("")
                            .route(web::post().to(employee::create_employee))
                            .route(web::get().to(employee::list_employees)),
                    )
                    // /employees/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(employee::update_employee))
                            .route(web::get().to(employee::get_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/attendance")
                    .service(
                        web::resource("/history").route(web::get().to(attendance::history)),
                    )
                    .service(
                        web::resource("/bulk-mark").route(web::post().to(attendance::bulk_mark)),
                    )
                    .service(
                        web::resource("/edit/{month}/{year}")
                            .route(web::post().to(attendance::begin_edit)),
                    )
                    .service(
                        web::resource("/lock/{month}/{year}")
                            .route(web::put().to(attendance::lock_month)),
                    )
                    .service(
                        web::resource("/unlock/{month}/{year}")
                            .route(web::put().to(attendance::unlock_month)),
                    )
                    .service(
                        web::resource("/import").route(web::post().to(attendance::import_month)),
                    )
                    .service(
                        web::resource("/export/{month}/{year}")
                            .route(web::get().to(attendance::export_month)),
                    )
                    .service(
                        web::resource("/template").route(web::get().to(attendance::template)),
                    ),
            )
            .service(master_scope("/branches", masters::MasterKind::Branch))
            .service(master_scope("/departments", masters::MasterKind::Department))
            .service(master_scope("/designations", masters::MasterKind::Designation))
            .service(master_scope("/grades", masters::MasterKind::Grade))
            .service(master_scope("/categories", masters::MasterKind::Category))
            .service(master_scope(
                "/reasons/termination",
                masters::MasterKind::TerminationReason,
            ))
            .service(master_scope(
                "/reasons/resignation",
                masters::MasterKind::ResignationReason,
            ))
            .service(
                web::scope("/sub-departments")
                    .service(
                        web::resource("")
                            .route(web::get().to(masters::list_sub_departments))
                            .route(web::post().to(masters::create_sub_department)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::put().to(masters::update_sub_department))
                            .route(web::delete().to(masters::delete_sub_department)),
                    ),
            )
            .service(
                web::scope("/declarations").service(
                    web::resource("/{employee_id}/{fiscal_year}")
                        .route(web::get().to(declaration::get_declaration))
                        .route(web::put().to(declaration::put_declaration)),
                ),
            )
            .service(
                web::scope("/companies")
                    // fixed segment before /{id}
                    .service(
                        web::resource("/test-domain").route(web::get().to(company::test_domain)),
                    )
                    .service(web::resource("/{id}").route(web::get().to(company::get_company))),
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
// ATTENDANCE MONTH
//  └─ edit → bulk-mark (save) → lock → unlock
//       export only while locked
