use actix_web::web;

use crate::handlers;

/// 统一注册 HTTP 路由，方便集中管理
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(handlers::hello)
        .service(handlers::interpolate_array)
        .service(handlers::run_patient_job)
        .service(handlers::get_job_contacts)
        .service(handlers::get_performance);
}
