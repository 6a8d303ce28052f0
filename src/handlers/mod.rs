pub mod contacts;
pub mod health;
pub mod interpolate;
pub mod patient;
pub mod performance;

pub use contacts::get_job_contacts;
pub use health::hello;
pub use interpolate::interpolate_array;
pub use patient::run_patient_job;
pub use performance::get_performance;

use actix_web::HttpResponse;

use crate::error::InterpolError;

/// 将错误转换为 JSON 响应
/// 阵列几何与配置问题返回 400，文件/体数据错误返回 500
pub fn error_response(err: &InterpolError) -> HttpResponse {
    let body = serde_json::json!({
        "error": err.to_string(),
        "kind": err.kind(),
    });
    if err.is_client_error() {
        HttpResponse::BadRequest().json(body)
    } else {
        HttpResponse::InternalServerError().json(body)
    }
}
