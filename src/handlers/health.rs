use actix_web::{HttpResponse, Responder, get, web};

use crate::app_state::AppState;

/// 根路径健康检查/服务说明
#[get("/")]
pub async fn hello(data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "message": "电极触点插值服务",
        "endpoints": [
            "POST /interpolate",
            "POST /patients/{patient_id}/run",
            "GET /jobs/{job_id}/contacts",
            "GET /performance?job_id=<id>",
        ],
        "supported_extensions": data.parser_registry.supported_extensions(),
        "patients": data.config.patient_ids(),
    }))
}
