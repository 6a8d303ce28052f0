use actix_web::{HttpResponse, Responder, post, web};
use serde::Serialize;

use crate::app_state::AppState;
use crate::handlers::error_response;
use crate::pipeline::{PatientReport, run_patient};
use crate::task::JobData;

#[derive(Serialize)]
pub struct RunResponse {
    pub job_id: String,
    pub report: PatientReport,
}

/// 对配置中的病人运行完整流程，生成插值掩膜
/// 例如: POST /patients/HUP64/run
#[post("/patients/{patient_id}/run")]
pub async fn run_patient_job(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let patient_id = path.into_inner();

    if !data.config.patients.contains_key(&patient_id) {
        return HttpResponse::NotFound().json(serde_json::json!({
            "error": "配置中没有该病人",
            "patient_id": patient_id,
        }));
    }

    // 文件读写放到阻塞线程池，避免占用 actix worker
    let config = data.config.clone();
    let registry = data.parser_registry.clone();
    let options = data.options.clone();
    let id = patient_id.clone();
    let result = web::block(move || run_patient(&config, &registry, &id, &options)).await;

    let run = match result {
        Ok(Ok(run)) => run,
        Ok(Err(e)) => {
            tracing::warn!(patient = %patient_id, kind = e.kind(), "处理失败: {}", e);
            return error_response(&e);
        }
        Err(e) => {
            return HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "后台任务执行失败",
                "details": e.to_string(),
            }));
        }
    };

    let report = run.report.clone();
    let job_id = data.job_store.insert(JobData::new(run));

    HttpResponse::Ok().json(RunResponse { job_id, report })
}
