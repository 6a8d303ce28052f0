use actix_web::{HttpResponse, Responder, get, web};
use serde::Deserialize;

use crate::app_state::AppState;

#[derive(Deserialize)]
pub struct PerformanceQuery {
    pub job_id: String,
}

/// 获取指定任务的各阶段耗时
#[get("/performance")]
pub async fn get_performance(
    data: web::Data<AppState>,
    query: web::Query<PerformanceQuery>,
) -> impl Responder {
    let records = data
        .job_store
        .get(&query.job_id)
        .map(|job| job.report.timings.clone())
        .unwrap_or_default();

    tracing::debug!(job_id = %query.job_id, records = records.len(), "性能数据查询");

    // 任务不存在或已过期时返回空数组，而不是 404
    HttpResponse::Ok().json(serde_json::json!({
        "job_id": query.job_id,
        "records": records,
    }))
}
