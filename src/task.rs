use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::interpol::ContactMap;
use crate::pipeline::{PatientReport, PatientRun};

/// 已完成的插值任务，供后续查询触点与耗时
pub struct JobData {
    pub report: PatientReport,
    pub contacts: ContactMap,
    /// 任务创建时间，用于 TTL 过期检查
    pub created_at: Instant,
}

impl JobData {
    pub fn new(run: PatientRun) -> Self {
        Self {
            report: run.report,
            contacts: run.contacts,
            created_at: Instant::now(),
        }
    }
}

pub struct JobStore {
    jobs: RwLock<HashMap<String, Arc<JobData>>>,
    /// TTL（Time-To-Live）默认过期时间：30 分钟
    default_ttl: Duration,
}

impl JobStore {
    pub fn new() -> Self {
        Self::with_ttl(Duration::from_secs(30 * 60))
    }

    /// 创建带自定义 TTL 的 JobStore
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            jobs: RwLock::new(HashMap::new()),
            default_ttl: ttl,
        }
    }

    pub fn insert(&self, data: JobData) -> String {
        let job_id = Uuid::new_v4().to_string();
        self.jobs.write().insert(job_id.clone(), Arc::new(data));
        job_id
    }

    pub fn get(&self, job_id: &str) -> Option<Arc<JobData>> {
        self.jobs.read().get(job_id).cloned()
    }

    /// 清理过期的任务
    /// 返回清理的任务数量
    pub fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut jobs = self.jobs.write();
        let before_count = jobs.len();

        jobs.retain(|_, job| now.duration_since(job.created_at) < self.default_ttl);

        before_count - jobs.len()
    }

    /// 获取当前任务数量
    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }

    /// 获取默认 TTL
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::geometry::Point3D;
    use crate::interpol::interpolate_corners;

    fn job() -> JobData {
        let contacts =
            interpolate_corners(Point3D::ORIGIN, Point3D::new(3.0, 0.0, 0.0), None, 1, 4).unwrap();
        JobData::new(PatientRun {
            report: PatientReport {
                patient_id: "HUP64".to_string(),
                grid_config: "1x4".to_string(),
                contact_count: contacts.len(),
                voxels_set: 0,
                skipped_contacts: 0,
                output_path: PathBuf::from("out.nii.gz"),
                timings: Vec::new(),
            },
            contacts,
        })
    }

    #[test]
    fn insert_and_get() {
        let store = JobStore::new();
        let id = store.insert(job());
        assert_eq!(store.job_count(), 1);
        assert_eq!(store.get(&id).unwrap().report.patient_id, "HUP64");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn expired_jobs_are_cleaned() {
        let store = JobStore::with_ttl(Duration::ZERO);
        store.insert(job());
        store.insert(job());
        assert_eq!(store.cleanup_expired(), 2);
        assert_eq!(store.job_count(), 0);

        let store = JobStore::new();
        store.insert(job());
        assert_eq!(store.cleanup_expired(), 0);
    }
}
