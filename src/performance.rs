use std::time::{Instant, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// 性能数据记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// 开始时间 (Unix 时间戳，毫秒)
    pub start_time: u64,
    /// 结束时间 (Unix 时间戳，毫秒)
    pub end_time: u64,
    /// 阶段名: "preprocess" / "interpolate" / "postprocess"
    pub stage: String,
    /// 实际耗时（毫秒，单调时钟）
    pub elapsed_ms: f64,
    /// 附加说明
    pub msg: String,
}

/// 阶段计时器
pub struct StageTimer {
    stage: &'static str,
    start_time: u64,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        Self {
            stage,
            start_time: get_unix_timestamp_ms(),
            started: Instant::now(),
        }
    }

    /// 结束计时并生成记录
    pub fn finish(self, msg: impl Into<String>) -> PerformanceRecord {
        let elapsed_ms = self.started.elapsed().as_secs_f64() * 1000.0;
        let msg = msg.into();
        tracing::debug!(stage = self.stage, elapsed_ms, "{}", msg);

        PerformanceRecord {
            start_time: self.start_time,
            end_time: get_unix_timestamp_ms(),
            stage: self.stage.to_string(),
            elapsed_ms,
            msg,
        }
    }
}

/// 获取 Unix 时间戳（毫秒）
pub fn get_unix_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
