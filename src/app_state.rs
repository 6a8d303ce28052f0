use std::sync::Arc;

use crate::config::ElectrodeConfig;
use crate::parser_registry::ParserRegistry;
use crate::pipeline::PipelineOptions;
use crate::task::JobStore;

/// 全局应用状态，负责在各个 handler 之间共享配置、解析器与任务存储
pub struct AppState {
    pub parser_registry: Arc<ParserRegistry>,
    /// 电极配置，未指定配置文件时为空
    pub config: Arc<ElectrodeConfig>,
    pub options: PipelineOptions,
    pub job_store: Arc<JobStore>,
}
