use std::path::PathBuf;

use thiserror::Error;

/// 统一错误类型
/// 几何错误（InvalidShape）与文件/配置错误分开，调用方可以区分"坐标不对"和"文件不对"
#[derive(Error, Debug)]
pub enum InterpolError {
    /// 阵列维度非正，或锚点数量与条带/网格类型不匹配
    #[error("无效的阵列形状: {0}")]
    InvalidShape(String),

    /// grid_config 不是 "MxN" 形式
    #[error("grid_config 格式错误: {0}")]
    GridConfig(String),

    /// 配置内容错误（缺少病人或阵列、坐标参数不合法等）
    #[error("配置错误: {0}")]
    Config(String),

    #[error("读写文件失败 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON 解析失败: {0}")]
    Json(#[from] serde_json::Error),

    /// 体数据文件头不合法
    #[error("体数据格式错误: {0}")]
    Volume(String),
}

pub type Result<T> = std::result::Result<T, InterpolError>;

impl InterpolError {
    pub fn invalid_shape(msg: impl Into<String>) -> Self {
        Self::InvalidShape(msg.into())
    }

    pub fn grid_config(msg: impl Into<String>) -> Self {
        Self::GridConfig(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn volume(msg: impl Into<String>) -> Self {
        Self::Volume(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// 是否属于阵列几何错误：维度/锚点不合法或 grid_config 写错
    pub fn is_geometry(&self) -> bool {
        matches!(self, Self::InvalidShape(_) | Self::GridConfig(_))
    }

    /// 请求方的输入问题（HTTP 400），其余归为服务端错误
    pub fn is_client_error(&self) -> bool {
        self.is_geometry() || matches!(self, Self::Config(_))
    }

    /// 错误类别名，用于 JSON 响应与批处理汇总
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidShape(_) => "invalid_shape",
            Self::GridConfig(_) => "grid_config",
            Self::Config(_) => "config",
            Self::Io { .. } => "io",
            Self::Json(_) => "json",
            Self::Volume(_) => "volume",
        }
    }
}
