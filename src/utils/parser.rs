use std::path::Path;

use serde::Serialize;

use crate::error::Result;

/// 体数据文件头信息
/// 只包含生成掩膜所需的部分：维度与体素到世界坐标的仿射矩阵
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeHeader {
    /// 空间维度 [nx, ny, nz]
    pub shape: [usize; 3],
    /// 体素间距
    pub pixdim: [f64; 3],
    /// 4x4 仿射矩阵，按行存储
    pub affine: [[f64; 4]; 4],
    /// 原始数据类型代码
    pub datatype: i16,
}

/// 体数据解析器 trait
/// 不同文件格式需要实现这个 trait
pub trait VolumeParser: Send + Sync {
    /// 获取支持的文件扩展名（不含点号），例如: "nii"
    fn supported_extensions(&self) -> Vec<&'static str>;

    /// 检查文件扩展名是否被支持
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }

    /// 只读取文件头（维度与仿射），不解析体素数据
    fn read_header(&self, path: &Path) -> Result<VolumeHeader>;

    /// 获取解析器名称（用于日志和错误信息）
    fn name(&self) -> &'static str;
}
