//! 单个病人的完整流程与批处理
//!
//! 读取分割文件头 -> 角点插值 -> 栅格化触点 -> 写出 `{patient}_interpol.nii.gz`

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::config::ElectrodeConfig;
use crate::error::{InterpolError, Result};
use crate::interpol::ContactMap;
use crate::parser_registry::ParserRegistry;
use crate::parsers::save_mask;
use crate::performance::{PerformanceRecord, StageTimer};
use crate::voxel_grid::{DEFAULT_RADIUS, MarkerShape, VoxelMask};

/// 流程参数，每次调用显式传入
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// 覆盖配置中的 DATA_DIR
    pub data_dir: Option<PathBuf>,
    /// 标记半径（体素）
    pub radius: f64,
    pub marker: MarkerShape,
    /// 使用的阵列标签，默认 "1"
    pub array_label: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            data_dir: None,
            radius: DEFAULT_RADIUS,
            marker: MarkerShape::default(),
            array_label: "1".to_string(),
        }
    }
}

/// 单个病人的处理结果
#[derive(Debug, Clone, Serialize)]
pub struct PatientReport {
    pub patient_id: String,
    pub grid_config: String,
    pub contact_count: usize,
    pub voxels_set: usize,
    pub skipped_contacts: usize,
    pub output_path: PathBuf,
    pub timings: Vec<PerformanceRecord>,
}

/// 报告与插值得到的触点
#[derive(Debug, Clone)]
pub struct PatientRun {
    pub report: PatientReport,
    pub contacts: ContactMap,
}

pub fn segmentation_path(data_dir: &Path, patient_id: &str) -> PathBuf {
    data_dir.join(format!("{}_unburied_electrode_seg.nii.gz", patient_id))
}

pub fn output_path(data_dir: &Path, patient_id: &str) -> PathBuf {
    data_dir.join(format!("{}_interpol.nii.gz", patient_id))
}

/// 处理单个病人
pub fn run_patient(
    config: &ElectrodeConfig,
    registry: &ParserRegistry,
    patient_id: &str,
    options: &PipelineOptions,
) -> Result<PatientRun> {
    // ==================== 预处理：配置、分割文件头 ====================
    let timer = StageTimer::start("preprocess");
    let entry = config.array(patient_id, &options.array_label)?;
    let shape = entry.shape()?;

    let data_dir = options
        .data_dir
        .clone()
        .or_else(|| config.resolved_data_dir())
        .ok_or_else(|| InterpolError::config("未指定数据目录 (DATA_DIR)"))?;
    let seg_path = segmentation_path(&data_dir, patient_id);

    let (header, parser_name) = registry.read_header(&seg_path)?;
    let mut mask = VoxelMask::zeros(header.shape)?;
    let preprocess = timer.finish(format!("{} 体数据 {:?}", parser_name, header.shape));

    // ==================== 插值 ====================
    let timer = StageTimer::start("interpolate");
    let contacts = entry.interpolate()?;
    let interpolate = timer.finish(format!("{} 阵列共 {} 个触点", shape, contacts.len()));

    // ==================== 后处理：栅格化并写出 ====================
    let timer = StageTimer::start("postprocess");
    let stats = mask.rasterize(&contacts, options.radius, options.marker);
    let out_path = output_path(&data_dir, patient_id);
    save_mask(&out_path, &mask, &header.affine)?;
    let postprocess = timer.finish(format!("写出 {}", out_path.display()));

    if stats.skipped_contacts > 0 {
        warn!(
            patient = patient_id,
            skipped = stats.skipped_contacts,
            "部分触点坐标非有限，已跳过"
        );
    }
    info!(
        patient = patient_id,
        grid = %shape,
        voxels = stats.voxels_set,
        output = %out_path.display(),
        "插值掩膜已生成"
    );

    Ok(PatientRun {
        report: PatientReport {
            patient_id: patient_id.to_string(),
            grid_config: entry.grid_config.clone(),
            contact_count: contacts.len(),
            voxels_set: stats.voxels_set,
            skipped_contacts: stats.skipped_contacts,
            output_path: out_path,
            timings: vec![preprocess, interpolate, postprocess],
        },
        contacts,
    })
}

/// 批处理中单个病人的失败信息
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub patient_id: String,
    /// 错误类别，见 [`InterpolError::kind`]
    pub kind: &'static str,
    pub geometry: bool,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<PatientReport>,
    pub failed: Vec<BatchFailure>,
}

/// 依次处理多个病人，单个失败只记录不中断
pub fn run_batch(
    config: &ElectrodeConfig,
    registry: &ParserRegistry,
    patient_ids: &[String],
    options: &PipelineOptions,
) -> BatchSummary {
    let mut summary = BatchSummary::default();

    for patient_id in patient_ids {
        match run_patient(config, registry, patient_id, options) {
            Ok(run) => summary.succeeded.push(run.report),
            Err(e) => {
                warn!(patient = %patient_id, kind = e.kind(), "处理失败: {}", e);
                summary.failed.push(BatchFailure {
                    patient_id: patient_id.clone(),
                    kind: e.kind(),
                    geometry: e.is_geometry(),
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        succeeded = summary.succeeded.len(),
        failed = summary.failed.len(),
        "批处理完成"
    );
    summary
}
