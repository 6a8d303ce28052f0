//! NIfTI-1 单文件格式（`.nii` / `.nii.gz`）
//!
//! 读取只解析文件头；写出 UINT8 掩膜，sform 取自参考仿射。

use std::path::Path;

use ndarray::{Array3, ShapeBuilder};
use nifti::NiftiHeader;
use nifti::writer::WriterOptions;

use crate::error::{InterpolError, Result};
use crate::utils::parser::{VolumeHeader, VolumeParser};
use crate::voxel_grid::VoxelMask;

/// NIFTI_XFORM_SCANNER_ANAT
const XFORM_SCANNER: i16 = 1;
/// NIFTI_UNITS_MM
const UNITS_MM: u8 = 2;

/// NIfTI-1 文件格式解析器
pub struct NiftiParser;

impl NiftiParser {
    pub fn new() -> Self {
        NiftiParser
    }
}

impl Default for NiftiParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VolumeParser for NiftiParser {
    fn supported_extensions(&self) -> Vec<&'static str> {
        vec!["nii", "nii.gz"]
    }

    fn name(&self) -> &'static str {
        "NIfTI-1 Parser"
    }

    fn read_header(&self, path: &Path) -> Result<VolumeHeader> {
        // 先区分文件不存在/不可读与格式错误
        std::fs::metadata(path).map_err(|e| InterpolError::io(path, e))?;

        let header = NiftiHeader::from_file(path).map_err(|e| {
            InterpolError::volume(format!("无法解析 NIfTI 文件头 {}: {}", path.display(), e))
        })?;
        volume_header(&header)
    }
}

/// 从 NIfTI 文件头提取维度与仿射
/// 仿射优先取 sform，其次 qform，最后退化为 pixdim 缩放
pub fn volume_header(header: &NiftiHeader) -> Result<VolumeHeader> {
    let ndim = header.dim[0];
    if !(3..=7).contains(&ndim) {
        return Err(InterpolError::volume(format!(
            "需要至少 3 个空间维度，但 dim[0] = {}",
            ndim
        )));
    }

    let mut shape = [0usize; 3];
    for (axis, size) in shape.iter_mut().enumerate() {
        let dim = header.dim[axis + 1];
        if dim < 1 {
            return Err(InterpolError::volume(format!("dim[{}] = {} 无效", axis + 1, dim)));
        }
        *size = dim as usize;
    }

    let pixdim = [
        header.pixdim[1] as f64,
        header.pixdim[2] as f64,
        header.pixdim[3] as f64,
    ];

    let affine = if header.sform_code > 0 {
        let row = |r: [f32; 4]| [r[0] as f64, r[1] as f64, r[2] as f64, r[3] as f64];
        [
            row(header.srow_x),
            row(header.srow_y),
            row(header.srow_z),
            [0.0, 0.0, 0.0, 1.0],
        ]
    } else if header.qform_code > 0 {
        let qfac = if header.pixdim[0] < 0.0 { -1.0 } else { 1.0 };
        qform_affine(
            [header.quatern_b as f64, header.quatern_c as f64, header.quatern_d as f64],
            [header.quatern_x as f64, header.quatern_y as f64, header.quatern_z as f64],
            pixdim,
            qfac,
        )
    } else {
        [
            [pixdim[0], 0.0, 0.0, 0.0],
            [0.0, pixdim[1], 0.0, 0.0],
            [0.0, 0.0, pixdim[2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ]
    };

    Ok(VolumeHeader {
        shape,
        pixdim,
        affine,
        datatype: header.datatype,
    })
}

/// 由四元数参数构造仿射矩阵
fn qform_affine(quatern: [f64; 3], offset: [f64; 3], pixdim: [f64; 3], qfac: f64) -> [[f64; 4]; 4] {
    let [b, c, d] = quatern;
    let a = (1.0 - (b * b + c * c + d * d)).max(0.0).sqrt();

    let r = [
        [a * a + b * b - c * c - d * d, 2.0 * (b * c - a * d), 2.0 * (b * d + a * c)],
        [2.0 * (b * c + a * d), a * a + c * c - b * b - d * d, 2.0 * (c * d - a * b)],
        [2.0 * (b * d - a * c), 2.0 * (c * d + a * b), a * a + d * d - b * b - c * c],
    ];
    let scale = [pixdim[0], pixdim[1], pixdim[2] * qfac];

    let mut affine = [[0.0; 4]; 4];
    for row in 0..3 {
        for col in 0..3 {
            affine[row][col] = r[row][col] * scale[col];
        }
        affine[row][3] = offset[row];
    }
    affine[3][3] = 1.0;
    affine
}

/// 仿射矩阵各列的长度，作为 pixdim
fn column_norms(affine: &[[f64; 4]; 4]) -> [f64; 3] {
    let mut norms = [0.0; 3];
    for (col, norm) in norms.iter_mut().enumerate() {
        *norm = (0..3).map(|row| affine[row][col].powi(2)).sum::<f64>().sqrt();
    }
    norms
}

/// 以参考仿射构造输出文件头（sform = scanner）
/// 维度、数据类型与偏移由写出器根据数组填写
pub fn reference_header(affine: &[[f64; 4]; 4]) -> NiftiHeader {
    let row = |r: usize| {
        [
            affine[r][0] as f32,
            affine[r][1] as f32,
            affine[r][2] as f32,
            affine[r][3] as f32,
        ]
    };
    let [sx, sy, sz] = column_norms(affine);

    let mut descrip = b"electrode contact mask".to_vec();
    descrip.resize(80, 0);

    NiftiHeader {
        pixdim: [1.0, sx as f32, sy as f32, sz as f32, 1.0, 1.0, 1.0, 1.0],
        xyzt_units: UNITS_MM,
        cal_max: 1.0,
        cal_min: 0.0,
        descrip,
        qform_code: 0,
        sform_code: XFORM_SCANNER,
        srow_x: row(0),
        srow_y: row(1),
        srow_z: row(2),
        ..NiftiHeader::default()
    }
}

/// 保存掩膜，`.nii.gz` 路径会自动 gzip 压缩
pub fn save_mask(path: &Path, mask: &VoxelMask, affine: &[[f64; 4]; 4]) -> Result<()> {
    let [nx, ny, nz] = mask.shape;
    // 掩膜按 x 变化最快存储，即 (nx, ny, nz) 的 Fortran 顺序
    let array = Array3::from_shape_vec((nx, ny, nz).f(), mask.get_data().to_vec())
        .map_err(|e| InterpolError::volume(format!("掩膜数据与维度不匹配: {}", e)))?;

    WriterOptions::new(path)
        .reference_header(&reference_header(affine))
        .write_nifti(&array)
        .map_err(|e| InterpolError::volume(format!("写出 NIfTI 失败 {}: {}", path.display(), e)))
}
