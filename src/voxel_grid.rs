use serde::{Deserialize, Serialize};

use crate::error::{InterpolError, Result};
use crate::geometry::Point3D;
use crate::interpol::ContactMap;

/// 默认标记半径（体素），即 0.2 * 10
pub const DEFAULT_RADIUS: f64 = 2.0;

/// 掩膜体素数上限（512^3），防止异常文件头导致超大分配
pub const MAX_VOXELS: usize = 512 * 512 * 512;

/// 体素掩膜
/// 表示三维规则网格上的二值数据
#[derive(Debug, Clone, PartialEq)]
pub struct VoxelMask {
    /// 网格维度 [nx, ny, nz]
    pub shape: [usize; 3],
    /// 数据数组，按 NIfTI 顺序存储 (x变化最快，y其次，z最慢)
    /// 索引计算: index = k * nx * ny + j * nx + i
    pub data: Vec<u8>,
}

/// 触点标记形状
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    /// 立方体，每轴覆盖 [trunc(p - r), trunc(p + r))
    Cube,
    /// 体素中心到触点距离不超过 r
    #[default]
    Sphere,
}

impl std::str::FromStr for MarkerShape {
    type Err = InterpolError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "cube" => Ok(MarkerShape::Cube),
            "sphere" => Ok(MarkerShape::Sphere),
            other => Err(InterpolError::config(format!(
                "未知的标记形状 '{}'，可选: cube, sphere",
                other
            ))),
        }
    }
}

/// 栅格化统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RasterStats {
    /// 栅格化后掩膜中的非零体素总数
    pub voxels_set: usize,
    /// 因坐标非有限而跳过的触点数量
    pub skipped_contacts: usize,
}

fn voxel_count(shape: [usize; 3]) -> Result<usize> {
    shape[0]
        .checked_mul(shape[1])
        .and_then(|n| n.checked_mul(shape[2]))
        .filter(|&n| n <= MAX_VOXELS)
        .ok_or_else(|| {
            InterpolError::volume(format!(
                "体数据维度 {:?} 超过上限 {} 个体素",
                shape, MAX_VOXELS
            ))
        })
}

impl VoxelMask {
    /// 创建新的体素掩膜
    pub fn new(shape: [usize; 3], data: Vec<u8>) -> Result<Self> {
        let total_elements = voxel_count(shape)?;

        if data.len() != total_elements {
            return Err(InterpolError::volume(format!(
                "数据量不匹配: shape {:?} 需要 {} 个元素，但提供了 {} 个",
                shape,
                total_elements,
                data.len()
            )));
        }

        Ok(VoxelMask { shape, data })
    }

    /// 创建全零掩膜，体素数超过 MAX_VOXELS 时报错
    pub fn zeros(shape: [usize; 3]) -> Result<Self> {
        Ok(VoxelMask {
            shape,
            data: vec![0; voxel_count(shape)?],
        })
    }

    fn index(&self, i: usize, j: usize, k: usize) -> Option<usize> {
        let [nx, ny, nz] = self.shape;
        (i < nx && j < ny && k < nz).then(|| k * nx * ny + j * nx + i)
    }

    pub fn get(&self, i: usize, j: usize, k: usize) -> Option<u8> {
        self.index(i, j, k).map(|idx| self.data[idx])
    }

    /// 设置体素值，越界返回 false
    pub fn set(&mut self, i: usize, j: usize, k: usize, value: u8) -> bool {
        match self.index(i, j, k) {
            Some(idx) => {
                self.data[idx] = value;
                true
            }
            None => false,
        }
    }

    /// 非零体素数量
    pub fn count_set(&self) -> usize {
        self.data.iter().filter(|&&v| v != 0).count()
    }

    pub fn get_data(&self) -> &[u8] {
        &self.data
    }

    pub fn get_shape(&self) -> [usize; 3] {
        self.shape
    }

    /// 在每个触点周围标记固定半径的区域
    /// 超出体数据范围的部分直接裁掉
    pub fn rasterize(&mut self, contacts: &ContactMap, radius: f64, marker: MarkerShape) -> RasterStats {
        let mut stats = RasterStats::default();

        for position in contacts.positions() {
            if !position.is_finite() {
                stats.skipped_contacts += 1;
                continue;
            }
            self.mark(position, radius, marker);
        }

        stats.voxels_set = self.count_set();
        stats
    }

    fn mark(&mut self, center: Point3D, radius: f64, marker: MarkerShape) {
        let c = center.to_array();
        let mut ranges = [(0usize, 0usize); 3];
        for axis in 0..3 {
            // 半开区间 [lo, hi)，裁剪到 [0, n)
            // 立方体的边界向零取整，与整数切片一致
            let (lo, hi) = match marker {
                MarkerShape::Cube => ((c[axis] - radius).trunc(), (c[axis] + radius).trunc()),
                MarkerShape::Sphere => ((c[axis] - radius).ceil(), (c[axis] + radius).floor() + 1.0),
            };
            let lo = lo.max(0.0);
            let hi = hi.min(self.shape[axis] as f64);
            ranges[axis] = if hi > lo { (lo as usize, hi as usize) } else { (0, 0) };
        }

        let r2 = radius * radius;
        for k in ranges[2].0..ranges[2].1 {
            for j in ranges[1].0..ranges[1].1 {
                for i in ranges[0].0..ranges[0].1 {
                    if marker == MarkerShape::Sphere {
                        let v = Point3D::new(i as f64, j as f64, k as f64) - center;
                        if v.x * v.x + v.y * v.y + v.z * v.z > r2 {
                            continue;
                        }
                    }
                    self.set(i, j, k, 1);
                }
            }
        }
    }
}
