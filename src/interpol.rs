//! 电极阵列触点插值
//!
//! 根据 2~3 个角点的三维坐标重建整个规则阵列的触点位置。
//!
//! 索引约定（行优先，0 起）：
//! - A 对应 (0, 0)
//! - 网格 (M>1 且 N>1)：B 位于 (M-1, 0)，即行轴末端；C 位于 (0, N-1)，即列轴末端
//! - 条带 1xN：触点为 (0, j)，B 位于 (0, N-1)
//! - 条带 Mx1：触点为 (i, 0)，B 位于 (M-1, 0)
//!
//! B/C 标反不会报错，只会得到转置或倾斜的阵列，因此调用方必须遵守上述约定。
//! 网格按平行四边形处理：不假设两轴正交，也不校正非平面性。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{InterpolError, Result};
use crate::geometry::{ArrayShape, Point3D};

/// 单个阵列允许的最大触点数，临床阵列远小于此
pub const MAX_CONTACTS: usize = 4096;

/// 实测的角点坐标
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnchorSet {
    #[serde(rename = "A")]
    pub a: Point3D,
    #[serde(rename = "B")]
    pub b: Point3D,
    #[serde(rename = "C", default, skip_serializing_if = "Option::is_none")]
    pub c: Option<Point3D>,
}

impl AnchorSet {
    /// 条带锚点（两个角点）
    pub fn strip(a: Point3D, b: Point3D) -> Self {
        Self { a, b, c: None }
    }

    /// 网格锚点（三个角点）
    pub fn grid(a: Point3D, b: Point3D, c: Point3D) -> Self {
        Self { a, b, c: Some(c) }
    }
}

/// 单个触点
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contact {
    pub row: usize,
    pub col: usize,
    pub position: Point3D,
}

/// 阵列索引 (row, col) -> 触点坐标
/// 迭代顺序为行优先
#[derive(Debug, Clone, PartialEq)]
pub struct ContactMap {
    shape: ArrayShape,
    contacts: BTreeMap<(usize, usize), Point3D>,
}

impl ContactMap {
    pub fn shape(&self) -> ArrayShape {
        self.shape
    }

    pub fn get(&self, row: usize, col: usize) -> Option<Point3D> {
        self.contacts.get(&(row, col)).copied()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Contact> + '_ {
        self.contacts.iter().map(|(&(row, col), &position)| Contact {
            row,
            col,
            position,
        })
    }

    pub fn positions(&self) -> impl Iterator<Item = Point3D> + '_ {
        self.contacts.values().copied()
    }
}

impl Serialize for ContactMap {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let contacts: Vec<Contact> = self.iter().collect();
        let mut state = serializer.serialize_struct("ContactMap", 3)?;
        state.serialize_field("rows", &self.shape.rows)?;
        state.serialize_field("cols", &self.shape.cols)?;
        state.serialize_field("contacts", &contacts)?;
        state.end()
    }
}

/// 第 i 个位置在长度为 len 的轴上的比例
/// 长度为 1 的轴视为固定点，位移为 0（不会除零）
fn fraction(i: usize, len: usize) -> f64 {
    if len <= 1 {
        0.0
    } else {
        i as f64 / (len - 1) as f64
    }
}

/// 校验维度与锚点数量是否匹配
fn validate(anchors: &AnchorSet, shape: ArrayShape) -> Result<()> {
    if shape.rows < 1 || shape.cols < 1 {
        return Err(InterpolError::invalid_shape(format!(
            "阵列维度必须为正，但得到 {}",
            shape
        )));
    }

    match shape.rows.checked_mul(shape.cols) {
        Some(count) if count <= MAX_CONTACTS => {}
        _ => {
            return Err(InterpolError::invalid_shape(format!(
                "阵列 {} 的触点数超过上限 {}",
                shape, MAX_CONTACTS
            )));
        }
    }

    match (shape.is_strip(), anchors.c.is_some()) {
        (true, true) => Err(InterpolError::invalid_shape(format!(
            "条带 {} 只需要 A、B 两个锚点，但提供了 C",
            shape
        ))),
        (false, false) => Err(InterpolError::invalid_shape(format!(
            "网格 {} 需要 A、B、C 三个锚点，但缺少 C",
            shape
        ))),
        _ => Ok(()),
    }
}

/// 根据角点插值出阵列全部触点坐标
///
/// - 条带：`P_i = A + (i/(L-1)) * (B - A)`，L = max(M, N)
/// - 网格：`P(i,j) = A + (i/(M-1)) * (B - A) + (j/(N-1)) * (C - A)`
///
/// 锚点所在索引直接写入输入坐标，保证无浮点漂移。
/// 坐标不做有限性检查，NaN/Inf 会原样传播到输出。
pub fn interpolate(anchors: &AnchorSet, shape: ArrayShape) -> Result<ContactMap> {
    validate(anchors, shape)?;

    let AnchorSet { a, b, c } = *anchors;
    let mut contacts = BTreeMap::new();

    match c {
        None => {
            let len = shape.rows.max(shape.cols);
            for k in 0..len {
                let index = if shape.rows == 1 { (0, k) } else { (k, 0) };
                contacts.insert(index, a.lerp(b, fraction(k, len)));
            }
            if len > 1 {
                let end = if shape.rows == 1 { (0, len - 1) } else { (len - 1, 0) };
                contacts.insert(end, b);
            }
        }
        Some(c) => {
            let axis2 = c - a;
            for i in 0..shape.rows {
                let row_start = a.lerp(b, fraction(i, shape.rows));
                for j in 0..shape.cols {
                    contacts.insert((i, j), row_start + axis2 * fraction(j, shape.cols));
                }
            }
            contacts.insert((shape.rows - 1, 0), b);
            contacts.insert((0, shape.cols - 1), c);
        }
    }
    contacts.insert((0, 0), a);

    tracing::trace!(shape = %shape, contacts = contacts.len(), "阵列插值完成");

    Ok(ContactMap { shape, contacts })
}

/// 便捷入口：直接传入角点与维度
pub fn interpolate_corners(
    a: Point3D,
    b: Point3D,
    c: Option<Point3D>,
    rows: usize,
    cols: usize,
) -> Result<ContactMap> {
    interpolate(&AnchorSet { a, b, c }, ArrayShape::new(rows, cols))
}
