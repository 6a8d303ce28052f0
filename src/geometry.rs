use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InterpolError;

/// 三维空间中的点（体素坐标或物理坐标）
/// JSON 中以 `[x, y, z]` 数组表示，与电极配置文件格式一致
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 3]", into = "[f64; 3]")]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub const ORIGIN: Point3D = Point3D::new(0.0, 0.0, 0.0);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// 线性插值: `(1 - t) * self + t * other`
    /// t = 0 和 t = 1 时分别精确返回两个端点
    pub fn lerp(self, other: Point3D, t: f64) -> Point3D {
        self * (1.0 - t) + other * t
    }

    pub fn distance(self, other: Point3D) -> f64 {
        let d = other - self;
        (d.x * d.x + d.y * d.y + d.z * d.z).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f64; 3]> for Point3D {
    fn from(v: [f64; 3]) -> Self {
        Point3D::new(v[0], v[1], v[2])
    }
}

impl From<Point3D> for [f64; 3] {
    fn from(p: Point3D) -> Self {
        p.to_array()
    }
}

impl Add for Point3D {
    type Output = Point3D;

    fn add(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3D {
    type Output = Point3D;

    fn sub(self, rhs: Point3D) -> Point3D {
        Point3D::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Point3D {
    type Output = Point3D;

    fn mul(self, s: f64) -> Point3D {
        Point3D::new(self.x * s, self.y * s, self.z * s)
    }
}

impl fmt::Display for Point3D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

impl FromStr for Point3D {
    type Err = InterpolError;

    /// 解析 "x,y,z" 形式（命令行参数）
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values: Vec<f64> = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|e| InterpolError::config(format!("无法解析坐标 '{}': {}", s, e)))?;

        match values.as_slice() {
            [x, y, z] => Ok(Point3D::new(*x, *y, *z)),
            _ => Err(InterpolError::config(format!(
                "坐标应该包含3个分量，但得到{}个: '{}'",
                values.len(),
                s
            ))),
        }
    }
}

/// 电极阵列维度 M 行 x N 列
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArrayShape {
    pub rows: usize,
    pub cols: usize,
}

impl ArrayShape {
    pub const fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols }
    }

    /// 条带：任一维度为 1
    pub fn is_strip(&self) -> bool {
        self.rows == 1 || self.cols == 1
    }

    pub fn contact_count(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }
}

impl fmt::Display for ArrayShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

impl FromStr for ArrayShape {
    type Err = InterpolError;

    /// 解析 grid_config 字符串，例如 "8x8"、"1x6"
    /// 维度为 0 时照常返回，由插值器报 InvalidShape
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        let parts: Vec<&str> = lowered.split('x').map(str::trim).collect();

        let [rows, cols] = parts.as_slice() else {
            return Err(InterpolError::grid_config(format!(
                "grid_config 应为 \"MxN\" 形式，但得到 '{}'",
                s
            )));
        };

        let parse = |part: &str| {
            part.parse::<usize>().map_err(|e| {
                InterpolError::grid_config(format!("grid_config '{}' 维度无法解析: {}", s, e))
            })
        };

        Ok(ArrayShape::new(parse(*rows)?, parse(*cols)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_hits_endpoints_exactly() {
        let a = Point3D::new(0.1, -3.7, 12.25);
        let b = Point3D::new(0.3, 8.9, -1.0 / 3.0);
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
    }

    #[test]
    fn point_serializes_as_array() {
        let p: Point3D = serde_json::from_str("[1.5, 2, -3]").unwrap();
        assert_eq!(p, Point3D::new(1.5, 2.0, -3.0));
        assert_eq!(serde_json::to_string(&p).unwrap(), "[1.5,2.0,-3.0]");
    }

    #[test]
    fn point_parses_from_cli_form() {
        let p: Point3D = " 1, 2.5 ,-4".parse().unwrap();
        assert_eq!(p, Point3D::new(1.0, 2.5, -4.0));
        assert!("1,2".parse::<Point3D>().is_err());
        assert!("1,a,3".parse::<Point3D>().is_err());
    }

    #[test]
    fn grid_config_parsing() {
        assert_eq!("8x8".parse::<ArrayShape>().unwrap(), ArrayShape::new(8, 8));
        assert_eq!(" 1 X 6 ".parse::<ArrayShape>().unwrap(), ArrayShape::new(1, 6));
        assert_eq!("0x4".parse::<ArrayShape>().unwrap(), ArrayShape::new(0, 4));
        assert!(matches!("8".parse::<ArrayShape>(), Err(InterpolError::GridConfig(_))));
        assert!("axb".parse::<ArrayShape>().is_err());
        assert!("2x3x4".parse::<ArrayShape>().is_err());
    }

    #[test]
    fn shape_display_round_trips() {
        let shape = ArrayShape::new(4, 5);
        assert_eq!(shape.to_string(), "4x5");
        assert!(!shape.is_strip());
        assert!(ArrayShape::new(1, 8).is_strip());
        assert_eq!(shape.contact_count(), 20);
    }
}
