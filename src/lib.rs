//! 颅内电极阵列触点插值
//!
//! 核心是 [`interpol::interpolate`]：由 2~3 个角点重建条带或网格阵列的全部触点坐标。
//! 其余模块负责配置读取、体数据文件头、掩膜栅格化、NIfTI 输出以及 HTTP 服务。

pub mod app_state;
pub mod config;
pub mod error;
pub mod geometry;
pub mod handlers;
pub mod interpol;
pub mod parser_registry;
pub mod parsers;
pub mod performance;
pub mod pipeline;
pub mod routes;
pub mod task;
pub mod utils;
pub mod voxel_grid;

pub use error::{InterpolError, Result};
pub use geometry::{ArrayShape, Point3D};
pub use interpol::{AnchorSet, Contact, ContactMap, interpolate, interpolate_corners};
