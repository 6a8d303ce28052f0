use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{InterpolError, Result};
use crate::geometry::{ArrayShape, Point3D};
use crate::interpol::{AnchorSet, ContactMap, interpolate};

/// 单个电极阵列的配置项
/// 例如: `{"grid_config": "8x8", "A": [..], "B": [..], "C": [..]}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayEntry {
    pub grid_config: String,
    #[serde(rename = "A")]
    pub a: Point3D,
    #[serde(rename = "B")]
    pub b: Point3D,
    #[serde(rename = "C", default)]
    pub c: Option<Point3D>,
}

impl ArrayEntry {
    pub fn shape(&self) -> Result<ArrayShape> {
        self.grid_config.parse()
    }

    pub fn anchors(&self) -> AnchorSet {
        AnchorSet {
            a: self.a,
            b: self.b,
            c: self.c,
        }
    }

    pub fn interpolate(&self) -> Result<ContactMap> {
        interpolate(&self.anchors(), self.shape()?)
    }
}

/// 病人 -> 阵列标签（"1"、"2"...）-> 阵列配置
pub type PatientArrays = BTreeMap<String, ArrayEntry>;

/// 电极配置文件
/// 顶层 `DATA_DIR` 为数据目录，其余键均为病人 ID
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ElectrodeConfig {
    #[serde(rename = "DATA_DIR", default)]
    pub data_dir: Option<String>,
    #[serde(flatten)]
    pub patients: BTreeMap<String, PatientArrays>,
}

impl ElectrodeConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// 从 JSON 文件加载配置
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| InterpolError::io(path, e))?;
        let config = Self::from_json_str(&text)?;
        tracing::debug!(path = %path.display(), patients = config.patients.len(), "已加载电极配置");
        Ok(config)
    }

    pub fn patient_ids(&self) -> Vec<String> {
        self.patients.keys().cloned().collect()
    }

    pub fn patient(&self, patient_id: &str) -> Result<&PatientArrays> {
        self.patients
            .get(patient_id)
            .ok_or_else(|| InterpolError::config(format!("配置中没有病人 '{}'", patient_id)))
    }

    pub fn array(&self, patient_id: &str, label: &str) -> Result<&ArrayEntry> {
        self.patient(patient_id)?.get(label).ok_or_else(|| {
            InterpolError::config(format!("病人 '{}' 没有阵列 '{}'", patient_id, label))
        })
    }

    /// 数据目录，开头的 `~` 展开为 `$HOME`
    pub fn resolved_data_dir(&self) -> Option<PathBuf> {
        self.data_dir.as_deref().map(expand_home)
    }
}

/// 展开路径开头的 `~`
pub fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix('~'), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => {
            let rest = rest.trim_start_matches('/');
            if rest.is_empty() {
                PathBuf::from(home)
            } else {
                PathBuf::from(home).join(rest)
            }
        }
        _ => PathBuf::from(path),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "DATA_DIR": "/data/hup",
        "HUP64": {
            "1": {"grid_config": "8x8", "A": [10, 20, 30], "B": [80, 20, 30], "C": [10, 90, 30]}
        },
        "HUP65": {
            "1": {"grid_config": "1x6", "A": [0, 0, 0], "B": [50, 0, 0]},
            "2": {"grid_config": "4x1", "A": [1, 1, 1], "B": [1, 1, 31]}
        }
    }"#;

    #[test]
    fn parses_patients_and_data_dir() {
        let config = ElectrodeConfig::from_json_str(SAMPLE).unwrap();
        assert_eq!(config.data_dir.as_deref(), Some("/data/hup"));
        assert_eq!(config.patient_ids(), vec!["HUP64", "HUP65"]);

        let grid = config.array("HUP64", "1").unwrap();
        assert_eq!(grid.shape().unwrap(), ArrayShape::new(8, 8));
        assert_eq!(grid.c, Some(Point3D::new(10.0, 90.0, 30.0)));

        let strip = config.array("HUP65", "1").unwrap();
        assert_eq!(strip.c, None);
        assert_eq!(strip.interpolate().unwrap().len(), 6);
    }

    #[test]
    fn missing_patient_or_array_is_config_error() {
        let config = ElectrodeConfig::from_json_str(SAMPLE).unwrap();
        assert!(matches!(config.patient("HUP99"), Err(InterpolError::Config(_))));
        assert!(matches!(config.array("HUP64", "3"), Err(InterpolError::Config(_))));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = ElectrodeConfig::from_json_str("{\"HUP64\": [").unwrap_err();
        assert!(matches!(err, InterpolError::Json(_)));
    }

    #[test]
    fn bad_grid_config_surfaces_on_interpolate() {
        let config = ElectrodeConfig::from_json_str(
            r#"{"P1": {"1": {"grid_config": "eight", "A": [0,0,0], "B": [1,0,0]}}}"#,
        )
        .unwrap();
        let err = config.array("P1", "1").unwrap().interpolate().unwrap_err();
        assert!(matches!(err, InterpolError::GridConfig(_)));
        assert!(err.is_geometry());
    }

    #[test]
    fn plain_paths_are_not_expanded() {
        assert_eq!(expand_home("/abs/dir"), PathBuf::from("/abs/dir"));
        assert_eq!(expand_home("rel/dir"), PathBuf::from("rel/dir"));
    }
}
