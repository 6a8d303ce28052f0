use std::path::Path;

use crate::error::{InterpolError, Result};
use crate::utils::parser::{VolumeHeader, VolumeParser};

/// 解析器注册表
/// 按文件名后缀匹配体数据解析器，支持 `nii.gz` 这类复合后缀
pub struct ParserRegistry {
    parsers: Vec<Box<dyn VolumeParser>>,
}

/// 文件名的候选后缀，从最长到最短
/// 例如 "seg.nii.gz" 依次得到 "nii.gz"、"gz"；隐藏文件开头的点不算
fn suffixes(file_name: &str) -> impl Iterator<Item = &str> {
    file_name
        .match_indices('.')
        .filter(|(pos, _)| *pos > 0)
        .map(move |(pos, _)| &file_name[pos + 1..])
        .filter(|suffix| !suffix.is_empty())
}

impl ParserRegistry {
    /// 创建新的解析器注册表，自动注册所有可用的解析器
    pub fn new() -> Self {
        Self::with_parsers(crate::parsers::get_all_parsers())
    }

    pub fn with_parsers(parsers: Vec<Box<dyn VolumeParser>>) -> Self {
        Self { parsers }
    }

    /// 根据后缀查找解析器
    /// extension: 不含开头点号，例如 "nii" 或 "nii.gz"
    pub fn find_parser(&self, extension: &str) -> Option<&dyn VolumeParser> {
        self.parsers
            .iter()
            .find(|parser| parser.supports(extension))
            .map(|p| p.as_ref())
    }

    /// 根据文件路径查找解析器，返回匹配到的最长后缀（小写）
    /// "archive.tar.gz" 不会因为 "gz" 被当成 NIfTI
    pub fn find_parser_for_file(&self, file_path: &Path) -> Option<(&dyn VolumeParser, String)> {
        let file_name = file_path.file_name()?.to_str()?;

        suffixes(file_name).find_map(|suffix| {
            self.find_parser(suffix)
                .map(|parser| (parser, suffix.to_ascii_lowercase()))
        })
    }

    /// 选择解析器并读取文件头，同时返回解析器名称
    pub fn read_header(&self, file_path: &Path) -> Result<(VolumeHeader, &'static str)> {
        let (parser, _) = self.find_parser_for_file(file_path).ok_or_else(|| {
            InterpolError::volume(format!(
                "不支持的文件格式: {}（支持: {}）",
                file_path.display(),
                self.supported_extensions().join(", ")
            ))
        })?;
        Ok((parser.read_header(file_path)?, parser.name()))
    }

    /// 获取所有支持的后缀列表
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self
            .parsers
            .iter()
            .flat_map(|parser| parser.supported_extensions())
            .map(|s| s.to_lowercase())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_suffix_wins() {
        let registry = ParserRegistry::new();
        assert_eq!(registry.supported_extensions(), vec!["nii", "nii.gz"]);

        let (parser, ext) = registry
            .find_parser_for_file(Path::new("data/HUP64_unburied_electrode_seg.NII.GZ"))
            .unwrap();
        assert_eq!(ext, "nii.gz");
        assert_eq!(parser.name(), "NIfTI-1 Parser");

        let (_, ext) = registry
            .find_parser_for_file(Path::new("run.v2.nii"))
            .unwrap();
        assert_eq!(ext, "nii");
    }

    #[test]
    fn other_gzip_files_have_no_parser() {
        let registry = ParserRegistry::new();
        assert!(registry.find_parser("gz").is_none());
        assert!(registry.find_parser_for_file(Path::new("archive.tar.gz")).is_none());
        assert!(registry.find_parser_for_file(Path::new("seg.vasp")).is_none());
        assert!(registry.find_parser_for_file(Path::new("no_extension")).is_none());
        assert!(registry.find_parser_for_file(Path::new(".nii")).is_none());
    }

    #[test]
    fn unsupported_file_is_volume_error() {
        let registry = ParserRegistry::new();
        let err = registry.read_header(Path::new("seg.tar.gz")).unwrap_err();
        assert!(matches!(err, InterpolError::Volume(_)));
    }

    #[test]
    fn empty_registry_matches_nothing() {
        let registry = ParserRegistry::with_parsers(Vec::new());
        assert!(registry.find_parser_for_file(Path::new("seg.nii.gz")).is_none());
        assert!(registry.supported_extensions().is_empty());
    }
}
