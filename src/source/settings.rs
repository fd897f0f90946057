use std::path::{Path, PathBuf};

use serde_json::Value as JsonValue;
use tracing::debug;

use crate::error::SourceError;

/// 按位置顺序提供字段名列表的侧通道
pub trait FieldListSource {
    /// 读取名为 `key` 的字段列表；缺失时返回空列表，非字符串项占位为空串
    fn read_list(&self, key: &str) -> Result<Vec<String>, SourceError>;
}

/// setting.json
///
/// ```json
/// { "student_fields": ["class", "studentid", "name", "award"] }
/// ```
#[derive(Debug, Clone)]
pub struct SettingsFile {
    path: PathBuf,
}

impl SettingsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FieldListSource for SettingsFile {
    fn read_list(&self, key: &str) -> Result<Vec<String>, SourceError> {
        let path_str = self.path.display().to_string();
        if !self.path.exists() {
            return Err(SourceError::NotFound { path: path_str });
        }

        let content = std::fs::read_to_string(&self.path)?;
        let data: JsonValue =
            serde_json::from_str(&content).map_err(|source| SourceError::SettingsParseFailed {
                path: path_str.clone(),
                source,
            })?;

        let fields: Vec<String> = data
            .get(key)
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .map(|item| item.as_str().map(str::to_string).unwrap_or_default())
                    .collect()
            })
            .unwrap_or_default();

        debug!("{} 中的 {}: {:?}", path_str, key, fields);
        Ok(fields)
    }
}
