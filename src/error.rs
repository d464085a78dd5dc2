//! 错误类型定义
//!
//! 批次校验的类型化错误。分析过程中的局部失败不在此列：
//! 越界区域被裁剪为空统计，单项因子失败降级为 0 分。

use thiserror::Error;

/// 批次校验错误
///
/// 校验时收集所有违规文件后一次性报告，不在第一个错误处中断。
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    /// 文件名缺少 `_YYYYMMDDHHMMSS` 时间戳段
    #[error("文件名缺少有效时间戳 (_YYYYMMDDHHMMSS): {}", .files.join(", "))]
    InvalidTimestamp { files: Vec<String> },

    /// 不支持的文件扩展名 (仅支持 jpg/jpeg/png)
    #[error("不支持的文件类型: {}", .files.join(", "))]
    UnsupportedFileType { files: Vec<String> },

    /// 空批次
    #[error("截图批次为空")]
    EmptyBatch,

    /// 所需的外部能力未注入 (OCR / NSFW)
    #[error("外部能力不可用: {name}")]
    CapabilityUnavailable { name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_timestamp_lists_files() {
        let err = ValidationError::InvalidTimestamp {
            files: vec!["a.png".to_string(), "b.png".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("a.png"));
        assert!(msg.contains("b.png"));
    }

    #[test]
    fn test_capability_unavailable_names_capability() {
        let err = ValidationError::CapabilityUnavailable {
            name: "ocr".to_string(),
        };
        assert!(err.to_string().contains("ocr"));
    }
}
