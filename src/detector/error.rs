//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载检测链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。
//!
//! 加载阶段的 `FileSystem / InvalidFormat / ResourceLimit` 都是 `Decode` 的细分，
//! 流水线对它们一视同仁：整次检测直接失败，不返回部分结果。

/// 检测链路统一错误类型。
///
/// 该类型会在应用层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    #[error("解码错误：{0}")]
    Decode(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    /// 差分引擎收到未对齐的两张图，属于流水线内部缺陷。
    #[error("尺寸不一致：{left:?} vs {right:?}（差分前必须先对齐尺寸）")]
    ShapeMismatch {
        left: (usize, usize),
        right: (usize, usize),
    },

    #[error("编码错误：{0}")]
    Encode(String),

    /// 检测器自身状态异常（如配置锁中毒），与输入图片无关。
    #[error("内部错误：{0}")]
    Internal(String),
}

impl DetectError {
    /// 是否属于加载阶段（读取 / 识别 / 解码）的失败。
    pub fn is_load_failure(&self) -> bool {
        matches!(
            self,
            Self::Decode(_) | Self::InvalidFormat(_) | Self::FileSystem(_) | Self::ResourceLimit(_)
        )
    }
}

impl From<DetectError> for String {
    /// 兼容部分仍使用字符串错误的调用点。
    fn from(error: DetectError) -> Self {
        error.to_string()
    }
}
