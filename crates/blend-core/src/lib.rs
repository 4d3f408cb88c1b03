//! # Blend Core
//!
//! 廢料配料核心資料模型與類型定義

pub mod config;
pub mod element;
pub mod lot;
pub mod request;
pub mod standard;

// Re-export 主要類型
pub use config::BlendConfig;
pub use element::{Element, ELEMENT_COUNT};
pub use lot::ScrapLot;
pub use request::{AreaFilter, BlendRequest, TargetWeight};
pub use standard::{ElementRange, ProductStandard};

/// 配料錯誤類型
#[derive(Debug, thiserror::Error)]
pub enum BlendError {
    #[error("區域 \"{0}\" 中沒有找到廢料數據")]
    EmptyCatalogue(String),

    #[error("找不到產品標準: {0}")]
    UnknownStandard(String),

    #[error("產品標準無效: {0}")]
    InvalidStandard(String),

    #[error("配料請求無效: {0}")]
    InvalidRequest(String),

    #[error("求解器在 {iterations} 次迭代內未收斂")]
    SolverDidNotConverge { iterations: usize },

    #[error("最優解總重量為零，無法構成有效配料")]
    DegenerateSolution,

    #[error("計算已取消")]
    Cancelled,

    #[error("計算錯誤: {0}")]
    CalculationError(String),
}

impl BlendError {
    /// 是否為使用者主動取消（非錯誤結果）
    pub fn is_cancellation(&self) -> bool {
        matches!(self, BlendError::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, BlendError>;
