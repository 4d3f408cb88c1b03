//! 配料引擎配置

use serde::{Deserialize, Serialize};

use crate::{BlendError, Result};

/// 配料引擎策略參數
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    /// 可忽略配料重量（kg），不高於此值的分配視為數值噪音
    pub negligible_weight_kg: f64,

    /// 每次線性規劃求解的最大迭代次數
    pub max_iterations: usize,

    /// 相對容差（約束可行性、含量判定）
    pub tolerance: f64,

    /// 總重量不高於此值（kg）時視為退化解
    pub degenerate_weight_kg: f64,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            negligible_weight_kg: 0.001,
            max_iterations: 1000,
            tolerance: 1e-6,
            degenerate_weight_kg: 1e-9,
        }
    }
}

impl BlendConfig {
    /// 創建預設配置
    pub fn new() -> Self {
        Self::default()
    }

    /// 從 JSON 讀取配置，缺少的欄位採用預設值
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| BlendError::InvalidRequest(format!("配置解析失敗: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 建構器模式：設置可忽略配料重量
    pub fn with_negligible_weight(mut self, weight_kg: f64) -> Self {
        self.negligible_weight_kg = weight_kg;
        self
    }

    /// 建構器模式：設置最大迭代次數
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// 建構器模式：設置相對容差
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// 建構器模式：設置退化解門檻
    pub fn with_degenerate_weight(mut self, weight_kg: f64) -> Self {
        self.degenerate_weight_kg = weight_kg;
        self
    }

    /// 檢查配置是否合法
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(BlendError::InvalidRequest("最大迭代次數必須大於 0".to_string()));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(BlendError::InvalidRequest(format!(
                "容差必須為正數: {}",
                self.tolerance
            )));
        }
        if !(self.negligible_weight_kg.is_finite() && self.negligible_weight_kg >= 0.0) {
            return Err(BlendError::InvalidRequest(format!(
                "可忽略配料重量不可為負: {}",
                self.negligible_weight_kg
            )));
        }
        if !(self.degenerate_weight_kg.is_finite() && self.degenerate_weight_kg >= 0.0) {
            return Err(BlendError::InvalidRequest(format!(
                "退化解門檻不可為負: {}",
                self.degenerate_weight_kg
            )));
        }
        Ok(())
    }
}
