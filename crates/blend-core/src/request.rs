//! 配料請求模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// 區域篩選
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AreaFilter {
    /// 全部區域
    #[default]
    All,
    /// 單一區域（與廢料的區域欄位完全相等）
    Area(String),
}

impl AreaFilter {
    /// 解析使用者輸入的區域篩選
    ///
    /// "ALL"、"*"、空字串與 "全部区域" 都表示全部區域。
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.is_empty()
            || trimmed == "*"
            || trimmed.eq_ignore_ascii_case("all")
            || trimmed == "全部区域"
            || trimmed == "全部區域"
        {
            AreaFilter::All
        } else {
            AreaFilter::Area(input.to_string())
        }
    }

    /// 檢查區域是否符合
    pub fn matches(&self, area: &str) -> bool {
        match self {
            AreaFilter::All => true,
            AreaFilter::Area(expected) => expected == area,
        }
    }
}

impl fmt::Display for AreaFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AreaFilter::All => f.write_str("ALL"),
            AreaFilter::Area(area) => f.write_str(area),
        }
    }
}

/// 目標產量
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetWeight {
    /// 每公斤成本最低的配比，按庫存放大到最大批量
    #[default]
    Cheapest,
    /// 指定產量（kg）
    Exactly(Decimal),
}

/// 配料請求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendRequest {
    /// 產品標準名稱
    pub standard_name: String,

    /// 區域篩選
    pub area_filter: AreaFilter,

    /// 目標產量
    pub target: TargetWeight,
}

impl BlendRequest {
    /// 創建新的配料請求（全部區域、最低單位成本）
    pub fn new(standard_name: String) -> Self {
        Self {
            standard_name,
            area_filter: AreaFilter::All,
            target: TargetWeight::Cheapest,
        }
    }

    /// 建構器模式：設置區域篩選
    pub fn with_area_filter(mut self, area_filter: AreaFilter) -> Self {
        self.area_filter = area_filter;
        self
    }

    /// 建構器模式：設置目標產量
    pub fn with_target_weight(mut self, weight_kg: Decimal) -> Self {
        self.target = TargetWeight::Exactly(weight_kg);
        self
    }
}
