//! 產品標準模型

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::element::Element;
use crate::{BlendError, Result};

/// 元素含量範圍（百分比）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ElementRange {
    /// 最小含量（%）
    pub min: f64,
    /// 最大含量（%）
    pub max: f64,
}

impl ElementRange {
    /// 創建含量範圍，要求 0 ≤ min ≤ max ≤ 100
    pub fn new(min: f64, max: f64) -> Result<Self> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    /// 檢查範圍是否合法
    pub fn validate(&self) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(BlendError::InvalidStandard(format!(
                "含量範圍必須是有限數值: {}~{}",
                self.min, self.max
            )));
        }
        if self.min < 0.0 || self.max > 100.0 || self.min > self.max {
            return Err(BlendError::InvalidStandard(format!(
                "含量範圍必須滿足 0 ≤ min ≤ max ≤ 100: {}~{}",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// 最小含量（小數）
    pub fn min_fraction(&self) -> f64 {
        self.min / 100.0
    }

    /// 最大含量（小數）
    pub fn max_fraction(&self) -> f64 {
        self.max / 100.0
    }

    /// 含量是否落在範圍內（容差以百分點計）
    pub fn contains(&self, content: f64, tolerance: f64) -> bool {
        content >= self.min - tolerance * self.min.abs().max(1.0)
            && content <= self.max + tolerance * self.max.abs().max(1.0)
    }
}

/// 產品標準（目標成分窗口）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStandard {
    /// 產品名稱（唯一）
    pub name: String,

    /// 受約束元素的含量範圍；未列出的元素不受約束
    pub ranges: BTreeMap<Element, ElementRange>,
}

impl ProductStandard {
    /// 創建沒有任何元素約束的產品標準
    pub fn new(name: String) -> Self {
        Self {
            name,
            ranges: BTreeMap::new(),
        }
    }

    /// 建構器模式：設置元素含量範圍
    pub fn with_range(mut self, element: Element, min: f64, max: f64) -> Result<Self> {
        self.ranges.insert(element, ElementRange::new(min, max)?);
        Ok(self)
    }

    /// 從持久化的範圍 JSON 解析
    ///
    /// 格式：`{"Si": {"min": 0.6, "max": 0.8}, ...}`
    pub fn from_ranges_json(name: String, json: &str) -> Result<Self> {
        let raw: HashMap<String, ElementRange> = serde_json::from_str(json)
            .map_err(|e| BlendError::InvalidStandard(format!("{}: {}", name, e)))?;

        let mut standard = Self::new(name);
        for (key, range) in raw {
            let element = key
                .parse::<Element>()
                .map_err(|e| BlendError::InvalidStandard(format!("{}: {}", standard.name, e)))?;
            range.validate()?;
            standard.ranges.insert(element, range);
        }
        Ok(standard)
    }

    /// 元素含量範圍
    pub fn range(&self, element: Element) -> Option<&ElementRange> {
        self.ranges.get(&element)
    }

    /// 依標準順序迭代受約束元素
    pub fn constrained_elements(&self) -> impl Iterator<Item = (Element, &ElementRange)> {
        self.ranges.iter().map(|(e, r)| (*e, r))
    }

    /// 是否沒有任何元素約束
    pub fn is_unconstrained(&self) -> bool {
        self.ranges.is_empty()
    }

    /// 檢查全部範圍是否合法
    pub fn validate(&self) -> Result<()> {
        for (element, range) in &self.ranges {
            range.validate().map_err(|e| {
                BlendError::InvalidStandard(format!("{} / {}: {}", self.name, element, e))
            })?;
        }
        Ok(())
    }
}
