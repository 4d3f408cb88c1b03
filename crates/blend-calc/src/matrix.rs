//! 成分矩陣建構

use blend_core::{AreaFilter, BlendError, Element, ScrapLot, ELEMENT_COUNT};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::BlendWarning;

/// 篩選後廢料的數值視圖
///
/// 三個陣列以廢料索引 0..n-1 對齊：重量上界、單價、元素分率（含量 / 100）。
#[derive(Debug, Clone)]
pub struct CompositionMatrix<'a> {
    lots: Vec<&'a ScrapLot>,
    weight_bounds: Vec<f64>,
    prices: Vec<f64>,
    fractions: Vec<[f64; ELEMENT_COUNT]>,
    warnings: Vec<BlendWarning>,
}

impl<'a> CompositionMatrix<'a> {
    /// 依區域篩選廢料並建立矩陣
    pub fn build(catalogue: &'a [ScrapLot], area_filter: &AreaFilter) -> blend_core::Result<Self> {
        let lots: Vec<&ScrapLot> = catalogue
            .iter()
            .filter(|lot| area_filter.matches(&lot.area))
            .collect();

        if lots.is_empty() {
            return Err(BlendError::EmptyCatalogue(area_filter.to_string()));
        }

        let mut weight_bounds = Vec::with_capacity(lots.len());
        let mut prices = Vec::with_capacity(lots.len());
        let mut fractions = Vec::with_capacity(lots.len());
        let mut warnings = Vec::new();

        for lot in &lots {
            for element in lot.unparsable_elements() {
                tracing::warn!("廢料 {} 的 {} 含量無法解析，按 0 計算", lot.name, element);
                warnings.push(BlendWarning::warning(
                    lot.name.clone(),
                    format!("{} 含量無法解析，按 0 計算", element),
                ));
            }

            let weight = decimal_to_f64(lot.weight_kg);
            if weight < 0.0 {
                tracing::warn!("廢料 {} 可用重量為負 ({})，按 0 計算", lot.name, weight);
                warnings.push(BlendWarning::warning(
                    lot.name.clone(),
                    format!("可用重量為負 ({})，按 0 計算", weight),
                ));
            }
            weight_bounds.push(weight.max(0.0));
            prices.push(decimal_to_f64(lot.unit_price));

            let mut row = [0.0; ELEMENT_COUNT];
            for element in Element::ALL {
                row[element.index()] = lot.percentage(element) / 100.0;
            }
            fractions.push(row);
        }

        Ok(Self {
            lots,
            weight_bounds,
            prices,
            fractions,
            warnings,
        })
    }

    /// 廢料數量
    pub fn len(&self) -> usize {
        self.lots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lots.is_empty()
    }

    /// 篩選後的廢料（保持目錄順序）
    pub fn lots(&self) -> &[&'a ScrapLot] {
        &self.lots
    }

    pub fn weight_bounds(&self) -> &[f64] {
        &self.weight_bounds
    }

    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    pub fn fractions(&self) -> &[[f64; ELEMENT_COUNT]] {
        &self.fractions
    }

    /// 單一廢料單一元素的分率
    pub fn fraction(&self, lot: usize, element: Element) -> f64 {
        self.fractions[lot][element.index()]
    }

    /// 單一元素在所有廢料中的分率
    pub fn element_column(&self, element: Element) -> Vec<f64> {
        self.fractions
            .iter()
            .map(|row| row[element.index()])
            .collect()
    }

    /// 篩選後的總可用重量
    pub fn total_available(&self) -> f64 {
        self.weight_bounds.iter().sum()
    }

    /// 建構過程中的數據警告
    pub fn warnings(&self) -> &[BlendWarning] {
        &self.warnings
    }
}

fn decimal_to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
