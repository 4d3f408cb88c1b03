//! 結果分析

use blend_core::{BlendConfig, BlendError, ProductStandard};

use crate::matrix::CompositionMatrix;
use crate::solver::BlendSolution;
use crate::{BlendWarning, ElementAnalysis, MixEntry};

/// 配料方案分析
#[derive(Debug, Clone, PartialEq)]
pub struct BlendAnalysis {
    pub total_weight: f64,
    pub total_cost: f64,
    pub average_price: f64,
    pub waste_mix: Vec<MixEntry>,
    pub element_analysis: Vec<ElementAnalysis>,
    pub warnings: Vec<BlendWarning>,
}

/// 結果分析器：將解向量轉為成本、配比與元素分析
pub struct ResultAnalyzer<'c> {
    config: &'c BlendConfig,
}

impl<'c> ResultAnalyzer<'c> {
    pub fn new(config: &'c BlendConfig) -> Self {
        Self { config }
    }

    /// 分析配料方案
    pub fn analyze(
        &self,
        solution: &BlendSolution,
        matrix: &CompositionMatrix<'_>,
        standard: &ProductStandard,
    ) -> blend_core::Result<BlendAnalysis> {
        let weights = &solution.weights;
        if weights.len() != matrix.len() {
            return Err(BlendError::CalculationError(format!(
                "解向量長度 {} 與廢料數量 {} 不一致",
                weights.len(),
                matrix.len()
            )));
        }

        let total_weight: f64 = weights.iter().sum();
        if !(total_weight > self.config.degenerate_weight_kg) {
            return Err(BlendError::DegenerateSolution);
        }

        let total_cost: f64 = weights
            .iter()
            .zip(matrix.prices())
            .map(|(x, price)| x * price)
            .sum();

        // 廢料配比
        let waste_mix: Vec<MixEntry> = matrix
            .lots()
            .iter()
            .zip(weights)
            .zip(matrix.prices())
            .filter(|((_, weight), _)| **weight > self.config.negligible_weight_kg)
            .map(|((lot, weight), price)| MixEntry {
                lot_name: lot.name.clone(),
                area: lot.area.clone(),
                weight: *weight,
                unit_price: *price,
                cost: weight * price,
                share_percent: weight / total_weight * 100.0,
            })
            .collect();

        let mut warnings = Vec::new();

        // 未列入配比的微量配料仍計入總成本（數值噪音不計）
        let (dropped, dropped_cost) = weights
            .iter()
            .zip(matrix.prices())
            .filter(|(weight, _)| {
                **weight > self.config.degenerate_weight_kg
                    && **weight <= self.config.negligible_weight_kg
            })
            .fold((0usize, 0.0f64), |(count, cost), (weight, price)| {
                (count + 1, cost + weight * price)
            });
        if dropped_cost != 0.0 {
            tracing::warn!("可忽略配料 {} 項未列入配比，成本 {:.6}", dropped, dropped_cost);
            warnings.push(BlendWarning::warning(
                "配料".to_string(),
                format!(
                    "可忽略配料共 {} 項，成本 {:.6} 計入總成本但未列入配比",
                    dropped, dropped_cost
                ),
            ));
        }

        // 元素分析
        let mut element_analysis = Vec::with_capacity(standard.ranges.len());
        for (element, range) in standard.constrained_elements() {
            let element_weight: f64 = weights
                .iter()
                .enumerate()
                .map(|(i, x)| x * matrix.fraction(i, element))
                .sum();
            let content = element_weight / total_weight * 100.0;
            let in_range = range.contains(content, self.config.tolerance);

            if !in_range {
                tracing::warn!(
                    "元素 {} 含量 {:.4}% 超出目標範圍 {}~{}%",
                    element,
                    content,
                    range.min,
                    range.max
                );
                warnings.push(BlendWarning::error(
                    element.to_string(),
                    format!(
                        "含量 {:.4}% 超出目標範圍 {:.3}%~{:.3}%",
                        content, range.min, range.max
                    ),
                ));
            }

            element_analysis.push(ElementAnalysis {
                element,
                content,
                target_min: range.min,
                target_max: range.max,
                in_range,
            });
        }

        Ok(BlendAnalysis {
            total_weight,
            total_cost,
            average_price: total_cost / total_weight,
            waste_mix,
            element_analysis,
            warnings,
        })
    }
}
