//! 約束建模
//!
//! 元素含量窗口是比例約束 `Σxᵢfᵢ / Σxᵢ ∈ [min, max]`，兩邊同乘總重量後
//! 成為線性不等式：
//!
//! ```text
//! Σᵢ xᵢ·(fᵢ − min) ≥ 0
//! Σᵢ xᵢ·(max − fᵢ) ≥ 0
//! ```

use blend_core::{Element, ProductStandard};
use blend_optimizer::LinearConstraint;

use crate::matrix::CompositionMatrix;

/// 單一元素的含量窗口（分率）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ElementBound {
    pub element: Element,
    pub min_fraction: f64,
    pub max_fraction: f64,
}

/// 配料問題的約束集合
#[derive(Debug, Clone)]
pub struct BlendConstraints {
    /// 受約束元素（標準順序）
    pub element_bounds: Vec<ElementBound>,

    /// 每個元素依序一列下限、一列上限
    pub rows: Vec<LinearConstraint>,

    /// 每批廢料的可用重量上界
    pub upper_bounds: Vec<f64>,
}

impl BlendConstraints {
    /// 廢料數量
    pub fn num_lots(&self) -> usize {
        self.upper_bounds.len()
    }

    /// 是否只有重量上界
    pub fn has_element_rows(&self) -> bool {
        !self.rows.is_empty()
    }

    /// 檢查配料重量是否滿足全部約束（相對容差）
    pub fn is_satisfied_by(&self, weights: &[f64], tolerance: f64) -> bool {
        if weights.len() != self.num_lots() {
            return false;
        }
        let within_bounds = weights
            .iter()
            .zip(&self.upper_bounds)
            .all(|(x, u)| *x >= -tolerance && *x <= u + tolerance * u.max(1.0));

        within_bounds && self.rows.iter().all(|row| row.is_satisfied(weights, tolerance))
    }
}

/// 約束建模器
pub struct ConstraintFormulator;

impl ConstraintFormulator {
    /// 將產品標準轉為線性約束
    pub fn formulate(
        matrix: &CompositionMatrix<'_>,
        standard: &ProductStandard,
    ) -> blend_core::Result<BlendConstraints> {
        standard.validate()?;

        let mut element_bounds = Vec::with_capacity(standard.ranges.len());
        let mut rows = Vec::with_capacity(standard.ranges.len() * 2);

        for (element, range) in standard.constrained_elements() {
            let min = range.min_fraction();
            let max = range.max_fraction();
            let column = matrix.element_column(element);

            rows.push(LinearConstraint::greater_eq(
                column.iter().map(|f| f - min).collect(),
                0.0,
            ));
            rows.push(LinearConstraint::greater_eq(
                column.iter().map(|f| max - f).collect(),
                0.0,
            ));

            element_bounds.push(ElementBound {
                element,
                min_fraction: min,
                max_fraction: max,
            });
        }

        tracing::debug!(
            "約束建模：元素約束 {} 個，線性不等式 {} 列，重量上界 {} 個",
            element_bounds.len(),
            rows.len(),
            matrix.len()
        );

        Ok(BlendConstraints {
            element_bounds,
            rows,
            upper_bounds: matrix.weight_bounds().to_vec(),
        })
    }
}
