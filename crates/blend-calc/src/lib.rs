//! # Blend Calculation Engine
//!
//! 廢料配料計算引擎：成分矩陣 → 約束建模 → 求解 → 結果分析

pub mod analysis;
pub mod constraints;
pub mod engine;
pub mod matrix;
pub mod solver;

// Re-export 主要類型
pub use analysis::{BlendAnalysis, ResultAnalyzer};
pub use constraints::{BlendConstraints, ConstraintFormulator, ElementBound};
pub use engine::{BlendEngine, BlendJob};
pub use matrix::CompositionMatrix;
pub use solver::{BlendSolution, BlendSolver, SolverOutcome};

use blend_core::{AreaFilter, Element, TargetWeight};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 配料計算結果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlendResult {
    /// 方案ID
    pub id: Uuid,

    /// 產品標準名稱
    pub standard_name: String,

    /// 區域篩選
    pub area_filter: AreaFilter,

    /// 目標產量
    pub target: TargetWeight,

    /// 是否可行
    pub feasible: bool,

    /// 總重量（kg）
    pub total_weight: f64,

    /// 總成本（元）
    pub total_cost: f64,

    /// 平均單價（元/kg），僅在可行時有值
    pub average_price: Option<f64>,

    /// 廢料配比（依目錄順序，已排除可忽略的分配）
    pub waste_mix: Vec<MixEntry>,

    /// 元素分析（依元素標準順序）
    pub element_analysis: Vec<ElementAnalysis>,

    /// 不可行原因
    pub reason: Option<String>,

    /// 警告信息
    pub warnings: Vec<BlendWarning>,

    /// 求解器樞軸迭代次數
    pub iterations: usize,

    /// 計算時間
    pub computed_at: DateTime<Utc>,

    /// 計算耗時（毫秒）
    pub calculation_time_ms: Option<u64>,
}

impl BlendResult {
    /// 創建可行的配料結果
    pub fn feasible(
        standard_name: String,
        area_filter: AreaFilter,
        target: TargetWeight,
        analysis: BlendAnalysis,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            standard_name,
            area_filter,
            target,
            feasible: true,
            total_weight: analysis.total_weight,
            total_cost: analysis.total_cost,
            average_price: Some(analysis.average_price),
            waste_mix: analysis.waste_mix,
            element_analysis: analysis.element_analysis,
            reason: None,
            warnings: analysis.warnings,
            iterations: 0,
            computed_at: Utc::now(),
            calculation_time_ms: None,
        }
    }

    /// 創建不可行的配料結果
    pub fn infeasible(
        standard_name: String,
        area_filter: AreaFilter,
        target: TargetWeight,
        reason: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            standard_name,
            area_filter,
            target,
            feasible: false,
            total_weight: 0.0,
            total_cost: 0.0,
            average_price: None,
            waste_mix: Vec::new(),
            element_analysis: Vec::new(),
            reason: Some(reason),
            warnings: Vec::new(),
            iterations: 0,
            computed_at: Utc::now(),
            calculation_time_ms: None,
        }
    }

    /// 添加警告
    pub fn add_warning(&mut self, warning: BlendWarning) {
        self.warnings.push(warning);
    }

    /// 由配比表重算的成本
    pub fn mix_cost(&self) -> f64 {
        self.waste_mix.iter().map(|entry| entry.cost).sum()
    }

    /// 所有受約束元素是否都在範圍內
    pub fn all_elements_in_range(&self) -> bool {
        self.element_analysis.iter().all(|a| a.in_range)
    }

    /// 查詢單一元素的分析
    pub fn element(&self, element: Element) -> Option<&ElementAnalysis> {
        self.element_analysis.iter().find(|a| a.element == element)
    }

    /// 查詢單一廢料的配料重量
    pub fn weight_of(&self, lot_name: &str) -> Option<f64> {
        self.waste_mix
            .iter()
            .find(|entry| entry.lot_name == lot_name)
            .map(|entry| entry.weight)
    }
}

/// 廢料配比項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MixEntry {
    pub lot_name: String,
    pub area: String,
    /// 配料重量（kg）
    pub weight: f64,
    pub unit_price: f64,
    /// 該項成本 = 重量 × 單價
    pub cost: f64,
    /// 占總重量百分比
    pub share_percent: f64,
}

/// 元素含量分析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementAnalysis {
    pub element: Element,
    /// 實際含量（%）
    pub content: f64,
    pub target_min: f64,
    pub target_max: f64,
    pub in_range: bool,
}

impl ElementAnalysis {
    /// 報表標記
    pub fn marker(&self) -> &'static str {
        if self.in_range {
            "✓"
        } else {
            "✗"
        }
    }
}

/// 配料警告
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendWarning {
    /// 相關對象（廢料名稱或元素符號）
    pub subject: String,
    pub message: String,
    pub severity: WarningSeverity,
}

impl BlendWarning {
    pub fn new(subject: String, message: String, severity: WarningSeverity) -> Self {
        Self {
            subject,
            message,
            severity,
        }
    }

    pub fn info(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Info)
    }

    pub fn warning(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Warning)
    }

    pub fn error(subject: String, message: String) -> Self {
        Self::new(subject, message, WarningSeverity::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningSeverity {
    Info,
    Warning,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analysis() -> BlendAnalysis {
        BlendAnalysis {
            total_weight: 100.0,
            total_cost: 340.0,
            average_price: 3.4,
            waste_mix: vec![
                MixEntry {
                    lot_name: "A".to_string(),
                    area: "Z1".to_string(),
                    weight: 20.0,
                    unit_price: 5.0,
                    cost: 100.0,
                    share_percent: 20.0,
                },
                MixEntry {
                    lot_name: "B".to_string(),
                    area: "Z1".to_string(),
                    weight: 80.0,
                    unit_price: 3.0,
                    cost: 240.0,
                    share_percent: 80.0,
                },
            ],
            element_analysis: vec![ElementAnalysis {
                element: Element::Si,
                content: 0.6,
                target_min: 0.6,
                target_max: 0.8,
                in_range: true,
            }],
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_feasible_result() {
        let result = BlendResult::feasible(
            "S".to_string(),
            AreaFilter::All,
            TargetWeight::Cheapest,
            analysis(),
        );

        assert!(result.feasible);
        assert_eq!(result.average_price, Some(3.4));
        assert_eq!(result.mix_cost(), 340.0);
        assert_eq!(result.weight_of("B"), Some(80.0));
        assert_eq!(result.weight_of("C"), None);
        assert!(result.all_elements_in_range());
        assert_eq!(result.element(Element::Si).unwrap().marker(), "✓");
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_infeasible_result() {
        let result = BlendResult::infeasible(
            "S".to_string(),
            AreaFilter::Area("Z9".to_string()),
            TargetWeight::Cheapest,
            "無法找到可行解".to_string(),
        );

        assert!(!result.feasible);
        assert!(result.average_price.is_none());
        assert!(result.waste_mix.is_empty());
        assert_eq!(result.reason.as_deref(), Some("無法找到可行解"));
    }

    #[test]
    fn test_result_serializes_for_presentation() {
        let result = BlendResult::feasible(
            "S".to_string(),
            AreaFilter::All,
            TargetWeight::Cheapest,
            analysis(),
        );

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["standard_name"], "S");
        assert_eq!(json["waste_mix"][1]["lot_name"], "B");
        assert_eq!(json["element_analysis"][0]["element"], "Si");
    }

    #[test]
    fn test_marker_for_out_of_range() {
        let analysis = ElementAnalysis {
            element: Element::Fe,
            content: 1.2,
            target_min: 0.0,
            target_max: 1.0,
            in_range: false,
        };
        assert_eq!(analysis.marker(), "✗");
    }
}
