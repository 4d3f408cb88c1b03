//! # Blend Optimizer
//!
//! 線性規劃求解模組（稠密兩階段有界變數單純形法）
//!
//! 所有決策變數隱含 `x ≥ 0`，上界以 [`LinearProgram::upper_bounds`] 指定，
//! 在比值檢驗中處理而不佔約束列。

pub mod cancel;
pub mod simplex;

// Re-export 主要類型
pub use cancel::CancellationToken;
pub use simplex::SimplexSolver;

use serde::{Deserialize, Serialize};

/// 約束類型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// a·x ≤ b
    LessEq,
    /// a·x ≥ b
    GreaterEq,
    /// a·x = b
    Equal,
}

/// 線性約束
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearConstraint {
    /// 係數（長度等於變數數量）
    pub coefficients: Vec<f64>,
    /// 約束類型
    pub kind: ConstraintKind,
    /// 右端值
    pub rhs: f64,
}

impl LinearConstraint {
    pub fn new(coefficients: Vec<f64>, kind: ConstraintKind, rhs: f64) -> Self {
        Self {
            coefficients,
            kind,
            rhs,
        }
    }

    pub fn less_eq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, ConstraintKind::LessEq, rhs)
    }

    pub fn greater_eq(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, ConstraintKind::GreaterEq, rhs)
    }

    pub fn equal(coefficients: Vec<f64>, rhs: f64) -> Self {
        Self::new(coefficients, ConstraintKind::Equal, rhs)
    }

    /// 在給定點的左端值 a·x
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.coefficients.iter().zip(x).map(|(a, v)| a * v).sum()
    }

    /// 檢查給定點是否滿足約束（相對容差）
    pub fn is_satisfied(&self, x: &[f64], tolerance: f64) -> bool {
        let lhs = self.evaluate(x);
        let scale = self
            .coefficients
            .iter()
            .zip(x)
            .map(|(a, v)| (a * v).abs())
            .fold(self.rhs.abs(), f64::max)
            .max(1.0);
        let slack = tolerance * scale;
        match self.kind {
            ConstraintKind::LessEq => lhs <= self.rhs + slack,
            ConstraintKind::GreaterEq => lhs >= self.rhs - slack,
            ConstraintKind::Equal => (lhs - self.rhs).abs() <= slack,
        }
    }
}

/// 優化方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Minimize,
    Maximize,
}

/// 線性規劃問題
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearProgram {
    /// 目標函數係數
    pub objective: Vec<f64>,

    /// 優化方向
    pub sense: Sense,

    /// 約束
    pub constraints: Vec<LinearConstraint>,

    /// 變數上界（None 表示無上界）
    pub upper_bounds: Vec<Option<f64>>,
}

impl LinearProgram {
    /// 創建沒有約束的問題
    pub fn new(objective: Vec<f64>, sense: Sense) -> Self {
        let upper_bounds = vec![None; objective.len()];
        Self {
            objective,
            sense,
            constraints: Vec::new(),
            upper_bounds,
        }
    }

    pub fn minimize(objective: Vec<f64>) -> Self {
        Self::new(objective, Sense::Minimize)
    }

    pub fn maximize(objective: Vec<f64>) -> Self {
        Self::new(objective, Sense::Maximize)
    }

    /// 建構器模式：添加約束
    pub fn with_constraint(mut self, constraint: LinearConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// 建構器模式：批量添加約束
    pub fn with_constraints(mut self, constraints: impl IntoIterator<Item = LinearConstraint>) -> Self {
        self.constraints.extend(constraints);
        self
    }

    /// 建構器模式：設置變數上界
    pub fn with_upper_bounds(mut self, upper_bounds: Vec<Option<f64>>) -> Self {
        self.upper_bounds = upper_bounds;
        self
    }

    /// 變數數量
    pub fn num_variables(&self) -> usize {
        self.objective.len()
    }

    /// 目標函數值
    pub fn objective_value(&self, x: &[f64]) -> f64 {
        self.objective.iter().zip(x).map(|(c, v)| c * v).sum()
    }
}

/// 求解器參數
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverOptions {
    /// 最大樞軸迭代次數
    pub max_iterations: usize,

    /// 相對可行性容差
    pub tolerance: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            tolerance: 1e-6,
        }
    }
}

/// 最優解
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    /// 最優點
    pub x: Vec<f64>,

    /// 目標函數值（原始方向）
    pub objective: f64,

    /// 實際樞軸迭代次數
    pub iterations: usize,
}

/// 求解錯誤
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolveError {
    /// 第一階段無法消去人工變數；`iterations` 為已執行的樞軸次數
    #[error("問題不可行（樞軸 {iterations} 次）")]
    Infeasible { iterations: usize },

    #[error("目標函數無界")]
    Unbounded,

    #[error("超過最大迭代次數 {iterations}")]
    IterationLimit { iterations: usize },

    #[error("求解已取消")]
    Cancelled,

    #[error("問題定義無效: {0}")]
    InvalidProgram(String),
}
