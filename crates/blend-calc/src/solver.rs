//! 配料求解
//!
//! 元素約束對總重量是齊次的，x = 0 永遠可行，單純最小化成本只會得到空配料。
//! 因此求解時必須固定產量：
//!
//! - 最低單位成本：以 `Σyᵢ = 1` 正規化後最小化 `Σpᵢyᵢ`，得到每公斤最便宜的
//!   合格配比 y，再按庫存上界放大到最大批量 `W = minᵢ uᵢ / yᵢ`。
//! - 指定產量：加入 `Σxᵢ = w` 後最小化成本。
//!
//! 沒有元素約束時不需要線性規劃，直接依單價分配庫存。
//! 問題為線性規劃，單純形法得到的是全域最優，不依賴初始猜測。

use blend_core::{BlendConfig, BlendError, TargetWeight};
use blend_optimizer::{
    CancellationToken, LinearConstraint, LinearProgram, SimplexSolver, Solution, SolveError,
    SolverOptions,
};
use rust_decimal::prelude::ToPrimitive;

use crate::constraints::BlendConstraints;

/// 視為配比中未使用的分率
const UNUSED_SHARE: f64 = 1e-12;

/// 求解得到的配料重量
#[derive(Debug, Clone, PartialEq)]
pub struct BlendSolution {
    /// 每批廢料的配料重量（kg）
    pub weights: Vec<f64>,

    /// 總成本
    pub objective: f64,

    /// 累計樞軸迭代次數
    pub iterations: usize,
}

/// 求解結果
#[derive(Debug, Clone, PartialEq)]
pub enum SolverOutcome {
    /// 找到最優配料
    Solved(BlendSolution),

    /// 問題在數學上不可行
    Infeasible { reason: String, iterations: usize },
}

/// 配料求解器
pub struct BlendSolver<'c> {
    config: &'c BlendConfig,
    simplex: SimplexSolver,
}

impl<'c> BlendSolver<'c> {
    pub fn new(config: &'c BlendConfig) -> Self {
        let simplex = SimplexSolver::new(SolverOptions {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
        });
        Self { config, simplex }
    }

    /// 求解最低成本配料
    pub fn solve(
        &self,
        prices: &[f64],
        constraints: &BlendConstraints,
        target: TargetWeight,
        cancel: Option<&CancellationToken>,
    ) -> blend_core::Result<SolverOutcome> {
        if prices.len() != constraints.num_lots() {
            return Err(BlendError::CalculationError(format!(
                "單價數量 {} 與廢料數量 {} 不一致",
                prices.len(),
                constraints.num_lots()
            )));
        }

        let target_weight = match target {
            TargetWeight::Cheapest => None,
            TargetWeight::Exactly(weight) => {
                let weight = weight.to_f64().unwrap_or(0.0);
                if !(weight.is_finite() && weight > 0.0) {
                    return Err(BlendError::InvalidRequest(format!(
                        "目標產量必須為正數: {}",
                        weight
                    )));
                }
                Some(weight)
            }
        };

        if !constraints.has_element_rows() {
            tracing::debug!("無元素約束，依單價直接分配庫存");
            return Ok(match target_weight {
                None => self.cheapest_stock(prices, constraints),
                Some(weight) => self.fill_cheapest_first(prices, constraints, weight),
            });
        }

        match target_weight {
            None => self.solve_cheapest(prices, constraints, cancel),
            Some(weight) => self.solve_exactly(prices, constraints, weight, cancel),
        }
    }

    /// 無元素約束：取最低單價的全部庫存
    fn cheapest_stock(&self, prices: &[f64], constraints: &BlendConstraints) -> SolverOutcome {
        let lowest = prices
            .iter()
            .zip(&constraints.upper_bounds)
            .filter(|(_, stock)| **stock > 0.0)
            .map(|(price, _)| *price)
            .fold(f64::INFINITY, f64::min);

        let weights: Vec<f64> = prices
            .iter()
            .zip(&constraints.upper_bounds)
            .map(|(price, stock)| if *price == lowest { *stock } else { 0.0 })
            .collect();

        let total: f64 = weights.iter().sum();
        if total <= self.config.degenerate_weight_kg {
            return SolverOutcome::Infeasible {
                reason: "無法找到可行解：篩選後的廢料沒有可用庫存".to_string(),
                iterations: 0,
            };
        }

        SolverOutcome::Solved(BlendSolution {
            objective: total * lowest,
            weights,
            iterations: 0,
        })
    }

    /// 無元素約束：按單價由低到高填滿指定產量（同價取目錄順序）
    fn fill_cheapest_first(
        &self,
        prices: &[f64],
        constraints: &BlendConstraints,
        weight: f64,
    ) -> SolverOutcome {
        let available: f64 = constraints.upper_bounds.iter().sum();
        if available < weight * (1.0 - self.config.tolerance) {
            return SolverOutcome::Infeasible {
                reason: shortfall_reason(available, weight),
                iterations: 0,
            };
        }

        let mut order: Vec<usize> = (0..prices.len()).collect();
        order.sort_by(|a, b| prices[*a].total_cmp(&prices[*b]).then(a.cmp(b)));

        let mut weights = vec![0.0; prices.len()];
        let mut remaining = weight;
        for i in order {
            if remaining <= 0.0 {
                break;
            }
            let take = constraints.upper_bounds[i].min(remaining);
            weights[i] = take;
            remaining -= take;
        }

        let objective = weights.iter().zip(prices).map(|(x, p)| x * p).sum();
        SolverOutcome::Solved(BlendSolution {
            weights,
            objective,
            iterations: 0,
        })
    }

    /// 每公斤最便宜的合格配比，放大到庫存允許的最大批量
    fn solve_cheapest(
        &self,
        prices: &[f64],
        constraints: &BlendConstraints,
        cancel: Option<&CancellationToken>,
    ) -> blend_core::Result<SolverOutcome> {
        let n = constraints.num_lots();
        // 沒有庫存的廢料不能出現在配比中
        let share_bounds = constraints
            .upper_bounds
            .iter()
            .map(|u| Some(if *u > 0.0 { 1.0 } else { 0.0 }))
            .collect();
        let program = LinearProgram::minimize(prices.to_vec())
            .with_constraints(constraints.rows.iter().cloned())
            .with_constraint(LinearConstraint::equal(vec![1.0; n], 1.0))
            .with_upper_bounds(share_bounds);

        let composition = match self.simplex.solve_with_cancel(&program, cancel) {
            Ok(solution) => solution,
            Err(SolveError::Infeasible { iterations }) => {
                return Ok(SolverOutcome::Infeasible {
                    reason: "無法找到可行解：沒有任何正重量的配料能滿足產品標準".to_string(),
                    iterations,
                })
            }
            Err(e) => return Err(map_solve_error(e)),
        };
        tracing::debug!("最低單位成本 {:.6} /kg", composition.objective);

        let batch = composition
            .x
            .iter()
            .zip(&constraints.upper_bounds)
            .filter(|(share, _)| **share > UNUSED_SHARE)
            .map(|(share, stock)| stock / share)
            .fold(f64::INFINITY, f64::min);

        if !(batch.is_finite() && batch > self.config.degenerate_weight_kg) {
            return Ok(SolverOutcome::Infeasible {
                reason: "無法找到可行解：沒有任何正重量的配料能滿足產品標準".to_string(),
                iterations: composition.iterations,
            });
        }
        tracing::debug!("最大批量 W = {:.6} kg", batch);

        let weights: Vec<f64> = composition
            .x
            .iter()
            .zip(&constraints.upper_bounds)
            .map(|(share, stock)| (share * batch).min(*stock))
            .collect();
        let objective = weights.iter().zip(prices).map(|(x, p)| x * p).sum();

        self.accept(
            Solution {
                x: weights,
                objective,
                iterations: composition.iterations,
            },
            constraints,
        )
    }

    fn solve_exactly(
        &self,
        prices: &[f64],
        constraints: &BlendConstraints,
        weight: f64,
        cancel: Option<&CancellationToken>,
    ) -> blend_core::Result<SolverOutcome> {
        match self.min_cost(prices, constraints, weight, cancel) {
            Ok(solution) => self.accept(solution, constraints),
            Err(SolveError::Infeasible { iterations }) => {
                // 補充說明庫存可支持的最大合格產量
                let (max_weight, max_iterations) =
                    self.max_weight(constraints, cancel).map_err(map_solve_error)?;
                Ok(SolverOutcome::Infeasible {
                    reason: shortfall_reason(max_weight, weight),
                    iterations: iterations + max_iterations,
                })
            }
            Err(e) => Err(map_solve_error(e)),
        }
    }

    /// 最大化總重量
    fn max_weight(
        &self,
        constraints: &BlendConstraints,
        cancel: Option<&CancellationToken>,
    ) -> Result<(f64, usize), SolveError> {
        let n = constraints.num_lots();
        let program = LinearProgram::maximize(vec![1.0; n])
            .with_constraints(constraints.rows.iter().cloned())
            .with_upper_bounds(upper_bounds(constraints));

        let solution = self.simplex.solve_with_cancel(&program, cancel)?;
        Ok((solution.objective.max(0.0), solution.iterations))
    }

    /// 固定總重量下最小化成本
    fn min_cost(
        &self,
        prices: &[f64],
        constraints: &BlendConstraints,
        total_weight: f64,
        cancel: Option<&CancellationToken>,
    ) -> Result<Solution, SolveError> {
        let n = constraints.num_lots();
        let program = LinearProgram::minimize(prices.to_vec())
            .with_constraints(constraints.rows.iter().cloned())
            .with_constraint(LinearConstraint::equal(vec![1.0; n], total_weight))
            .with_upper_bounds(upper_bounds(constraints));

        self.simplex.solve_with_cancel(&program, cancel)
    }

    /// 檢查求解結果後接受
    fn accept(
        &self,
        solution: Solution,
        constraints: &BlendConstraints,
    ) -> blend_core::Result<SolverOutcome> {
        if !constraints.is_satisfied_by(&solution.x, self.config.tolerance) {
            return Err(BlendError::CalculationError(
                "求解結果超出約束容差".to_string(),
            ));
        }

        Ok(SolverOutcome::Solved(BlendSolution {
            weights: solution.x,
            objective: solution.objective,
            iterations: solution.iterations,
        }))
    }
}

fn shortfall_reason(max_weight: f64, target: f64) -> String {
    format!(
        "無法找到可行解：滿足產品標準的最大產量為 {:.3} kg，低於目標產量 {} kg",
        max_weight, target
    )
}

fn upper_bounds(constraints: &BlendConstraints) -> Vec<Option<f64>> {
    constraints.upper_bounds.iter().map(|u| Some(*u)).collect()
}

fn map_solve_error(error: SolveError) -> BlendError {
    match error {
        SolveError::IterationLimit { iterations } => BlendError::SolverDidNotConverge { iterations },
        SolveError::Cancelled => BlendError::Cancelled,
        SolveError::Infeasible { .. } => BlendError::CalculationError("問題不可行".to_string()),
        SolveError::Unbounded => BlendError::CalculationError("目標函數無界".to_string()),
        SolveError::InvalidProgram(message) => BlendError::CalculationError(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraints::ConstraintFormulator;
    use crate::matrix::CompositionMatrix;
    use blend_core::{AreaFilter, Element, ProductStandard, ScrapLot};
    use rstest::rstest;
    use rust_decimal::Decimal;

    fn catalogue() -> Vec<ScrapLot> {
        vec![
            ScrapLot::new("A".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(5))
                .with_element(Element::Si, "1.0"),
            ScrapLot::new("B".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(3))
                .with_element(Element::Si, "0.5"),
        ]
    }

    fn solve(
        standard: &ProductStandard,
        target: TargetWeight,
        config: &BlendConfig,
    ) -> blend_core::Result<SolverOutcome> {
        let catalogue = catalogue();
        let matrix = CompositionMatrix::build(&catalogue, &AreaFilter::All).unwrap();
        let constraints = ConstraintFormulator::formulate(&matrix, standard).unwrap();
        BlendSolver::new(config).solve(matrix.prices(), &constraints, target, None)
    }

    fn si_standard(min: f64, max: f64) -> ProductStandard {
        ProductStandard::new("SI".to_string())
            .with_range(Element::Si, min, max)
            .unwrap()
    }

    #[test]
    fn test_exact_target_prefers_cheaper_lot() {
        let outcome = solve(
            &si_standard(0.6, 0.8),
            TargetWeight::Exactly(Decimal::from(100)),
            &BlendConfig::default(),
        )
        .unwrap();

        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert!((solution.weights[0] - 20.0).abs() < 1e-6);
        assert!((solution.weights[1] - 80.0).abs() < 1e-6);
        assert!((solution.objective - 340.0).abs() < 1e-6);
    }

    #[test]
    fn test_cheapest_target_leans_on_cheaper_lot() {
        // 每公斤最便宜：A 20% + B 80%（Si 正好 0.6%），B 的 100 kg 庫存限制批量為 125 kg
        let outcome = solve(&si_standard(0.6, 0.8), TargetWeight::Cheapest, &BlendConfig::default())
            .unwrap();

        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert!((solution.weights[0] - 25.0).abs() < 1e-6);
        assert!((solution.weights[1] - 100.0).abs() < 1e-6);
        assert!((solution.objective - 425.0).abs() < 1e-6);
        assert!(solution.iterations > 0);
    }

    #[test]
    fn test_cheapest_target_limited_by_composition() {
        // Si ≥ 0.9%：配比 A 80% + B 20%，A 的庫存限制批量
        let outcome = solve(&si_standard(0.9, 1.0), TargetWeight::Cheapest, &BlendConfig::default())
            .unwrap();

        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert!((solution.weights[0] - 100.0).abs() < 1e-6);
        assert!((solution.weights[1] - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_unreachable_minimum_is_infeasible() {
        let standard = ProductStandard::new("CU".to_string())
            .with_range(Element::Cu, 99.0, 100.0)
            .unwrap();

        let outcome = solve(&standard, TargetWeight::Cheapest, &BlendConfig::default()).unwrap();
        assert!(matches!(outcome, SolverOutcome::Infeasible { .. }));

        let outcome = solve(
            &standard,
            TargetWeight::Exactly(Decimal::from(10)),
            &BlendConfig::default(),
        )
        .unwrap();
        let SolverOutcome::Infeasible { reason, .. } = outcome else {
            panic!("expected infeasible");
        };
        assert!(reason.contains("0.000 kg"));
    }

    #[test]
    fn test_target_above_stock_is_infeasible() {
        let outcome = solve(
            &si_standard(0.6, 0.8),
            TargetWeight::Exactly(Decimal::from(500)),
            &BlendConfig::default(),
        )
        .unwrap();

        let SolverOutcome::Infeasible { reason, .. } = outcome else {
            panic!("expected infeasible");
        };
        assert!(reason.contains("200.000 kg"));
    }

    #[test]
    fn test_non_positive_target_rejected() {
        let result = solve(
            &si_standard(0.6, 0.8),
            TargetWeight::Exactly(Decimal::ZERO),
            &BlendConfig::default(),
        );
        assert!(matches!(result, Err(BlendError::InvalidRequest(_))));
    }

    #[test]
    fn test_iteration_cap_reports_non_convergence() {
        let config = BlendConfig::default().with_max_iterations(1);
        let result = solve(
            &si_standard(0.6, 0.8),
            TargetWeight::Exactly(Decimal::from(100)),
            &config,
        );

        assert!(matches!(
            result,
            Err(BlendError::SolverDidNotConverge { iterations: 1 })
        ));
    }

    #[test]
    fn test_infeasible_exact_target_counts_both_solves() {
        let catalogue = catalogue();
        let matrix = CompositionMatrix::build(&catalogue, &AreaFilter::All).unwrap();
        let constraints = ConstraintFormulator::formulate(&matrix, &si_standard(0.6, 0.8)).unwrap();
        let config = BlendConfig::default();
        let solver = BlendSolver::new(&config);

        let failed = match solver.min_cost(matrix.prices(), &constraints, 500.0, None) {
            Err(SolveError::Infeasible { iterations }) => iterations,
            other => panic!("expected infeasible, got {:?}", other),
        };
        let (_, follow_up) = solver.max_weight(&constraints, None).unwrap();
        assert!(failed > 0);

        let outcome = solver
            .solve(
                matrix.prices(),
                &constraints,
                TargetWeight::Exactly(Decimal::from(500)),
                None,
            )
            .unwrap();
        let SolverOutcome::Infeasible { iterations, .. } = outcome else {
            panic!("expected infeasible");
        };
        assert_eq!(iterations, failed + follow_up);
    }

    #[test]
    fn test_without_element_rows_takes_cheapest_stock() {
        let standard = ProductStandard::new("FREE".to_string());

        let outcome = solve(&standard, TargetWeight::Cheapest, &BlendConfig::default()).unwrap();
        assert_eq!(
            outcome,
            SolverOutcome::Solved(BlendSolution {
                weights: vec![0.0, 100.0],
                objective: 300.0,
                iterations: 0,
            })
        );
    }

    #[rstest]
    #[case(50, vec![0.0, 50.0], 150.0)]
    #[case(150, vec![50.0, 100.0], 550.0)]
    #[case(200, vec![100.0, 100.0], 800.0)]
    fn test_without_element_rows_fills_cheapest_first(
        #[case] target: i64,
        #[case] expected: Vec<f64>,
        #[case] cost: f64,
    ) {
        let standard = ProductStandard::new("FREE".to_string());

        let outcome = solve(
            &standard,
            TargetWeight::Exactly(Decimal::from(target)),
            &BlendConfig::default(),
        )
        .unwrap();

        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        assert_eq!(solution.weights, expected);
        assert!((solution.objective - cost).abs() < 1e-9);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn test_without_element_rows_target_above_stock() {
        let standard = ProductStandard::new("FREE".to_string());

        let outcome = solve(
            &standard,
            TargetWeight::Exactly(Decimal::from(250)),
            &BlendConfig::default(),
        )
        .unwrap();

        let SolverOutcome::Infeasible { reason, iterations } = outcome else {
            panic!("expected infeasible");
        };
        assert!(reason.contains("200.000 kg"));
        assert_eq!(iterations, 0);
    }

    #[test]
    fn test_large_catalogue_stays_within_pivot_cap() {
        // 600 批高矽料 + 600 批低矽料，每批 100 kg
        let catalogue: Vec<ScrapLot> = (0..1200)
            .map(|i| {
                let (si, price) = if i % 2 == 0 { ("1.0", 5) } else { ("0.5", 3) };
                ScrapLot::new(
                    format!("L{:04}", i),
                    "Z1".to_string(),
                    Decimal::from(100),
                    Decimal::from(price),
                )
                .with_element(Element::Si, si)
            })
            .collect();
        let matrix = CompositionMatrix::build(&catalogue, &AreaFilter::All).unwrap();
        let constraints = ConstraintFormulator::formulate(&matrix, &si_standard(0.6, 0.8)).unwrap();
        let config = BlendConfig::default();
        let solver = BlendSolver::new(&config);

        let outcome = solver
            .solve(
                matrix.prices(),
                &constraints,
                TargetWeight::Exactly(Decimal::from(5_000)),
                None,
            )
            .unwrap();
        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        let total: f64 = solution.weights.iter().sum();
        assert!((total - 5_000.0).abs() < 1e-6 * 5_000.0);
        // 高矽料 1 000 kg + 低矽料 4 000 kg
        assert!((solution.objective - 17_000.0).abs() < 1e-6 * 17_000.0);
        assert!(solution.iterations < config.max_iterations);

        let outcome = solver
            .solve(matrix.prices(), &constraints, TargetWeight::Cheapest, None)
            .unwrap();
        let SolverOutcome::Solved(solution) = outcome else {
            panic!("expected a solution");
        };
        let total: f64 = solution.weights.iter().sum();
        assert!((solution.objective / total - 3.4).abs() < 1e-6);
        assert!(constraints.is_satisfied_by(&solution.weights, config.tolerance));
    }

    #[test]
    fn test_cancelled_token() {
        let catalogue = catalogue();
        let matrix = CompositionMatrix::build(&catalogue, &AreaFilter::All).unwrap();
        let constraints = ConstraintFormulator::formulate(&matrix, &si_standard(0.6, 0.8)).unwrap();
        let config = BlendConfig::default();
        let token = CancellationToken::new();
        token.cancel();

        let result = BlendSolver::new(&config).solve(
            matrix.prices(),
            &constraints,
            TargetWeight::Cheapest,
            Some(&token),
        );
        assert!(matches!(result, Err(BlendError::Cancelled)));
    }
}
