//! 稠密兩階段有界變數單純形法
//!
//! 第一階段以人工變數尋找基本可行解，第二階段最小化目標函數。
//! 變數上界不佔約束列：非基變數停在下界 0 或上界 u，比值檢驗同時考慮
//! 基變數觸及 0、觸及上界，以及選入變數自身翻轉到另一個界。
//! 選入變數採 Dantzig 規則（同值取最小索引），連續退化樞軸過多時改用
//! Bland 規則，保證不循環且結果可重現。

use crate::{
    CancellationToken, ConstraintKind, LinearProgram, Sense, Solution, SolveError, SolverOptions,
};

/// 樞軸元素下限
const PIVOT_TOLERANCE: f64 = 1e-9;

/// 檢驗數判定最優的容差
const OPTIMALITY_TOLERANCE: f64 = 1e-9;

/// 比值檢驗視為平手的容差
const RATIO_TOLERANCE: f64 = 1e-12;

/// 連續退化樞軸達到此數後改用 Bland 規則
const DEGENERATE_STREAK_LIMIT: usize = 20;

/// 單純形求解器
#[derive(Debug, Clone, Default)]
pub struct SimplexSolver {
    options: SolverOptions,
}

impl SimplexSolver {
    /// 創建求解器
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }

    /// 求解器參數
    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    /// 求解線性規劃
    pub fn solve(&self, program: &LinearProgram) -> Result<Solution, SolveError> {
        self.solve_with_cancel(program, None)
    }

    /// 求解線性規劃，每一步前檢查取消標記
    ///
    /// 迭代上限只計算樞軸；界翻轉不改變基，只更新基變數的值。
    pub fn solve_with_cancel(
        &self,
        program: &LinearProgram,
        cancel: Option<&CancellationToken>,
    ) -> Result<Solution, SolveError> {
        let structural = program.num_variables();
        let (rows, bounds) = normalized_rows(program)?;

        let mut tableau = Tableau::new(structural, &rows, &bounds);
        let mut run = RunState {
            iterations: 0,
            flips: 0,
            max_iterations: self.options.max_iterations,
            cancel,
        };

        tracing::debug!(
            "單純形求解：變數 {} 個，約束 {} 列，人工變數 {} 個",
            structural,
            rows.len(),
            tableau.columns - tableau.artificial_start
        );

        // 第一階段：最小化人工變數總和
        if tableau.has_artificials() {
            let phase_one_cost: Vec<f64> = (0..tableau.columns)
                .map(|j| if j >= tableau.artificial_start { 1.0 } else { 0.0 })
                .collect();
            tableau.optimize(&phase_one_cost, tableau.columns, &mut run)?;

            let infeasibility = tableau.objective(&phase_one_cost);
            let rhs_scale = rows.iter().fold(1.0_f64, |m, r| m.max(r.rhs.abs()));
            if infeasibility > self.options.tolerance * rhs_scale {
                tracing::debug!("第一階段殘差 {:.3e}，問題不可行", infeasibility);
                return Err(SolveError::Infeasible {
                    iterations: run.iterations,
                });
            }
            tableau.drive_out_artificials();
        }

        // 第二階段：原始目標（最大化轉為最小化）
        let sign = match program.sense {
            Sense::Minimize => 1.0,
            Sense::Maximize => -1.0,
        };
        let mut cost = vec![0.0; tableau.columns];
        for (c, objective) in cost.iter_mut().zip(&program.objective) {
            *c = sign * objective;
        }
        tableau.optimize(&cost, tableau.artificial_start, &mut run)?;

        let x = tableau.primal(structural);
        let objective = program.objective_value(&x);

        tracing::debug!(
            "單純形求解完成：樞軸 {} 次，界翻轉 {} 次，目標值 {}",
            run.iterations,
            run.flips,
            objective
        );

        Ok(Solution {
            x,
            objective,
            iterations: run.iterations,
        })
    }
}

/// 正規化後的約束列（右端值非負）
#[derive(Debug, Clone)]
struct Row {
    coefficients: Vec<f64>,
    kind: ConstraintKind,
    rhs: f64,
}

impl Row {
    /// 以最大係數縮放，並翻轉符號使右端值非負
    fn normalized(mut coefficients: Vec<f64>, mut kind: ConstraintKind, mut rhs: f64) -> Self {
        let scale = coefficients.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
        if scale > 0.0 {
            for v in coefficients.iter_mut() {
                *v /= scale;
            }
            rhs /= scale;
        }

        // a·x ≥ 0 翻成 -a·x ≤ 0，可直接以鬆弛變數作為初始基
        if rhs < 0.0 || (rhs == 0.0 && kind == ConstraintKind::GreaterEq) {
            for v in coefficients.iter_mut() {
                *v = -*v;
            }
            rhs = -rhs;
            kind = match kind {
                ConstraintKind::LessEq => ConstraintKind::GreaterEq,
                ConstraintKind::GreaterEq => ConstraintKind::LessEq,
                ConstraintKind::Equal => ConstraintKind::Equal,
            };
        }

        Self {
            coefficients,
            kind,
            rhs,
        }
    }
}

/// 檢查問題並回傳正規化約束列與結構變數上界（無上界為 +∞）
fn normalized_rows(program: &LinearProgram) -> Result<(Vec<Row>, Vec<f64>), SolveError> {
    let n = program.num_variables();

    if program.objective.iter().any(|c| !c.is_finite()) {
        return Err(SolveError::InvalidProgram("目標函數係數必須是有限數值".to_string()));
    }
    if program.upper_bounds.len() != n {
        return Err(SolveError::InvalidProgram(format!(
            "上界數量 {} 與變數數量 {} 不一致",
            program.upper_bounds.len(),
            n
        )));
    }

    let mut rows = Vec::with_capacity(program.constraints.len());
    for (i, constraint) in program.constraints.iter().enumerate() {
        if constraint.coefficients.len() != n {
            return Err(SolveError::InvalidProgram(format!(
                "約束 {} 有 {} 個係數，預期 {} 個",
                i,
                constraint.coefficients.len(),
                n
            )));
        }
        if !constraint.rhs.is_finite() || constraint.coefficients.iter().any(|v| !v.is_finite()) {
            return Err(SolveError::InvalidProgram(format!("約束 {} 含非有限數值", i)));
        }
        rows.push(Row::normalized(
            constraint.coefficients.clone(),
            constraint.kind,
            constraint.rhs,
        ));
    }

    let mut bounds = Vec::with_capacity(n);
    for (j, bound) in program.upper_bounds.iter().enumerate() {
        let upper = bound.unwrap_or(f64::INFINITY);
        if upper.is_nan() {
            return Err(SolveError::InvalidProgram(format!("變數 {} 的上界不是數值", j)));
        }
        if upper < 0.0 {
            return Err(SolveError::Infeasible { iterations: 0 });
        }
        bounds.push(upper);
    }

    Ok((rows, bounds))
}

struct RunState<'a> {
    iterations: usize,
    flips: usize,
    max_iterations: usize,
    cancel: Option<&'a CancellationToken>,
}

impl RunState<'_> {
    fn is_cancelled(&self) -> bool {
        self.cancel.is_some_and(|token| token.is_cancelled())
    }
}

/// 比值檢驗結果
enum Step {
    /// 選入變數移到另一個界
    Flip { length: f64 },
    /// 第 `row` 列的基變數離基，停在上界或 0
    Pivot { row: usize, length: f64, to_upper: bool },
}

/// 單純形表
///
/// 欄位配置：[結構變數 | 鬆弛/剩餘變數 | 人工變數]。`values` 為各列基變數的當前值。
struct Tableau {
    cells: Vec<Vec<f64>>,
    values: Vec<f64>,
    basis: Vec<usize>,
    upper: Vec<f64>,
    at_upper: Vec<bool>,
    columns: usize,
    artificial_start: usize,
}

impl Tableau {
    fn new(structural: usize, rows: &[Row], bounds: &[f64]) -> Self {
        let slack_count = rows
            .iter()
            .filter(|r| r.kind != ConstraintKind::Equal)
            .count();
        let artificial_count = rows
            .iter()
            .filter(|r| r.kind != ConstraintKind::LessEq)
            .count();
        let artificial_start = structural + slack_count;
        let columns = artificial_start + artificial_count;

        let mut cells = Vec::with_capacity(rows.len());
        let mut values = Vec::with_capacity(rows.len());
        let mut basis = Vec::with_capacity(rows.len());
        let mut next_slack = structural;
        let mut next_artificial = artificial_start;

        for row in rows {
            let mut cell = vec![0.0; columns];
            cell[..structural].copy_from_slice(&row.coefficients);

            match row.kind {
                ConstraintKind::LessEq => {
                    cell[next_slack] = 1.0;
                    basis.push(next_slack);
                    next_slack += 1;
                }
                ConstraintKind::GreaterEq => {
                    cell[next_slack] = -1.0;
                    next_slack += 1;
                    cell[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
                ConstraintKind::Equal => {
                    cell[next_artificial] = 1.0;
                    basis.push(next_artificial);
                    next_artificial += 1;
                }
            }
            cells.push(cell);
            values.push(row.rhs);
        }

        let mut upper = bounds.to_vec();
        upper.resize(columns, f64::INFINITY);

        Self {
            cells,
            values,
            basis,
            upper,
            at_upper: vec![false; columns],
            columns,
            artificial_start,
        }
    }

    fn has_artificials(&self) -> bool {
        self.columns > self.artificial_start
    }

    /// 全部欄位的當前值
    fn point(&self) -> Vec<f64> {
        let mut x: Vec<f64> = (0..self.columns)
            .map(|j| if self.at_upper[j] { self.upper[j] } else { 0.0 })
            .collect();
        for (i, &b) in self.basis.iter().enumerate() {
            x[b] = self.values[i];
        }
        x
    }

    fn objective(&self, cost: &[f64]) -> f64 {
        self.point().iter().zip(cost).map(|(x, c)| x * c).sum()
    }

    /// 在前 `eligible` 個欄位中迭代至最優
    fn optimize(
        &mut self,
        cost: &[f64],
        eligible: usize,
        run: &mut RunState<'_>,
    ) -> Result<(), SolveError> {
        let mut bland = false;
        let mut degenerate_streak = 0;

        loop {
            if run.is_cancelled() {
                return Err(SolveError::Cancelled);
            }

            let Some((entering, direction)) = self.entering_column(cost, eligible, bland) else {
                return Ok(());
            };

            match self.ratio_test(entering, direction) {
                None => return Err(SolveError::Unbounded),
                Some(Step::Flip { length }) => {
                    self.flip(entering, direction, length);
                    run.flips += 1;
                }
                Some(Step::Pivot {
                    row,
                    length,
                    to_upper,
                }) => {
                    if run.iterations >= run.max_iterations {
                        return Err(SolveError::IterationLimit {
                            iterations: run.iterations,
                        });
                    }

                    self.pivot(row, entering, direction, length, to_upper);
                    run.iterations += 1;

                    if length <= PIVOT_TOLERANCE {
                        degenerate_streak += 1;
                        if !bland && degenerate_streak >= DEGENERATE_STREAK_LIMIT {
                            tracing::debug!(
                                "連續退化樞軸 {} 次，改用 Bland 規則",
                                degenerate_streak
                            );
                            bland = true;
                        }
                    } else {
                        degenerate_streak = 0;
                    }
                }
            }
        }
    }

    /// 選入欄位與移動方向（+1 自下界增加，-1 自上界減少）
    fn entering_column(&self, cost: &[f64], eligible: usize, bland: bool) -> Option<(usize, f64)> {
        let mut is_basic = vec![false; self.columns];
        for &b in &self.basis {
            is_basic[b] = true;
        }

        let mut best: Option<(usize, f64, f64)> = None;
        for j in 0..eligible {
            if is_basic[j] || self.upper[j] <= 0.0 {
                continue;
            }
            let reduced = cost[j]
                - self
                    .basis
                    .iter()
                    .enumerate()
                    .map(|(i, &b)| cost[b] * self.cells[i][j])
                    .sum::<f64>();

            let candidate = if self.at_upper[j] {
                (reduced > OPTIMALITY_TOLERANCE).then_some((reduced, -1.0))
            } else {
                (reduced < -OPTIMALITY_TOLERANCE).then_some((-reduced, 1.0))
            };

            if let Some((score, direction)) = candidate {
                if bland {
                    return Some((j, direction));
                }
                match best {
                    Some((_, s, _)) if s >= score => {}
                    _ => best = Some((j, score, direction)),
                }
            }
        }
        best.map(|(j, _, direction)| (j, direction))
    }

    fn ratio_test(&self, column: usize, direction: f64) -> Option<Step> {
        let mut best: Option<(usize, f64, bool)> = None;
        for (i, row) in self.cells.iter().enumerate() {
            let alpha = row[column] * direction;
            let basic = self.basis[i];
            let (length, to_upper) = if alpha > PIVOT_TOLERANCE {
                (self.values[i].max(0.0) / alpha, false)
            } else if alpha < -PIVOT_TOLERANCE && self.upper[basic].is_finite() {
                ((self.upper[basic] - self.values[i]).max(0.0) / -alpha, true)
            } else {
                continue;
            };

            best = match best {
                None => Some((i, length, to_upper)),
                Some((k, r, u)) => {
                    let better = length < r - RATIO_TOLERANCE
                        || (length <= r + RATIO_TOLERANCE && basic < self.basis[k]);
                    if better {
                        Some((i, length, to_upper))
                    } else {
                        Some((k, r, u))
                    }
                }
            };
        }

        let own = self.upper[column];
        match best {
            Some((_, length, _)) if own.is_finite() && own <= length => {
                Some(Step::Flip { length: own })
            }
            None if own.is_finite() => Some(Step::Flip { length: own }),
            None => None,
            Some((row, length, to_upper)) => Some(Step::Pivot {
                row,
                length,
                to_upper,
            }),
        }
    }

    /// 沿選入欄位移動 `length`，更新基變數的值
    fn shift(&mut self, column: usize, direction: f64, length: f64) {
        for (value, row) in self.values.iter_mut().zip(&self.cells) {
            *value -= row[column] * direction * length;
        }
    }

    fn flip(&mut self, column: usize, direction: f64, length: f64) {
        self.shift(column, direction, length);
        self.at_upper[column] = !self.at_upper[column];
        self.clean_values();
    }

    fn pivot(&mut self, row: usize, column: usize, direction: f64, length: f64, to_upper: bool) {
        let start = if self.at_upper[column] {
            self.upper[column]
        } else {
            0.0
        };
        self.shift(column, direction, length);

        let leaving = self.basis[row];
        self.at_upper[leaving] = to_upper;
        self.eliminate(row, column);
        self.values[row] = start + direction * length;
        self.basis[row] = column;
        self.at_upper[column] = false;
        self.clean_values();
    }

    /// 以 (row, column) 為樞軸做高斯消去（僅係數部分）
    fn eliminate(&mut self, row: usize, column: usize) {
        let pivot = self.cells[row][column];
        for v in self.cells[row].iter_mut() {
            *v /= pivot;
        }
        let pivot_row = self.cells[row].clone();

        for (i, cells) in self.cells.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = cells[column];
            if factor == 0.0 {
                continue;
            }
            for (v, p) in cells.iter_mut().zip(&pivot_row) {
                *v -= factor * p;
            }
            cells[column] = 0.0;
        }
    }

    /// 捨入造成的微小越界歸回界上
    fn clean_values(&mut self) {
        for (value, &b) in self.values.iter_mut().zip(&self.basis) {
            let upper = self.upper[b];
            let slack = PIVOT_TOLERANCE * (1.0 + value.abs());
            if *value < 0.0 && *value > -slack {
                *value = 0.0;
            } else if upper.is_finite() && *value > upper && *value < upper + slack {
                *value = upper;
            }
        }
    }

    /// 將第一階段後仍在基中的人工變數換出
    fn drive_out_artificials(&mut self) {
        for row in 0..self.cells.len() {
            if self.basis[row] < self.artificial_start {
                continue;
            }
            // 殘值已在容差內
            self.values[row] = 0.0;

            let candidate =
                (0..self.artificial_start).find(|&j| self.cells[row][j].abs() > PIVOT_TOLERANCE);
            // 找不到時該列為冗餘約束，人工變數保持為 0
            if let Some(column) = candidate {
                self.pivot(row, column, 1.0, 0.0, false);
            }
        }
    }

    fn primal(&self, structural: usize) -> Vec<f64> {
        let mut x = self.point();
        x.truncate(structural);
        for (v, upper) in x.iter_mut().zip(&self.upper) {
            *v = v.clamp(0.0, *upper);
        }
        x
    }
}
