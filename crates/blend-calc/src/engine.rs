//! 配料引擎主入口

use std::thread::{self, JoinHandle};
use std::time::Instant;

use blend_core::{
    AreaFilter, BlendConfig, BlendError, BlendRequest, ProductStandard, ScrapLot, TargetWeight,
};
use blend_optimizer::CancellationToken;
use rayon::prelude::*;

use crate::analysis::ResultAnalyzer;
use crate::constraints::ConstraintFormulator;
use crate::matrix::CompositionMatrix;
use crate::solver::{BlendSolver, SolverOutcome};
use crate::BlendResult;

/// 配料引擎
///
/// 每次呼叫都是輸入的純函數：借用廢料目錄與產品標準，回傳獨立的 [`BlendResult`]。
#[derive(Debug, Clone, Default)]
pub struct BlendEngine {
    config: BlendConfig,
}

impl BlendEngine {
    /// 創建配料引擎（配置不合法時回傳錯誤）
    pub fn new(config: BlendConfig) -> blend_core::Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BlendConfig {
        &self.config
    }

    /// 計算每公斤成本最低的合格配料，並按庫存放大到最大批量
    pub fn optimize(
        &self,
        catalogue: &[ScrapLot],
        standard: &ProductStandard,
        area_filter: &AreaFilter,
    ) -> blend_core::Result<BlendResult> {
        self.run(catalogue, standard, area_filter, TargetWeight::Cheapest, None)
    }

    /// 可取消的配料計算
    pub fn optimize_with_cancel(
        &self,
        catalogue: &[ScrapLot],
        standard: &ProductStandard,
        area_filter: &AreaFilter,
        target: TargetWeight,
        token: &CancellationToken,
    ) -> blend_core::Result<BlendResult> {
        self.run(catalogue, standard, area_filter, target, Some(token))
    }

    /// 依請求中的標準名稱查找產品標準後計算
    pub fn optimize_request(
        &self,
        catalogue: &[ScrapLot],
        standards: &[ProductStandard],
        request: &BlendRequest,
    ) -> blend_core::Result<BlendResult> {
        let standard = standards
            .iter()
            .find(|s| s.name == request.standard_name)
            .ok_or_else(|| BlendError::UnknownStandard(request.standard_name.clone()))?;

        self.run(
            catalogue,
            standard,
            &request.area_filter,
            request.target,
            None,
        )
    }

    /// 對同一份目錄平行評估多個產品標準，結果順序與輸入一致
    pub fn optimize_all(
        &self,
        catalogue: &[ScrapLot],
        standards: &[ProductStandard],
        area_filter: &AreaFilter,
    ) -> Vec<blend_core::Result<BlendResult>> {
        tracing::info!("批量配料計算：產品標準 {} 個", standards.len());

        standards
            .par_iter()
            .map(|standard| self.optimize(catalogue, standard, area_filter))
            .collect()
    }

    /// 在背景執行緒上計算，呼叫端可透過 [`BlendJob`] 取消或等待
    pub fn spawn(
        &self,
        catalogue: Vec<ScrapLot>,
        standard: ProductStandard,
        request: BlendRequest,
    ) -> BlendJob {
        self.spawn_with_token(catalogue, standard, request, CancellationToken::new())
    }

    /// 使用呼叫端提供的取消標記在背景執行緒上計算
    pub fn spawn_with_token(
        &self,
        catalogue: Vec<ScrapLot>,
        standard: ProductStandard,
        request: BlendRequest,
        token: CancellationToken,
    ) -> BlendJob {
        let engine = self.clone();
        let worker_token = token.clone();

        let handle = thread::spawn(move || {
            engine.run(
                &catalogue,
                &standard,
                &request.area_filter,
                request.target,
                Some(&worker_token),
            )
        });

        BlendJob { handle, token }
    }

    fn run(
        &self,
        catalogue: &[ScrapLot],
        standard: &ProductStandard,
        area_filter: &AreaFilter,
        target: TargetWeight,
        cancel: Option<&CancellationToken>,
    ) -> blend_core::Result<BlendResult> {
        tracing::info!(
            "開始配料計算：產品標準 {}，區域 {}，目錄 {} 筆",
            standard.name,
            area_filter,
            catalogue.len()
        );

        let start_time = Instant::now();

        if cancel.is_some_and(|token| token.is_cancelled()) {
            return Err(BlendError::Cancelled);
        }

        // Step 1: 成分矩陣
        tracing::debug!("Step 1: 成分矩陣");
        let matrix = CompositionMatrix::build(catalogue, area_filter)?;
        tracing::debug!("篩選後廢料數量: {}", matrix.len());

        // Step 2: 約束建模
        tracing::debug!("Step 2: 約束建模");
        let constraints = ConstraintFormulator::formulate(&matrix, standard)?;

        // Step 3: 求解
        tracing::debug!("Step 3: 線性規劃求解");
        let outcome = BlendSolver::new(&self.config).solve(
            matrix.prices(),
            &constraints,
            target,
            cancel,
        )?;

        // Step 4: 結果分析
        let mut result = match outcome {
            SolverOutcome::Solved(solution) => {
                tracing::debug!("Step 4: 結果分析");
                let analysis =
                    ResultAnalyzer::new(&self.config).analyze(&solution, &matrix, standard)?;
                let mut result = BlendResult::feasible(
                    standard.name.clone(),
                    area_filter.clone(),
                    target,
                    analysis,
                );
                result.iterations = solution.iterations;
                result
            }
            SolverOutcome::Infeasible { reason, iterations } => {
                tracing::info!("配料不可行: {}", reason);
                let mut result = BlendResult::infeasible(
                    standard.name.clone(),
                    area_filter.clone(),
                    target,
                    reason,
                );
                result.iterations = iterations;
                result
            }
        };

        // 數據警告排在分析警告之前
        let mut warnings = matrix.warnings().to_vec();
        warnings.append(&mut result.warnings);
        result.warnings = warnings;

        result.calculation_time_ms = Some(start_time.elapsed().as_millis() as u64);

        tracing::info!("配料計算完成，耗時 {:?}", start_time.elapsed());
        if result.feasible {
            tracing::info!(
                "總重量 {:.3} kg，總成本 {:.2}，配料 {} 項",
                result.total_weight,
                result.total_cost,
                result.waste_mix.len()
            );
        }

        Ok(result)
    }
}

/// 背景配料任務
pub struct BlendJob {
    handle: JoinHandle<blend_core::Result<BlendResult>>,
    token: CancellationToken,
}

impl BlendJob {
    /// 請求取消（協作式，於求解器下一步前生效）
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待任務結束
    pub fn join(self) -> blend_core::Result<BlendResult> {
        self.handle
            .join()
            .map_err(|_| BlendError::CalculationError("配料執行緒異常終止".to_string()))?
    }
}
