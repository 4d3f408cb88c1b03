//! 協作式取消

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// 不限制檢查次數
const UNLIMITED: usize = usize::MAX;

/// 取消標記，求解器在每一步前檢查
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
    remaining_checks: Arc<AtomicUsize>,
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            remaining_checks: Arc::new(AtomicUsize::new(UNLIMITED)),
        }
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只允許通過 `checks` 次檢查，之後自動視為已取消
    ///
    /// 可用來限制單次計算的工作量。
    pub fn with_check_limit(checks: usize) -> Self {
        let token = Self::default();
        token.remaining_checks.store(checks, Ordering::Release);
        token
    }

    /// 請求取消
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    /// 是否已請求取消（有檢查次數限制時會消耗一次）
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Acquire) {
            return true;
        }

        let consumed = self
            .remaining_checks
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            });
        if consumed.is_err() {
            self.cancel();
            return true;
        }
        false
    }
}
