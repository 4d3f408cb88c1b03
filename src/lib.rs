//! # Scrap Blend
//!
//! 廢料配料最佳化：在產品標準的元素含量窗口內，求出成本最低的廢料組合。
//!
//! ```no_run
//! use scrap_blend::prelude::*;
//! use rust_decimal::Decimal;
//!
//! let catalogue = vec![
//!     ScrapLot::new("A".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(5))
//!         .with_element(Element::Si, "1.0"),
//!     ScrapLot::new("B".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(3))
//!         .with_element(Element::Si, "0.5"),
//! ];
//! let standard = ProductStandard::new("SI-06".to_string())
//!     .with_range(Element::Si, 0.6, 0.8)?;
//!
//! let result = BlendEngine::default().optimize(&catalogue, &standard, &AreaFilter::All)?;
//! assert!(result.feasible);
//! # Ok::<(), BlendError>(())
//! ```

pub use blend_calc;
pub use blend_core;
pub use blend_optimizer;

/// 常用類型
pub mod prelude {
    pub use blend_calc::{
        BlendEngine, BlendJob, BlendResult, BlendWarning, ElementAnalysis, MixEntry,
        WarningSeverity,
    };
    pub use blend_core::{
        AreaFilter, BlendConfig, BlendError, BlendRequest, Element, ElementRange,
        ProductStandard, ScrapLot, TargetWeight,
    };
    pub use blend_optimizer::CancellationToken;
}
