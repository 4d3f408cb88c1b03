//! 產品標準普查範例
//!
//! 對同一份廢料目錄平行評估多個產品標準，並示範背景計算與取消。

use rust_decimal::Decimal;
use scrap_blend::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let catalogue = vec![
        ScrapLot::new("A".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(5))
            .with_element(Element::Si, "1.0")
            .with_element(Element::Fe, "0.2"),
        ScrapLot::new("B".to_string(), "Z1".to_string(), Decimal::from(100), Decimal::from(3))
            .with_element(Element::Si, "0.5")
            .with_element(Element::Fe, "0.4"),
        ScrapLot::new("C".to_string(), "Z2".to_string(), Decimal::from(250), Decimal::new(25, 1))
            .with_element(Element::Si, "0.3")
            .with_element(Element::Fe, "0.1"),
    ];

    let standards = vec![
        ProductStandard::new("SI-06".to_string()).with_range(Element::Si, 0.6, 0.8)?,
        ProductStandard::new("SI-04-FE".to_string())
            .with_range(Element::Si, 0.4, 0.6)?
            .with_range(Element::Fe, 0.0, 0.25)?,
        ProductStandard::new("SI-HIGH".to_string()).with_range(Element::Si, 5.0, 7.0)?,
    ];

    let engine = BlendEngine::default();

    println!("===== 產品標準普查（全部區域）=====");
    for (standard, result) in standards
        .iter()
        .zip(engine.optimize_all(&catalogue, &standards, &AreaFilter::All))
    {
        match result {
            Ok(result) if result.feasible => println!(
                "  ✓ {:<10} 批量 {:>8.3} kg，最低平均單價 {:.4}",
                standard.name,
                result.total_weight,
                result.average_price.unwrap_or_default()
            ),
            Ok(result) => println!(
                "  ✗ {:<10} {}",
                standard.name,
                result.reason.unwrap_or_default()
            ),
            Err(e) => println!("  ! {:<10} {}", standard.name, e),
        }
    }

    println!("\n===== 背景計算 =====");
    let request = BlendRequest::new("SI-06".to_string()).with_target_weight(Decimal::from(150));
    let job = engine.spawn(catalogue.clone(), standards[0].clone(), request.clone());
    let result = job.join()?;
    println!(
        "  150 kg SI-06：成本 {:.2}，配料 {} 項",
        result.total_cost,
        result.waste_mix.len()
    );

    let job = engine.spawn(catalogue, standards[0].clone(), request);
    job.cancel();
    match job.join() {
        Ok(_) => println!("  取消前已完成"),
        Err(e) if e.is_cancellation() => println!("  {}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
