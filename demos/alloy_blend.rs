//! # 壓鑄鋁合金配料範例
//!
//! 展示完整的配料計算流程：
//! - 廢料：型材、活塞、回爐料、高矽合金
//! - 產品標準：ADC12
//! - 目標：指定產量的最低成本配料，以及每公斤最便宜的配比
//!
//! 執行：`RUST_LOG=debug cargo run --example alloy_blend`

use anyhow::Context;
use rust_decimal::Decimal;
use scrap_blend::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("===== ADC12 配料計算範例 =====\n");

    // 步驟 1: 廢料目錄
    println!("[1] 廢料目錄");
    let catalogue = create_catalogue();
    for lot in &catalogue {
        println!(
            "    {} ({}) {} kg @ {} 元/kg",
            lot.name, lot.area, lot.weight_kg, lot.unit_price
        );
    }
    println!();

    // 步驟 2: 產品標準（持久化的 JSON 格式）
    println!("[2] 產品標準");
    let standard = ProductStandard::from_ranges_json(
        "ADC12".to_string(),
        r#"{
            "Si": {"min": 9.6, "max": 12.0},
            "Cu": {"min": 1.5, "max": 3.5},
            "Fe": {"min": 0.0, "max": 0.9},
            "Zn": {"min": 0.0, "max": 1.0},
            "Mg": {"min": 0.0, "max": 0.3}
        }"#,
    )
    .context("產品標準解析失敗")?;
    for (element, range) in standard.constrained_elements() {
        println!("    {}: {}% ~ {}%", element, range.min, range.max);
    }
    println!();

    let engine = BlendEngine::new(BlendConfig::default())?;

    // 步驟 3: 指定產量 600 kg
    println!("[3] 指定產量 600 kg");
    let request = BlendRequest::new("ADC12".to_string())
        .with_area_filter(AreaFilter::parse("全部區域"))
        .with_target_weight(Decimal::from(600));
    let result = engine.optimize_request(&catalogue, std::slice::from_ref(&standard), &request)?;
    print_result(&result);

    // 步驟 4: 最低單位成本
    println!("[4] 最低單位成本（按庫存放大到最大批量）");
    let result = engine.optimize(&catalogue, &standard, &AreaFilter::All)?;
    print_result(&result);

    // 步驟 5: 單一區域
    println!("[5] 僅使用 Z1 區域");
    let result = engine.optimize(&catalogue, &standard, &AreaFilter::parse("Z1"))?;
    print_result(&result);

    Ok(())
}

fn create_catalogue() -> Vec<ScrapLot> {
    vec![
        ScrapLot::new("廢鋁型材".to_string(), "Z1".to_string(), Decimal::from(500), Decimal::from(14))
            .with_element(Element::Si, "0.5")
            .with_element(Element::Fe, "0.3")
            .with_element(Element::Cu, "0.1")
            .with_element(Element::Mg, "0.6")
            .with_element(Element::Al, "98.2"),
        ScrapLot::new("廢活塞".to_string(), "Z1".to_string(), Decimal::from(300), Decimal::from(12))
            .with_element(Element::Si, "12.0")
            .with_element(Element::Fe, "0.7")
            .with_element(Element::Cu, "1.0")
            .with_element(Element::Ni, "1.0")
            .with_element(Element::Mg, "1.0"),
        ScrapLot::new("ADC12 回爐料".to_string(), "Z2".to_string(), Decimal::from(800), Decimal::from(13))
            .with_element(Element::Si, "10.8")
            .with_element(Element::Fe, "0.9")
            .with_element(Element::Cu, "2.5")
            .with_element(Element::Zn, "0.8"),
        ScrapLot::new("高矽合金".to_string(), "Z2".to_string(), Decimal::from(200), Decimal::from(16))
            .with_element(Element::Si, "20")
            .with_element(Element::Fe, "0.5")
            .with_element(Element::Cu, "0.2"),
        ScrapLot::new("廢銅線".to_string(), "Z3".to_string(), Decimal::from(100), Decimal::from(50))
            .with_element(Element::Cu, "99")
            .with_element(Element::Fe, "未檢測"),
    ]
}

fn print_result(result: &BlendResult) {
    if !result.feasible {
        println!(
            "    ✗ 不可行: {}\n",
            result.reason.as_deref().unwrap_or("無法找到可行解")
        );
        return;
    }

    println!(
        "    總重量 {:.3} kg，總成本 {:.2} 元，平均單價 {:.4} 元/kg",
        result.total_weight,
        result.total_cost,
        result.average_price.unwrap_or_default()
    );
    for entry in &result.waste_mix {
        println!(
            "    - {:<12} {:<4} {:>10.3} kg {:>6.2}%",
            entry.lot_name, entry.area, entry.weight, entry.share_percent
        );
    }
    for analysis in &result.element_analysis {
        println!(
            "    {} {:<3} {:>8.4}%  [{} ~ {}]",
            analysis.marker(),
            analysis.element,
            analysis.content,
            analysis.target_min,
            analysis.target_max
        );
    }
    for warning in &result.warnings {
        println!("    ⚠ [{:?}] {}: {}", warning.severity, warning.subject, warning.message);
    }
    println!(
        "    迭代 {} 次，耗時 {} ms\n",
        result.iterations,
        result.calculation_time_ms.unwrap_or_default()
    );
}
