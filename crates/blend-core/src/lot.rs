//! 廢料批次模型

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::element::Element;

/// 廢料批次（庫存中的一批廢料）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapLot {
    /// 廢料名稱（目錄內唯一）
    pub name: String,

    /// 存放區域
    pub area: String,

    /// 元素含量（百分比，保留人工輸入的原始文字）
    pub composition: BTreeMap<Element, String>,

    /// 可用重量（kg）
    pub weight_kg: Decimal,

    /// 單價（元/kg）
    pub unit_price: Decimal,
}

impl ScrapLot {
    /// 創建新的廢料批次（元素含量預設為空）
    pub fn new(name: String, area: String, weight_kg: Decimal, unit_price: Decimal) -> Self {
        Self {
            name,
            area,
            composition: BTreeMap::new(),
            weight_kg,
            unit_price,
        }
    }

    /// 建構器模式：設置元素含量
    pub fn with_element(mut self, element: Element, percentage: impl Into<String>) -> Self {
        self.composition.insert(element, percentage.into());
        self
    }

    /// 元素含量百分比
    ///
    /// 無法解析或非有限值回退為 0.0，有限值截斷到 [0, 100]。
    /// 未填寫的元素視為 0.0。
    pub fn percentage(&self, element: Element) -> f64 {
        self.composition
            .get(&element)
            .and_then(|raw| parse_percentage(raw))
            .unwrap_or(0.0)
    }

    /// 已填寫但無法解析的元素欄位
    pub fn unparsable_elements(&self) -> Vec<Element> {
        self.composition
            .iter()
            .filter(|(_, raw)| parse_percentage(raw).is_none())
            .map(|(element, _)| *element)
            .collect()
    }

    /// 檢查是否位於指定區域
    pub fn is_in_area(&self, area: &str) -> bool {
        self.area == area
    }
}

fn parse_percentage(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn lot() -> ScrapLot {
        ScrapLot::new(
            "ADC12-01".to_string(),
            "Z1".to_string(),
            Decimal::from(500),
            Decimal::from(12),
        )
    }

    #[test]
    fn test_create_lot() {
        let lot = lot().with_element(Element::Si, "10.5").with_element(Element::Cu, "2");

        assert_eq!(lot.name, "ADC12-01");
        assert_eq!(lot.weight_kg, Decimal::from(500));
        assert_eq!(lot.percentage(Element::Si), 10.5);
        assert_eq!(lot.percentage(Element::Cu), 2.0);
        assert!(lot.is_in_area("Z1"));
        assert!(!lot.is_in_area("z1"));
    }

    #[test]
    fn test_missing_element_reads_zero() {
        let lot = lot();
        assert_eq!(lot.percentage(Element::Fe), 0.0);
        assert!(lot.unparsable_elements().is_empty());
    }

    #[rstest]
    #[case(" 0.75 ", 0.75)]
    #[case("abc", 0.0)]
    #[case("", 0.0)]
    #[case("0.5%", 0.0)]
    #[case("NaN", 0.0)]
    #[case("inf", 0.0)]
    #[case("-3", 0.0)]
    #[case("120", 100.0)]
    fn test_percentage_coercion(#[case] raw: &str, #[case] expected: f64) {
        let lot = lot().with_element(Element::Mg, raw);
        assert_eq!(lot.percentage(Element::Mg), expected);
    }

    #[test]
    fn test_unparsable_elements_listed() {
        let lot = lot()
            .with_element(Element::Si, "x")
            .with_element(Element::Fe, "0.3")
            .with_element(Element::Zn, "--");

        assert_eq!(lot.unparsable_elements(), vec![Element::Si, Element::Zn]);
    }
}
