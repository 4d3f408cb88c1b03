//! 化學元素定義

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 元素數量（固定 14 種）
pub const ELEMENT_COUNT: usize = 14;

/// 廢料與產品標準追蹤的化學元素
///
/// 宣告順序即報表順序，`Ord` 依此排列。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Element {
    Si,
    Fe,
    Cu,
    Mn,
    Mg,
    Zn,
    Ti,
    Cr,
    Ni,
    Zr,
    Sr,
    Bi,
    Na,
    Al,
}

impl Element {
    /// 全部元素（標準順序）
    pub const ALL: [Element; ELEMENT_COUNT] = [
        Element::Si,
        Element::Fe,
        Element::Cu,
        Element::Mn,
        Element::Mg,
        Element::Zn,
        Element::Ti,
        Element::Cr,
        Element::Ni,
        Element::Zr,
        Element::Sr,
        Element::Bi,
        Element::Na,
        Element::Al,
    ];

    /// 元素符號
    pub fn symbol(self) -> &'static str {
        match self {
            Element::Si => "Si",
            Element::Fe => "Fe",
            Element::Cu => "Cu",
            Element::Mn => "Mn",
            Element::Mg => "Mg",
            Element::Zn => "Zn",
            Element::Ti => "Ti",
            Element::Cr => "Cr",
            Element::Ni => "Ni",
            Element::Zr => "Zr",
            Element::Sr => "Sr",
            Element::Bi => "Bi",
            Element::Na => "Na",
            Element::Al => "Al",
        }
    }

    /// 在成分矩陣中的欄位索引
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Element {
    type Err = String;

    /// 接受 "Si"、"si"、"Si(%)" 等寫法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let symbol = trimmed.strip_suffix("(%)").unwrap_or(trimmed).trim();

        Element::ALL
            .iter()
            .copied()
            .find(|e| e.symbol().eq_ignore_ascii_case(symbol))
            .ok_or_else(|| format!("未知元素: {}", s))
    }
}
