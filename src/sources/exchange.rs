// =============================================================================
// Exchange classification for Chinese futures codes
// =============================================================================
//
// A code is an alphabetic product prefix followed by a delivery month
// (`RB2405`) or a continuous-contract suffix: `88` for the main contract and
// `99` for the index (`RB88`).

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Exchange {
    Shfe,
    Dce,
    Czce,
    Cffex,
    Unknown,
}

impl Exchange {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shfe => "SHFE",
            Self::Dce => "DCE",
            Self::Czce => "CZCE",
            Self::Cffex => "CFFEX",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for Exchange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CFFEX: &[&str] = &["IF", "IC", "IH", "IM", "TS", "TF", "T"];
const SHFE: &[&str] = &[
    "CU", "AL", "ZN", "PB", "NI", "SN", "AU", "AG", "RB", "WR", "HC", "SS", "BU", "RU", "FU", "SP",
];
const DCE: &[&str] = &[
    "C", "CS", "A", "B", "M", "Y", "P", "FB", "BB", "JD", "RR", "L", "V", "PP", "J", "JM", "I",
    "EG", "EB",
];
const CZCE: &[&str] = &[
    "SR", "CF", "CY", "ZC", "FG", "TA", "MA", "RM", "OI", "WH", "PM", "RI", "SF", "SM", "AP", "CJ",
    "UR",
];

/// `true` for continuous main / index contracts (`RB88`, `CU99`).
pub fn is_main_contract(code: &str) -> bool {
    let code = code.trim();
    (code.ends_with("88") || code.ends_with("99")) && product_prefix(code).len() + 2 == code.len()
}

/// Upper-case alphabetic product prefix (`rb2405` → `RB`).
pub fn product_prefix(code: &str) -> String {
    code.trim()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Exchange listing the product behind `code`.
pub fn classify(code: &str) -> Exchange {
    let product = product_prefix(code);
    let listed = |table: &[&str]| table.contains(&product.as_str());
    if product.is_empty() {
        Exchange::Unknown
    } else if listed(CFFEX) {
        Exchange::Cffex
    } else if listed(SHFE) {
        Exchange::Shfe
    } else if listed(DCE) {
        Exchange::Dce
    } else if listed(CZCE) {
        Exchange::Czce
    } else {
        Exchange::Unknown
    }
}
