use std::fmt;

use serde::{Deserialize, Serialize};

/// Return types the engine ships calculators for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FormCode {
    #[serde(rename = "1040")]
    Individual,
    #[serde(rename = "1120")]
    CCorporation,
    #[serde(rename = "1120-S")]
    SCorporation,
    #[serde(rename = "1065")]
    Partnership,
    #[serde(rename = "1041")]
    TrustEstate,
    #[serde(rename = "990")]
    NonProfit,
}

impl FormCode {
    pub const ALL: [Self; 6] = [
        Self::Individual,
        Self::CCorporation,
        Self::SCorporation,
        Self::Partnership,
        Self::TrustEstate,
        Self::NonProfit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Individual => "1040",
            Self::CCorporation => "1120",
            Self::SCorporation => "1120-S",
            Self::Partnership => "1065",
            Self::TrustEstate => "1041",
            Self::NonProfit => "990",
        }
    }

    /// Parses a form code, ignoring surrounding whitespace and case.
    pub fn parse(s: &str) -> Option<Self> {
        let code = normalize_form_code(s);
        Self::ALL.into_iter().find(|form| form.as_str() == code)
    }

    pub fn title(&self) -> &'static str {
        match self {
            Self::Individual => "U.S. Individual Income Tax Return",
            Self::CCorporation => "U.S. Corporation Income Tax Return",
            Self::SCorporation => "U.S. Income Tax Return for an S Corporation",
            Self::Partnership => "U.S. Return of Partnership Income",
            Self::TrustEstate => "U.S. Income Tax Return for Estates and Trusts",
            Self::NonProfit => "Return of Organization Exempt From Income Tax",
        }
    }
}

impl fmt::Display for FormCode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical spelling of a form code used for every lookup key.
pub fn normalize_form_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(FormCode::parse(" 1120-s "), Some(FormCode::SCorporation));
    }

    #[test]
    fn parse_rejects_unknown_form() {
        assert_eq!(FormCode::parse("941"), None);
    }

    #[test]
    fn every_form_round_trips() {
        for form in FormCode::ALL {
            assert_eq!(FormCode::parse(form.as_str()), Some(form));
        }
    }
}
