//! Constraining-facet checks
//!
//! Applies the facets of a simple-type restriction to a lexical value.
//! The whiteSpace facet normalizes the value before the other facets run.

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::model::{Facet, FacetValue};

/// White-space processing modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteSpaceMode {
    /// Keep the value as is
    #[default]
    Preserve,
    /// Replace tabs and newlines with spaces
    Replace,
    /// Replace, then collapse runs and trim
    Collapse,
}

impl WhiteSpaceMode {
    /// Parse from the facet value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "preserve" => Some(Self::Preserve),
            "replace" => Some(Self::Replace),
            "collapse" => Some(Self::Collapse),
            _ => None,
        }
    }

    /// Normalize a value according to this mode
    pub fn normalize(&self, value: &str) -> String {
        match self {
            Self::Preserve => value.to_string(),
            Self::Replace => value.replace(['\t', '\n', '\r'], " "),
            Self::Collapse => {
                let replaced = value.replace(['\t', '\n', '\r'], " ");
                let mut result = String::with_capacity(replaced.len());
                let mut previous_space = true;
                for c in replaced.chars() {
                    if c == ' ' {
                        if !previous_space {
                            result.push(' ');
                            previous_space = true;
                        }
                    } else {
                        result.push(c);
                        previous_space = false;
                    }
                }
                result.trim_end().to_string()
            }
        }
    }
}

/// Check a value against a facet list; returns violation messages
pub fn check_facets(facets: &[Facet], value: &str) -> Vec<String> {
    let mode = facets
        .iter()
        .find_map(|facet| match facet {
            Facet::WhiteSpace(v) => WhiteSpaceMode::parse(&v.value),
            _ => None,
        })
        .unwrap_or_default();
    let value = mode.normalize(value);

    let mut violations = Vec::new();

    // Enumerations and patterns each pass when any member matches
    let enumerations: Vec<&FacetValue> = facets
        .iter()
        .filter_map(|facet| match facet {
            Facet::Enumeration(v) => Some(v),
            _ => None,
        })
        .collect();
    if !enumerations.is_empty() && !enumerations.iter().any(|v| v.value == value) {
        violations.push(format!(
            "'{}' is not one of the enumerated values [{}]",
            value,
            enumerations
                .iter()
                .map(|v| v.value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }

    let patterns: Vec<&FacetValue> = facets
        .iter()
        .filter_map(|facet| match facet {
            Facet::Pattern(v) => Some(v),
            _ => None,
        })
        .collect();
    if !patterns.is_empty() {
        let matched = patterns.iter().any(|p| pattern_matches(&p.value, &value));
        if !matched {
            violations.push(format!(
                "'{}' does not match pattern '{}'",
                value,
                patterns
                    .iter()
                    .map(|p| p.value.as_str())
                    .collect::<Vec<_>>()
                    .join("|")
            ));
        }
    }

    for facet in facets {
        match facet {
            Facet::Length(v) => {
                if let Ok(expected) = v.value.parse::<usize>() {
                    let actual = value.chars().count();
                    if actual != expected {
                        violations.push(format!(
                            "length is {} but must be exactly {}",
                            actual, expected
                        ));
                    }
                }
            }
            Facet::MinLength(v) => {
                if let Ok(min) = v.value.parse::<usize>() {
                    let actual = value.chars().count();
                    if actual < min {
                        violations
                            .push(format!("length is {} but must be at least {}", actual, min));
                    }
                }
            }
            Facet::MaxLength(v) => {
                if let Ok(max) = v.value.parse::<usize>() {
                    let actual = value.chars().count();
                    if actual > max {
                        violations
                            .push(format!("length is {} but must be at most {}", actual, max));
                    }
                }
            }
            Facet::MinInclusive(v) => {
                if compare(&value, &v.value) == Some(std::cmp::Ordering::Less) {
                    violations.push(format!("'{}' is less than minInclusive {}", value, v.value));
                }
            }
            Facet::MaxInclusive(v) => {
                if compare(&value, &v.value) == Some(std::cmp::Ordering::Greater) {
                    violations.push(format!(
                        "'{}' is greater than maxInclusive {}",
                        value, v.value
                    ));
                }
            }
            Facet::MinExclusive(v) => {
                if compare(&value, &v.value) != Some(std::cmp::Ordering::Greater) {
                    violations.push(format!(
                        "'{}' must be greater than minExclusive {}",
                        value, v.value
                    ));
                }
            }
            Facet::MaxExclusive(v) => {
                if compare(&value, &v.value) != Some(std::cmp::Ordering::Less) {
                    violations.push(format!(
                        "'{}' must be less than maxExclusive {}",
                        value, v.value
                    ));
                }
            }
            Facet::TotalDigits(v) => {
                if let (Ok(limit), Ok(decimal)) =
                    (v.value.parse::<usize>(), value.parse::<Decimal>())
                {
                    let digits = decimal
                        .abs()
                        .to_string()
                        .chars()
                        .filter(|c| c.is_ascii_digit())
                        .count();
                    if digits > limit {
                        violations.push(format!(
                            "'{}' has {} digits but totalDigits is {}",
                            value, digits, limit
                        ));
                    }
                }
            }
            Facet::FractionDigits(v) => {
                if let (Ok(limit), Ok(decimal)) =
                    (v.value.parse::<usize>(), value.parse::<Decimal>())
                {
                    if decimal.scale() as usize > limit {
                        violations.push(format!(
                            "'{}' has {} fraction digits but fractionDigits is {}",
                            value,
                            decimal.scale(),
                            limit
                        ));
                    }
                }
            }
            _ => {}
        }
    }

    violations
}

/// Compare a value to a bound: numerically when both parse as decimals,
/// lexically otherwise (which covers ISO-8601 dates)
fn compare(value: &str, bound: &str) -> Option<std::cmp::Ordering> {
    match (value.parse::<Decimal>(), bound.parse::<Decimal>()) {
        (Ok(a), Ok(b)) => Some(a.cmp(&b)),
        _ => Some(value.cmp(bound)),
    }
}

static EXPLICIT_ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\^|\$$").unwrap());

/// XSD patterns are implicitly anchored
fn pattern_matches(pattern: &str, value: &str) -> bool {
    let anchored = if EXPLICIT_ANCHOR.is_match(pattern) {
        pattern.to_string()
    } else {
        format!("^(?:{})$", pattern)
    };
    match Regex::new(&anchored) {
        Ok(re) => re.is_match(value),
        Err(_) => {
            tracing::warn!(pattern = pattern, "unsupported pattern facet; skipping");
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FacetValue;

    fn facet_value(v: &str) -> FacetValue {
        FacetValue::new(v)
    }

    #[test]
    fn test_enumeration() {
        let facets = vec![
            Facet::Enumeration(facet_value("red")),
            Facet::Enumeration(facet_value("green")),
        ];
        assert!(check_facets(&facets, "red").is_empty());
        assert!(!check_facets(&facets, "blue").is_empty());
    }

    #[test]
    fn test_pattern_anchored() {
        let facets = vec![Facet::Pattern(facet_value("[A-Z]{2}"))];
        assert!(check_facets(&facets, "AB").is_empty());
        assert!(!check_facets(&facets, "ABC").is_empty());
        assert!(!check_facets(&facets, "ab").is_empty());
    }

    #[test]
    fn test_length_facets() {
        let facets = vec![
            Facet::MinLength(facet_value("2")),
            Facet::MaxLength(facet_value("4")),
        ];
        assert!(check_facets(&facets, "abc").is_empty());
        assert!(!check_facets(&facets, "a").is_empty());
        assert!(!check_facets(&facets, "abcde").is_empty());
    }

    #[test]
    fn test_numeric_bounds() {
        let facets = vec![
            Facet::MinInclusive(facet_value("0")),
            Facet::MaxExclusive(facet_value("100")),
        ];
        assert!(check_facets(&facets, "0").is_empty());
        assert!(check_facets(&facets, "99.5").is_empty());
        assert!(!check_facets(&facets, "-1").is_empty());
        assert!(!check_facets(&facets, "100").is_empty());
    }

    #[test]
    fn test_digit_facets() {
        let facets = vec![
            Facet::TotalDigits(facet_value("4")),
            Facet::FractionDigits(facet_value("2")),
        ];
        assert!(check_facets(&facets, "12.34").is_empty());
        assert!(!check_facets(&facets, "12345").is_empty());
        assert!(!check_facets(&facets, "1.234").is_empty());
    }

    #[test]
    fn test_whitespace_collapse_before_checks() {
        let facets = vec![
            Facet::WhiteSpace(facet_value("collapse")),
            Facet::Enumeration(facet_value("red")),
        ];
        assert!(check_facets(&facets, "  red \n").is_empty());
    }

    #[test]
    fn test_whitespace_modes() {
        assert_eq!(WhiteSpaceMode::Replace.normalize("a\tb"), "a b");
        assert_eq!(WhiteSpaceMode::Collapse.normalize("  a   b  "), "a b");
        assert_eq!(WhiteSpaceMode::Preserve.normalize(" a "), " a ");
    }
}
