//! Built-in XSD datatype value checks
//!
//! Lexical checks for the built-in atomic types used during instance
//! validation. Unknown built-in names pass; the goal is catching values
//! that cannot possibly be valid, not full datatype arithmetic.

use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;

use crate::names;

static DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^-?P(?:\d+Y)?(?:\d+M)?(?:\d+D)?(?:T(?:\d+H)?(?:\d+M)?(?:\d+(?:\.\d+)?S)?)?$")
        .unwrap()
});

static GYEAR_MONTH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d{4,}-\d{2}(?:Z|[+-]\d{2}:\d{2})?$").unwrap());

static GYEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^-?\d{4,}(?:Z|[+-]\d{2}:\d{2})?$").unwrap());

static GMONTH_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^--\d{2}-\d{2}(?:Z|[+-]\d{2}:\d{2})?$").unwrap());

static GDAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^---\d{2}(?:Z|[+-]\d{2}:\d{2})?$").unwrap());

static GMONTH: Lazy<Regex> = Lazy::new(|| Regex::new(r"^--\d{2}(?:Z|[+-]\d{2}:\d{2})?$").unwrap());

static HEX_BINARY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:[0-9a-fA-F]{2})*$").unwrap());

static NMTOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[\w\.\-:]+$").unwrap());

static LANGUAGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z]{1,8}(?:-[a-zA-Z0-9]{1,8})*$").unwrap());

/// Whether a local name denotes an XSD built-in simple type
pub fn is_builtin_type(local_name: &str) -> bool {
    matches!(
        local_name,
        "string"
            | "normalizedString"
            | "token"
            | "language"
            | "Name"
            | "NCName"
            | "ID"
            | "IDREF"
            | "IDREFS"
            | "ENTITY"
            | "ENTITIES"
            | "NMTOKEN"
            | "NMTOKENS"
            | "boolean"
            | "decimal"
            | "integer"
            | "long"
            | "int"
            | "short"
            | "byte"
            | "nonNegativeInteger"
            | "positiveInteger"
            | "nonPositiveInteger"
            | "negativeInteger"
            | "unsignedLong"
            | "unsignedInt"
            | "unsignedShort"
            | "unsignedByte"
            | "float"
            | "double"
            | "duration"
            | "dateTime"
            | "time"
            | "date"
            | "gYearMonth"
            | "gYear"
            | "gMonthDay"
            | "gDay"
            | "gMonth"
            | "hexBinary"
            | "base64Binary"
            | "anyURI"
            | "QName"
            | "NOTATION"
            | "anyType"
            | "anySimpleType"
            | "anyAtomicType"
            | "dateTimeStamp"
            | "yearMonthDuration"
            | "dayTimeDuration"
    )
}

/// Check a value against a built-in type's lexical space
///
/// Returns a violation message on failure.
pub fn check_builtin_value(local_name: &str, value: &str) -> Result<(), String> {
    let trimmed = value.trim();
    let fail = |expected: &str| {
        Err(format!(
            "'{}' is not a valid {} ({})",
            trimmed, local_name, expected
        ))
    };

    match local_name {
        "boolean" => match trimmed {
            "true" | "false" | "1" | "0" => Ok(()),
            _ => fail("true, false, 1 or 0"),
        },
        "decimal" => match trimmed.parse::<Decimal>() {
            Ok(_) => Ok(()),
            Err(_) => fail("a decimal number"),
        },
        "integer" | "nonNegativeInteger" | "positiveInteger" | "nonPositiveInteger"
        | "negativeInteger" => match trimmed.parse::<i128>() {
            Ok(n) => match local_name {
                "nonNegativeInteger" if n < 0 => fail("an integer >= 0"),
                "positiveInteger" if n <= 0 => fail("an integer > 0"),
                "nonPositiveInteger" if n > 0 => fail("an integer <= 0"),
                "negativeInteger" if n >= 0 => fail("an integer < 0"),
                _ => Ok(()),
            },
            Err(_) => fail("an integer"),
        },
        "long" => check_parse::<i64>(trimmed, local_name),
        "int" => check_parse::<i32>(trimmed, local_name),
        "short" => check_parse::<i16>(trimmed, local_name),
        "byte" => check_parse::<i8>(trimmed, local_name),
        "unsignedLong" => check_parse::<u64>(trimmed, local_name),
        "unsignedInt" => check_parse::<u32>(trimmed, local_name),
        "unsignedShort" => check_parse::<u16>(trimmed, local_name),
        "unsignedByte" => check_parse::<u8>(trimmed, local_name),
        "float" | "double" => match trimmed {
            "INF" | "-INF" | "NaN" => Ok(()),
            _ => match trimmed.parse::<f64>() {
                Ok(_) => Ok(()),
                Err(_) => fail("a floating-point number"),
            },
        },
        "dateTime" | "dateTimeStamp" => {
            let candidate = trimmed.trim_end_matches('Z');
            if chrono::NaiveDateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S").is_ok()
                || chrono::NaiveDateTime::parse_from_str(candidate, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
                || chrono::DateTime::parse_from_rfc3339(trimmed).is_ok()
            {
                Ok(())
            } else {
                fail("an ISO-8601 date-time")
            }
        }
        "date" => {
            let candidate = trimmed.trim_end_matches('Z');
            match chrono::NaiveDate::parse_from_str(candidate, "%Y-%m-%d") {
                Ok(_) => Ok(()),
                Err(_) => fail("an ISO-8601 date"),
            }
        }
        "time" => {
            let candidate = trimmed.trim_end_matches('Z');
            if chrono::NaiveTime::parse_from_str(candidate, "%H:%M:%S").is_ok()
                || chrono::NaiveTime::parse_from_str(candidate, "%H:%M:%S%.f").is_ok()
            {
                Ok(())
            } else {
                fail("an ISO-8601 time")
            }
        }
        "duration" | "yearMonthDuration" | "dayTimeDuration" => {
            if DURATION.is_match(trimmed) && trimmed.len() > 1 {
                Ok(())
            } else {
                fail("an ISO-8601 duration")
            }
        }
        "gYearMonth" => check_regex(&GYEAR_MONTH, trimmed, local_name),
        "gYear" => check_regex(&GYEAR, trimmed, local_name),
        "gMonthDay" => check_regex(&GMONTH_DAY, trimmed, local_name),
        "gDay" => check_regex(&GDAY, trimmed, local_name),
        "gMonth" => check_regex(&GMONTH, trimmed, local_name),
        "hexBinary" => {
            if HEX_BINARY.is_match(trimmed) {
                Ok(())
            } else {
                fail("an even-length hex string")
            }
        }
        "base64Binary" => {
            let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
            match base64::engine::general_purpose::STANDARD.decode(compact.as_bytes()) {
                Ok(_) => Ok(()),
                Err(_) => fail("base64 data"),
            }
        }
        "QName" => {
            if names::is_valid_qname(trimmed) {
                Ok(())
            } else {
                fail("a qualified name")
            }
        }
        "Name" | "NCName" | "ID" | "IDREF" | "ENTITY" => {
            if names::is_valid_ncname(trimmed) {
                Ok(())
            } else {
                fail("an XML name")
            }
        }
        "NMTOKEN" => check_regex(&NMTOKEN, trimmed, local_name),
        "language" => check_regex(&LANGUAGE, trimmed, local_name),
        // string family and the any* types accept every value
        _ => Ok(()),
    }
}

fn check_parse<T: std::str::FromStr>(value: &str, type_name: &str) -> Result<(), String> {
    match value.parse::<T>() {
        Ok(_) => Ok(()),
        Err(_) => Err(format!("'{}' is not a valid {}", value, type_name)),
    }
}

fn check_regex(re: &Regex, value: &str, type_name: &str) -> Result<(), String> {
    if re.is_match(value) {
        Ok(())
    } else {
        Err(format!("'{}' is not a valid {}", value, type_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boolean() {
        assert!(check_builtin_value("boolean", "true").is_ok());
        assert!(check_builtin_value("boolean", "0").is_ok());
        assert!(check_builtin_value("boolean", "yes").is_err());
    }

    #[test]
    fn test_numeric_ranges() {
        assert!(check_builtin_value("int", "2147483647").is_ok());
        assert!(check_builtin_value("int", "2147483648").is_err());
        assert!(check_builtin_value("byte", "-128").is_ok());
        assert!(check_builtin_value("byte", "200").is_err());
        assert!(check_builtin_value("unsignedInt", "-1").is_err());
        assert!(check_builtin_value("positiveInteger", "0").is_err());
        assert!(check_builtin_value("decimal", "3.14").is_ok());
        assert!(check_builtin_value("decimal", "abc").is_err());
    }

    #[test]
    fn test_floats() {
        assert!(check_builtin_value("double", "1.5e10").is_ok());
        assert!(check_builtin_value("float", "INF").is_ok());
        assert!(check_builtin_value("float", "x").is_err());
    }

    #[test]
    fn test_dates() {
        assert!(check_builtin_value("date", "2024-02-29").is_ok());
        assert!(check_builtin_value("date", "2024-13-01").is_err());
        assert!(check_builtin_value("dateTime", "2024-01-01T12:30:00").is_ok());
        assert!(check_builtin_value("dateTime", "2024-01-01T12:30:00Z").is_ok());
        assert!(check_builtin_value("time", "23:59:59").is_ok());
        assert!(check_builtin_value("time", "25:00:00").is_err());
    }

    #[test]
    fn test_binary() {
        assert!(check_builtin_value("hexBinary", "0fB8").is_ok());
        assert!(check_builtin_value("hexBinary", "0fB").is_err());
        assert!(check_builtin_value("base64Binary", "SGVsbG8=").is_ok());
        assert!(check_builtin_value("base64Binary", "!!!").is_err());
    }

    #[test]
    fn test_durations() {
        assert!(check_builtin_value("duration", "P1Y2M3DT4H5M6S").is_ok());
        assert!(check_builtin_value("duration", "-P1D").is_ok());
        assert!(check_builtin_value("duration", "1Y").is_err());
    }

    #[test]
    fn test_names() {
        assert!(check_builtin_value("NCName", "valid-name").is_ok());
        assert!(check_builtin_value("NCName", "in:valid").is_err());
        assert!(check_builtin_value("QName", "p:local").is_ok());
    }

    #[test]
    fn test_string_accepts_anything() {
        assert!(check_builtin_value("string", "anything at all").is_ok());
        assert!(check_builtin_value("anyURI", "relative/path?query").is_ok());
    }

    #[test]
    fn test_is_builtin_type() {
        assert!(is_builtin_type("string"));
        assert!(is_builtin_type("dateTimeStamp"));
        assert!(!is_builtin_type("PersonType"));
    }
}
