//! XML name validation and Clark-notation utilities
//!
//! Validation for NCNames and QNames according to the XML specifications,
//! plus helpers for the `{uri}local` Clark notation used as type index keys.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NCNAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}][A-Z_a-z\u{C0}-\u{D6}\u{D8}-\u{F6}\u{F8}-\u{2FF}\-\.0-9]*$")
        .unwrap()
});

/// Check if a string is a valid NCName (non-colonized name)
pub fn is_valid_ncname(name: &str) -> bool {
    NCNAME.is_match(name)
}

/// Check if a string is a valid QName (`local` or `prefix:local`)
pub fn is_valid_qname(name: &str) -> bool {
    if name.is_empty() {
        return false;
    }

    if let Some((prefix, local)) = name.split_once(':') {
        is_valid_ncname(prefix) && is_valid_ncname(local)
    } else {
        is_valid_ncname(name)
    }
}

/// Validate an NCName and return an error if invalid
pub fn validate_ncname(name: &str) -> Result<()> {
    if is_valid_ncname(name) {
        Ok(())
    } else {
        Err(Error::Other(format!("invalid NCName: '{}'", name)))
    }
}

/// Split a QName into prefix and local name
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some((prefix, local)) = qname.split_once(':') {
        (Some(prefix), local)
    } else {
        (None, qname)
    }
}

/// Format a (namespace, local) pair as a Clark-notation key
///
/// With no namespace the bare local name is returned.
pub fn clark(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{{{}}}{}", ns, local),
        _ => local.to_string(),
    }
}

/// Check whether a string uses Clark notation (`{uri}local`)
pub fn is_clark(name: &str) -> bool {
    name.starts_with('{')
}

/// Split a Clark-notation string into (namespace, local)
pub fn split_clark(name: &str) -> Result<(Option<String>, String)> {
    if let Some(rest) = name.strip_prefix('{') {
        let (uri, local) = rest.split_once('}').ok_or_else(|| {
            Error::Other(format!("malformed Clark notation: '{}'", name))
        })?;
        if local.is_empty() {
            return Err(Error::Other(format!(
                "malformed Clark notation: '{}' has no local name",
                name
            )));
        }
        let ns = if uri.is_empty() {
            None
        } else {
            Some(uri.to_string())
        };
        Ok((ns, local.to_string()))
    } else {
        Ok((None, name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_ncname() {
        assert!(is_valid_ncname("element"));
        assert!(is_valid_ncname("my-element"));
        assert!(is_valid_ncname("_element"));
        assert!(is_valid_ncname("element123"));

        assert!(!is_valid_ncname(""));
        assert!(!is_valid_ncname("123element"));
        assert!(!is_valid_ncname("-element"));
        assert!(!is_valid_ncname("prefix:element"));
    }

    #[test]
    fn test_is_valid_qname() {
        assert!(is_valid_qname("element"));
        assert!(is_valid_qname("xs:schema"));

        assert!(!is_valid_qname(""));
        assert!(!is_valid_qname(":element"));
        assert!(!is_valid_qname("element:"));
    }

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("element"), (None, "element"));
        assert_eq!(split_qname("xs:element"), (Some("xs"), "element"));
    }

    #[test]
    fn test_clark() {
        assert_eq!(
            clark(Some("http://example.com"), "Person"),
            "{http://example.com}Person"
        );
        assert_eq!(clark(None, "Person"), "Person");
        assert_eq!(clark(Some(""), "Person"), "Person");
    }

    #[test]
    fn test_split_clark() {
        let (ns, local) = split_clark("{http://example.com}Person").unwrap();
        assert_eq!(ns.as_deref(), Some("http://example.com"));
        assert_eq!(local, "Person");

        let (ns, local) = split_clark("Person").unwrap();
        assert!(ns.is_none());
        assert_eq!(local, "Person");

        assert!(split_clark("{unclosed").is_err());
        assert!(split_clark("{http://example.com}").is_err());
    }
}
