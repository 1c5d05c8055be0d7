//! XSD version detection
//!
//! A schema document is XSD 1.1 iff it uses a 1.1-only construct: the
//! assertion/alternative/open-content elements, the `defaultAttributes` or
//! `xpathDefaultNamespace` schema attributes, or one of the 1.1-only
//! atomic types.

use serde::{Deserialize, Serialize};

use crate::documents::Element;

/// XSD specification version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum XsdVersion {
    /// XSD 1.0
    #[default]
    V10,
    /// XSD 1.1
    V11,
}

impl XsdVersion {
    /// Human-readable version string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::V10 => "1.0",
            Self::V11 => "1.1",
        }
    }

    /// Whether a validator targeting this version accepts a schema of the
    /// given version (1.1 accepts 1.0; 1.0 rejects 1.1)
    pub fn accepts(&self, schema_version: XsdVersion) -> bool {
        match self {
            Self::V11 => true,
            Self::V10 => schema_version == Self::V10,
        }
    }
}

impl std::fmt::Display for XsdVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

const XSD11_ELEMENTS: &[&str] = &[
    "assert",
    "assertion",
    "alternative",
    "openContent",
    "defaultOpenContent",
];

const XSD11_SCHEMA_ATTRS: &[&str] = &["defaultAttributes", "xpathDefaultNamespace"];

const XSD11_ATOMIC_TYPES: &[&str] = &[
    "anyAtomicType",
    "dateTimeStamp",
    "yearMonthDuration",
    "dayTimeDuration",
];

const TYPE_REF_ATTRS: &[&str] = &["type", "base", "itemType", "memberTypes"];

/// Detect the XSD version of a schema document from its root element
pub fn detect_version(root: &Element) -> XsdVersion {
    for attr in XSD11_SCHEMA_ATTRS {
        if root.get_attribute(attr).is_some() {
            return XsdVersion::V11;
        }
    }

    if root.any_descendant(&|elem| {
        if XSD11_ELEMENTS.contains(&elem.local_name()) {
            return true;
        }
        TYPE_REF_ATTRS.iter().any(|attr| {
            elem.get_attribute(attr)
                .map(references_11_atomic_type)
                .unwrap_or(false)
        })
    }) {
        return XsdVersion::V11;
    }

    XsdVersion::V10
}

/// Whether a type-reference attribute value names a 1.1-only atomic type
///
/// Handles space-separated lists (memberTypes) and prefixed names.
fn references_11_atomic_type(value: &str) -> bool {
    value.split_whitespace().any(|token| {
        let local = token.rsplit(':').next().unwrap_or(token);
        XSD11_ATOMIC_TYPES.contains(&local)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::documents::Document;

    #[test]
    fn test_plain_schema_is_10() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="urn:a">
                 <xs:element name="e" type="xs:string"/>
               </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(detect_version(doc.root().unwrap()), XsdVersion::V10);
    }

    #[test]
    fn test_assert_element_is_11() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:complexType name="t">
                   <xs:assert test="@a gt 0"/>
                 </xs:complexType>
               </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(detect_version(doc.root().unwrap()), XsdVersion::V11);
    }

    #[test]
    fn test_default_attributes_is_11() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" defaultAttributes="common"/>"#,
        )
        .unwrap();
        assert_eq!(detect_version(doc.root().unwrap()), XsdVersion::V11);
    }

    #[test]
    fn test_11_atomic_type_reference() {
        let doc = Document::from_string(
            r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
                 <xs:element name="ts" type="xs:dateTimeStamp"/>
               </xs:schema>"#,
        )
        .unwrap();
        assert_eq!(detect_version(doc.root().unwrap()), XsdVersion::V11);
    }

    #[test]
    fn test_version_acceptance() {
        assert!(XsdVersion::V11.accepts(XsdVersion::V10));
        assert!(XsdVersion::V11.accepts(XsdVersion::V11));
        assert!(XsdVersion::V10.accepts(XsdVersion::V10));
        assert!(!XsdVersion::V10.accepts(XsdVersion::V11));
    }
}
