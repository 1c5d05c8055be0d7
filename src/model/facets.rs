//! Constraining facets for simple types

use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;

/// Common payload of a facet element: the `value` attribute plus `fixed`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FacetValue {
    /// Optional id attribute
    pub id: Option<String>,
    /// The facet value, uninterpreted
    pub value: String,
    /// Whether the facet is fixed for derived types
    pub fixed: bool,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

impl FacetValue {
    /// Create a facet value
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }
}

/// A constraining facet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Facet {
    /// One member of the value enumeration
    Enumeration(FacetValue),
    /// A regular-expression pattern
    Pattern(FacetValue),
    /// Exact length
    Length(FacetValue),
    /// Minimum length
    MinLength(FacetValue),
    /// Maximum length
    MaxLength(FacetValue),
    /// Inclusive lower bound
    MinInclusive(FacetValue),
    /// Inclusive upper bound
    MaxInclusive(FacetValue),
    /// Exclusive lower bound
    MinExclusive(FacetValue),
    /// Exclusive upper bound
    MaxExclusive(FacetValue),
    /// Maximum number of decimal digits
    TotalDigits(FacetValue),
    /// Maximum number of fraction digits
    FractionDigits(FacetValue),
    /// White-space processing mode
    WhiteSpace(FacetValue),
}

impl Facet {
    /// The XSD element name of this facet
    pub fn xml_name(&self) -> &'static str {
        match self {
            Facet::Enumeration(_) => "enumeration",
            Facet::Pattern(_) => "pattern",
            Facet::Length(_) => "length",
            Facet::MinLength(_) => "minLength",
            Facet::MaxLength(_) => "maxLength",
            Facet::MinInclusive(_) => "minInclusive",
            Facet::MaxInclusive(_) => "maxInclusive",
            Facet::MinExclusive(_) => "minExclusive",
            Facet::MaxExclusive(_) => "maxExclusive",
            Facet::TotalDigits(_) => "totalDigits",
            Facet::FractionDigits(_) => "fractionDigits",
            Facet::WhiteSpace(_) => "whiteSpace",
        }
    }

    /// The facet payload
    pub fn value(&self) -> &FacetValue {
        match self {
            Facet::Enumeration(v)
            | Facet::Pattern(v)
            | Facet::Length(v)
            | Facet::MinLength(v)
            | Facet::MaxLength(v)
            | Facet::MinInclusive(v)
            | Facet::MaxInclusive(v)
            | Facet::MinExclusive(v)
            | Facet::MaxExclusive(v)
            | Facet::TotalDigits(v)
            | Facet::FractionDigits(v)
            | Facet::WhiteSpace(v) => v,
        }
    }

    /// Construct a facet from its XSD element name and payload
    pub fn from_xml_name(name: &str, value: FacetValue) -> Option<Self> {
        Some(match name {
            "enumeration" => Facet::Enumeration(value),
            "pattern" => Facet::Pattern(value),
            "length" => Facet::Length(value),
            "minLength" => Facet::MinLength(value),
            "maxLength" => Facet::MaxLength(value),
            "minInclusive" => Facet::MinInclusive(value),
            "maxInclusive" => Facet::MaxInclusive(value),
            "minExclusive" => Facet::MinExclusive(value),
            "maxExclusive" => Facet::MaxExclusive(value),
            "totalDigits" => Facet::TotalDigits(value),
            "fractionDigits" => Facet::FractionDigits(value),
            "whiteSpace" => Facet::WhiteSpace(value),
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facet_round_trip_by_name() {
        for name in [
            "enumeration",
            "pattern",
            "length",
            "minLength",
            "maxLength",
            "minInclusive",
            "maxInclusive",
            "minExclusive",
            "maxExclusive",
            "totalDigits",
            "fractionDigits",
            "whiteSpace",
        ] {
            let facet = Facet::from_xml_name(name, FacetValue::new("x")).unwrap();
            assert_eq!(facet.xml_name(), name);
        }
        assert!(Facet::from_xml_name("bogus", FacetValue::new("x")).is_none());
    }
}
