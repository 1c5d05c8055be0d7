//! Content-model particles
//!
//! Sequence, choice and all groups preserve document order; their members
//! are a tagged variant over {element, group reference, nested model
//! group, wildcard}.

use serde::{Deserialize, Serialize};

use crate::model::annotations::Annotation;
use crate::model::elements::ElementDecl;

/// maxOccurs value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxOccurs {
    /// A bounded occurrence count
    Bounded(u32),
    /// `maxOccurs="unbounded"`
    Unbounded,
}

impl Default for MaxOccurs {
    fn default() -> Self {
        MaxOccurs::Bounded(1)
    }
}

/// Occurrence range of a particle; XSD defaults are `1..1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurs {
    /// minOccurs
    pub min: u32,
    /// maxOccurs
    pub max: MaxOccurs,
}

impl Default for Occurs {
    fn default() -> Self {
        Self {
            min: 1,
            max: MaxOccurs::Bounded(1),
        }
    }
}

impl Occurs {
    /// An optional occurrence (`0..1`)
    pub fn optional() -> Self {
        Self {
            min: 0,
            max: MaxOccurs::Bounded(1),
        }
    }

    /// Whether this is the XSD default `1..1`
    pub fn is_default(&self) -> bool {
        self.min == 1 && self.max == MaxOccurs::Bounded(1)
    }

    /// Whether a repetition count satisfies this range
    pub fn accepts(&self, count: u32) -> bool {
        if count < self.min {
            return false;
        }
        match self.max {
            MaxOccurs::Unbounded => true,
            MaxOccurs::Bounded(max) => count <= max,
        }
    }
}

/// processContents mode of a wildcard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProcessContents {
    /// Validate if a declaration is available
    #[default]
    Strict,
    /// Validate when possible
    Lax,
    /// Skip validation
    Skip,
}

impl ProcessContents {
    /// Parse from the attribute value
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "strict" => Some(Self::Strict),
            "lax" => Some(Self::Lax),
            "skip" => Some(Self::Skip),
            _ => None,
        }
    }

    /// The attribute value for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lax => "lax",
            Self::Skip => "skip",
        }
    }
}

/// An `xs:any` wildcard particle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnyElement {
    /// Optional id attribute
    pub id: Option<String>,
    /// Namespace constraint (`##any`, `##other`, a URI list, …)
    pub namespace: Option<String>,
    /// processContents mode
    pub process_contents: ProcessContents,
    /// Occurrence range
    pub occurs: Occurs,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// A reference to a named model group (`xs:group ref="…"`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    /// Optional id attribute
    pub id: Option<String>,
    /// Qualified name of the referenced group
    pub ref_name: String,
    /// Occurrence range
    pub occurs: Occurs,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// A sequence/choice/all body
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelGroup {
    /// Optional id attribute
    pub id: Option<String>,
    /// Occurrence range
    pub occurs: Occurs,
    /// Member particles, in document order
    pub particles: Vec<Particle>,
    /// Optional annotation
    pub annotation: Option<Annotation>,
}

/// A content-model particle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Particle {
    /// A local or referenced element
    Element(Box<ElementDecl>),
    /// A reference to a named group
    GroupRef(GroupRef),
    /// An ordered sequence
    Sequence(ModelGroup),
    /// An exclusive choice
    Choice(ModelGroup),
    /// An unordered all group
    All(ModelGroup),
    /// A wildcard
    Any(AnyElement),
}

impl Particle {
    /// The occurrence range of this particle
    pub fn occurs(&self) -> Occurs {
        match self {
            Particle::Element(e) => e.occurs,
            Particle::GroupRef(g) => g.occurs,
            Particle::Sequence(g) | Particle::Choice(g) | Particle::All(g) => g.occurs,
            Particle::Any(a) => a.occurs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurs_default() {
        let occurs = Occurs::default();
        assert!(occurs.is_default());
        assert!(occurs.accepts(1));
        assert!(!occurs.accepts(0));
        assert!(!occurs.accepts(2));
    }

    #[test]
    fn test_occurs_unbounded() {
        let occurs = Occurs {
            min: 0,
            max: MaxOccurs::Unbounded,
        };
        assert!(occurs.accepts(0));
        assert!(occurs.accepts(10000));
    }

    #[test]
    fn test_process_contents_parse() {
        assert_eq!(ProcessContents::parse("lax"), Some(ProcessContents::Lax));
        assert_eq!(ProcessContents::parse("bogus"), None);
        assert_eq!(ProcessContents::Skip.as_str(), "skip");
    }
}
