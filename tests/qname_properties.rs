//! Property tests for qualified-name handling

use proptest::prelude::*;

use xsdrepo::names;
use xsdrepo::namespaces::NamespaceRegistry;

fn ncname() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_.-]{0,15}"
}

fn namespace_uri() -> impl Strategy<Value = String> {
    "(urn:[a-z]{1,8}(:[a-z]{1,8}){0,2}|http://[a-z]{1,10}\\.example\\.com(/[a-z]{1,6}){0,3})"
}

proptest! {
    /// Clark formatting and splitting invert each other
    #[test]
    fn clark_round_trip(ns in namespace_uri(), local in ncname()) {
        let clark = names::clark(Some(&ns), &local);
        let (parsed_ns, parsed_local) = names::split_clark(&clark).unwrap();
        prop_assert_eq!(parsed_ns.as_deref(), Some(ns.as_str()));
        prop_assert_eq!(parsed_local, local);
    }

    /// A registered prefix and its Clark form parse to the same name
    #[test]
    fn prefixed_equals_clark(prefix in ncname(), ns in namespace_uri(), local in ncname()) {
        let mut registry = NamespaceRegistry::new();
        registry.register(prefix.clone(), ns.clone());

        let by_prefix = registry.parse_qname(&format!("{}:{}", prefix, local)).unwrap();
        let by_clark = registry.parse_qname(&names::clark(Some(&ns), &local)).unwrap();

        prop_assert_eq!(by_prefix.namespace.as_deref(), by_clark.namespace.as_deref());
        prop_assert_eq!(by_prefix.local_name, by_clark.local_name);
    }

    /// Bare names take the default namespace
    #[test]
    fn bare_name_uses_default(ns in namespace_uri(), local in ncname()) {
        let mut registry = NamespaceRegistry::new();
        registry.set_default_namespace(ns.clone());

        let parsed = registry.parse_qname(&local).unwrap();
        prop_assert_eq!(parsed.namespace.as_deref(), Some(ns.as_str()));
        prop_assert_eq!(parsed.local_name, local);
    }

    /// Generated NCNames pass validation
    #[test]
    fn generated_ncnames_are_valid(local in ncname()) {
        prop_assert!(names::is_valid_ncname(&local));
        prop_assert!(names::is_valid_qname(&local));
    }
}
