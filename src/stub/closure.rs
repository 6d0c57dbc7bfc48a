use std::collections::HashSet;

use crate::classfile::types::ClassRecord;
use crate::stub::visibility::is_visible;

/// Accumulates which class names must end up in the output archive.
///
/// The visible set holds every scanned class that is itself part of the API
/// surface. The include set starts from the visible set and additionally
/// picks up every superclass and interface name referenced by any scanned
/// class, visible or not, so that emitted stubs keep their declared
/// supertypes resolvable. Names are added exactly one level deep: a name
/// pulled in by reference is never re-derived unless that class is itself
/// part of the scan. Membership only grows within a run.
#[derive(Debug, Default)]
pub struct InclusionClosure {
    visible: HashSet<String>,
    include: HashSet<String>,
}

impl InclusionClosure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one scanned class into the closure.
    pub fn record(&mut self, class: &ClassRecord) {
        if is_visible(class.access_flags) {
            self.visible.insert(class.name.clone());
            self.include.insert(class.name.clone());
        }
        // Supertype names count even when the class itself is hidden.
        if let Some(super_name) = &class.super_name {
            self.include.insert(super_name.clone());
        }
        for interface in &class.interfaces {
            self.include.insert(interface.clone());
        }
    }

    /// Names of scanned classes that are part of the API surface.
    pub fn visible(&self) -> &HashSet<String> {
        &self.visible
    }

    /// Names whose stub must appear in the output, when available.
    pub fn include(&self) -> &HashSet<String> {
        &self.include
    }

    pub fn contains(&self, name: &str) -> bool {
        self.include.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::types::{ACC_PUBLIC, ACC_SUPER};
    use pretty_assertions::assert_eq;

    fn class(name: &str, access_flags: u16, super_name: &str, interfaces: &[&str]) -> ClassRecord {
        ClassRecord {
            minor_version: 0,
            major_version: 63,
            access_flags,
            name: name.to_string(),
            super_name: Some(super_name.to_string()),
            interfaces: interfaces.iter().map(|s| s.to_string()).collect(),
            fields: Vec::new(),
            methods: Vec::new(),
            inner_classes: Vec::new(),
            permitted_subclasses: Vec::new(),
            signature: None,
            visible_annotations: Vec::new(),
            invisible_annotations: Vec::new(),
        }
    }

    #[test]
    fn visible_class_is_included_with_its_supertypes() {
        let mut closure = InclusionClosure::new();
        closure.record(&class(
            "a/Foo",
            ACC_PUBLIC | ACC_SUPER,
            "a/Base",
            &["java/io/Closeable"],
        ));

        assert!(closure.visible().contains("a/Foo"));
        assert!(closure.contains("a/Foo"));
        assert!(closure.contains("a/Base"));
        assert!(closure.contains("java/io/Closeable"));
    }

    #[test]
    fn hidden_class_still_contributes_supertype_names() {
        let mut closure = InclusionClosure::new();
        closure.record(&class("a/Hidden", ACC_SUPER, "a/Base", &["a/Marker"]));

        assert!(!closure.visible().contains("a/Hidden"));
        assert!(!closure.contains("a/Hidden"));
        assert!(closure.contains("a/Base"));
        assert!(closure.contains("a/Marker"));
    }

    #[test]
    fn include_set_is_a_superset_of_the_visible_set() {
        let mut closure = InclusionClosure::new();
        closure.record(&class("a/Foo", ACC_PUBLIC, "a/Base", &[]));
        closure.record(&class("a/Hidden", 0, "java/lang/Object", &[]));
        closure.record(&class("a/Base", ACC_PUBLIC, "java/lang/Object", &[]));

        for name in closure.visible() {
            assert!(closure.include().contains(name));
        }
        assert_eq!(closure.visible().len(), 2);
        assert_eq!(closure.include().len(), 3); // Foo, Base, Object
    }

    #[test]
    fn visit_order_does_not_change_the_final_sets() {
        let records = [
            class("a/Foo", ACC_PUBLIC, "a/Base", &["a/Iface"]),
            class("a/Base", ACC_PUBLIC, "java/lang/Object", &[]),
            class("a/Hidden", 0, "a/Secret", &[]),
        ];

        let mut forward = InclusionClosure::new();
        for record in &records {
            forward.record(record);
        }
        let mut backward = InclusionClosure::new();
        for record in records.iter().rev() {
            backward.record(record);
        }

        assert_eq!(forward.visible(), backward.visible());
        assert_eq!(forward.include(), backward.include());
    }
}
