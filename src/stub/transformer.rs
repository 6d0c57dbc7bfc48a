//! Rewrites a parsed class into its API stub form.

use crate::classfile::types::{Annotation, ClassRecord, FieldRecord, MethodRecord};
use crate::stub::visibility::is_visible;

/// Internal name of the preview-feature marker annotation type.
pub const PREVIEW_MARKER_CLASS: &str = "jdk/internal/javac/PreviewFeature";

/// Type descriptor of the preview-feature marker annotation.
pub const PREVIEW_MARKER_DESCRIPTOR: &str = "Ljdk/internal/javac/PreviewFeature;";

/// Major format version every stub is downgraded to (Java 11).
pub const BASELINE_MAJOR_VERSION: u16 = 55;

/// Produce the stub form of one class.
///
/// Pure function over the record: non-visible members are omitted,
/// preview-marker annotations and the marker's inner-class records are
/// removed, permitted-subclass lists are cleared, and the format version is
/// pinned to the baseline. Member ordering and everything else is preserved
/// as read.
pub fn strip_class(class: &ClassRecord) -> ClassRecord {
    ClassRecord {
        minor_version: 0,
        major_version: BASELINE_MAJOR_VERSION,
        access_flags: class.access_flags,
        name: class.name.clone(),
        super_name: class.super_name.clone(),
        interfaces: class.interfaces.clone(),
        fields: class
            .fields
            .iter()
            .filter(|field| is_visible(field.access_flags))
            .map(strip_field)
            .collect(),
        methods: class
            .methods
            .iter()
            .filter(|method| is_visible(method.access_flags))
            .map(strip_method)
            .collect(),
        inner_classes: class
            .inner_classes
            .iter()
            .filter(|inner| inner.outer.as_deref() != Some(PREVIEW_MARKER_CLASS))
            .cloned()
            .collect(),
        permitted_subclasses: Vec::new(),
        signature: class.signature.clone(),
        visible_annotations: strip_marker_annotations(&class.visible_annotations),
        invisible_annotations: strip_marker_annotations(&class.invisible_annotations),
    }
}

fn strip_field(field: &FieldRecord) -> FieldRecord {
    FieldRecord {
        access_flags: field.access_flags,
        name: field.name.clone(),
        descriptor: field.descriptor.clone(),
        signature: field.signature.clone(),
        constant_value: field.constant_value.clone(),
        visible_annotations: strip_marker_annotations(&field.visible_annotations),
        invisible_annotations: strip_marker_annotations(&field.invisible_annotations),
    }
}

fn strip_method(method: &MethodRecord) -> MethodRecord {
    MethodRecord {
        access_flags: method.access_flags,
        name: method.name.clone(),
        descriptor: method.descriptor.clone(),
        signature: method.signature.clone(),
        exceptions: method.exceptions.clone(),
        visible_annotations: strip_marker_annotations(&method.visible_annotations),
        invisible_annotations: strip_marker_annotations(&method.invisible_annotations),
    }
}

fn strip_marker_annotations(annotations: &[Annotation]) -> Vec<Annotation> {
    annotations
        .iter()
        .filter(|annotation| annotation.type_descriptor != PREVIEW_MARKER_DESCRIPTOR)
        .cloned()
        .collect()
}
