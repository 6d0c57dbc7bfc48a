//! Binary class file serializer.
//!
//! Emits a [`ClassRecord`] as class file bytes with a freshly built,
//! deduplicated constant pool. Pool entries are numbered in first-use order,
//! so the output is a pure function of the record and identical across runs.

use std::collections::HashMap;

use thiserror::Error;

use super::types::{Annotation, ClassRecord, ConstantValue, ElementValue};

#[derive(Debug, Error)]
pub enum ClassWriteError {
    #[error("constant pool exceeds the 65535 slot limit")]
    ConstantPoolOverflow,
}

/// Serialize one class record into class file bytes.
pub fn write_class(record: &ClassRecord) -> Result<Vec<u8>, ClassWriteError> {
    let mut pool = ConstantPoolBuilder::new();
    let mut body = Vec::new();

    put_u2(&mut body, record.access_flags);
    let this_index = pool.class(&record.name)?;
    put_u2(&mut body, this_index);
    let super_index = match &record.super_name {
        Some(name) => pool.class(name)?,
        None => 0,
    };
    put_u2(&mut body, super_index);

    put_u2(&mut body, record.interfaces.len() as u16);
    for interface in &record.interfaces {
        let index = pool.class(interface)?;
        put_u2(&mut body, index);
    }

    put_u2(&mut body, record.fields.len() as u16);
    for field in &record.fields {
        put_u2(&mut body, field.access_flags);
        let name_index = pool.utf8(&field.name)?;
        put_u2(&mut body, name_index);
        let descriptor_index = pool.utf8(&field.descriptor)?;
        put_u2(&mut body, descriptor_index);

        let mut attributes = AttributeSet::new();
        if let Some(value) = &field.constant_value {
            let value_index = pool.constant_value(value)?;
            let mut payload = Vec::new();
            put_u2(&mut payload, value_index);
            attributes.push(&mut pool, "ConstantValue", payload)?;
        }
        if let Some(signature) = &field.signature {
            let signature_index = pool.utf8(signature)?;
            let mut payload = Vec::new();
            put_u2(&mut payload, signature_index);
            attributes.push(&mut pool, "Signature", payload)?;
        }
        attributes.push_annotations(&mut pool, &field.visible_annotations, true)?;
        attributes.push_annotations(&mut pool, &field.invisible_annotations, false)?;
        attributes.write_to(&mut body);
    }

    put_u2(&mut body, record.methods.len() as u16);
    for method in &record.methods {
        put_u2(&mut body, method.access_flags);
        let name_index = pool.utf8(&method.name)?;
        put_u2(&mut body, name_index);
        let descriptor_index = pool.utf8(&method.descriptor)?;
        put_u2(&mut body, descriptor_index);

        let mut attributes = AttributeSet::new();
        if !method.exceptions.is_empty() {
            let mut payload = Vec::new();
            put_u2(&mut payload, method.exceptions.len() as u16);
            for exception in &method.exceptions {
                let index = pool.class(exception)?;
                put_u2(&mut payload, index);
            }
            attributes.push(&mut pool, "Exceptions", payload)?;
        }
        if let Some(signature) = &method.signature {
            let signature_index = pool.utf8(signature)?;
            let mut payload = Vec::new();
            put_u2(&mut payload, signature_index);
            attributes.push(&mut pool, "Signature", payload)?;
        }
        attributes.push_annotations(&mut pool, &method.visible_annotations, true)?;
        attributes.push_annotations(&mut pool, &method.invisible_annotations, false)?;
        attributes.write_to(&mut body);
    }

    let mut attributes = AttributeSet::new();
    if let Some(signature) = &record.signature {
        let signature_index = pool.utf8(signature)?;
        let mut payload = Vec::new();
        put_u2(&mut payload, signature_index);
        attributes.push(&mut pool, "Signature", payload)?;
    }
    attributes.push_annotations(&mut pool, &record.visible_annotations, true)?;
    attributes.push_annotations(&mut pool, &record.invisible_annotations, false)?;
    if !record.inner_classes.is_empty() {
        let mut payload = Vec::new();
        put_u2(&mut payload, record.inner_classes.len() as u16);
        for inner in &record.inner_classes {
            let inner_index = pool.class(&inner.inner)?;
            put_u2(&mut payload, inner_index);
            let outer_index = match &inner.outer {
                Some(outer) => pool.class(outer)?,
                None => 0,
            };
            put_u2(&mut payload, outer_index);
            let name_index = match &inner.inner_name {
                Some(name) => pool.utf8(name)?,
                None => 0,
            };
            put_u2(&mut payload, name_index);
            put_u2(&mut payload, inner.access_flags);
        }
        attributes.push(&mut pool, "InnerClasses", payload)?;
    }
    if !record.permitted_subclasses.is_empty() {
        let mut payload = Vec::new();
        put_u2(&mut payload, record.permitted_subclasses.len() as u16);
        for permitted in &record.permitted_subclasses {
            let index = pool.class(permitted)?;
            put_u2(&mut payload, index);
        }
        attributes.push(&mut pool, "PermittedSubclasses", payload)?;
    }
    attributes.write_to(&mut body);

    let mut out = Vec::with_capacity(body.len() + 256);
    put_u4(&mut out, 0xCAFE_BABE);
    put_u2(&mut out, record.minor_version);
    put_u2(&mut out, record.major_version);
    put_u2(&mut out, pool.count());
    pool.write_to(&mut out);
    out.extend_from_slice(&body);
    Ok(out)
}

fn encode_annotations(
    pool: &mut ConstantPoolBuilder,
    annotations: &[Annotation],
) -> Result<Vec<u8>, ClassWriteError> {
    let mut buf = Vec::new();
    put_u2(&mut buf, annotations.len() as u16);
    for annotation in annotations {
        encode_annotation(&mut buf, pool, annotation)?;
    }
    Ok(buf)
}

fn encode_annotation(
    buf: &mut Vec<u8>,
    pool: &mut ConstantPoolBuilder,
    annotation: &Annotation,
) -> Result<(), ClassWriteError> {
    let type_index = pool.utf8(&annotation.type_descriptor)?;
    put_u2(buf, type_index);
    put_u2(buf, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        let name_index = pool.utf8(name)?;
        put_u2(buf, name_index);
        encode_element_value(buf, pool, value)?;
    }
    Ok(())
}

fn encode_element_value(
    buf: &mut Vec<u8>,
    pool: &mut ConstantPoolBuilder,
    value: &ElementValue,
) -> Result<(), ClassWriteError> {
    match value {
        ElementValue::Byte(v) => put_const(buf, b'B', pool.integer(*v)?),
        ElementValue::Char(v) => put_const(buf, b'C', pool.integer(*v)?),
        ElementValue::Short(v) => put_const(buf, b'S', pool.integer(*v)?),
        ElementValue::Boolean(v) => put_const(buf, b'Z', pool.integer(*v)?),
        ElementValue::Int(v) => put_const(buf, b'I', pool.integer(*v)?),
        ElementValue::Long(v) => put_const(buf, b'J', pool.long(*v)?),
        ElementValue::Float(bits) => put_const(buf, b'F', pool.float(*bits)?),
        ElementValue::Double(bits) => put_const(buf, b'D', pool.double(*bits)?),
        ElementValue::Str(v) => put_const(buf, b's', pool.utf8(v)?),
        ElementValue::EnumConst {
            type_descriptor,
            const_name,
        } => {
            buf.push(b'e');
            let type_index = pool.utf8(type_descriptor)?;
            put_u2(buf, type_index);
            let const_index = pool.utf8(const_name)?;
            put_u2(buf, const_index);
        }
        ElementValue::ClassInfo(descriptor) => put_const(buf, b'c', pool.utf8(descriptor)?),
        ElementValue::Nested(annotation) => {
            buf.push(b'@');
            encode_annotation(buf, pool, annotation)?;
        }
        ElementValue::Array(values) => {
            buf.push(b'[');
            put_u2(buf, values.len() as u16);
            for value in values {
                encode_element_value(buf, pool, value)?;
            }
        }
    }
    Ok(())
}

fn put_const(buf: &mut Vec<u8>, tag: u8, index: u16) {
    buf.push(tag);
    put_u2(buf, index);
}

/// Named attributes of one class, field, or method, in emission order.
struct AttributeSet {
    attributes: Vec<(u16, Vec<u8>)>,
}

impl AttributeSet {
    fn new() -> Self {
        Self {
            attributes: Vec::new(),
        }
    }

    fn push(
        &mut self,
        pool: &mut ConstantPoolBuilder,
        name: &str,
        payload: Vec<u8>,
    ) -> Result<(), ClassWriteError> {
        let name_index = pool.utf8(name)?;
        self.attributes.push((name_index, payload));
        Ok(())
    }

    fn push_annotations(
        &mut self,
        pool: &mut ConstantPoolBuilder,
        annotations: &[Annotation],
        runtime_visible: bool,
    ) -> Result<(), ClassWriteError> {
        if annotations.is_empty() {
            return Ok(());
        }
        let payload = encode_annotations(pool, annotations)?;
        let name = if runtime_visible {
            "RuntimeVisibleAnnotations"
        } else {
            "RuntimeInvisibleAnnotations"
        };
        self.push(pool, name, payload)
    }

    fn write_to(self, out: &mut Vec<u8>) {
        put_u2(out, self.attributes.len() as u16);
        for (name_index, payload) in self.attributes {
            put_u2(out, name_index);
            put_u4(out, payload.len() as u32);
            out.extend_from_slice(&payload);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class(u16),
    Str(u16),
}

/// Constant pool under construction: entries are interned on first use and
/// numbered sequentially, with longs and doubles taking two slots.
struct ConstantPoolBuilder {
    entries: Vec<PoolKey>,
    lookup: HashMap<PoolKey, u16>,
    next_index: u16,
}

impl ConstantPoolBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            lookup: HashMap::new(),
            next_index: 1,
        }
    }

    fn intern(&mut self, key: PoolKey) -> Result<u16, ClassWriteError> {
        if let Some(&index) = self.lookup.get(&key) {
            return Ok(index);
        }
        let slots: u32 = match key {
            PoolKey::Long(_) | PoolKey::Double(_) => 2,
            _ => 1,
        };
        let index = self.next_index;
        let next = u32::from(index) + slots;
        if next > u32::from(u16::MAX) {
            return Err(ClassWriteError::ConstantPoolOverflow);
        }
        self.next_index = next as u16;
        self.lookup.insert(key.clone(), index);
        self.entries.push(key);
        Ok(index)
    }

    fn utf8(&mut self, value: &str) -> Result<u16, ClassWriteError> {
        self.intern(PoolKey::Utf8(value.to_string()))
    }

    fn class(&mut self, name: &str) -> Result<u16, ClassWriteError> {
        let name_index = self.utf8(name)?;
        self.intern(PoolKey::Class(name_index))
    }

    fn integer(&mut self, value: i32) -> Result<u16, ClassWriteError> {
        self.intern(PoolKey::Integer(value))
    }

    fn float(&mut self, bits: u32) -> Result<u16, ClassWriteError> {
        self.intern(PoolKey::Float(bits))
    }

    fn long(&mut self, value: i64) -> Result<u16, ClassWriteError> {
        self.intern(PoolKey::Long(value))
    }

    fn double(&mut self, bits: u64) -> Result<u16, ClassWriteError> {
        self.intern(PoolKey::Double(bits))
    }

    fn string(&mut self, value: &str) -> Result<u16, ClassWriteError> {
        let utf8_index = self.utf8(value)?;
        self.intern(PoolKey::Str(utf8_index))
    }

    fn constant_value(&mut self, value: &ConstantValue) -> Result<u16, ClassWriteError> {
        match value {
            ConstantValue::Integer(v) => self.integer(*v),
            ConstantValue::Float(bits) => self.float(*bits),
            ConstantValue::Long(v) => self.long(*v),
            ConstantValue::Double(bits) => self.double(*bits),
            ConstantValue::Str(v) => self.string(v),
        }
    }

    /// The `constant_pool_count` value: one past the last occupied slot.
    fn count(&self) -> u16 {
        self.next_index
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        for entry in &self.entries {
            match entry {
                PoolKey::Utf8(value) => {
                    out.push(1);
                    put_u2(out, value.len() as u16);
                    out.extend_from_slice(value.as_bytes());
                }
                PoolKey::Integer(value) => {
                    out.push(3);
                    put_u4(out, *value as u32);
                }
                PoolKey::Float(bits) => {
                    out.push(4);
                    put_u4(out, *bits);
                }
                PoolKey::Long(value) => {
                    out.push(5);
                    let bits = *value as u64;
                    put_u4(out, (bits >> 32) as u32);
                    put_u4(out, bits as u32);
                }
                PoolKey::Double(bits) => {
                    out.push(6);
                    put_u4(out, (bits >> 32) as u32);
                    put_u4(out, *bits as u32);
                }
                PoolKey::Class(name_index) => {
                    out.push(7);
                    put_u2(out, *name_index);
                }
                PoolKey::Str(utf8_index) => {
                    out.push(8);
                    put_u2(out, *utf8_index);
                }
            }
        }
    }
}

fn put_u2(buf: &mut Vec<u8>, value: u16) {
    buf.extend_from_slice(&value.to_be_bytes());
}

fn put_u4(buf: &mut Vec<u8>, value: u32) {
    buf.extend_from_slice(&value.to_be_bytes());
}
