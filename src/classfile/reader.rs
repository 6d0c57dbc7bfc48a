//! Binary class file parser.
//!
//! Parses one class file into a [`ClassRecord`]. Only structural content is
//! materialized; `Code`, line-number, local-variable and stack-map data are
//! skipped by length, so class files stripped of those sections parse the
//! same as full ones.

use thiserror::Error;

use super::types::{
    Annotation, ClassRecord, ConstantValue, ElementValue, FieldRecord, InnerClassRecord,
    MethodRecord,
};

const MAGIC: u32 = 0xCAFE_BABE;

/// Oldest major format version accepted (Java 1.1).
pub const MIN_SUPPORTED_MAJOR: u16 = 45;

/// Newest major format version accepted (the newest configured platform).
pub const MAX_SUPPORTED_MAJOR: u16 = 64;

#[derive(Debug, Error)]
pub enum ClassParseError {
    #[error("unexpected end of class file")]
    UnexpectedEof,
    #[error("invalid class file magic header")]
    BadMagic,
    #[error("unrecognized class file version {major}.{minor}")]
    UnsupportedVersion { major: u16, minor: u16 },
    #[error("unsupported constant pool tag {tag}")]
    UnsupportedConstantTag { tag: u8 },
    #[error("invalid constant pool index {index}")]
    BadConstantIndex { index: u16 },
    #[error("invalid UTF-8 string in constant pool: {0}")]
    Utf8Decode(#[from] std::string::FromUtf8Error),
    #[error("unsupported annotation element tag '{tag}'")]
    BadElementTag { tag: char },
    #[error("constant pool entry {index} is not usable as a field initializer")]
    BadConstantValue { index: u16 },
}

/// Parse one binary class unit into its structural representation.
pub fn parse_class(bytes: &[u8]) -> Result<ClassRecord, ClassParseError> {
    let mut r = ByteReader::new(bytes);
    if r.read_u4()? != MAGIC {
        return Err(ClassParseError::BadMagic);
    }
    let minor_version = r.read_u2()?;
    let major_version = r.read_u2()?;
    if !(MIN_SUPPORTED_MAJOR..=MAX_SUPPORTED_MAJOR).contains(&major_version) {
        return Err(ClassParseError::UnsupportedVersion {
            major: major_version,
            minor: minor_version,
        });
    }

    let pool = ConstantPool::parse(&mut r)?;

    let access_flags = r.read_u2()?;
    let this_class = r.read_u2()?;
    let super_class = r.read_u2()?;
    let name = pool.class_name(this_class)?;
    let super_name = if super_class == 0 {
        None
    } else {
        Some(pool.class_name(super_class)?)
    };

    let interface_count = r.read_u2()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.read_u2()?)?);
    }

    let field_count = r.read_u2()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(parse_field(&mut r, &pool)?);
    }

    let method_count = r.read_u2()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(parse_method(&mut r, &pool)?);
    }

    let mut inner_classes = Vec::new();
    let mut permitted_subclasses = Vec::new();
    let mut signature = None;
    let mut visible_annotations = Vec::new();
    let mut invisible_annotations = Vec::new();

    let attribute_count = r.read_u2()?;
    for _ in 0..attribute_count {
        let attr_name = pool.utf8(r.read_u2()?)?;
        let attr_len = r.read_u4()? as usize;
        match attr_name {
            "InnerClasses" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                let count = a.read_u2()?;
                for _ in 0..count {
                    let inner = pool.class_name(a.read_u2()?)?;
                    let outer_index = a.read_u2()?;
                    let outer = if outer_index == 0 {
                        None
                    } else {
                        Some(pool.class_name(outer_index)?)
                    };
                    let name_index = a.read_u2()?;
                    let inner_name = if name_index == 0 {
                        None
                    } else {
                        Some(pool.utf8(name_index)?.to_string())
                    };
                    let access_flags = a.read_u2()?;
                    inner_classes.push(InnerClassRecord {
                        inner,
                        outer,
                        inner_name,
                        access_flags,
                    });
                }
            }
            "PermittedSubclasses" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                let count = a.read_u2()?;
                for _ in 0..count {
                    permitted_subclasses.push(pool.class_name(a.read_u2()?)?);
                }
            }
            "Signature" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                signature = Some(pool.utf8(a.read_u2()?)?.to_string());
            }
            "RuntimeVisibleAnnotations" => {
                visible_annotations = parse_annotations(r.read_slice(attr_len)?, &pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                invisible_annotations = parse_annotations(r.read_slice(attr_len)?, &pool)?;
            }
            _ => r.skip(attr_len)?,
        }
    }

    Ok(ClassRecord {
        minor_version,
        major_version,
        access_flags,
        name,
        super_name,
        interfaces,
        fields,
        methods,
        inner_classes,
        permitted_subclasses,
        signature,
        visible_annotations,
        invisible_annotations,
    })
}

fn parse_field(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<FieldRecord, ClassParseError> {
    let access_flags = r.read_u2()?;
    let name = pool.utf8(r.read_u2()?)?.to_string();
    let descriptor = pool.utf8(r.read_u2()?)?.to_string();

    let mut signature = None;
    let mut constant_value = None;
    let mut visible_annotations = Vec::new();
    let mut invisible_annotations = Vec::new();

    let attribute_count = r.read_u2()?;
    for _ in 0..attribute_count {
        let attr_name = pool.utf8(r.read_u2()?)?;
        let attr_len = r.read_u4()? as usize;
        match attr_name {
            "ConstantValue" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                constant_value = Some(pool.constant_value(a.read_u2()?)?);
            }
            "Signature" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                signature = Some(pool.utf8(a.read_u2()?)?.to_string());
            }
            "RuntimeVisibleAnnotations" => {
                visible_annotations = parse_annotations(r.read_slice(attr_len)?, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                invisible_annotations = parse_annotations(r.read_slice(attr_len)?, pool)?;
            }
            _ => r.skip(attr_len)?,
        }
    }

    Ok(FieldRecord {
        access_flags,
        name,
        descriptor,
        signature,
        constant_value,
        visible_annotations,
        invisible_annotations,
    })
}

fn parse_method(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<MethodRecord, ClassParseError> {
    let access_flags = r.read_u2()?;
    let name = pool.utf8(r.read_u2()?)?.to_string();
    let descriptor = pool.utf8(r.read_u2()?)?.to_string();

    let mut signature = None;
    let mut exceptions = Vec::new();
    let mut visible_annotations = Vec::new();
    let mut invisible_annotations = Vec::new();

    let attribute_count = r.read_u2()?;
    for _ in 0..attribute_count {
        let attr_name = pool.utf8(r.read_u2()?)?;
        let attr_len = r.read_u4()? as usize;
        match attr_name {
            "Exceptions" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                let count = a.read_u2()?;
                for _ in 0..count {
                    exceptions.push(pool.class_name(a.read_u2()?)?);
                }
            }
            "Signature" => {
                let mut a = ByteReader::new(r.read_slice(attr_len)?);
                signature = Some(pool.utf8(a.read_u2()?)?.to_string());
            }
            "RuntimeVisibleAnnotations" => {
                visible_annotations = parse_annotations(r.read_slice(attr_len)?, pool)?;
            }
            "RuntimeInvisibleAnnotations" => {
                invisible_annotations = parse_annotations(r.read_slice(attr_len)?, pool)?;
            }
            // Code and everything else is implementation content.
            _ => r.skip(attr_len)?,
        }
    }

    Ok(MethodRecord {
        access_flags,
        name,
        descriptor,
        signature,
        exceptions,
        visible_annotations,
        invisible_annotations,
    })
}

fn parse_annotations(
    data: &[u8],
    pool: &ConstantPool,
) -> Result<Vec<Annotation>, ClassParseError> {
    let mut r = ByteReader::new(data);
    let count = r.read_u2()?;
    let mut annotations = Vec::with_capacity(count as usize);
    for _ in 0..count {
        annotations.push(parse_annotation(&mut r, pool)?);
    }
    Ok(annotations)
}

fn parse_annotation(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<Annotation, ClassParseError> {
    let type_descriptor = pool.utf8(r.read_u2()?)?.to_string();
    let pair_count = r.read_u2()?;
    let mut elements = Vec::with_capacity(pair_count as usize);
    for _ in 0..pair_count {
        let name = pool.utf8(r.read_u2()?)?.to_string();
        let value = parse_element_value(r, pool)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_descriptor,
        elements,
    })
}

fn parse_element_value(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
) -> Result<ElementValue, ClassParseError> {
    let tag = r.read_u1()?;
    let value = match tag {
        b'B' => ElementValue::Byte(pool.integer(r.read_u2()?)?),
        b'C' => ElementValue::Char(pool.integer(r.read_u2()?)?),
        b'S' => ElementValue::Short(pool.integer(r.read_u2()?)?),
        b'Z' => ElementValue::Boolean(pool.integer(r.read_u2()?)?),
        b'I' => ElementValue::Int(pool.integer(r.read_u2()?)?),
        b'J' => ElementValue::Long(pool.long(r.read_u2()?)?),
        b'F' => ElementValue::Float(pool.float_bits(r.read_u2()?)?),
        b'D' => ElementValue::Double(pool.double_bits(r.read_u2()?)?),
        b's' => ElementValue::Str(pool.utf8(r.read_u2()?)?.to_string()),
        b'e' => {
            let type_descriptor = pool.utf8(r.read_u2()?)?.to_string();
            let const_name = pool.utf8(r.read_u2()?)?.to_string();
            ElementValue::EnumConst {
                type_descriptor,
                const_name,
            }
        }
        b'c' => ElementValue::ClassInfo(pool.utf8(r.read_u2()?)?.to_string()),
        b'@' => ElementValue::Nested(parse_annotation(r, pool)?),
        b'[' => {
            let count = r.read_u2()?;
            let mut values = Vec::with_capacity(count as usize);
            for _ in 0..count {
                values.push(parse_element_value(r, pool)?);
            }
            ElementValue::Array(values)
        }
        other => {
            return Err(ClassParseError::BadElementTag { tag: other as char });
        }
    };
    Ok(value)
}

/// One resolved constant pool entry. Entries the stub pipeline never needs
/// to dereference are collapsed into `Other`.
#[derive(Debug, Clone)]
enum PoolEntry {
    Utf8(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Class { name_index: u16 },
    Str { utf8_index: u16 },
    Other,
    Unusable,
}

struct ConstantPool {
    entries: Vec<PoolEntry>,
}

impl ConstantPool {
    fn parse(r: &mut ByteReader<'_>) -> Result<Self, ClassParseError> {
        let count = r.read_u2()? as usize;
        let mut entries = Vec::with_capacity(count);
        entries.push(PoolEntry::Unusable); // index 0 is reserved

        while entries.len() < count {
            let tag = r.read_u1()?;
            let entry = match tag {
                1 => {
                    let length = r.read_u2()? as usize;
                    PoolEntry::Utf8(String::from_utf8(r.read_slice(length)?.to_vec())?)
                }
                3 => PoolEntry::Integer(r.read_u4()? as i32),
                4 => PoolEntry::Float(r.read_u4()?),
                5 => {
                    let high = r.read_u4()? as u64;
                    let low = r.read_u4()? as u64;
                    PoolEntry::Long(((high << 32) | low) as i64)
                }
                6 => {
                    let high = r.read_u4()? as u64;
                    let low = r.read_u4()? as u64;
                    PoolEntry::Double((high << 32) | low)
                }
                7 => PoolEntry::Class {
                    name_index: r.read_u2()?,
                },
                8 => PoolEntry::Str {
                    utf8_index: r.read_u2()?,
                },
                // Fieldref, Methodref, InterfaceMethodref, NameAndType,
                // Dynamic, InvokeDynamic
                9 | 10 | 11 | 12 | 17 | 18 => {
                    r.skip(4)?;
                    PoolEntry::Other
                }
                // MethodHandle
                15 => {
                    r.skip(3)?;
                    PoolEntry::Other
                }
                // MethodType, Module, Package
                16 | 19 | 20 => {
                    r.skip(2)?;
                    PoolEntry::Other
                }
                other => return Err(ClassParseError::UnsupportedConstantTag { tag: other }),
            };

            // Longs and doubles occupy two pool slots.
            let wide = matches!(entry, PoolEntry::Long(_) | PoolEntry::Double(_));
            entries.push(entry);
            if wide {
                entries.push(PoolEntry::Unusable);
            }
        }

        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&PoolEntry, ClassParseError> {
        self.entries
            .get(index as usize)
            .ok_or(ClassParseError::BadConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Utf8(value) => Ok(value.as_str()),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Class { name_index } => Ok(self.utf8(*name_index)?.to_string()),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn integer(&self, index: u16) -> Result<i32, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Integer(value) => Ok(*value),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn long(&self, index: u16) -> Result<i64, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Long(value) => Ok(*value),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn float_bits(&self, index: u16) -> Result<u32, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Float(bits) => Ok(*bits),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn double_bits(&self, index: u16) -> Result<u64, ClassParseError> {
        match self.get(index)? {
            PoolEntry::Double(bits) => Ok(*bits),
            _ => Err(ClassParseError::BadConstantIndex { index }),
        }
    }

    fn constant_value(&self, index: u16) -> Result<ConstantValue, ClassParseError> {
        let value = match self.get(index)? {
            PoolEntry::Integer(value) => ConstantValue::Integer(*value),
            PoolEntry::Float(bits) => ConstantValue::Float(*bits),
            PoolEntry::Long(value) => ConstantValue::Long(*value),
            PoolEntry::Double(bits) => ConstantValue::Double(*bits),
            PoolEntry::Str { utf8_index } => ConstantValue::Str(self.utf8(*utf8_index)?.to_string()),
            _ => return Err(ClassParseError::BadConstantValue { index }),
        };
        Ok(value)
    }
}

/// Big-endian cursor over a class file buffer. Every read is bounds-checked.
struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or(ClassParseError::UnexpectedEof)?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn read_u1(&mut self) -> Result<u8, ClassParseError> {
        Ok(self.take(1)?[0])
    }

    fn read_u2(&mut self) -> Result<u16, ClassParseError> {
        let bytes = self.take(2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn read_u4(&mut self) -> Result<u32, ClassParseError> {
        let bytes = self.take(4)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], ClassParseError> {
        self.take(len)
    }

    fn skip(&mut self, len: usize) -> Result<(), ClassParseError> {
        self.take(len)?;
        Ok(())
    }
}
