//! Structural representation of one binary class unit.
//!
//! Only the categories the stub pipeline operates on are modelled: names,
//! supertype references, member signatures, annotations, inner-class and
//! permitted-subclass records. Executable code and debug data are never
//! materialized.

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_PRIVATE: u16 = 0x0002;
pub const ACC_PROTECTED: u16 = 0x0004;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_FINAL: u16 = 0x0010;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;
pub const ACC_SYNTHETIC: u16 = 0x1000;
pub const ACC_ANNOTATION: u16 = 0x2000;
pub const ACC_ENUM: u16 = 0x4000;

/// Parsed form of a single class file.
///
/// Superclass and interface entries are name references in internal form
/// (`java/lang/Object`); the referenced classes need not be part of the
/// same scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassRecord {
    /// Minor format version, as read.
    pub minor_version: u16,

    /// Major format version, as read.
    pub major_version: u16,

    /// Class-level access flags.
    pub access_flags: u16,

    /// Internal name of this class.
    pub name: String,

    /// Internal name of the superclass; `None` only for the root type.
    pub super_name: Option<String>,

    /// Internal names of directly implemented interfaces, declaration order.
    pub interfaces: Vec<String>,

    /// Declared fields, declaration order.
    pub fields: Vec<FieldRecord>,

    /// Declared methods, declaration order.
    pub methods: Vec<MethodRecord>,

    /// Inner-class records attached to this class file.
    pub inner_classes: Vec<InnerClassRecord>,

    /// Permitted subclasses of a sealed class, if any.
    pub permitted_subclasses: Vec<String>,

    /// Generic signature, when present.
    pub signature: Option<String>,

    /// Class-level annotations with runtime retention.
    pub visible_annotations: Vec<Annotation>,

    /// Class-level annotations with class-file retention.
    pub invisible_annotations: Vec<Annotation>,
}

/// One declared field, signature-level content only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    /// Field access flags.
    pub access_flags: u16,

    /// Field name.
    pub name: String,

    /// Type descriptor, e.g. `I` or `Ljava/lang/String;`.
    pub descriptor: String,

    /// Generic signature, when present.
    pub signature: Option<String>,

    /// Compile-time constant initializer, when present.
    pub constant_value: Option<ConstantValue>,

    /// Field annotations with runtime retention.
    pub visible_annotations: Vec<Annotation>,

    /// Field annotations with class-file retention.
    pub invisible_annotations: Vec<Annotation>,
}

/// One declared method, signature-level content only. Method bodies are
/// never read, so there is nothing executable to carry here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRecord {
    /// Method access flags.
    pub access_flags: u16,

    /// Method name (`<init>` for constructors).
    pub name: String,

    /// Method descriptor, e.g. `(JLjava/lang/String;)V`.
    pub descriptor: String,

    /// Generic signature, when present.
    pub signature: Option<String>,

    /// Internal names of declared thrown exception classes.
    pub exceptions: Vec<String>,

    /// Method annotations with runtime retention.
    pub visible_annotations: Vec<Annotation>,

    /// Method annotations with class-file retention.
    pub invisible_annotations: Vec<Annotation>,
}

/// One entry of the inner-class table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassRecord {
    /// Internal name of the inner class itself.
    pub inner: String,

    /// Internal name of the enclosing class; `None` for local and
    /// anonymous classes.
    pub outer: Option<String>,

    /// Simple name of the inner class; `None` for anonymous classes.
    pub inner_name: Option<String>,

    /// Access flags of the inner class as declared in source.
    pub access_flags: u16,
}

/// A single annotation with its named element values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Type descriptor of the annotation interface,
    /// e.g. `Ljava/lang/FunctionalInterface;`.
    pub type_descriptor: String,

    /// Element name/value pairs, declaration order.
    pub elements: Vec<(String, ElementValue)>,
}

/// One annotation element value.
///
/// Integer-backed kinds (`Byte`, `Char`, `Short`, `Boolean`, `Int`) carry
/// the raw pool value; floating-point kinds carry raw bit patterns so that
/// re-emission is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    Byte(i32),
    Char(i32),
    Short(i32),
    Boolean(i32),
    Int(i32),
    Long(i64),
    Float(u32),
    Double(u64),
    Str(String),
    EnumConst {
        type_descriptor: String,
        const_name: String,
    },
    ClassInfo(String),
    Nested(Annotation),
    Array(Vec<ElementValue>),
}

/// Compile-time constant initializer of a field.
///
/// Floats and doubles are stored as raw bits so NaN payloads survive a
/// parse/emit cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstantValue {
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
    Str(String),
}
