//! Decoded compiler metadata.
//!
//! A [`ClassProto`] is what the metadata reader yields for a binary the
//! compiler itself produced: names go through a [`NameTable`] and types are
//! already in the descriptor model's shape, so no signature parsing applies.

use descry_descriptors::{ClassKind, Modality, Variance, Visibility};
use descry_ir::FqName;

use super::RawAnnotation;

/// A binary located for a class, before its metadata is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedBinary {
    pub fq_name: FqName,
    /// Opaque location string, meaningful only to the reader.
    pub path: String,
    pub is_nested: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualifiedNameEntry {
    /// Index of the enclosing qualified name; `None` at the root.
    pub parent: Option<u32>,
    /// Index into the simple-name table.
    pub short_name: u32,
}

/// String tables shared by every index in a proto.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameTable {
    pub simple_names: Vec<String>,
    pub qualified_names: Vec<QualifiedNameEntry>,
}

impl NameTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simple(&self, index: u32) -> Option<&str> {
        self.simple_names.get(index as usize).map(String::as_str)
    }

    /// Segments of qualified name `index`, outermost first.
    ///
    /// Returns `None` for a dangling index or a parent chain longer than the
    /// table, which can only come from a cycle.
    pub fn qualified(&self, index: u32) -> Option<Vec<&str>> {
        let mut segments = Vec::new();
        let mut current = Some(index);
        while let Some(idx) = current {
            if segments.len() > self.qualified_names.len() {
                return None;
            }
            let entry = self.qualified_names.get(idx as usize)?;
            segments.push(self.simple(entry.short_name)?);
            current = entry.parent;
        }
        segments.reverse();
        Some(segments)
    }

    /// Index of `name` in the simple-name table, appending it if new.
    pub fn add_simple(&mut self, name: &str) -> u32 {
        if let Some(pos) = self.simple_names.iter().position(|s| s == name) {
            return index_of(pos);
        }
        self.simple_names.push(name.to_owned());
        index_of(self.simple_names.len() - 1)
    }

    /// Index of dotted `name` in the qualified-name table, appending the
    /// missing prefixes.
    pub fn add_qualified(&mut self, name: &str) -> u32 {
        let mut parent = None;
        let mut index = 0;
        for segment in name.split('.') {
            let short_name = self.add_simple(segment);
            let entry = QualifiedNameEntry { parent, short_name };
            index = match self.qualified_names.iter().position(|e| *e == entry) {
                Some(pos) => index_of(pos),
                None => {
                    self.qualified_names.push(entry);
                    index_of(self.qualified_names.len() - 1)
                }
            };
            parent = Some(index);
        }
        index
    }
}

fn index_of(pos: usize) -> u32 {
    u32::try_from(pos).unwrap_or(u32::MAX)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProtoTypeConstructor {
    /// Qualified-name index of a class.
    Class(u32),
    /// Simple-name index of a type parameter in scope.
    Parameter(u32),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProtoTypeArgument {
    Star,
    Type { variance: Variance, ty: ProtoType },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoType {
    pub constructor: ProtoTypeConstructor,
    pub arguments: Vec<ProtoTypeArgument>,
    pub nullable: bool,
}

impl ProtoType {
    pub fn class(index: u32) -> Self {
        ProtoType {
            constructor: ProtoTypeConstructor::Class(index),
            arguments: Vec::new(),
            nullable: false,
        }
    }

    pub fn parameter(name: u32) -> Self {
        ProtoType {
            constructor: ProtoTypeConstructor::Parameter(name),
            arguments: Vec::new(),
            nullable: false,
        }
    }

    #[must_use]
    pub fn with_argument(mut self, variance: Variance, ty: ProtoType) -> Self {
        self.arguments.push(ProtoTypeArgument::Type { variance, ty });
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoTypeParameter {
    pub name: u32,
    pub variance: Variance,
    pub upper_bounds: Vec<ProtoType>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoValueParameter {
    pub name: u32,
    pub ty: ProtoType,
    pub vararg_element: Option<ProtoType>,
    pub declares_default: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoFunction {
    pub name: u32,
    pub modality: Modality,
    pub visibility: Visibility,
    pub type_parameters: Vec<ProtoTypeParameter>,
    pub receiver: Option<ProtoType>,
    pub value_parameters: Vec<ProtoValueParameter>,
    pub return_type: ProtoType,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoProperty {
    pub name: u32,
    pub ty: ProtoType,
    pub is_var: bool,
    pub modality: Modality,
    pub visibility: Visibility,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtoConstructor {
    pub value_parameters: Vec<ProtoValueParameter>,
    pub visibility: Visibility,
    pub is_primary: bool,
}

/// One class as recorded in compiler metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassProto {
    pub abi_version: u32,
    pub names: NameTable,
    /// Qualified-name index of the class itself.
    pub fq_name: u32,
    pub kind: ClassKind,
    pub modality: Modality,
    pub visibility: Visibility,
    pub is_inner: bool,
    pub type_parameters: Vec<ProtoTypeParameter>,
    pub supertypes: Vec<ProtoType>,
    pub functions: Vec<ProtoFunction>,
    pub properties: Vec<ProtoProperty>,
    pub constructors: Vec<ProtoConstructor>,
    /// Simple-name indices of enum entries.
    pub enum_entries: Vec<u32>,
    pub annotations: Vec<RawAnnotation>,
}

impl ClassProto {
    /// An empty final class proto named by `fq_name`.
    pub fn new(abi_version: u32, mut names: NameTable, fq_name: &str) -> Self {
        let fq_name = names.add_qualified(fq_name);
        ClassProto {
            abi_version,
            names,
            fq_name,
            kind: ClassKind::Class,
            modality: Modality::Final,
            visibility: Visibility::Public,
            is_inner: false,
            type_parameters: Vec::new(),
            supertypes: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            enum_entries: Vec::new(),
            annotations: Vec::new(),
        }
    }
}
