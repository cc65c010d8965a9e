//! Descriptor storage.
//!
//! One arena per resolution session. Descriptors are appended and never
//! removed, except by [`Descriptors::rollback`] which discards everything a
//! failed pass allocated.
//!
//! While a checkpoint is open, the first mutable access to a descriptor that
//! predates it saves a copy in the journal. Rolling back puts those copies
//! back, so a failed pass cannot leave surviving descriptors pointing at
//! discarded ones.

use descry_ir::{FqName, FqNameUnsafe, Name};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::annotation::AnnotationDescriptor;
use crate::class::{ClassDescriptor, Origin};
use crate::ids::{
    AnnotationId, ClassId, ConstructorId, FunctionId, PackageId, PropertyId, TypeParamId,
};
use crate::members::{
    ConstructorDescriptor, FunctionDescriptor, PropertyDescriptor, TypeParameterDescriptor,
};

#[derive(Clone, Debug)]
pub struct PackageDescriptor {
    pub fq_name: FqName,
    pub parent: Option<PackageId>,
    pub origin: Origin,
}

/// Arena lengths at a point in time.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Checkpoint {
    classes: u32,
    type_params: u32,
    functions: u32,
    properties: u32,
    constructors: u32,
    annotations: u32,
    packages: u32,
}

/// Pre-pass copies of descriptors the open pass has touched.
#[derive(Clone, Debug)]
struct Journal {
    base: Checkpoint,
    classes: FxHashMap<ClassId, ClassDescriptor>,
    type_params: FxHashMap<TypeParamId, TypeParameterDescriptor>,
    functions: FxHashMap<FunctionId, FunctionDescriptor>,
    properties: FxHashMap<PropertyId, PropertyDescriptor>,
    annotations: FxHashMap<AnnotationId, AnnotationDescriptor>,
}

impl Journal {
    fn new(base: Checkpoint) -> Self {
        Journal {
            base,
            classes: FxHashMap::default(),
            type_params: FxHashMap::default(),
            functions: FxHashMap::default(),
            properties: FxHashMap::default(),
            annotations: FxHashMap::default(),
        }
    }
}

/// The descriptor arenas of one session.
///
/// # Panics
///
/// Every `alloc_*` method panics if its arena would need more than
/// `u32::MAX` ids.
#[derive(Clone, Debug)]
pub struct Descriptors {
    classes: Vec<ClassDescriptor>,
    type_params: Vec<TypeParameterDescriptor>,
    functions: Vec<FunctionDescriptor>,
    properties: Vec<PropertyDescriptor>,
    constructors: Vec<ConstructorDescriptor>,
    annotations: Vec<AnnotationDescriptor>,
    packages: Vec<PackageDescriptor>,
    package_index: FxHashMap<FqName, PackageId>,
    journal: Option<Journal>,
}

/// Id for the next entry of an arena holding `len` entries.
///
/// # Panics
///
/// Panics if an arena outgrows `u32` ids.
fn next_id(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("descriptor arena exceeded u32::MAX entries"))
}

/// Save `arena[id]` in `saved` unless it was allocated after `base` or is
/// already saved.
fn save<K, T>(saved: &mut FxHashMap<K, T>, arena: &[T], key: K, index: usize, base: u32)
where
    K: std::hash::Hash + Eq,
    T: Clone,
{
    if index < base as usize {
        saved.entry(key).or_insert_with(|| arena[index].clone());
    }
}

fn restore<K, T>(saved: FxHashMap<K, T>, arena: &mut [T], index: impl Fn(&K) -> usize) {
    for (key, value) in saved {
        arena[index(&key)] = value;
    }
}

impl Descriptors {
    /// Empty arena holding only the root package.
    pub fn new() -> Self {
        let mut descriptors = Descriptors {
            classes: Vec::new(),
            type_params: Vec::new(),
            functions: Vec::new(),
            properties: Vec::new(),
            constructors: Vec::new(),
            annotations: Vec::new(),
            packages: Vec::new(),
            package_index: FxHashMap::default(),
            journal: None,
        };
        descriptors.packages.push(PackageDescriptor {
            fq_name: FqName::root(),
            parent: None,
            origin: Origin::BuiltIn,
        });
        descriptors
            .package_index
            .insert(FqName::root(), PackageId::from_raw(0));
        descriptors
    }

    pub fn root_package(&self) -> PackageId {
        PackageId::from_raw(0)
    }

    // Classes

    pub fn alloc_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = ClassId::from_raw(next_id(self.classes.len()));
        self.classes.push(class);
        id
    }

    #[inline]
    pub fn class(&self, id: ClassId) -> &ClassDescriptor {
        &self.classes[id.index()]
    }

    #[inline]
    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassDescriptor {
        if let Some(journal) = &mut self.journal {
            save(&mut journal.classes, &self.classes, id, id.index(), journal.base.classes);
        }
        &mut self.classes[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassDescriptor)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, class)| (ClassId::from_raw(next_id(i)), class))
    }

    /// Record `child` as a nested classifier of `parent`.
    pub fn add_nested(&mut self, parent: ClassId, child: ClassId) {
        let nested = &mut self.class_mut(parent).nested;
        if !nested.contains(&child) {
            nested.push(child);
        }
    }

    /// Nested classifier of `parent` with the given simple name.
    pub fn nested_by_name(&self, parent: ClassId, name: Name) -> Option<ClassId> {
        self.class(parent)
            .nested
            .iter()
            .copied()
            .find(|&child| self.class(child).name == name)
    }

    /// Whether `sub` is `sup` or reaches it through resolved supertypes.
    pub fn is_subclass_of(&self, sub: ClassId, sup: ClassId) -> bool {
        let mut stack = vec![sub];
        let mut visited = FxHashSet::default();
        while let Some(current) = stack.pop() {
            if current == sup {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            stack.extend(
                self.class(current)
                    .supertypes
                    .iter()
                    .filter_map(crate::types::Type::class_id),
            );
        }
        false
    }

    // Type parameters

    pub fn alloc_type_param(&mut self, param: TypeParameterDescriptor) -> TypeParamId {
        let id = TypeParamId::from_raw(next_id(self.type_params.len()));
        self.type_params.push(param);
        id
    }

    #[inline]
    pub fn type_param(&self, id: TypeParamId) -> &TypeParameterDescriptor {
        &self.type_params[id.index()]
    }

    #[inline]
    pub fn type_param_mut(&mut self, id: TypeParamId) -> &mut TypeParameterDescriptor {
        if let Some(journal) = &mut self.journal {
            save(&mut journal.type_params, &self.type_params, id, id.index(), journal.base.type_params);
        }
        &mut self.type_params[id.index()]
    }

    // Functions

    pub fn alloc_function(&mut self, function: FunctionDescriptor) -> FunctionId {
        let id = FunctionId::from_raw(next_id(self.functions.len()));
        self.functions.push(function);
        id
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &FunctionDescriptor {
        &self.functions[id.index()]
    }

    #[inline]
    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionDescriptor {
        if let Some(journal) = &mut self.journal {
            save(&mut journal.functions, &self.functions, id, id.index(), journal.base.functions);
        }
        &mut self.functions[id.index()]
    }

    // Properties

    pub fn alloc_property(&mut self, property: PropertyDescriptor) -> PropertyId {
        let id = PropertyId::from_raw(next_id(self.properties.len()));
        self.properties.push(property);
        id
    }

    #[inline]
    pub fn property(&self, id: PropertyId) -> &PropertyDescriptor {
        &self.properties[id.index()]
    }

    #[inline]
    pub fn property_mut(&mut self, id: PropertyId) -> &mut PropertyDescriptor {
        if let Some(journal) = &mut self.journal {
            save(&mut journal.properties, &self.properties, id, id.index(), journal.base.properties);
        }
        &mut self.properties[id.index()]
    }

    // Constructors

    pub fn alloc_constructor(&mut self, constructor: ConstructorDescriptor) -> ConstructorId {
        let id = ConstructorId::from_raw(next_id(self.constructors.len()));
        self.constructors.push(constructor);
        id
    }

    #[inline]
    pub fn constructor(&self, id: ConstructorId) -> &ConstructorDescriptor {
        &self.constructors[id.index()]
    }

    // Annotations

    pub fn alloc_annotation(&mut self, annotation: AnnotationDescriptor) -> AnnotationId {
        let id = AnnotationId::from_raw(next_id(self.annotations.len()));
        self.annotations.push(annotation);
        id
    }

    #[inline]
    pub fn annotation(&self, id: AnnotationId) -> &AnnotationDescriptor {
        &self.annotations[id.index()]
    }

    #[inline]
    pub fn annotation_mut(&mut self, id: AnnotationId) -> &mut AnnotationDescriptor {
        if let Some(journal) = &mut self.journal {
            save(&mut journal.annotations, &self.annotations, id, id.index(), journal.base.annotations);
        }
        &mut self.annotations[id.index()]
    }

    // Packages

    #[inline]
    pub fn package(&self, id: PackageId) -> &PackageDescriptor {
        &self.packages[id.index()]
    }

    pub fn package_by_name(&self, fq_name: &FqNameUnsafe) -> Option<PackageId> {
        self.package_index.get(fq_name).copied()
    }

    /// Package descriptor for `fq_name`, creating it and its parents if needed.
    pub fn ensure_package(&mut self, fq_name: &FqName, origin: Origin) -> PackageId {
        if let Some(id) = self.package_by_name(fq_name.as_unsafe()) {
            return id;
        }
        let parent = fq_name
            .parent()
            .map(|parent| self.ensure_package(&parent, origin));
        let id = PackageId::from_raw(next_id(self.packages.len()));
        self.packages.push(PackageDescriptor {
            fq_name: fq_name.clone(),
            parent,
            origin,
        });
        self.package_index.insert(fq_name.clone(), id);
        tracing::trace!(package = id.raw(), "package created");
        id
    }

    // Rollback

    /// Current arena lengths, without opening a journal.
    pub fn mark(&self) -> Checkpoint {
        Checkpoint {
            classes: next_id(self.classes.len()),
            type_params: next_id(self.type_params.len()),
            functions: next_id(self.functions.len()),
            properties: next_id(self.properties.len()),
            constructors: next_id(self.constructors.len()),
            annotations: next_id(self.annotations.len()),
            packages: next_id(self.packages.len()),
        }
    }

    /// Open a journal for a pass. End it with [`commit`](Self::commit) or
    /// [`rollback`](Self::rollback).
    pub fn checkpoint(&mut self) -> Checkpoint {
        let checkpoint = self.mark();
        debug_assert!(self.journal.is_none(), "checkpoint opened inside another pass");
        self.journal = Some(Journal::new(checkpoint));
        checkpoint
    }

    /// Keep every write of the open pass.
    pub fn commit(&mut self) {
        self.journal = None;
    }

    /// Discard everything allocated after `checkpoint` and restore the
    /// descriptors the pass modified.
    pub fn rollback(&mut self, checkpoint: Checkpoint) {
        let cp = checkpoint;
        self.classes.truncate(cp.classes as usize);
        self.type_params.truncate(cp.type_params as usize);
        self.functions.truncate(cp.functions as usize);
        self.properties.truncate(cp.properties as usize);
        self.constructors.truncate(cp.constructors as usize);
        self.annotations.truncate(cp.annotations as usize);
        self.packages.truncate(cp.packages as usize);
        self.package_index.retain(|_, id| id.raw() < cp.packages);

        let Some(journal) = self.journal.take() else {
            return;
        };
        tracing::trace!(
            classes = journal.classes.len(),
            type_params = journal.type_params.len(),
            "restoring journaled descriptors"
        );
        restore(journal.classes, &mut self.classes, |id| id.index());
        restore(journal.type_params, &mut self.type_params, |id| id.index());
        restore(journal.functions, &mut self.functions, |id| id.index());
        restore(journal.properties, &mut self.properties, |id| id.index());
        restore(journal.annotations, &mut self.annotations, |id| id.index());
    }
}

impl Default for Descriptors {
    fn default() -> Self {
        Self::new()
    }
}
