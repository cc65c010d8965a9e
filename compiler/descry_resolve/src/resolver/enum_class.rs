//! Enum class objects.
//!
//! Every enum `E` gets a synthetic class object `<class-object-for-E>`
//! holding `values(): Array<E>` and `valueOf(value: String): E`, with one
//! nested `EnumEntry` class per constant. It is cached under the canonical
//! form of `E.ClassObject$`.

use descry_descriptors::{
    BuiltIns, ClassDescriptor, ClassId, ClassKind, Container, FunctionDescriptor, FunctionKind,
    MemberScope, Members, Origin, Type, ValueParameterDescriptor,
};
use descry_ir::{class_object_name, Name};

use super::Resolver;
use crate::ResolveError;

pub(crate) fn synthesize_class_object(
    r: &mut Resolver<'_>,
    enum_class: ClassId,
    entries: &[Name],
) -> Result<ClassId, ResolveError> {
    let (enum_name, enum_fq, visibility) = {
        let descriptor = r.state.descriptors.class(enum_class);
        (descriptor.name, descriptor.fq_name.clone(), descriptor.visibility)
    };
    let name = class_object_name(r.interner, enum_name);
    let fq_name = enum_fq.child(name);

    let mut descriptor = ClassDescriptor::new(
        name,
        fq_name.clone(),
        Container::Class(enum_class),
        ClassKind::ClassObject,
        Origin::Synthetic,
    )
    .with_visibility(visibility);
    descriptor.supertypes = vec![BuiltIns::any_type()];
    let class_object = r.state.descriptors.alloc_class(descriptor);
    r.cache_insert(fq_name.clone(), class_object)?;
    r.state.descriptors.add_nested(enum_class, class_object);
    r.state.descriptors.class_mut(enum_class).class_object = Some(class_object);

    let enum_type = Type::class(enum_class);
    let container = Container::Class(class_object);

    let mut values =
        FunctionDescriptor::placeholder(r.names().values, container, Origin::Synthetic);
    values.kind = FunctionKind::Synthesized;
    values.is_static = true;
    values.return_type = BuiltIns::array_of(enum_type.clone());

    let mut value_of =
        FunctionDescriptor::placeholder(r.names().value_of, container, Origin::Synthetic);
    value_of.kind = FunctionKind::Synthesized;
    value_of.is_static = true;
    value_of.value_parameters = vec![ValueParameterDescriptor::new(
        r.names().value,
        0,
        Type::class(ClassId::STRING),
    )];
    value_of.return_type = enum_type.clone();

    let functions = vec![
        r.state.descriptors.alloc_function(values),
        r.state.descriptors.alloc_function(value_of),
    ];
    r.state.descriptors.class_mut(class_object).members = MemberScope::Loaded(Members {
        functions,
        ..Members::default()
    });

    for &entry in entries {
        let entry_fq = fq_name.child(entry);
        let mut entry_descriptor = ClassDescriptor::new(
            entry,
            entry_fq.clone(),
            Container::Class(class_object),
            ClassKind::EnumEntry,
            Origin::Synthetic,
        )
        .with_visibility(visibility)
        .with_members(Members::default());
        entry_descriptor.supertypes = vec![enum_type.clone()];
        let id = r.state.descriptors.alloc_class(entry_descriptor);
        r.cache_insert(entry_fq, id)?;
        r.state.descriptors.add_nested(class_object, id);
    }

    tracing::debug!(
        class_object = class_object.raw(),
        entries = entries.len(),
        "enum class object synthesized"
    );
    Ok(class_object)
}
