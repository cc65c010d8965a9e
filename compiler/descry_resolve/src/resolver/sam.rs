//! Single-abstract-method detection for interfaces.

use descry_descriptors::{ClassId, Descriptors, FunctionId, Modality, Type};
use descry_ir::Name;
use rustc_hash::FxHashMap;

use super::{members, Resolver};
use crate::ResolveError;

/// Set `sam_type` on `interface` if exactly one abstract method remains
/// after inheritance and that method is not generic.
pub(crate) fn detect_single_abstract_method(
    r: &mut Resolver<'_>,
    interface: ClassId,
) -> Result<(), ResolveError> {
    members::ensure_members(r, interface)?;
    let supers = members::supertype_classes(&r.state.descriptors, interface);
    for &sup in &supers {
        members::ensure_members(r, sup)?;
    }

    let descriptors = &r.state.descriptors;
    let names = r.names();

    // The nearest declaration of a (name, arity) pair decides whether it
    // is still abstract.
    let mut first_seen: FxHashMap<(Name, usize), bool> = FxHashMap::default();
    let mut candidates: FxHashMap<(Name, usize), Vec<FunctionId>> = FxHashMap::default();
    let mut order = Vec::new();
    for owner in std::iter::once(interface).chain(supers.iter().copied()) {
        for &function in descriptors.class(owner).functions() {
            let descriptor = descriptors.function(function);
            if descriptor.is_static || names.is_object_method(descriptor.name, descriptor.arity())
            {
                continue;
            }
            let key = (descriptor.name, descriptor.arity());
            let is_abstract = descriptor.modality == Modality::Abstract;
            first_seen.entry(key).or_insert_with(|| {
                order.push(key);
                is_abstract
            });
            if is_abstract {
                candidates.entry(key).or_default().push(function);
            }
        }
    }

    let mut abstract_keys = order.iter().filter(|key| first_seen[*key]);
    let (Some(key), None) = (abstract_keys.next(), abstract_keys.next()) else {
        return Ok(());
    };
    let group = candidates.get(key).map(Vec::as_slice).unwrap_or_default();
    if group
        .iter()
        .any(|&function| !descriptors.function(function).type_parameters.is_empty())
    {
        tracing::debug!("single abstract method is generic");
        return Ok(());
    }
    let Some(chosen) = most_specific(descriptors, group) else {
        return Ok(());
    };

    let function = descriptors.function(chosen);
    let sam_type = Type::Function {
        receiver: None,
        parameters: function
            .value_parameters
            .iter()
            .map(|parameter| parameter.ty.clone())
            .collect(),
        return_type: Box::new(function.return_type.clone()),
    };
    tracing::debug!(class = interface.raw(), "single abstract method found");
    r.state.descriptors.class_mut(interface).sam_type = Some(sam_type);
    Ok(())
}

/// The candidate whose return type is a subtype of every other, or the
/// first one.
fn most_specific(descriptors: &Descriptors, group: &[FunctionId]) -> Option<FunctionId> {
    let return_class = |function: FunctionId| descriptors.function(function).return_type.class_id();
    group
        .iter()
        .copied()
        .find(|&candidate| {
            group.iter().all(|&other| {
                match (return_class(candidate), return_class(other)) {
                    (Some(own), Some(theirs)) => {
                        own == theirs || descriptors.is_subclass_of(own, theirs)
                    }
                    _ => candidate == other,
                }
            })
        })
        .or_else(|| group.first().copied())
}
