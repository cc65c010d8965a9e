//! Class lookup by a dotted name whose package boundary is unknown.

use std::cell::RefCell;

use descry_descriptors::{ClassId, ClassKind, Container, PackageId};
use descry_ir::{FqName, Name};
use descry_resolve::{ResolveError, SearchRule};
use rustc_hash::FxHashSet;

use super::{LazyResolveSession, LazyState};

pub(super) fn class_descriptors_by_fq_name(
    session: &LazyResolveSession,
    state: &RefCell<LazyState>,
    fq_name: &FqName,
    include_objects: bool,
) -> Result<Vec<ClassId>, ResolveError> {
    let mut found = Vec::new();
    let mut package = fq_name.parent();
    while let Some(candidate) = package {
        if let Some(package_id) = session.resolution.resolve_package(&candidate) {
            let path = fq_name.suffix_from(candidate.len());
            found.extend(classes_at(
                session,
                state,
                &candidate,
                package_id,
                path.segments(),
                include_objects,
            )?);
        }
        package = candidate.parent();
    }

    let mut seen = FxHashSet::default();
    found.retain(|&class| seen.insert(class));
    tracing::trace!(
        name = %fq_name.display(session.resolution.interner()),
        found = found.len(),
        "classes by qualified name"
    );
    Ok(found)
}

/// Classes reached by walking `path` from `package`, one class level per
/// segment.
fn classes_at(
    session: &LazyResolveSession,
    state: &RefCell<LazyState>,
    package: &FqName,
    package_id: PackageId,
    path: &[Name],
    include_objects: bool,
) -> Result<Vec<ClassId>, ResolveError> {
    let Some((&first, rest)) = path.split_first() else {
        return Ok(Vec::new());
    };

    let mut level: Vec<ClassId> = {
        let lazy = state.borrow();
        let resolver = session.resolution.read();
        lazy.package_classes
            .get(package)
            .into_iter()
            .flatten()
            .copied()
            .filter(|&class| resolver.descriptors().class(class).name == first)
            .collect()
    };
    if let Some(class) =
        session
            .resolution
            .resolve_class_with(&package.child(first), SearchRule::IncludeNative)?
    {
        let container = session.resolution.read().descriptors().class(class).container;
        if container == Container::Package(package_id) && !level.contains(&class) {
            level.push(class);
        }
    }

    for &segment in rest {
        let mut next = Vec::new();
        for class in level {
            if let Some(nested) = nested_class(session, class, segment)? {
                next.push(nested);
            }
        }
        level = next;
    }

    if !include_objects {
        let resolver = session.resolution.read();
        level.retain(|&class| resolver.descriptors().class(class).kind != ClassKind::Object);
    }
    Ok(level)
}

/// Nested classifier `name` of `outer`, loading it from the class finder
/// when `outer` is foreign and it has not been seen yet.
fn nested_class(
    session: &LazyResolveSession,
    outer: ClassId,
    name: Name,
) -> Result<Option<ClassId>, ResolveError> {
    let source_name = {
        let resolver = session.resolution.read();
        let descriptors = resolver.descriptors();
        if let Some(nested) = descriptors.nested_by_name(outer, name) {
            return Ok(Some(nested));
        }
        descriptors.class(outer).source_name.clone()
    };
    let Some(source_name) = source_name else {
        return Ok(None);
    };
    let Some(nested) = session
        .resolution
        .resolve_class_with(&source_name.child(name), SearchRule::IncludeNative)?
    else {
        return Ok(None);
    };
    let container = session.resolution.read().descriptors().class(nested).container;
    Ok((container == Container::Class(outer)).then_some(nested))
}
