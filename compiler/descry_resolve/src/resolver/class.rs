//! Class resolution.
//!
//! Qualified name to class descriptor, short-circuiting at the first match:
//!
//! 1. trait-implementation helpers are never classes
//! 2. `lang.*` names navigate the built-ins
//! 3. native classes are subject to the [`SearchRule`]
//! 4. the canonical name is looked up in the class cache
//! 5. otherwise the class is built from compiled metadata or a raw
//!    declaration, or recorded as unresolvable
//!
//! A new descriptor is cached before its type parameters, supertypes and
//! annotations are resolved, so cyclic references find it half-built
//! instead of recursing.

use std::sync::Arc;

use descry_descriptors::{ClassDescriptor, ClassId, ClassKind, Container, Modality, Origin};
use descry_diagnostic::{Diagnostic, ErrorCode};
use descry_ir::{canonicalize, FqName, FqNameUnsafe, StringInterner};

use super::transform::TypeVariableScope;
use super::{
    annotations, compiled, enum_class, sam, signatures, supertypes, well_known, Resolver,
    ResolverState, SearchRule,
};
use crate::cache::CacheLookup;
use crate::raw::{AnnotationOwner, AnnotationOwnerKey, ClassFlags, RawClass};
use crate::signature::{parse_class_signature, ClassSignature};
use crate::stack::ensure_sufficient_stack;
use crate::ResolveError;

#[tracing::instrument(level = "debug", skip_all, fields(class = %fq_name.display(r.interner)))]
pub(crate) fn resolve_class(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    rule: SearchRule,
) -> Result<Option<ClassId>, ResolveError> {
    if is_trait_impl(r.interner, fq_name) {
        return Ok(None);
    }
    if r.state.builtins.is_builtin_name(fq_name) {
        return Ok(r.state.builtins.lookup(&r.state.descriptors, fq_name));
    }
    if let Some(native) = r.state.native.get(fq_name) {
        return apply_search_rule(r, fq_name, native, rule);
    }

    let canonical = r.canonical(fq_name);
    match r.state.cache.lookup(&canonical) {
        CacheLookup::Resolved(class) => {
            tracing::trace!(class = class.raw(), "cache hit");
            return Ok(Some(class));
        }
        CacheLookup::Unresolvable => {
            tracing::trace!("known unresolvable");
            return Ok(None);
        }
        CacheLookup::Unknown => {}
    }

    r.depth += 1;
    let result = ensure_sufficient_stack(|| resolve_uncached(r, fq_name, &canonical));
    r.depth -= 1;
    result
}

fn is_trait_impl(interner: &StringInterner, fq_name: &FqName) -> bool {
    fq_name
        .short_name()
        .is_some_and(|name| interner.lookup(name).ends_with(well_known::TRAIT_IMPL_SUFFIX))
}

/// The answer [`resolve_class`] would give without running a pass: trait
/// implementation helpers, built-ins and cache hits. `None` when a pass is
/// needed, which includes every name bound in the native index.
pub(crate) fn settled_lookup(
    state: &ResolverState,
    interner: &StringInterner,
    fq_name: &FqName,
) -> Option<Option<ClassId>> {
    if is_trait_impl(interner, fq_name) {
        return Some(None);
    }
    if state.builtins.is_builtin_name(fq_name) {
        return Some(state.builtins.lookup(&state.descriptors, fq_name));
    }
    if state.native.get(fq_name).is_some() {
        return None;
    }
    match state.cache.lookup(&canonicalize(interner, fq_name)) {
        CacheLookup::Resolved(class) => Some(Some(class)),
        CacheLookup::Unresolvable => Some(None),
        CacheLookup::Unknown => None,
    }
}

fn apply_search_rule(
    r: &Resolver<'_>,
    fq_name: &FqName,
    native: ClassId,
    rule: SearchRule,
) -> Result<Option<ClassId>, ResolveError> {
    match rule {
        SearchRule::IgnoreIfNative => Ok(None),
        SearchRule::IncludeNative => Ok(Some(native)),
        SearchRule::ErrorIfNative => Err(ResolveError::FoundNative {
            name: r.render(fq_name),
        }),
    }
}

fn resolve_uncached(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    canonical: &FqNameUnsafe,
) -> Result<Option<ClassId>, ResolveError> {
    if let Some(position) = r.names().class_object_position(fq_name) {
        return resolve_through_owner(r, fq_name, canonical, position);
    }
    if let Some(class) = compiled::resolve_compiled(r, fq_name, canonical)? {
        return Ok(Some(class));
    }

    let Some(raw) = r.providers.class_finder.find_class(fq_name) else {
        tracing::debug!("no declaration found, caching negative");
        r.cache_insert_negative(canonical.clone())?;
        return Ok(None);
    };
    if raw.fq_name != *fq_name {
        return Err(ResolveError::NameMismatch {
            requested: r.render(fq_name),
            found: r.render(&raw.fq_name),
        });
    }
    if raw.flags.contains(ClassFlags::MIRROR) {
        return Err(ResolveError::MirrorDeclaration {
            name: r.render(fq_name),
        });
    }

    let container = resolve_container(r, fq_name, raw.outer.as_ref())?;
    if let Some(class) = recheck_cache(r, canonical)? {
        return Ok(Some(class));
    }
    build_foreign_class(r, fq_name, canonical, raw, container).map(Some)
}

/// Class objects and their entries only exist as side effects of resolving
/// their owner.
fn resolve_through_owner(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    canonical: &FqNameUnsafe,
    position: usize,
) -> Result<Option<ClassId>, ResolveError> {
    let owner = fq_name.prefix(position);
    resolve_class(r, &owner, SearchRule::IncludeNative)?;
    if let Some(class) = recheck_cache(r, canonical)? {
        return Ok(Some(class));
    }
    tracing::debug!("owner has no such class object member, caching negative");
    r.cache_insert_negative(canonical.clone())?;
    Ok(None)
}

/// The container may have materialized this class while it resolved. A
/// negative entry here means two lookups of one name disagreed.
pub(super) fn recheck_cache(
    r: &mut Resolver<'_>,
    canonical: &FqNameUnsafe,
) -> Result<Option<ClassId>, ResolveError> {
    match r.state.cache.lookup(canonical) {
        CacheLookup::Resolved(class) => Ok(Some(class)),
        CacheLookup::Unknown => Ok(None),
        existing @ CacheLookup::Unresolvable => Err(r.cache_rewrite(&crate::cache::CacheConflict {
            name: canonical.clone(),
            existing,
        })),
    }
}

/// Outer class for nested declarations, otherwise the package.
pub(super) fn resolve_container(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    outer: Option<&FqName>,
) -> Result<Container, ResolveError> {
    if let Some(outer) = outer {
        return match resolve_class(r, outer, SearchRule::IncludeNative)? {
            Some(parent) => Ok(Container::Class(parent)),
            None => Err(ResolveError::ParentUnresolved {
                name: r.render(fq_name),
                parent: r.render(outer),
            }),
        };
    }
    let package = fq_name.parent().unwrap_or_else(FqName::root);
    Ok(Container::Package(
        r.state.descriptors.ensure_package(&package, Origin::Foreign),
    ))
}

fn class_kind(flags: ClassFlags) -> ClassKind {
    if flags.contains(ClassFlags::ANNOTATION) {
        ClassKind::Annotation
    } else if flags.contains(ClassFlags::INTERFACE) {
        ClassKind::Interface
    } else if flags.contains(ClassFlags::ENUM) {
        ClassKind::Enum
    } else {
        ClassKind::Class
    }
}

fn class_modality(flags: ClassFlags) -> Modality {
    if flags.contains(ClassFlags::ANNOTATION) {
        Modality::Final
    } else if flags.intersects(ClassFlags::ABSTRACT | ClassFlags::INTERFACE) {
        Modality::Abstract
    } else if flags.contains(ClassFlags::FINAL) {
        Modality::Final
    } else {
        Modality::Open
    }
}

/// Allocate, cache, then populate a class from its raw declaration.
fn build_foreign_class(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    canonical: &FqNameUnsafe,
    raw: Arc<RawClass>,
    container: Container,
) -> Result<ClassId, ResolveError> {
    let kind = class_kind(raw.flags);
    let mut descriptor = ClassDescriptor::new(
        raw.name(),
        canonical.clone(),
        container,
        kind,
        Origin::Foreign,
    )
    .with_modality(class_modality(raw.flags))
    .with_visibility(raw.visibility)
    .with_source_name(fq_name.clone());
    descriptor.is_inner = raw.is_nested()
        && kind == ClassKind::Class
        && !raw.flags.contains(ClassFlags::STATIC);

    let id = r.state.descriptors.alloc_class(descriptor);
    r.cache_insert(canonical.clone(), id)?;
    if let Container::Class(parent) = container {
        r.state.descriptors.add_nested(parent, id);
    }
    r.state.raw_classes.insert(id, Arc::clone(&raw));
    tracing::debug!(class = id.raw(), ?kind, "foreign class allocated");

    let signature = parse_signature(r, fq_name, &raw);
    let outer_scope = TypeVariableScope::for_class(&r.state.descriptors, id);
    if let Some(signature) = &signature {
        signatures::resolve_class_type_parameters(
            r,
            id,
            &signature.type_parameters,
            &outer_scope,
        )?;
    }

    let supertypes = supertypes::resolve_supertypes(r, id, &raw, signature.as_ref())?;
    r.state.descriptors.class_mut(id).supertypes = supertypes;

    let key = AnnotationOwnerKey::Class(fq_name.clone());
    let annotations =
        annotations::resolve_annotations(r, AnnotationOwner::new(&key, &raw.annotations))?;
    r.state.descriptors.class_mut(id).annotations = annotations;

    if kind == ClassKind::Interface {
        sam::detect_single_abstract_method(r, id)?;
    }
    if kind == ClassKind::Enum {
        let entries: Vec<_> = raw
            .fields
            .iter()
            .filter(|field| field.is_enum_constant())
            .map(|field| field.name)
            .collect();
        enum_class::synthesize_class_object(r, id, &entries)?;
    }
    Ok(id)
}

/// A malformed signature is reported and the class treated as erased.
fn parse_signature(
    r: &mut Resolver<'_>,
    fq_name: &FqName,
    raw: &RawClass,
) -> Option<ClassSignature> {
    let text = raw.generic_signature.as_deref()?;
    match parse_class_signature(r.interner, text) {
        Ok(signature) => Some(signature),
        Err(err) => {
            tracing::debug!(error = %err, "malformed class signature, treating as erased");
            r.push_diagnostic(
                Diagnostic::error(ErrorCode::E1002)
                    .with_message(format!("malformed signature of `{}`: {err}", r.render(fq_name))),
            );
            None
        }
    }
}
