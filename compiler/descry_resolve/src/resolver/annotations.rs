//! Annotation resolution.
//!
//! Own and external annotations are resolved in order. Internal markers are
//! filtered out, platform aliases short-circuit to built-in descriptors, and
//! everything else goes through class resolution. The annotation's type is
//! assigned by a postponed task; arguments are bound eagerly.

use descry_descriptors::{
    AnnotationArgument, AnnotationDescriptor, AnnotationId, BuiltIns, ClassId, Type,
};
use descry_ir::{FqName, Name};

use super::{class, constants, members, Resolver, SearchRule};
use crate::config::ResolverConfig;
use crate::providers::Providers;
use crate::raw::{AnnotationOwner, AnnotationOwnerKey, RawAnnotation};
use crate::ResolveError;

/// Message carried by the built-in descriptor for the platform deprecation
/// annotation.
const PLATFORM_DEPRECATION_MESSAGE: &str = "Deprecated in Java";

/// Markers with a dedicated probe.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum AnnotationProbe {
    NotNull,
    Mutable,
    ReadOnly,
}

#[tracing::instrument(level = "trace", skip_all, fields(own = owner.annotations.len()))]
pub(crate) fn resolve_annotations(
    r: &mut Resolver<'_>,
    owner: AnnotationOwner<'_>,
) -> Result<Vec<AnnotationId>, ResolveError> {
    let external = external_annotations(r.providers, r.config, owner.key);
    let mut resolved = Vec::with_capacity(owner.annotations.len() + external.len());
    for raw in owner.annotations.iter().chain(&external) {
        if let Some(id) = resolve_annotation(r, raw)? {
            resolved.push(id);
        }
    }
    Ok(resolved)
}

/// Resolve one occurrence; `None` when it is filtered, its class is
/// unknown, or one of its arguments cannot be evaluated.
pub(crate) fn resolve_annotation(
    r: &mut Resolver<'_>,
    raw: &RawAnnotation,
) -> Result<Option<AnnotationId>, ResolveError> {
    let Some(fq_name) = &raw.fq_name else {
        tracing::trace!("annotation without a name skipped");
        return Ok(None);
    };
    if r.names().is_denied(fq_name) {
        tracing::trace!(annotation = %fq_name.display(r.interner), "internal marker skipped");
        return Ok(None);
    }
    if let Some(alias) = r.state.platform.map_annotation(fq_name) {
        return Ok(Some(alias_annotation(r, alias)));
    }

    let Some(class) = class::resolve_class(r, fq_name, SearchRule::IncludeNative)? else {
        tracing::debug!(annotation = %fq_name.display(r.interner), "annotation class not found, skipped");
        return Ok(None);
    };
    let Some(arguments) = bind_arguments(r, class, raw)? else {
        return Ok(None);
    };

    let id = r.state.descriptors.alloc_annotation(AnnotationDescriptor {
        annotation_type: None,
        arguments,
    });
    r.tasks.push(move |descriptors| {
        descriptors.annotation_mut(id).annotation_type = Some(Type::class(class));
    });
    Ok(Some(id))
}

fn alias_annotation(r: &mut Resolver<'_>, alias: ClassId) -> AnnotationId {
    if alias == ClassId::DEPRECATED {
        BuiltIns::deprecated_annotation(
            &mut r.state.descriptors,
            r.interner,
            PLATFORM_DEPRECATION_MESSAGE,
        )
    } else {
        r.state.descriptors.alloc_annotation(AnnotationDescriptor {
            annotation_type: Some(Type::class(alias)),
            arguments: Vec::new(),
        })
    }
}

/// Match arguments to the parameters of the annotation class's sole
/// constructor. Unmatched arguments are dropped; a null argument, matched
/// or not, or a value that cannot be evaluated drops the whole occurrence.
fn bind_arguments(
    r: &mut Resolver<'_>,
    class: ClassId,
    raw: &RawAnnotation,
) -> Result<Option<Vec<AnnotationArgument>>, ResolveError> {
    members::ensure_members(r, class)?;
    let parameters: Vec<(Name, u32)> = {
        let descriptors = &r.state.descriptors;
        match descriptors.class(class).constructors() {
            [constructor] => descriptors
                .constructor(*constructor)
                .value_parameters
                .iter()
                .map(|param| (param.name, param.index))
                .collect(),
            _ => Vec::new(),
        }
    };

    let mut arguments = Vec::with_capacity(raw.arguments.len());
    for argument in &raw.arguments {
        let name = argument.name.unwrap_or(r.names().value);
        let Some(value) = &argument.value else {
            tracing::debug!(argument = r.interner.lookup(name), "null annotation argument");
            return Ok(None);
        };
        let Some(&(parameter, index)) = parameters.iter().find(|(param, _)| *param == name) else {
            tracing::trace!(argument = r.interner.lookup(name), "unmatched annotation argument dropped");
            continue;
        };
        let Some(value) = constants::resolve_constant(r, value)? else {
            tracing::debug!(argument = r.interner.lookup(name), "unresolvable annotation argument");
            return Ok(None);
        };
        arguments.push(AnnotationArgument {
            parameter,
            index,
            value,
        });
    }
    Ok(Some(arguments))
}

pub(crate) fn external_annotations(
    providers: &Providers,
    config: &ResolverConfig,
    key: &AnnotationOwnerKey,
) -> Vec<RawAnnotation> {
    match &providers.external_annotations {
        Some(store) if config.use_external_annotations => store.find_external_annotations(key),
        _ => Vec::new(),
    }
}

/// Whether own or external annotations carry `marker`, without building
/// descriptors.
pub(crate) fn marker_present(
    providers: &Providers,
    config: &ResolverConfig,
    key: &AnnotationOwnerKey,
    own: &[RawAnnotation],
    marker: &FqName,
) -> bool {
    let is_marker = |annotation: &RawAnnotation| annotation.fq_name.as_ref() == Some(marker);
    own.iter().any(is_marker)
        || external_annotations(providers, config, key)
            .iter()
            .any(is_marker)
}

pub(crate) fn has_marker(
    r: &Resolver<'_>,
    key: &AnnotationOwnerKey,
    own: &[RawAnnotation],
    probe: AnnotationProbe,
) -> bool {
    let marker = r.names().marker(probe);
    marker_present(r.providers, r.config, key, own, marker)
}
