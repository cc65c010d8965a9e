//! Hooks into the body-level type checker.
//!
//! Resolving expressions is not this crate's job. Granule handlers make
//! sure the declarations involved have descriptors, then hand the syntax to
//! a [`BodyResolver`] together with the request's trace.

use descry_descriptors::{ClassId, FunctionId, PropertyId};
use descry_resolve::ResolutionSession;

use crate::syntax::{ElementId, NodeId, SyntaxTree};
use crate::trace::DelegatingTrace;

/// Where a body lives.
#[derive(Clone, Copy)]
pub struct BodyScope<'a> {
    pub session: &'a ResolutionSession,
    pub tree: &'a SyntaxTree,
    /// The declaration that owns the body.
    pub element: ElementId,
}

impl BodyScope<'_> {
    pub fn node(&self) -> NodeId {
        self.element.node
    }
}

/// The body-level type checker.
///
/// Implementations may resolve classes through `scope.session`; they must
/// not re-enter the lazy session that called them.
pub trait BodyResolver: Send + Sync {
    fn resolve_function_body(
        &self,
        scope: BodyScope<'_>,
        function: FunctionId,
        trace: &mut DelegatingTrace,
    );

    fn resolve_property_initializer(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    );

    fn resolve_property_delegate(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    );

    fn resolve_property_accessors(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    );

    fn resolve_delegation_specifier_list(
        &self,
        scope: BodyScope<'_>,
        class: ClassId,
        trace: &mut DelegatingTrace,
    );

    fn resolve_anonymous_initializers(
        &self,
        scope: BodyScope<'_>,
        class: ClassId,
        trace: &mut DelegatingTrace,
    );
}

/// Resolves declarations only, leaving every body untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclarationsOnly;

impl BodyResolver for DeclarationsOnly {
    fn resolve_function_body(&self, _: BodyScope<'_>, _: FunctionId, _: &mut DelegatingTrace) {}

    fn resolve_property_initializer(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {}

    fn resolve_property_delegate(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {}

    fn resolve_property_accessors(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {}

    fn resolve_delegation_specifier_list(
        &self,
        _: BodyScope<'_>,
        _: ClassId,
        _: &mut DelegatingTrace,
    ) {
    }

    fn resolve_anonymous_initializers(&self, _: BodyScope<'_>, _: ClassId, _: &mut DelegatingTrace) {}
}
