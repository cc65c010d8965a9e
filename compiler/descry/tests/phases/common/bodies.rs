//! A body resolver that records what it was asked to do.

use descry::descriptors::{FunctionId, PropertyId};
use descry::lazy::{BodyScope, DelegatingTrace, NodeKind, ReferenceTarget};
use descry::{BodyResolver, ClassId, SearchRule};
use parking_lot::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyCall {
    FunctionBody(FunctionId),
    Initializer(PropertyId),
    Delegate(PropertyId),
    Accessors(PropertyId),
    DelegationList(ClassId),
    AnonymousInitializers(ClassId),
}

/// Records every hook call. Function bodies also resolve the class named
/// by each expression, the way a checker would.
#[derive(Default)]
pub struct RecordingBodies {
    calls: Mutex<Vec<BodyCall>>,
}

impl RecordingBodies {
    pub fn calls(&self) -> Vec<BodyCall> {
        self.calls.lock().clone()
    }

    pub fn count(&self, matches: impl Fn(&BodyCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| matches(call)).count()
    }

    fn record(&self, call: BodyCall) {
        self.calls.lock().push(call);
    }
}

impl BodyResolver for RecordingBodies {
    fn resolve_function_body(
        &self,
        scope: BodyScope<'_>,
        function: FunctionId,
        trace: &mut DelegatingTrace,
    ) {
        self.record(BodyCall::FunctionBody(function));
        let mut pending = scope.tree.children(scope.node()).to_vec();
        while let Some(node) = pending.pop() {
            pending.extend_from_slice(scope.tree.children(node));
            if scope.tree.kind(node) != NodeKind::Expression {
                continue;
            }
            let Some(path) = &scope.tree.node(node).path else {
                continue;
            };
            if let Ok(Some(class)) = scope.session.resolve_class_with(path, SearchRule::IncludeNative)
            {
                let element = descry::ElementId::new(scope.element.file, node);
                trace.record_reference(element, ReferenceTarget::Class(class));
            }
        }
    }

    fn resolve_property_initializer(
        &self,
        _: BodyScope<'_>,
        property: PropertyId,
        _: &mut DelegatingTrace,
    ) {
        self.record(BodyCall::Initializer(property));
    }

    fn resolve_property_delegate(&self, _: BodyScope<'_>, property: PropertyId, _: &mut DelegatingTrace) {
        self.record(BodyCall::Delegate(property));
    }

    fn resolve_property_accessors(&self, _: BodyScope<'_>, property: PropertyId, _: &mut DelegatingTrace) {
        self.record(BodyCall::Accessors(property));
    }

    fn resolve_delegation_specifier_list(
        &self,
        _: BodyScope<'_>,
        class: ClassId,
        _: &mut DelegatingTrace,
    ) {
        self.record(BodyCall::DelegationList(class));
    }

    fn resolve_anonymous_initializers(
        &self,
        _: BodyScope<'_>,
        class: ClassId,
        _: &mut DelegatingTrace,
    ) {
        self.record(BodyCall::AnonymousInitializers(class));
    }
}
