use std::sync::Arc;

use descry::descriptors::{FunctionId, PropertyId};
use descry::lazy::{
    BodyScope, Declaration, DelegatingTrace, GranuleStatus, NodeId, NodeKind, ReferenceTarget,
};
use descry::resolve::raw::RawClass;
use descry::{
    analyze_file, BodyResolver, CancellationFlag, ClassId, ElementId, ErrorCode, ResolveError,
    SyntaxTree, Type,
};
use pretty_assertions::assert_eq;

use crate::common::{BodyCall, RecordingBodies, World};

struct Widget {
    tree: SyntaxTree,
    class: NodeId,
    draw: NodeId,
    call: NodeId,
    size: NodeId,
}

/// ```text
/// package app
/// import lib.Base
/// class Widget : Base {
///     fun draw() { lib.Base }
///     val size: Int = 0
/// }
/// ```
fn widget(world: &World) -> Widget {
    let mut tree = SyntaxTree::new("widget.ds");
    tree.add(NodeId::ROOT, NodeKind::PackageHeader)
        .path(world.fq("app"))
        .id();
    tree.add(NodeId::ROOT, NodeKind::Import)
        .path(world.fq("lib.Base"))
        .id();
    let class = tree
        .add(NodeId::ROOT, NodeKind::Class)
        .named(world.name("Widget"))
        .id();
    let list = tree.add(class, NodeKind::DelegationSpecifierList).id();
    let specifier = tree.add(list, NodeKind::DelegationSpecifier).id();
    tree.add(specifier, NodeKind::TypeReference)
        .path(world.fq("Base"))
        .id();
    let draw = tree.add(class, NodeKind::Function).named(world.name("draw")).id();
    let block = tree.add(draw, NodeKind::Block).id();
    let call = tree
        .add(block, NodeKind::Expression)
        .path(world.fq("lib.Base"))
        .id();
    let size = tree.add(class, NodeKind::Property).named(world.name("size")).id();
    tree.add(size, NodeKind::TypeReference)
        .path(world.fq("Int"))
        .id();
    tree.add(size, NodeKind::Expression).id();
    Widget {
        tree,
        class,
        draw,
        call,
        size,
    }
}

fn world_with_base() -> World {
    let mut world = World::new();
    let base = world.fq("lib.Base");
    world.add(RawClass::new(base));
    world
}

#[test]
fn analysis_runs_every_hook_once() {
    let world = world_with_base();
    let base = world.fq("lib.Base");
    let widget = widget(&world);
    let (lazy, _) = world.lazy();
    let bodies = Arc::new(RecordingBodies::default());
    let lazy = lazy.with_body_resolver(bodies.clone());
    let file = lazy.add_file(widget.tree).unwrap();

    let context = analyze_file(&lazy, file).unwrap();
    assert!(context.diagnostics().is_empty(), "{:?}", context.diagnostics());
    let base = lazy.resolution().resolve_class(&base).unwrap().unwrap();
    assert_eq!(
        context.reference(ElementId::new(file, widget.call)),
        Some(ReferenceTarget::Class(base))
    );

    let Some(Declaration::Class(class)) = context.declaration(ElementId::new(file, widget.class))
    else {
        panic!("class was not declared");
    };
    let Some(Declaration::Function(draw)) = context.declaration(ElementId::new(file, widget.draw))
    else {
        panic!("function was not declared");
    };
    let Some(Declaration::Property(size)) = context.declaration(ElementId::new(file, widget.size))
    else {
        panic!("property was not declared");
    };
    let calls = bodies.calls();
    assert_eq!(calls.len(), 3, "{calls:?}");
    for expected in [
        BodyCall::DelegationList(class),
        BodyCall::FunctionBody(draw),
        BodyCall::Initializer(size),
    ] {
        assert!(calls.contains(&expected), "{expected:?} missing from {calls:?}");
    }

    analyze_file(&lazy, file).unwrap();
    assert_eq!(bodies.calls().len(), 3);

    let state = lazy.resolution().read();
    let descriptors = state.descriptors();
    assert_eq!(descriptors.class(class).supertypes, vec![Type::class(base)]);
    assert_eq!(descriptors.property(size).ty, Type::class(ClassId::INT));
}

#[test]
fn asking_about_an_expression_resolves_only_its_function() {
    let world = world_with_base();
    let widget = widget(&world);
    let (lazy, _) = world.lazy();
    let bodies = Arc::new(RecordingBodies::default());
    let lazy = lazy.with_body_resolver(bodies.clone());
    let file = lazy.add_file(widget.tree).unwrap();

    lazy.resolve_to_element(ElementId::new(file, widget.call))
        .unwrap();
    assert_eq!(
        bodies.count(|call| matches!(call, BodyCall::FunctionBody(_))),
        1
    );
    assert_eq!(bodies.calls().len(), 1);
    assert_eq!(
        lazy.granule_status(ElementId::new(file, widget.draw)),
        GranuleStatus::Resolved
    );
    assert_eq!(
        lazy.granule_status(ElementId::new(file, widget.size)),
        GranuleStatus::Unvisited
    );
}

/// Cancels the session from inside the first function body it sees.
struct CancellingBodies {
    flag: CancellationFlag,
    inner: RecordingBodies,
}

impl BodyResolver for CancellingBodies {
    fn resolve_function_body(
        &self,
        scope: BodyScope<'_>,
        function: FunctionId,
        trace: &mut DelegatingTrace,
    ) {
        self.flag.cancel();
        self.inner.resolve_function_body(scope, function, trace);
    }

    fn resolve_property_initializer(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    ) {
        self.inner.resolve_property_initializer(scope, property, trace);
    }

    fn resolve_property_delegate(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    ) {
        self.inner.resolve_property_delegate(scope, property, trace);
    }

    fn resolve_property_accessors(
        &self,
        scope: BodyScope<'_>,
        property: PropertyId,
        trace: &mut DelegatingTrace,
    ) {
        self.inner.resolve_property_accessors(scope, property, trace);
    }

    fn resolve_delegation_specifier_list(
        &self,
        scope: BodyScope<'_>,
        class: ClassId,
        trace: &mut DelegatingTrace,
    ) {
        self.inner.resolve_delegation_specifier_list(scope, class, trace);
    }

    fn resolve_anonymous_initializers(
        &self,
        scope: BodyScope<'_>,
        class: ClassId,
        trace: &mut DelegatingTrace,
    ) {
        self.inner.resolve_anonymous_initializers(scope, class, trace);
    }
}

#[test]
fn cancellation_stops_between_granules_and_resumes() {
    let world = world_with_base();
    let widget = widget(&world);
    let (lazy, _) = world.lazy();
    let flag = CancellationFlag::new();
    let bodies = Arc::new(CancellingBodies {
        flag: flag.clone(),
        inner: RecordingBodies::default(),
    });
    let lazy = lazy
        .with_body_resolver(bodies.clone())
        .with_cancellation(flag.clone());
    let file = lazy.add_file(widget.tree).unwrap();

    assert!(matches!(analyze_file(&lazy, file), Err(ResolveError::Cancelled)));
    assert_eq!(
        lazy.granule_status(ElementId::new(file, widget.draw)),
        GranuleStatus::Resolved
    );
    assert_eq!(
        lazy.granule_status(ElementId::new(file, widget.size)),
        GranuleStatus::Unvisited
    );

    flag.reset();
    let bodies_before = bodies.inner.calls().len();
    // The function body is not run again, so nothing cancels this time.
    let context = analyze_file(&lazy, file).unwrap();
    assert!(context.diagnostics().is_empty());
    assert_eq!(bodies.inner.calls().len(), bodies_before + 1);
}

#[test]
fn unresolved_imports_surface_in_the_file_context() {
    let world = World::new();
    let widget = widget(&world);
    let (lazy, _) = world.lazy();
    let file = lazy.add_file(widget.tree).unwrap();

    let context = analyze_file(&lazy, file).unwrap();
    let codes: Vec<ErrorCode> = context
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect();
    assert!(codes.contains(&ErrorCode::E2002), "{codes:?}");
}

#[test]
fn unresolved_supertypes_keep_their_slot() {
    let world = world_with_base();
    let base = world.fq("lib.Base");

    // class Gadget : lib.Missing, lib.Base
    let mut tree = SyntaxTree::new("gadget.ds");
    let class = tree
        .add(NodeId::ROOT, NodeKind::Class)
        .named(world.name("Gadget"))
        .id();
    let list = tree.add(class, NodeKind::DelegationSpecifierList).id();
    for path in ["lib.Missing", "lib.Base"] {
        let specifier = tree.add(list, NodeKind::DelegationSpecifier).id();
        tree.add(specifier, NodeKind::TypeReference)
            .path(world.fq(path))
            .id();
    }
    let (lazy, _) = world.lazy();
    let file = lazy.add_file(tree).unwrap();

    let context = lazy.resolve_to_element(ElementId::new(file, list)).unwrap();
    let codes: Vec<ErrorCode> = context
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect();
    assert_eq!(codes, vec![ErrorCode::E2001]);

    let Some(Declaration::Class(class)) = lazy.context().declaration(ElementId::new(file, class))
    else {
        panic!("class was not declared");
    };
    let base = lazy.resolution().resolve_class(&base).unwrap().unwrap();
    let state = lazy.resolution().read();
    let supertypes = &state.descriptors().class(class).supertypes;
    assert_eq!(supertypes.len(), 2);
    assert!(supertypes[0].is_error());
    assert_eq!(supertypes[1], Type::class(base));
}
