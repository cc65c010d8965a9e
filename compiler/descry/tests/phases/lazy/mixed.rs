use descry::descriptors::{Modality, Origin, Visibility};
use descry::lazy::{Declaration, GranuleStatus, NodeId, NodeKind, ReferenceTarget};
use descry::resolve::raw::{ClassFlags, ClassProto, NameTable, ProtoFunction, ProtoType, RawClass};
use descry::resolve::CURRENT_ABI_VERSION;
use descry::{ElementId, ErrorCode, ResolveError, SearchRule, SyntaxTree, Type};
use pretty_assertions::assert_eq;

use crate::common::World;

#[test]
fn stale_metadata_is_reported_on_the_requesting_granule() {
    let mut world = World::new();
    let compiled = world.fq("lib.Compiled");
    world.add(RawClass::new(compiled.clone()));
    let mut names = NameTable::new();
    let size = names.add_simple("size");
    let int = names.add_qualified("lang.Int");
    let mut proto = ClassProto::new(CURRENT_ABI_VERSION + 1, names, "lib.Compiled");
    proto.functions.push(ProtoFunction {
        name: size,
        modality: Modality::Final,
        visibility: Visibility::Public,
        type_parameters: Vec::new(),
        receiver: None,
        value_parameters: Vec::new(),
        return_type: ProtoType::class(int),
    });
    world.add_proto(compiled.clone(), proto);

    // val cache: lib.Compiled
    let mut tree = SyntaxTree::new("cache.ds");
    let property = tree
        .add(NodeId::ROOT, NodeKind::Property)
        .named(world.name("cache"))
        .id();
    tree.add(property, NodeKind::TypeReference)
        .path(compiled.clone())
        .id();
    let (lazy, _) = world.lazy();
    let file = lazy.add_file(tree).unwrap();
    let element = ElementId::new(file, property);

    let context = lazy.resolve_to_element(element).unwrap();
    let codes: Vec<ErrorCode> = context
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect();
    assert_eq!(codes, vec![ErrorCode::E1001]);
    assert_eq!(lazy.granule_status(element), GranuleStatus::ResolvedWithDiagnostic);
    assert!(lazy.resolution().take_diagnostics().is_empty());

    let class = lazy.resolution().resolve_class(&compiled).unwrap().unwrap();
    let Some(Declaration::Property(property)) = context.declaration(element) else {
        panic!("property was not declared");
    };
    let state = lazy.resolution().read();
    assert_eq!(state.descriptors().class(class).origin, Origin::Foreign);
    assert_eq!(state.descriptors().property(property).ty, Type::class(class));
}

#[test]
fn source_functions_carry_foreign_annotations() {
    let mut world = World::new();
    let marker = world.fq("lib.Marker");
    world.add(RawClass::new(marker.clone()).with_flags(ClassFlags::ANNOTATION | ClassFlags::INTERFACE));

    // import lib.Marker
    // @Marker fun run() {}
    let mut tree = SyntaxTree::new("run.ds");
    tree.add(NodeId::ROOT, NodeKind::Import)
        .path(marker.clone())
        .id();
    let function = tree
        .add(NodeId::ROOT, NodeKind::Function)
        .named(world.name("run"))
        .id();
    let entry = tree
        .add(function, NodeKind::AnnotationEntry)
        .path(world.fq("Marker"))
        .id();
    let (lazy, _) = world.lazy();
    let file = lazy.add_file(tree).unwrap();

    let context = lazy.resolve_to_element(ElementId::new(file, entry)).unwrap();
    let marker = lazy.resolution().resolve_class(&marker).unwrap().unwrap();
    assert_eq!(
        context.reference(ElementId::new(file, entry)),
        Some(ReferenceTarget::Class(marker))
    );

    let Some(Declaration::Function(function)) = context.declaration(ElementId::new(file, function))
    else {
        panic!("function was not declared");
    };
    let state = lazy.resolution().read();
    let descriptors = state.descriptors();
    let annotations = &descriptors.function(function).annotations;
    assert_eq!(annotations.len(), 1);
    assert_eq!(
        descriptors.annotation(annotations[0]).annotation_class(),
        Some(marker)
    );
}

#[test]
fn source_classes_are_visible_only_to_native_aware_lookups() {
    let world = World::new();
    let name = world.fq("app.Service");
    let mut tree = SyntaxTree::new("service.ds");
    tree.add(NodeId::ROOT, NodeKind::PackageHeader)
        .path(world.fq("app"))
        .id();
    let class = tree
        .add(NodeId::ROOT, NodeKind::Class)
        .named(world.name("Service"))
        .id();
    let (lazy, finder) = world.lazy();
    let file = lazy.add_file(tree).unwrap();
    let Some(Declaration::Class(class)) = lazy.context().declaration(ElementId::new(file, class))
    else {
        panic!("class was not declared");
    };

    let resolution = lazy.resolution();
    assert_eq!(
        resolution
            .resolve_class_with(&name, SearchRule::IncludeNative)
            .unwrap(),
        Some(class)
    );
    assert_eq!(
        resolution
            .resolve_class_with(&name, SearchRule::IgnoreIfNative)
            .unwrap(),
        None
    );
    assert_eq!(finder.lookups(), 0);
    assert_eq!(lazy.class_descriptors_by_fq_name(&name, false).unwrap(), vec![class]);
}

#[test]
fn failed_bound_resolution_leaves_no_stale_bounds() {
    let mut world = World::new();
    let good = world.fq("pkg.Good");
    let bad = world.fq("pkg.Bad");
    let other = world.fq("pkg.Other");
    world.add(RawClass::new(good.clone()));
    world.add(RawClass::new(bad.clone()).with_flags(ClassFlags::MIRROR));
    world.add(RawClass::new(other.clone()));

    // class C<A : pkg.Good, B : pkg.Bad>
    let mut tree = SyntaxTree::new("bounds.ds");
    let class = tree
        .add(NodeId::ROOT, NodeKind::Class)
        .named(world.name("C"))
        .id();
    let first = tree
        .add(class, NodeKind::TypeParameter)
        .named(world.name("A"))
        .id();
    tree.add(first, NodeKind::TypeReference).path(good).id();
    let second = tree
        .add(class, NodeKind::TypeParameter)
        .named(world.name("B"))
        .id();
    tree.add(second, NodeKind::TypeReference).path(bad).id();
    let (lazy, _) = world.lazy();
    let file = lazy.add_file(tree).unwrap();
    let element = ElementId::new(file, first);
    let Some(Declaration::TypeParameter(parameter)) = lazy.context().declaration(element) else {
        panic!("type parameter was not declared");
    };
    let classes_before = lazy.resolution().read().descriptors().class_count();

    assert!(matches!(
        lazy.resolve_to_element(element),
        Err(ResolveError::MirrorDeclaration { .. })
    ));
    assert_eq!(lazy.granule_status(element), GranuleStatus::Unvisited);

    let other = lazy.resolution().resolve_class(&other).unwrap().unwrap();
    let state = lazy.resolution().read();
    let descriptor = state.descriptors().type_param(parameter);
    assert!(!descriptor.initialized);
    assert!(descriptor.upper_bounds.is_empty());
    assert_eq!(other.index(), classes_before);
}
