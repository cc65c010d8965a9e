use descry_diagnostic::ErrorCode;
use descry_resolve::raw::RawClass;
use descry_resolve::SilentErrorReporter;
use pretty_assertions::assert_eq;

use super::*;
use crate::session::LazyResolveSession;
use crate::testing::Fixture;

/// Resolve the reference at `node` against the session's declarations.
fn resolve(lazy: &LazyResolveSession, file: FileId, node: NodeId) -> (Type, DelegatingTrace) {
    let tree = lazy.tree(file).unwrap();
    let package = tree.package();
    let cx = FileCx {
        tree: &tree,
        file,
        package: &package,
    };
    let mut trace = DelegatingTrace::new(lazy.context(), "test");
    let ty = lazy
        .resolution()
        .with_resolver(&SilentErrorReporter, |r| {
            resolve_type_reference(r, cx, node, &mut trace)
        })
        .unwrap();
    (ty, trace)
}

#[test]
fn type_parameters_are_found_before_classes() {
    let fx = Fixture::new();
    let mut tree = SyntaxTree::new("box.ds");
    tree.add(NodeId::ROOT, NodeKind::PackageHeader)
        .path(fx.fq("p"))
        .id();
    let class = tree.add(NodeId::ROOT, NodeKind::Class).named(fx.name("Box")).id();
    let parameter = tree.add(class, NodeKind::TypeParameter).named(fx.name("T")).id();
    let function = tree.add(class, NodeKind::Function).named(fx.name("get")).id();
    let returned = tree
        .add(function, NodeKind::TypeReference)
        .path(fx.fq("T"))
        .nullable()
        .id();

    let lazy = fx.session();
    let file = lazy.add_file(tree).unwrap();
    let (ty, trace) = resolve(&lazy, file, returned);

    let Some(Declaration::TypeParameter(id)) =
        lazy.context().declaration(ElementId::new(file, parameter))
    else {
        panic!("type parameter was not declared");
    };
    assert_eq!(ty, Type::parameter(id).with_nullability(true));
    assert_eq!(
        trace.reference(ElementId::new(file, returned)),
        Some(ReferenceTarget::TypeParameter(id))
    );
}

#[test]
fn imports_win_over_the_file_package() {
    let mut fx = Fixture::new();
    let imported = fx.fq("q.Foo");
    let local = fx.fq("p.Foo");
    fx.add(RawClass::new(imported.clone()));
    fx.add(RawClass::new(local));

    let mut tree = SyntaxTree::new("use.ds");
    tree.add(NodeId::ROOT, NodeKind::PackageHeader)
        .path(fx.fq("p"))
        .id();
    tree.add(NodeId::ROOT, NodeKind::Import)
        .path(imported.clone())
        .id();
    let property = tree.add(NodeId::ROOT, NodeKind::Property).named(fx.name("x")).id();
    let reference = tree
        .add(property, NodeKind::TypeReference)
        .path(fx.fq("Foo"))
        .id();
    tree.add(reference, NodeKind::TypeReference)
        .path(fx.fq("Int"))
        .id();

    let lazy = fx.session();
    let file = lazy.add_file(tree).unwrap();
    let (ty, _) = resolve(&lazy, file, reference);

    let foo = lazy.resolution().resolve_class(&imported).unwrap().unwrap();
    assert_eq!(
        ty,
        Type::generic(foo, vec![TypeProjection::invariant(Type::class(ClassId::INT))])
    );
}

#[test]
fn nested_classes_of_enclosing_classes_are_in_scope() {
    let fx = Fixture::new();
    let mut tree = SyntaxTree::new("outer.ds");
    let outer = tree.add(NodeId::ROOT, NodeKind::Class).named(fx.name("Outer")).id();
    let inner = tree.add(outer, NodeKind::Class).named(fx.name("Inner")).id();
    let function = tree.add(outer, NodeKind::Function).named(fx.name("make")).id();
    let returned = tree
        .add(function, NodeKind::TypeReference)
        .path(fx.fq("Inner"))
        .id();

    let lazy = fx.session();
    let file = lazy.add_file(tree).unwrap();
    let (ty, _) = resolve(&lazy, file, returned);

    let inner = lazy
        .context()
        .declaration(ElementId::new(file, inner))
        .and_then(Declaration::class)
        .unwrap();
    assert_eq!(ty, Type::class(inner));
}

#[test]
fn unresolved_names_become_error_types() {
    let fx = Fixture::new();
    let mut tree = SyntaxTree::new("broken.ds");
    let property = tree.add(NodeId::ROOT, NodeKind::Property).named(fx.name("x")).id();
    let reference = tree
        .add(property, NodeKind::TypeReference)
        .path(fx.fq("Missing"))
        .id();

    let lazy = fx.session();
    let file = lazy.add_file(tree).unwrap();
    let (ty, trace) = resolve(&lazy, file, reference);

    assert!(ty.is_error());
    let codes: Vec<ErrorCode> = trace
        .context()
        .diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect();
    assert_eq!(codes, vec![ErrorCode::E2001]);
    assert_eq!(trace.reference(ElementId::new(file, reference)), None);
}
