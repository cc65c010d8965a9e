use descry::descriptors::{ClassKind, PrimitiveType};
use descry::resolve::raw::{
    AnnotationOwnerKey, ClassFlags, MemberFlags, RawAnnotation, RawClass, RawConstant, RawMethod,
    RawType,
};
use descry::{FqName, ResolverConfig};
use pretty_assertions::assert_eq;

use crate::common::World;

/// `@interface Ann { int value(); }`
fn with_annotation_class(world: &mut World) -> FqName {
    let ann = world.fq("pkg.Ann");
    let value = world.name("value");
    world.add(
        RawClass::new(ann.clone())
            .with_flags(ClassFlags::ANNOTATION | ClassFlags::INTERFACE)
            .with_method(
                RawMethod::new(value, RawType::Primitive(PrimitiveType::Int))
                    .with_flags(MemberFlags::ABSTRACT),
            ),
    );
    ann
}

#[test]
fn annotated_class_resolves_with_its_arguments() {
    // @Ann(value = 5) class Foo
    let mut world = World::new();
    let ann = with_annotation_class(&mut world);
    let foo = world.fq("pkg.Foo");
    let value = world.name("value");
    world.add(
        RawClass::new(foo.clone())
            .with_annotation(RawAnnotation::new(ann.clone()).with_argument(Some(value), RawConstant::Int(5))),
    );
    let name = world.name("Foo");
    let (session, _) = world.build();

    let id = session.resolve_class(&foo).unwrap().unwrap();
    let ann = session.resolve_class(&ann).unwrap().unwrap();
    let state = session.read();
    let descriptors = state.descriptors();
    let class = descriptors.class(id);
    assert_eq!(class.name, name);
    assert_eq!(class.kind, ClassKind::Class);
    assert_eq!(class.annotations.len(), 1);

    let annotation = descriptors.annotation(class.annotations[0]);
    assert_eq!(annotation.annotation_class(), Some(ann));
    assert_eq!(annotation.argument(value).and_then(|v| v.as_int()), Some(5));
}

#[test]
fn internal_markers_are_filtered_out() {
    let mut world = World::new();
    let ann = with_annotation_class(&mut world);
    let foo = world.fq("pkg.Foo");
    let marker = RawAnnotation::new(world.fq("lang.internal.NotNull"));
    world.add(
        RawClass::new(foo.clone())
            .with_annotation(marker.clone())
            .with_annotation(RawAnnotation::new(ann).with_argument(None, RawConstant::Int(1))),
    );
    let (session, _) = world.build();

    let id = session.resolve_class(&foo).unwrap().unwrap();
    assert_eq!(session.read().descriptors().class(id).annotations.len(), 1);
    assert!(session.has_not_null_annotation(&AnnotationOwnerKey::Class(foo), &[marker]));
}

#[test]
fn external_annotations_join_the_declared_ones() {
    let mut world = World::new();
    let ann = with_annotation_class(&mut world);
    let plain = world.fq("pkg.Plain");
    world.add(RawClass::new(plain.clone()));
    world.annotate(
        AnnotationOwnerKey::Class(plain.clone()),
        RawAnnotation::new(ann.clone()).with_argument(None, RawConstant::Int(7)),
    );
    let value = world.name("value");
    let (session, _) = world.build();

    let id = session.resolve_class(&plain).unwrap().unwrap();
    let state = session.read();
    let descriptors = state.descriptors();
    let annotations = &descriptors.class(id).annotations;
    assert_eq!(annotations.len(), 1);
    let annotation = descriptors.annotation(annotations[0]);
    assert_eq!(annotation.argument(value).and_then(|v| v.as_int()), Some(7));
}

#[test]
fn external_annotations_can_be_switched_off() {
    let mut world = World::new();
    let ann = with_annotation_class(&mut world);
    let plain = world.fq("pkg.Plain");
    world.add(RawClass::new(plain.clone()));
    world.annotate(AnnotationOwnerKey::Class(plain.clone()), RawAnnotation::new(ann));
    let (session, _) = world
        .with_config(ResolverConfig::new().with_external_annotations(false))
        .build();

    let id = session.resolve_class(&plain).unwrap().unwrap();
    assert!(session.read().descriptors().class(id).annotations.is_empty());
}
