use descry::descriptors::{ClassKind, Container, PrimitiveType, Type};
use descry::resolve::raw::{ClassFlags, MemberFlags, RawClass, RawField, RawMethod, RawType};
use descry::resolve::CacheLookup;
use descry::{ClassId, SearchRule};
use pretty_assertions::assert_eq;

use crate::common::World;

#[test]
fn enum_entries_are_reachable_through_the_class_object() {
    let mut world = World::new();
    let color = world.fq("pkg.Color");
    world.add(
        RawClass::new(color.clone())
            .with_flags(ClassFlags::ENUM | ClassFlags::FINAL)
            .with_field(
                RawField::new(world.name("RED"), RawType::class(color.clone())).with_flags(
                    MemberFlags::STATIC | MemberFlags::FINAL | MemberFlags::ENUM_CONSTANT,
                ),
            ),
    );
    let red = world.fq("pkg.Color.ClassObject$.RED");
    let (values, value_of) = (world.name("values"), world.name("valueOf"));
    let (session, finder) = world.build();

    let entry = session
        .resolve_class_with(&red, SearchRule::IncludeNative)
        .unwrap()
        .unwrap();
    assert_eq!(session.cached(&red), CacheLookup::Resolved(entry));
    assert_eq!(finder.lookups(), 1);

    let color = session.resolve_class(&color).unwrap().unwrap();
    let class_object = session.read().descriptors().class(color).class_object.unwrap();
    let members = session.class_members(class_object).unwrap();

    let state = session.read();
    let descriptors = state.descriptors();
    assert_eq!(descriptors.class(class_object).kind, ClassKind::ClassObject);
    assert_eq!(descriptors.class(entry).container, Container::Class(class_object));
    let names: Vec<_> = members
        .functions
        .iter()
        .map(|&function| descriptors.function(function).name)
        .collect();
    assert_eq!(names, vec![values, value_of]);
    let value_of = descriptors.function(members.functions[1]);
    assert_eq!(value_of.return_type, Type::class(color));
    assert_eq!(value_of.value_parameters[0].ty, Type::class(ClassId::STRING));
}

#[test]
fn self_referencing_supertype_terminates() {
    // class A<T> extends A<A>
    let mut world = World::new();
    let a = world.fq("pkg.A");
    world.add(RawClass::new(a.clone()).with_signature("<T:Ljava/lang/Object;>Lpkg/A<Lpkg/A;>;"));
    let (session, finder) = world.build();

    let id = session.resolve_class(&a).unwrap().unwrap();
    assert_eq!(finder.lookups(), 1);

    let state = session.read();
    let class = state.descriptors().class(id);
    assert_eq!(class.type_parameters.len(), 1);
    assert_eq!(class.supertypes.len(), 1);
    let supertype = &class.supertypes[0];
    assert_eq!(supertype.class_id(), Some(id));
    let argument = supertype.arguments()[0].ty().unwrap();
    assert_eq!(argument.class_id(), Some(id));
}

#[test]
fn builtin_nested_classes_need_no_finder() {
    let world = World::new();
    let entry = world.fq("lang.Map.Entry");
    let (session, finder) = world.build();

    assert_eq!(session.resolve_class(&entry).unwrap(), Some(ClassId::MAP_ENTRY));
    assert_eq!(finder.lookups(), 0);
}

#[test]
fn functional_interfaces_expose_their_single_method() {
    let mut world = World::new();
    let predicate = world.fq("pkg.Predicate");
    world.add(
        RawClass::new(predicate.clone())
            .with_flags(ClassFlags::INTERFACE | ClassFlags::ABSTRACT)
            .with_method(
                RawMethod::new(world.name("test"), RawType::Primitive(PrimitiveType::Boolean))
                    .with_flags(MemberFlags::ABSTRACT)
                    .with_parameter(Some(world.name("value")), RawType::Primitive(PrimitiveType::Int)),
            ),
    );
    let (session, _) = world.build();

    let id = session.resolve_class(&predicate).unwrap().unwrap();
    assert_eq!(
        session.read().descriptors().class(id).sam_type,
        Some(Type::Function {
            receiver: None,
            parameters: vec![Type::class(ClassId::INT)],
            return_type: Box::new(Type::class(ClassId::BOOLEAN)),
        })
    );
}
