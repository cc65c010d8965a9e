use descry::resolve::raw::{ClassFlags, RawClass};
use descry::resolve::CacheLookup;
use descry::{ResolveError, SearchRule};
use pretty_assertions::assert_eq;

use crate::common::World;

#[test]
fn resolving_twice_returns_the_same_descriptor() {
    let mut world = World::new();
    let foo = world.fq("pkg.Foo");
    world.add(RawClass::new(foo.clone()));
    let (session, finder) = world.build();

    let first = session.resolve_class(&foo).unwrap();
    let second = session.resolve_class(&foo).unwrap();
    assert!(first.is_some());
    assert_eq!(first, second);
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.cached(&foo), CacheLookup::Resolved(first.unwrap()));
}

#[test]
fn misses_are_remembered() {
    let world = World::new();
    let missing = world.fq("pkg.Missing");
    let (session, finder) = world.build();

    for _ in 0..3 {
        assert_eq!(session.resolve_class(&missing).unwrap(), None);
    }
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.cached(&missing), CacheLookup::Unresolvable);
}

#[test]
fn conflicting_answers_roll_the_pass_back() {
    // Resolving `Inner` resolves its outer class, whose supertype is
    // `Inner` again. The finder answers only once, so the nested request
    // caches `Inner` as missing while the outer one is still building it.
    let mut world = World::flaky();
    let outer = world.fq("pkg.Outer");
    let inner = world.fq("pkg.Outer.Inner");
    world.add(RawClass::new(outer.clone()).with_supertype(inner.clone()));
    world.add(RawClass::new(inner.clone()).nested_in(outer.clone()));
    let (session, _) = world.build();
    let classes_before = session.read().descriptors().class_count();

    let err = session.resolve_class(&inner).unwrap_err();
    assert!(matches!(err, ResolveError::CacheRewrite { .. }), "{err}");
    assert_eq!(session.cached(&inner), CacheLookup::Unknown);
    assert_eq!(session.cached(&outer), CacheLookup::Unknown);
    assert_eq!(session.read().descriptors().class_count(), classes_before);
    assert!(session.take_diagnostics().is_empty());
}

#[test]
fn every_name_spelling_hits_one_entry() {
    let mut world = World::new();
    let color = world.fq("pkg.Color");
    world.add(RawClass::new(color.clone()).with_flags(ClassFlags::ENUM));
    let spelled = world.fq("pkg.Color.ClassObject$");
    let (session, finder) = world.build();

    session.resolve_class(&color).unwrap();
    let CacheLookup::Resolved(class_object) = session.cached(&spelled) else {
        panic!("class object was not cached with its owner");
    };
    assert_eq!(
        session
            .resolve_class_with(&spelled, SearchRule::IncludeNative)
            .unwrap(),
        Some(class_object)
    );
    assert_eq!(finder.lookups(), 1);
}
