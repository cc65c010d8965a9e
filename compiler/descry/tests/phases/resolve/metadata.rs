use descry::descriptors::{Modality, Origin, Visibility};
use descry::resolve::raw::{ClassProto, NameTable, ProtoFunction, ProtoType, RawClass};
use descry::resolve::CURRENT_ABI_VERSION;
use descry::{ClassId, ErrorCode, ResolverConfig, Type};
use pretty_assertions::assert_eq;

use crate::common::World;

/// `class Compiled { fun size(): Int }` as compiled metadata.
fn compiled(abi_version: u32) -> ClassProto {
    let mut names = NameTable::new();
    let size = names.add_simple("size");
    let int = names.add_qualified("lang.Int");
    let mut proto = ClassProto::new(abi_version, names, "pkg.Compiled");
    proto.functions.push(ProtoFunction {
        name: size,
        modality: Modality::Final,
        visibility: Visibility::Public,
        type_parameters: Vec::new(),
        receiver: None,
        value_parameters: Vec::new(),
        return_type: ProtoType::class(int),
    });
    proto
}

fn world_with(abi_version: u32) -> World {
    let mut world = World::new();
    let name = world.fq("pkg.Compiled");
    world.add(RawClass::new(name.clone()));
    world.add_proto(name, compiled(abi_version));
    world
}

#[test]
fn compiled_metadata_wins_over_raw_declarations() {
    let world = world_with(CURRENT_ABI_VERSION);
    let name = world.fq("pkg.Compiled");
    let (session, finder) = world.build();

    let id = session.resolve_class(&name).unwrap().unwrap();
    assert_eq!(finder.lookups(), 0);
    assert_eq!(session.read().descriptors().class(id).origin, Origin::Compiled);

    let members = session.class_members(id).unwrap();
    let state = session.read();
    assert_eq!(
        state.descriptors().function(members.functions[0]).return_type,
        Type::class(ClassId::INT)
    );
}

#[test]
fn stale_metadata_is_reported_once_and_skipped() {
    let world = world_with(CURRENT_ABI_VERSION - 1);
    let name = world.fq("pkg.Compiled");
    let (session, finder) = world.build();

    let id = session.resolve_class(&name).unwrap().unwrap();
    assert_eq!(session.resolve_class(&name).unwrap(), Some(id));
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.read().descriptors().class(id).origin, Origin::Foreign);

    let codes: Vec<ErrorCode> = session
        .take_diagnostics()
        .iter()
        .map(|diagnostic| diagnostic.code)
        .collect();
    assert_eq!(codes, vec![ErrorCode::E1001]);
}

#[test]
fn metadata_can_be_ignored() {
    let world = world_with(CURRENT_ABI_VERSION)
        .with_config(ResolverConfig::new().with_compiled_metadata(false));
    let name = world.fq("pkg.Compiled");
    let (session, finder) = world.build();

    let id = session.resolve_class(&name).unwrap().unwrap();
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.read().descriptors().class(id).origin, Origin::Foreign);
}
