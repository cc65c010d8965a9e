use std::sync::atomic::{AtomicUsize, Ordering};

use descry_descriptors::{
    AnnotationArgument, ClassDescriptor, ClassKind, ConstantValue, Container, Modality,
    PrimitiveType, Type, TypeProjection, Visibility,
};
use descry_diagnostic::ErrorCode;
use descry_ir::Name;
use pretty_assertions::assert_eq;
use rustc_hash::{FxHashMap, FxHashSet};

use super::*;
use crate::config::CURRENT_ABI_VERSION;
use crate::providers::SilentErrorReporter;
use crate::raw::{
    ClassFlags, ClassProto, LocatedBinary, MemberFlags, NameTable, ProtoFunction, ProtoType, RawClass,
    RawConstant, RawField, RawMethod, RawType,
};

#[derive(Default)]
struct MapFinder {
    classes: FxHashMap<FqName, Arc<RawClass>>,
    packages: FxHashSet<FqName>,
    lookups: AtomicUsize,
}

impl MapFinder {
    fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ClassFinder for MapFinder {
    fn find_class(&self, fq_name: &FqName) -> Option<Arc<RawClass>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.classes.get(fq_name).cloned()
    }

    fn package_exists(&self, fq_name: &FqName) -> bool {
        self.packages.contains(fq_name)
    }
}

#[derive(Default)]
struct MapMetadata {
    protos: FxHashMap<FqName, ClassProto>,
}

impl MetadataReader for MapMetadata {
    fn find_binary(&self, fq_name: &FqName) -> Option<LocatedBinary> {
        self.protos.contains_key(fq_name).then(|| LocatedBinary {
            fq_name: fq_name.clone(),
            path: format!("{}.bin", fq_name.len()),
            is_nested: false,
        })
    }

    fn read_class_metadata(&self, binary: &LocatedBinary) -> Option<ClassProto> {
        self.protos.get(&binary.fq_name).cloned()
    }
}

struct World {
    interner: SharedInterner,
    finder: MapFinder,
    metadata: MapMetadata,
}

impl World {
    fn new() -> Self {
        World {
            interner: SharedInterner::new(),
            finder: MapFinder::default(),
            metadata: MapMetadata::default(),
        }
    }

    fn fq(&self, text: &str) -> FqName {
        FqName::parse(&self.interner, text).unwrap()
    }

    fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    fn add(&mut self, class: RawClass) {
        self.finder.classes.insert(class.fq_name.clone(), Arc::new(class));
    }

    /// Serve `class` when `requested` is asked for, whatever it reports.
    fn add_as(&mut self, requested: FqName, class: RawClass) {
        self.finder.classes.insert(requested, Arc::new(class));
    }

    fn add_proto(&mut self, fq_name: FqName, proto: ClassProto) {
        self.metadata.protos.insert(fq_name, proto);
    }

    fn session(self) -> (ResolutionSession, Arc<MapFinder>) {
        let finder = Arc::new(self.finder);
        let session = ResolutionSession::builder(finder.clone())
            .with_metadata(Arc::new(self.metadata))
            .with_interner(self.interner)
            .build();
        (session, finder)
    }
}

fn resolved(session: &ResolutionSession, fq_name: &FqName) -> ClassId {
    session.resolve_class(fq_name).unwrap().unwrap()
}

#[test]
fn class_is_resolved_once_and_cached() {
    let mut world = World::new();
    let foo = world.fq("pkg.Foo");
    world.add(RawClass::new(foo.clone()));
    let (session, finder) = world.session();

    let first = resolved(&session, &foo);
    let second = resolved(&session, &foo);
    assert_eq!(first, second);
    assert_eq!(finder.lookups(), 1);

    let state = session.read();
    let class = state.descriptors().class(first);
    assert_eq!(class.origin, Origin::Foreign);
    assert_eq!(class.kind, ClassKind::Class);
    assert_eq!(class.supertypes, vec![Type::class(ClassId::ANY)]);
    assert!(matches!(class.container, Container::Package(_)));
}

#[test]
fn missing_class_is_cached_negatively() {
    let world = World::new();
    let missing = world.fq("pkg.Missing");
    let (session, finder) = world.session();

    assert_eq!(session.resolve_class(&missing).unwrap(), None);
    assert_eq!(session.resolve_class(&missing).unwrap(), None);
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.cached(&missing), CacheLookup::Unresolvable);
}

#[test]
fn settled_names_resolve_while_readers_hold_the_state() {
    let mut world = World::new();
    let foo = world.fq("pkg.Foo");
    let missing = world.fq("pkg.Missing");
    let entry = world.fq("lang.Map.Entry");
    world.add(RawClass::new(foo.clone()));
    let (session, finder) = world.session();
    let id = resolved(&session, &foo);
    assert_eq!(session.resolve_class(&missing).unwrap(), None);

    // A pass would need the write lock and block on this reader.
    let reader = session.read();
    assert_eq!(session.resolve_class(&foo).unwrap(), Some(id));
    assert_eq!(session.resolve_class(&missing).unwrap(), None);
    assert_eq!(session.resolve_class(&entry).unwrap(), Some(ClassId::MAP_ENTRY));
    drop(reader);
    assert_eq!(finder.lookups(), 2);
}

#[test]
fn trait_impl_helpers_are_never_classes() {
    let world = World::new();
    let helper = world.fq("pkg.Foo$$TImpl");
    let (session, finder) = world.session();

    assert_eq!(session.resolve_class(&helper).unwrap(), None);
    assert_eq!(finder.lookups(), 0);
}

#[test]
fn builtin_names_navigate_nested_scopes() {
    let world = World::new();
    let entry = world.fq("lang.Map.Entry");
    let missing = world.fq("lang.Map.Missing");
    let (session, finder) = world.session();

    assert_eq!(session.resolve_class(&entry).unwrap(), Some(ClassId::MAP_ENTRY));
    assert_eq!(session.resolve_class(&missing).unwrap(), None);
    assert_eq!(finder.lookups(), 0);
}

#[test]
fn enum_gets_class_object_with_synthetic_members() {
    let mut world = World::new();
    let color = world.fq("pkg.Color");
    let string = world.fq("java.lang.String");
    world.add(
        RawClass::new(color.clone())
            .with_flags(ClassFlags::ENUM | ClassFlags::FINAL)
            .with_field(
                RawField::new(world.name("RED"), RawType::class(color.clone())).with_flags(
                    MemberFlags::STATIC | MemberFlags::FINAL | MemberFlags::ENUM_CONSTANT,
                ),
            )
            .with_method(
                RawMethod::new(world.name("values"), RawType::array(RawType::class(color.clone())))
                    .with_flags(MemberFlags::STATIC),
            )
            .with_method(
                RawMethod::new(world.name("valueOf"), RawType::class(color.clone()))
                    .with_flags(MemberFlags::STATIC)
                    .with_parameter(Some(world.name("name")), RawType::class(string)),
            )
            .with_method(RawMethod::new(
                world.name("shade"),
                RawType::Primitive(PrimitiveType::Int),
            )),
    );
    let class_object_name = world.fq("pkg.Color.ClassObject$");
    let red = world.name("RED");
    let shade = world.name("shade");
    let values = world.name("values");
    let value_of = world.name("valueOf");
    let (session, _) = world.session();

    let id = resolved(&session, &color);
    let class_object = session.read().descriptors().class(id).class_object.unwrap();
    assert_eq!(
        session
            .resolve_class_with(&class_object_name, SearchRule::IncludeNative)
            .unwrap(),
        Some(class_object)
    );

    let own = session.class_members(id).unwrap();
    let object = session.class_members(class_object).unwrap();
    let state = session.read();
    let descriptors = state.descriptors();
    let names = |functions: &[descry_descriptors::FunctionId]| -> Vec<Name> {
        functions.iter().map(|&f| descriptors.function(f).name).collect()
    };
    assert_eq!(names(&own.functions), vec![shade]);
    assert!(own.properties.is_empty());
    assert_eq!(names(&object.functions), vec![values, value_of]);

    let entry = descriptors.nested_by_name(class_object, red).unwrap();
    assert_eq!(descriptors.class(entry).kind, ClassKind::EnumEntry);
    assert_eq!(descriptors.class(entry).supertypes, vec![Type::class(id)]);
}

#[test]
fn unresolved_supertype_keeps_its_slot() {
    let mut world = World::new();
    let sub = world.fq("pkg.Sub");
    let gone = world.fq("pkg.Gone");
    world.add(RawClass::new(sub.clone()).with_supertype(gone));
    let (session, _) = world.session();

    let id = resolved(&session, &sub);
    let supertypes = session.read().descriptors().class(id).supertypes.clone();
    assert_eq!(supertypes.len(), 1);
    assert!(supertypes[0].is_error());

    let diagnostics = session.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::E2003);
}

#[test]
fn cyclic_supertypes_terminate() {
    let mut world = World::new();
    let a = world.fq("pkg.A");
    let b = world.fq("pkg.B");
    world.add(RawClass::new(a.clone()).with_supertype(b.clone()));
    world.add(RawClass::new(b.clone()).with_supertype(a.clone()));
    let (session, finder) = world.session();

    let a_id = resolved(&session, &a);
    let b_id = resolved(&session, &b);
    let state = session.read();
    assert_eq!(state.descriptors().class(a_id).supertypes, vec![Type::class(b_id)]);
    assert_eq!(state.descriptors().class(b_id).supertypes, vec![Type::class(a_id)]);
    assert_eq!(finder.lookups(), 2);
}

#[test]
fn generic_signature_binds_type_parameters() {
    let mut world = World::new();
    let boxed = world.fq("pkg.Box");
    world.add(
        RawClass::new(boxed.clone())
            .with_signature("<T:Ljava/lang/Object;>Ljava/lang/Object;Ljava/lang/Comparable<TT;>;"),
    );
    let (session, _) = world.session();

    let id = resolved(&session, &boxed);
    let state = session.read();
    let class = state.descriptors().class(id);
    assert_eq!(class.type_parameters.len(), 1);
    let param = class.type_parameters[0];
    let descriptor = state.descriptors().type_param(param);
    assert!(descriptor.initialized);
    assert_eq!(descriptor.upper_bounds, vec![Type::class(ClassId::ANY).nullable()]);
    assert_eq!(
        class.supertypes,
        vec![Type::generic(
            ClassId::COMPARABLE,
            vec![TypeProjection::invariant(Type::parameter(param))]
        )]
    );
}

#[test]
fn self_bounded_type_parameter_binds_its_own_class() {
    let mut world = World::new();
    let node = world.fq("pkg.Node");
    world.add(RawClass::new(node.clone()).with_signature("<T:Lpkg/Node<TT;>;>Ljava/lang/Object;"));
    let (session, _) = world.session();

    let id = resolved(&session, &node);
    let state = session.read();
    let param = state.descriptors().class(id).type_parameters[0];
    assert_eq!(
        state.descriptors().type_param(param).upper_bounds,
        vec![Type::generic(id, vec![TypeProjection::invariant(Type::parameter(param))])]
    );
}

#[test]
fn sibling_type_parameter_bounds_bind_to_placeholders() {
    let mut world = World::new();
    let pair = world.fq("pkg.Pair");
    world.add(RawClass::new(pair.clone()).with_signature("<K:Ljava/lang/Object;V:TK;>Ljava/lang/Object;"));
    let (session, _) = world.session();

    let id = resolved(&session, &pair);
    let state = session.read();
    let params = &state.descriptors().class(id).type_parameters;
    assert_eq!(params.len(), 2);
    let (k, v) = (params[0], params[1]);
    assert_eq!(
        state.descriptors().type_param(v).upper_bounds,
        vec![Type::parameter(k)]
    );
    assert!(state.descriptors().type_param(k).initialized);
}

/// `pkg.Ann` with a single `int value()` element, and `pkg.Foo` carrying
/// the annotation built by `annotate`.
fn annotation_world(annotate: impl FnOnce(&World, FqName) -> RawAnnotation) -> (World, FqName, FqName) {
    let mut world = World::new();
    let ann = world.fq("pkg.Ann");
    let foo = world.fq("pkg.Foo");
    world.add(
        RawClass::new(ann.clone())
            .with_flags(ClassFlags::ANNOTATION | ClassFlags::INTERFACE)
            .with_method(
                RawMethod::new(world.name("value"), RawType::Primitive(PrimitiveType::Int))
                    .with_flags(MemberFlags::ABSTRACT),
            ),
    );
    let annotation = annotate(&world, ann.clone());
    world.add(RawClass::new(foo.clone()).with_annotation(annotation));
    (world, ann, foo)
}

#[test]
fn annotation_arguments_bind_to_the_sole_constructor() {
    let (world, ann, foo) = annotation_world(|world, ann| {
        RawAnnotation::new(ann)
            .with_argument(None, RawConstant::Int(5))
            .with_argument(Some(world.name("unknown")), RawConstant::Int(1))
    });
    let value = world.name("value");
    let (session, _) = world.session();

    let foo_id = resolved(&session, &foo);
    let ann_id = resolved(&session, &ann);
    let state = session.read();
    let annotations = &state.descriptors().class(foo_id).annotations;
    assert_eq!(annotations.len(), 1);
    let descriptor = state.descriptors().annotation(annotations[0]);
    assert_eq!(descriptor.annotation_type, Some(Type::class(ann_id)));
    assert_eq!(
        descriptor.arguments,
        vec![AnnotationArgument {
            parameter: value,
            index: 0,
            value: ConstantValue::Int(5),
        }]
    );
    assert_eq!(state.descriptors().class(ann_id).kind, ClassKind::Annotation);
    assert_eq!(
        state.descriptors().class(ann_id).supertypes,
        vec![Type::class(ClassId::ANNOTATION)]
    );
}

#[test]
fn null_argument_drops_the_occurrence() {
    let (world, _, foo) =
        annotation_world(|_, ann| RawAnnotation::new(ann).with_null_argument(None));
    let (session, _) = world.session();

    let foo_id = resolved(&session, &foo);
    assert!(session.read().descriptors().class(foo_id).annotations.is_empty());
}

#[test]
fn unmatched_null_argument_still_drops_the_occurrence() {
    let (world, _, foo) = annotation_world(|world, ann| {
        RawAnnotation::new(ann).with_null_argument(Some(world.name("other")))
    });
    let (session, _) = world.session();

    let foo_id = resolved(&session, &foo);
    assert!(session.read().descriptors().class(foo_id).annotations.is_empty());
}

#[test]
fn internal_markers_are_probed_not_resolved() {
    let mut world = World::new();
    let foo = world.fq("pkg.Foo");
    let marker = RawAnnotation::new(world.fq("lang.internal.NotNull"));
    world.add(RawClass::new(foo.clone()).with_annotation(marker.clone()));
    let (session, _) = world.session();

    let id = resolved(&session, &foo);
    assert!(session.read().descriptors().class(id).annotations.is_empty());

    let key = AnnotationOwnerKey::Class(foo);
    assert!(session.has_not_null_annotation(&key, &[marker]));
    assert!(!session.has_readonly_annotation(&key, &[]));
}

#[test]
fn platform_deprecation_uses_the_builtin_annotation() {
    let mut world = World::new();
    let foo = world.fq("pkg.Foo");
    let deprecated = RawAnnotation::new(world.fq("java.lang.Deprecated"));
    world.add(RawClass::new(foo.clone()).with_annotation(deprecated));
    let (session, _) = world.session();

    let id = resolved(&session, &foo);
    let state = session.read();
    let annotations = &state.descriptors().class(id).annotations;
    assert_eq!(annotations.len(), 1);
    let descriptor = state.descriptors().annotation(annotations[0]);
    assert_eq!(descriptor.annotation_class(), Some(ClassId::DEPRECATED));
    assert_eq!(
        descriptor.arguments[0].value.as_str(),
        Some("Deprecated in Java")
    );
}

#[test]
fn native_classes_follow_the_search_rule() {
    let world = World::new();
    let native = world.fq("pkg.Native");
    let package = world.fq("pkg");
    let (session, finder) = world.session();

    let id = session
        .with_resolver(&SilentErrorReporter, |r| {
            let package = r.ensure_package(&package);
            let name = native.short_name().unwrap_or_default();
            let id = r.descriptors_mut().alloc_class(ClassDescriptor::new(
                name,
                native.to_unsafe(),
                Container::Package(package),
                ClassKind::Class,
                Origin::Native,
            ));
            assert!(r.register_native_class(native.clone(), id));
            Ok(id)
        })
        .unwrap();

    assert!(matches!(
        session.resolve_class(&native),
        Err(ResolveError::FoundNative { .. })
    ));
    assert_eq!(
        session.resolve_class_with(&native, SearchRule::IgnoreIfNative).unwrap(),
        None
    );
    assert_eq!(
        session.resolve_class_with(&native, SearchRule::IncludeNative).unwrap(),
        Some(id)
    );
    assert_eq!(finder.lookups(), 0);
}

#[test]
fn fatal_error_rolls_back_the_pass() {
    let mut world = World::new();
    let holder = world.fq("pkg.Holder");
    let fine = world.fq("pkg.Fine");
    let bad = world.fq("pkg.Bad");
    world.add(
        RawClass::new(holder.clone())
            .with_supertype(fine.clone())
            .with_supertype(bad.clone()),
    );
    world.add(RawClass::new(fine.clone()));
    let other = world.fq("pkg.Other");
    world.add_as(bad, RawClass::new(other));
    let (session, _) = world.session();
    let classes_before = session.read().descriptors().class_count();

    let err = session.resolve_class(&holder).unwrap_err();
    assert!(matches!(err, ResolveError::NameMismatch { .. }));
    assert_eq!(session.cached(&holder), CacheLookup::Unknown);
    assert_eq!(session.cached(&fine), CacheLookup::Unknown);
    assert_eq!(session.read().descriptors().class_count(), classes_before);

    // The surviving class resolves normally afterwards.
    assert!(session.resolve_class(&fine).unwrap().is_some());
}

#[test]
fn nested_class_without_outer_is_fatal() {
    let mut world = World::new();
    let outer = world.fq("pkg.Outer");
    let inner = world.fq("pkg.Outer.Inner");
    world.add(RawClass::new(inner.clone()).nested_in(outer));
    let (session, _) = world.session();

    assert!(matches!(
        session.resolve_class(&inner),
        Err(ResolveError::ParentUnresolved { .. })
    ));
}

#[test]
fn functional_interface_gets_a_sam_type() {
    let mut world = World::new();
    let action = world.fq("pkg.Action");
    let pair = world.fq("pkg.Pair");
    let string = world.fq("java.lang.String");
    let object = world.fq("java.lang.Object");
    world.add(
        RawClass::new(action.clone())
            .with_flags(ClassFlags::INTERFACE | ClassFlags::ABSTRACT)
            .with_method(
                RawMethod::new(world.name("run"), RawType::Void)
                    .with_flags(MemberFlags::ABSTRACT)
                    .with_parameter(Some(world.name("input")), RawType::class(string)),
            )
            .with_method(
                RawMethod::new(world.name("equals"), RawType::Primitive(PrimitiveType::Boolean))
                    .with_flags(MemberFlags::ABSTRACT)
                    .with_parameter(None, RawType::class(object)),
            ),
    );
    world.add(
        RawClass::new(pair.clone())
            .with_flags(ClassFlags::INTERFACE | ClassFlags::ABSTRACT)
            .with_method(RawMethod::new(world.name("first"), RawType::Void).with_flags(MemberFlags::ABSTRACT))
            .with_method(RawMethod::new(world.name("second"), RawType::Void).with_flags(MemberFlags::ABSTRACT)),
    );
    let (session, _) = world.session();

    let action_id = resolved(&session, &action);
    let pair_id = resolved(&session, &pair);
    let state = session.read();
    assert_eq!(
        state.descriptors().class(action_id).sam_type,
        Some(Type::Function {
            receiver: None,
            parameters: vec![Type::class(ClassId::STRING).nullable()],
            return_type: Box::new(Type::class(ClassId::UNIT)),
        })
    );
    assert_eq!(state.descriptors().class(pair_id).sam_type, None);
}

#[test]
fn override_with_incompatible_return_is_recorded() {
    let mut world = World::new();
    let base = world.fq("pkg.Base");
    let derived = world.fq("pkg.Derived");
    let string = world.fq("java.lang.String");
    world.add(RawClass::new(base.clone()).with_method(RawMethod::new(world.name("get"), RawType::class(string))));
    world.add(
        RawClass::new(derived.clone())
            .with_supertype(base.clone())
            .with_method(RawMethod::new(world.name("get"), RawType::Primitive(PrimitiveType::Int))),
    );
    let (session, _) = world.session();

    let base_id = resolved(&session, &base);
    let derived_id = resolved(&session, &derived);
    let base_members = session.class_members(base_id).unwrap();
    let derived_members = session.class_members(derived_id).unwrap();

    let state = session.read();
    let function = state.descriptors().function(derived_members.functions[0]);
    assert_eq!(function.overridden, vec![base_members.functions[0]]);
    assert_eq!(function.signature_errors.len(), 1);
    assert_eq!(function.modality, Modality::Open);
    assert_eq!(derived_members.constructors.len(), 1);
}

fn compiled_proto(abi_version: u32) -> ClassProto {
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

#[test]
fn compiled_metadata_is_preferred() {
    let mut world = World::new();
    let compiled = world.fq("pkg.Compiled");
    world.add(RawClass::new(compiled.clone()));
    let proto = compiled_proto(CURRENT_ABI_VERSION);
    world.add_proto(compiled.clone(), proto);
    let (session, finder) = world.session();

    let id = resolved(&session, &compiled);
    assert_eq!(finder.lookups(), 0);
    assert_eq!(session.read().descriptors().class(id).origin, Origin::Compiled);

    let members = session.class_members(id).unwrap();
    let state = session.read();
    let size = state.descriptors().function(members.functions[0]);
    assert_eq!(size.return_type, Type::class(ClassId::INT));
}

#[test]
fn incompatible_metadata_is_reported_and_ignored() {
    let mut world = World::new();
    let compiled = world.fq("pkg.Compiled");
    world.add(RawClass::new(compiled.clone()));
    let proto = compiled_proto(CURRENT_ABI_VERSION - 1);
    world.add_proto(compiled.clone(), proto);
    let (session, finder) = world.session();

    let id = resolved(&session, &compiled);
    assert_eq!(finder.lookups(), 1);
    assert_eq!(session.read().descriptors().class(id).origin, Origin::Foreign);

    let diagnostics = session.take_diagnostics();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].code, ErrorCode::E1001);
}

#[test]
fn packages_are_confirmed_by_the_finder() {
    let mut world = World::new();
    let known = world.fq("pkg.known");
    let unknown = world.fq("pkg.unknown");
    world.finder.packages.insert(known.clone());
    let (session, _) = world.session();

    let package = session.resolve_package(&known).unwrap();
    assert_eq!(session.resolve_package(&known), Some(package));
    assert_eq!(session.resolve_package(&unknown), None);
}
