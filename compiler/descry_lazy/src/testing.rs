//! Shared fixtures for unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use descry_descriptors::{ClassId, FunctionId, PropertyId};
use descry_ir::{FqName, Name, SharedInterner};
use descry_resolve::raw::RawClass;
use descry_resolve::{ClassFinder, ResolutionSession};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::body::{BodyResolver, BodyScope};
use crate::session::LazyResolveSession;
use crate::trace::DelegatingTrace;

#[derive(Default)]
pub(crate) struct MapFinder {
    classes: FxHashMap<FqName, Arc<RawClass>>,
    packages: FxHashSet<FqName>,
}

impl ClassFinder for MapFinder {
    fn find_class(&self, fq_name: &FqName) -> Option<Arc<RawClass>> {
        self.classes.get(fq_name).cloned()
    }

    fn package_exists(&self, fq_name: &FqName) -> bool {
        self.packages.contains(fq_name)
    }
}

pub(crate) struct Fixture {
    pub interner: SharedInterner,
    finder: MapFinder,
}

impl Fixture {
    pub fn new() -> Self {
        Fixture {
            interner: SharedInterner::new(),
            finder: MapFinder::default(),
        }
    }

    pub fn fq(&self, text: &str) -> FqName {
        FqName::parse(&self.interner, text).unwrap()
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Serve a foreign class, registering its package and every parent.
    pub fn add(&mut self, class: RawClass) {
        let mut package = class.outer.clone().unwrap_or_else(|| class.fq_name.clone()).parent();
        while let Some(current) = package {
            package = current.parent();
            self.finder.packages.insert(current);
        }
        self.finder.classes.insert(class.fq_name.clone(), Arc::new(class));
    }

    pub fn session(self) -> LazyResolveSession {
        let resolution = ResolutionSession::builder(Arc::new(self.finder))
            .with_interner(self.interner)
            .build();
        LazyResolveSession::new(Arc::new(resolution))
    }
}

/// Counts body-resolver calls and can be told to panic.
#[derive(Default)]
pub(crate) struct CountingBodies {
    pub function_bodies: AtomicUsize,
    pub initializers: AtomicUsize,
    pub panic_on_function: bool,
    pub seen: Mutex<Vec<FunctionId>>,
}

impl CountingBodies {
    pub fn function_bodies(&self) -> usize {
        self.function_bodies.load(Ordering::SeqCst)
    }
}

impl BodyResolver for CountingBodies {
    fn resolve_function_body(&self, _: BodyScope<'_>, function: FunctionId, _: &mut DelegatingTrace) {
        self.function_bodies.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(function);
        if self.panic_on_function {
            panic!("body checker crashed");
        }
    }

    fn resolve_property_initializer(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {
        self.initializers.fetch_add(1, Ordering::SeqCst);
    }

    fn resolve_property_delegate(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {}

    fn resolve_property_accessors(&self, _: BodyScope<'_>, _: PropertyId, _: &mut DelegatingTrace) {}

    fn resolve_delegation_specifier_list(&self, _: BodyScope<'_>, _: ClassId, _: &mut DelegatingTrace) {}

    fn resolve_anonymous_initializers(&self, _: BodyScope<'_>, _: ClassId, _: &mut DelegatingTrace) {}
}
