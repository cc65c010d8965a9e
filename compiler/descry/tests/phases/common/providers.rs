//! In-memory providers and the world that wires them into sessions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use descry::resolve::raw::{AnnotationOwnerKey, ClassProto, LocatedBinary, RawAnnotation, RawClass};
use descry::{
    ClassFinder, ExternalAnnotationStore, FqName, LazyResolveSession, MetadataReader, Name,
    ResolutionSession, ResolverConfig, SharedInterner,
};
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};

/// Serves raw classes from a map and counts every lookup.
#[derive(Default)]
pub struct CountingFinder {
    classes: FxHashMap<FqName, Arc<RawClass>>,
    packages: FxHashSet<FqName>,
    /// Answer each name only the first time it is asked for.
    serve_once: bool,
    served: Mutex<FxHashSet<FqName>>,
    lookups: AtomicUsize,
}

impl CountingFinder {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl ClassFinder for CountingFinder {
    fn find_class(&self, fq_name: &FqName) -> Option<Arc<RawClass>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let class = self.classes.get(fq_name)?;
        if self.serve_once && !self.served.lock().insert(fq_name.clone()) {
            return None;
        }
        Some(Arc::clone(class))
    }

    fn package_exists(&self, fq_name: &FqName) -> bool {
        self.packages.contains(fq_name)
    }
}

/// Compiled metadata kept in memory, one proto per class.
#[derive(Default)]
pub struct MemoryMetadata {
    protos: FxHashMap<FqName, ClassProto>,
}

impl MetadataReader for MemoryMetadata {
    fn find_binary(&self, fq_name: &FqName) -> Option<LocatedBinary> {
        self.protos.contains_key(fq_name).then(|| LocatedBinary {
            fq_name: fq_name.clone(),
            path: format!("memory:{}", self.protos.len()),
            is_nested: false,
        })
    }

    fn read_class_metadata(&self, binary: &LocatedBinary) -> Option<ClassProto> {
        self.protos.get(&binary.fq_name).cloned()
    }
}

#[derive(Default)]
pub struct MemoryAnnotations {
    annotations: FxHashMap<AnnotationOwnerKey, Vec<RawAnnotation>>,
}

impl ExternalAnnotationStore for MemoryAnnotations {
    fn find_external_annotations(&self, owner: &AnnotationOwnerKey) -> Vec<RawAnnotation> {
        self.annotations.get(owner).cloned().unwrap_or_default()
    }
}

/// Everything a session is built from.
pub struct World {
    pub interner: SharedInterner,
    finder: CountingFinder,
    metadata: MemoryMetadata,
    annotations: MemoryAnnotations,
    config: ResolverConfig,
}

impl World {
    pub fn new() -> Self {
        descry::init_tracing();
        World {
            interner: SharedInterner::new(),
            finder: CountingFinder::default(),
            metadata: MemoryMetadata::default(),
            annotations: MemoryAnnotations::default(),
            config: ResolverConfig::default(),
        }
    }

    /// A world whose finder answers each name once, then forgets it.
    pub fn flaky() -> Self {
        let mut world = World::new();
        world.finder.serve_once = true;
        world
    }

    pub fn fq(&self, text: &str) -> FqName {
        FqName::parse(&self.interner, text).unwrap()
    }

    pub fn name(&self, text: &str) -> Name {
        self.interner.intern(text)
    }

    /// Serve a raw class, registering its package and every parent.
    pub fn add(&mut self, class: RawClass) {
        let top_level = class.outer.clone().unwrap_or_else(|| class.fq_name.clone());
        let mut package = top_level.parent();
        while let Some(current) = package {
            package = current.parent();
            self.finder.packages.insert(current);
        }
        self.finder.classes.insert(class.fq_name.clone(), Arc::new(class));
    }

    pub fn add_proto(&mut self, fq_name: FqName, proto: ClassProto) {
        self.metadata.protos.insert(fq_name, proto);
    }

    pub fn annotate(&mut self, owner: AnnotationOwnerKey, annotation: RawAnnotation) {
        self.annotations
            .annotations
            .entry(owner)
            .or_default()
            .push(annotation);
    }

    #[must_use]
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> (Arc<ResolutionSession>, Arc<CountingFinder>) {
        let finder = Arc::new(self.finder);
        let session = ResolutionSession::builder(finder.clone())
            .with_metadata(Arc::new(self.metadata))
            .with_external_annotations(Arc::new(self.annotations))
            .with_config(self.config)
            .with_interner(self.interner)
            .build();
        (Arc::new(session), finder)
    }

    pub fn lazy(self) -> (LazyResolveSession, Arc<CountingFinder>) {
        let (session, finder) = self.build();
        (LazyResolveSession::new(session), finder)
    }
}
