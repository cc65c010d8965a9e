//! Collaborators the resolver consumes.
//!
//! All of them are synchronous and side-effect free: the same query always
//! yields the same answer for the lifetime of a session.

use std::sync::Arc;

use descry_ir::FqName;
use parking_lot::Mutex;

use crate::raw::{AnnotationOwnerKey, ClassProto, LocatedBinary, RawAnnotation, RawClass};

/// Finds raw foreign declarations.
pub trait ClassFinder: Send + Sync {
    fn find_class(&self, fq_name: &FqName) -> Option<Arc<RawClass>>;

    fn package_exists(&self, fq_name: &FqName) -> bool;
}

/// Locates and reads compiler-produced metadata.
pub trait MetadataReader: Send + Sync {
    fn find_binary(&self, fq_name: &FqName) -> Option<LocatedBinary>;

    fn read_class_metadata(&self, binary: &LocatedBinary) -> Option<ClassProto>;
}

/// Annotations attached to foreign declarations out of band.
pub trait ExternalAnnotationStore: Send + Sync {
    fn find_external_annotations(&self, owner: &AnnotationOwnerKey) -> Vec<RawAnnotation>;
}

/// Receives problems that the requesting context decides how to surface.
pub trait ErrorReporter {
    fn report_incompatible_abi_version(&self, class: &FqName, actual: u32, expected: u32);
}

/// Drops every report. Used for speculative nested resolution, whose
/// problems are already reported by the outer request.
#[derive(Clone, Copy, Debug, Default)]
pub struct SilentErrorReporter;

impl ErrorReporter for SilentErrorReporter {
    fn report_incompatible_abi_version(&self, _class: &FqName, _actual: u32, _expected: u32) {}
}

/// A report held until the requesting context turns it into a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AbiVersionReport {
    pub class: FqName,
    pub actual: u32,
    pub expected: u32,
}

/// Records reports in order.
#[derive(Debug, Default)]
pub struct CollectingErrorReporter {
    reports: Mutex<Vec<AbiVersionReport>>,
}

impl CollectingErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<AbiVersionReport> {
        std::mem::take(&mut *self.reports.lock())
    }
}

impl ErrorReporter for CollectingErrorReporter {
    fn report_incompatible_abi_version(&self, class: &FqName, actual: u32, expected: u32) {
        self.reports.lock().push(AbiVersionReport {
            class: class.clone(),
            actual,
            expected,
        });
    }
}

/// The collaborator set of one session, wired once at construction.
#[derive(Clone)]
pub struct Providers {
    pub class_finder: Arc<dyn ClassFinder>,
    pub metadata: Option<Arc<dyn MetadataReader>>,
    pub external_annotations: Option<Arc<dyn ExternalAnnotationStore>>,
}

impl Providers {
    pub fn new(class_finder: Arc<dyn ClassFinder>) -> Self {
        Providers {
            class_finder,
            metadata: None,
            external_annotations: None,
        }
    }

    #[must_use]
    pub fn with_metadata(mut self, metadata: Arc<dyn MetadataReader>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn with_external_annotations(mut self, store: Arc<dyn ExternalAnnotationStore>) -> Self {
        self.external_annotations = Some(store);
        self
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field("metadata", &self.metadata.is_some())
            .field("external_annotations", &self.external_annotations.is_some())
            .finish_non_exhaustive()
    }
}
