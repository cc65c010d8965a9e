//! Resolver configuration.

/// Metadata version this resolver reads.
pub const CURRENT_ABI_VERSION: u32 = 6;

/// Settings fixed for the lifetime of a resolution session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Compiled metadata with any other version is reported and ignored.
    pub expected_abi_version: u32,
    /// Consult the external annotation store.
    pub use_external_annotations: bool,
    /// Try compiled metadata before raw declarations.
    pub prefer_compiled_metadata: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            expected_abi_version: CURRENT_ABI_VERSION,
            use_external_annotations: true,
            prefer_compiled_metadata: true,
        }
    }
}

impl ResolverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_expected_abi_version(mut self, version: u32) -> Self {
        self.expected_abi_version = version;
        self
    }

    #[must_use]
    pub fn with_external_annotations(mut self, enabled: bool) -> Self {
        self.use_external_annotations = enabled;
        self
    }

    #[must_use]
    pub fn with_compiled_metadata(mut self, enabled: bool) -> Self {
        self.prefer_compiled_metadata = enabled;
        self
    }
}
