/// Schema files read by [`DataRegistry::from_directory`](crate::DataRegistry::from_directory)
/// unless configured otherwise.
pub const DEFAULT_MAX_SCHEMA_FILES: usize = 256;

/// Per-file size cap for directory-loaded schemas, in bytes.
pub const DEFAULT_MAX_SCHEMA_BYTES: usize = 256 * 1024;

/// How a [`DataRegistry`](crate::DataRegistry) compiles schemas and treats
/// permission or policy types it has no validator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Close every object schema so `data` may only carry declared properties.
    pub strict_mode: bool,
    /// Unregistered type names fail with `ValidationError::UnknownType`
    /// instead of passing unchecked.
    pub fail_on_unknown_type: bool,
    pub max_schema_files: usize,
    pub max_schema_bytes: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            strict_mode: false,
            fail_on_unknown_type: false,
            max_schema_files: DEFAULT_MAX_SCHEMA_FILES,
            max_schema_bytes: DEFAULT_MAX_SCHEMA_BYTES,
        }
    }
}
