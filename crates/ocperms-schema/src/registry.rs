use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::RegistryConfig;
use crate::descriptor::{Policy, TypeDescriptor};
use crate::document::{RequestDocument, ResponseDocument};
use crate::error::{Result, SchemaError, ValidationError, ValueKind};
use crate::grant::GrantedPermission;
use crate::path::FieldPath;
use crate::request::PermissionRequest;
use crate::strict::close_object_schemas;
use crate::v1::{GrantedPermissionsResponseV1, PermissionV1, PermissionsRequestV1, PolicyV1};
use crate::validator::{DataValidator, SchemaDataValidator};

const SCHEMA_SUFFIX: &str = ".schema.json";

/// Which `data` payload a validator applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataKind {
    Permission,
    Policy,
}

impl DataKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Permission => "permission",
            Self::Policy => "policy",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type ValidatorTable = HashMap<String, Box<dyn DataValidator>>;

/// Type-name keyed registry of `data` validators.
///
/// Structural validation treats `data` as an opaque mapping. The registry is
/// the second pass: it walks an already-validated record and checks each
/// permission and policy payload against the validator registered for its
/// type name.
pub struct DataRegistry {
    permissions: ValidatorTable,
    policies: ValidatorTable,
    config: RegistryConfig,
}

impl DataRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            permissions: HashMap::new(),
            policies: HashMap::new(),
            config,
        }
    }

    /// Register a JSON Schema for a type from a JSON string.
    pub fn register(&mut self, kind: DataKind, type_name: &str, schema_json: &str) -> Result<()> {
        let schema: Value = serde_json::from_str(schema_json)?;
        self.register_value(kind, type_name, &schema)
    }

    /// Register a JSON Schema for a type from a JSON value.
    pub fn register_value(&mut self, kind: DataKind, type_name: &str, schema: &Value) -> Result<()> {
        let mut schema_to_compile = schema.clone();
        if self.config.strict_mode {
            close_object_schemas(&mut schema_to_compile);
        }

        let compiled = SchemaDataValidator::compile(&schema_to_compile)?;
        self.register_validator(kind, type_name, compiled);
        Ok(())
    }

    /// Register hand-written validation for a type.
    pub fn register_validator(
        &mut self,
        kind: DataKind,
        type_name: &str,
        validator: impl DataValidator + 'static,
    ) {
        self.table_mut(kind)
            .insert(type_name.to_string(), Box::new(validator));
    }

    /// Load schemas from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load `permission.<type>.schema.json` and `policy.<type>.schema.json`
    /// files from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        let mut loaded_schema_count = 0usize;

        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name();
            let file_name = file_name.to_string_lossy();
            let is_schema_file = file_name.ends_with(SCHEMA_SUFFIX);
            let entry_path = entry.path();
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();

            if file_type.is_symlink() {
                if is_schema_file {
                    return Err(SchemaError::LoadFailed(format!(
                        "refusing to load schema symlink: {file_name}"
                    )));
                }
                continue;
            }
            if !file_type.is_file() || !is_schema_file {
                continue;
            }

            let Some((kind, type_name)) = parse_schema_file_name(&file_name) else {
                return Err(SchemaError::LoadFailed(format!(
                    "unrecognized schema filename: {file_name}"
                )));
            };

            loaded_schema_count = loaded_schema_count.saturating_add(1);
            if loaded_schema_count > registry.config.max_schema_files {
                return Err(SchemaError::LoadFailed(format!(
                    "schema count exceeds configured max ({}): {}",
                    registry.config.max_schema_files, loaded_schema_count
                )));
            }

            let content = read_bounded(&entry_path, &path_metadata, &registry.config)?;
            registry.register(kind, type_name, &content)?;
            debug!(kind = %kind, type_name, "registered data schema");
        }

        Ok(registry)
    }

    /// Load from embedded `(kind, type name, schema)` triples.
    pub fn from_embedded(schemas: &[(DataKind, &str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (kind, type_name, schema) in schemas {
            registry.register(*kind, type_name, schema)?;
        }
        Ok(registry)
    }

    /// Check if a type has a registered validator.
    pub fn has_validator(&self, kind: DataKind, type_name: &str) -> bool {
        self.table(kind).contains_key(type_name)
    }

    /// Registered type names for `kind`, sorted.
    pub fn types(&self, kind: DataKind) -> Vec<&str> {
        let mut names: Vec<&str> = self.table(kind).keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Check the permission and policy data of one request.
    pub fn check_permission_request(
        &self,
        request: &PermissionRequest,
    ) -> std::result::Result<(), ValidationError> {
        self.check_request_at(request, &FieldPath::root())
    }

    /// Check every request of a batch, reporting the first failing element.
    pub fn check_permissions_request(
        &self,
        requests: &[PermissionRequest],
    ) -> std::result::Result<(), ValidationError> {
        each_element(requests, &FieldPath::root(), |request, path| {
            self.check_request_at(request, path)
        })
    }

    /// Check the echoed request of a grant, when present.
    pub fn check_granted_permission(
        &self,
        grant: &GrantedPermission,
    ) -> std::result::Result<(), ValidationError> {
        self.check_grant_at(grant, &FieldPath::root())
    }

    pub fn check_granted_permissions_response(
        &self,
        grants: &[GrantedPermission],
    ) -> std::result::Result<(), ValidationError> {
        each_element(grants, &FieldPath::root(), |grant, path| {
            self.check_grant_at(grant, path)
        })
    }

    pub fn check_permissions_request_v1(
        &self,
        request: &PermissionsRequestV1,
    ) -> std::result::Result<(), ValidationError> {
        let path = FieldPath::root().field("permissions");
        each_element(&request.permissions, &path, |permission, path| {
            self.check_permission_v1_at(permission, path)
        })
    }

    /// v1 grants carry only a type; there is no `data` to check.
    pub fn check_granted_permissions_response_v1(
        &self,
        response: &GrantedPermissionsResponseV1,
    ) -> std::result::Result<(), ValidationError> {
        let path = FieldPath::root().field("grantedPermissions");
        each_element(&response.granted_permissions, &path, |grant, path| {
            self.check_known_type(DataKind::Permission, &grant.kind, &path.field("type"))
        })
    }

    pub fn check_request_document(
        &self,
        document: &RequestDocument,
    ) -> std::result::Result<(), ValidationError> {
        match document {
            RequestDocument::V1(request) => self.check_permissions_request_v1(request),
            RequestDocument::V2(requests) => self.check_permissions_request(requests),
        }
    }

    pub fn check_response_document(
        &self,
        document: &ResponseDocument,
    ) -> std::result::Result<(), ValidationError> {
        match document {
            ResponseDocument::V1(response) => self.check_granted_permissions_response_v1(response),
            ResponseDocument::V2(grants) => self.check_granted_permissions_response(grants),
        }
    }

    fn check_request_at(
        &self,
        request: &PermissionRequest,
        path: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        self.check_data(
            DataKind::Permission,
            &request.permission.kind,
            request.permission.data.as_ref(),
            &path.field("permission"),
        )?;
        self.check_policies(request.policies(), &path.field("policies"))
    }

    fn check_grant_at(
        &self,
        grant: &GrantedPermission,
        path: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        match &grant.permission {
            Some(request) => self.check_request_at(request, &path.field("permission")),
            None => Ok(()),
        }
    }

    fn check_permission_v1_at(
        &self,
        permission: &PermissionV1,
        path: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        self.check_any_data(
            DataKind::Permission,
            &permission.kind,
            permission.data.as_ref(),
            path,
        )?;
        each_element(&permission.policies, &path.field("policies"), |policy: &PolicyV1, path| {
            self.check_any_data(DataKind::Policy, &policy.kind, policy.data.as_ref(), path)
        })
    }

    fn check_policies(
        &self,
        policies: &[Policy],
        path: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        each_element(policies, path, |policy, path| {
            self.check_data(DataKind::Policy, &policy.kind, policy.data.as_ref(), path)
        })
    }

    /// `owner` is the object holding both `type` and `data`.
    fn check_data(
        &self,
        kind: DataKind,
        descriptor: &TypeDescriptor,
        data: Option<&Map<String, Value>>,
        owner: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        let type_name = descriptor.name();
        let Some(validator) = self.table(kind).get(type_name) else {
            return self.check_known_type(kind, descriptor, &owner.field("type"));
        };

        validator.validate_data(data).map_err(|message| {
            debug!(kind = %kind, type_name, %message, "data rejected");
            ValidationError::DataRejected {
                path: owner.field("data"),
                type_name: type_name.to_string(),
                message,
            }
        })
    }

    /// v1 `data` may be any value. `null` counts as absent; a validator
    /// registered for the type only ever sees objects.
    fn check_any_data(
        &self,
        kind: DataKind,
        descriptor: &TypeDescriptor,
        data: Option<&Value>,
        owner: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        let other = match data {
            None | Some(Value::Null) => return self.check_data(kind, descriptor, None, owner),
            Some(Value::Object(map)) => return self.check_data(kind, descriptor, Some(map), owner),
            Some(other) => other,
        };

        let type_name = descriptor.name();
        if !self.has_validator(kind, type_name) {
            return self.check_known_type(kind, descriptor, &owner.field("type"));
        }
        Err(ValidationError::DataRejected {
            path: owner.field("data"),
            type_name: type_name.to_string(),
            message: format!("expected object, found {}", ValueKind::of(other)),
        })
    }

    fn check_known_type(
        &self,
        kind: DataKind,
        descriptor: &TypeDescriptor,
        path: &FieldPath,
    ) -> std::result::Result<(), ValidationError> {
        let type_name = descriptor.name();
        if !self.config.fail_on_unknown_type || self.has_validator(kind, type_name) {
            return Ok(());
        }
        Err(ValidationError::UnknownType {
            path: path.clone(),
            type_name: type_name.to_string(),
        })
    }

    fn table(&self, kind: DataKind) -> &ValidatorTable {
        match kind {
            DataKind::Permission => &self.permissions,
            DataKind::Policy => &self.policies,
        }
    }

    fn table_mut(&mut self, kind: DataKind) -> &mut ValidatorTable {
        match kind {
            DataKind::Permission => &mut self.permissions,
            DataKind::Policy => &mut self.policies,
        }
    }
}

impl Default for DataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataRegistry")
            .field("permissions", &self.types(DataKind::Permission))
            .field("policies", &self.types(DataKind::Policy))
            .field("config", &self.config)
            .finish()
    }
}

fn each_element<T>(
    items: &[T],
    path: &FieldPath,
    mut check: impl FnMut(&T, &FieldPath) -> std::result::Result<(), ValidationError>,
) -> std::result::Result<(), ValidationError> {
    for (index, item) in items.iter().enumerate() {
        check(item, &path.index(index)).map_err(|err| ValidationError::element(index, err))?;
    }
    Ok(())
}

fn parse_schema_file_name(file_name: &str) -> Option<(DataKind, &str)> {
    let stem = file_name.strip_suffix(SCHEMA_SUFFIX)?;
    let (kind, type_name) = if let Some(name) = stem.strip_prefix("permission.") {
        (DataKind::Permission, name)
    } else if let Some(name) = stem.strip_prefix("policy.") {
        (DataKind::Policy, name)
    } else {
        return None;
    };

    if type_name.is_empty() {
        return None;
    }
    Some((kind, type_name))
}

fn read_bounded(
    entry_path: &Path,
    path_metadata: &std::fs::Metadata,
    config: &RegistryConfig,
) -> Result<String> {
    let file_name = entry_path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file = std::fs::File::open(entry_path).map_err(|err| {
        SchemaError::LoadFailed(format!(
            "failed opening schema {}: {err}",
            entry_path.display()
        ))
    })?;
    let opened_metadata = file
        .metadata()
        .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

    #[cfg(unix)]
    {
        if !same_file_identity(path_metadata, &opened_metadata) {
            return Err(SchemaError::LoadFailed(format!(
                "schema file changed during load: {file_name}"
            )));
        }
    }
    #[cfg(not(unix))]
    let _ = path_metadata;

    let max_bytes = config.max_schema_bytes;
    if opened_metadata.len() > max_bytes as u64 {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large ({} bytes): {file_name}",
            opened_metadata.len()
        )));
    }

    let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
    let mut content = String::new();
    file.take(read_limit)
        .read_to_string(&mut content)
        .map_err(|err| {
            SchemaError::LoadFailed(format!(
                "failed reading schema {}: {err}",
                entry_path.display()
            ))
        })?;
    if content.len() > max_bytes {
        return Err(SchemaError::LoadFailed(format!(
            "schema file too large while reading: {file_name}"
        )));
    }

    Ok(content)
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}
