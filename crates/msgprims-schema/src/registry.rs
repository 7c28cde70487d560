use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::RegistryConfig;
use crate::error::{Result, SchemaError};
use crate::parser::compile;
use crate::schema::MessageSchema;

/// File extension of message definition files.
pub const DEFINITION_EXTENSION: &str = ".msg";

/// Type-name keyed store of compiled schemas.
///
/// Lookups take `&self`; insertion takes `&mut self`, so a registry shared
/// across threads must be wrapped in a lock before it is extended.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<MessageSchema>>,
    config: RegistryConfig,
}

impl SchemaRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            schemas: HashMap::new(),
            config,
        }
    }

    /// Compile a definition and register the result.
    ///
    /// On error the registry is left unchanged.
    pub fn compile(&mut self, type_name: &str, text: &str) -> Result<Arc<MessageSchema>> {
        let schema = compile(type_name, text, self)?;
        self.register(schema)
    }

    /// Register an already-compiled schema.
    ///
    /// Re-registering an identical schema is a no-op; a different schema under
    /// the same name is a conflict.
    pub fn register(&mut self, schema: MessageSchema) -> Result<Arc<MessageSchema>> {
        if let Some(existing) = self.schemas.get(schema.type_name()) {
            if existing.fingerprint() == schema.fingerprint() {
                return Ok(Arc::clone(existing));
            }
            return Err(SchemaError::Conflict {
                type_name: schema.type_name().to_string(),
                existing: existing.fingerprint().to_hex(),
            });
        }

        debug!(type_name = %schema.type_name(), fingerprint = %schema.fingerprint(), "schema registered");
        let schema = Arc::new(schema);
        self.schemas
            .insert(schema.type_name().to_string(), Arc::clone(&schema));
        Ok(schema)
    }

    /// Look up a schema by fully-qualified type name.
    pub fn get(&self, type_name: &str) -> Option<&Arc<MessageSchema>> {
        self.schemas.get(type_name)
    }

    /// Resolve a type reference as written inside a definition of `package`.
    ///
    /// Tries the name as given, then `package/name`, then `std_msgs/Header`
    /// for a bare `Header`.
    pub fn resolve(&self, reference: &str, package: Option<&str>) -> Option<&Arc<MessageSchema>> {
        if let Some(schema) = self.schemas.get(reference) {
            return Some(schema);
        }
        if reference.contains('/') {
            return None;
        }
        if let Some(package) = package {
            if let Some(schema) = self.schemas.get(&format!("{package}/{reference}")) {
                return Some(schema);
            }
        }
        if reference == "Header" {
            return self.schemas.get("std_msgs/Header");
        }
        None
    }

    /// Check if a type name is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    /// Get registry configuration.
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Load definitions from a directory.
    pub fn from_directory(path: &Path) -> Result<Self> {
        Self::from_directory_with_config(path, RegistryConfig::default())
    }

    /// Load definitions from a directory with explicit config.
    pub fn from_directory_with_config(path: &Path, config: RegistryConfig) -> Result<Self> {
        let mut registry = Self::with_config(config);
        registry.load_directory(path)?;
        Ok(registry)
    }

    /// Load every `*.msg` file in `path`, compiling in dependency order.
    ///
    /// The package name is the directory name, or its parent's name when the
    /// directory is called `msg`. Returns the number of schemas added.
    pub fn load_directory(&mut self, path: &Path) -> Result<usize> {
        let package = package_for_directory(path)?;
        let mut pending = self.read_definitions(path, &package)?;
        let loaded = pending.len();

        // Retry until a pass compiles nothing, so files may appear in any order.
        while !pending.is_empty() {
            let before = pending.len();
            let mut first_error = None;
            let mut remaining = Vec::new();
            for (type_name, text) in pending {
                match compile(&type_name, &text, self) {
                    Ok(schema) => {
                        self.register(schema)?;
                    }
                    Err(err) => {
                        if first_error.is_none() {
                            first_error = Some((type_name.clone(), err));
                        }
                        remaining.push((type_name, text));
                    }
                }
            }
            if remaining.len() == before {
                if let Some((type_name, err)) = first_error {
                    warn!(%type_name, error = %err, "definition failed to compile");
                    return Err(err);
                }
            }
            pending = remaining;
        }

        Ok(loaded)
    }

    /// Load from embedded `(type_name, definition)` pairs, in order.
    pub fn from_embedded(definitions: &[(&str, &str)]) -> Result<Self> {
        let mut registry = Self::new();
        for (type_name, text) in definitions {
            registry.compile(type_name, text)?;
        }
        Ok(registry)
    }

    fn read_definitions(&self, path: &Path, package: &str) -> Result<Vec<(String, String)>> {
        let entries = std::fs::read_dir(path)
            .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Some(stem) = file_name.strip_suffix(DEFINITION_EXTENSION) else {
                continue;
            };
            if stem.is_empty() {
                continue;
            }
            files.push((stem.to_string(), file_name, entry.path()));
        }
        files.sort();

        if files.len() > self.config.max_schemas_from_directory {
            return Err(SchemaError::LoadFailed(format!(
                "definition count exceeds configured max ({}): {}",
                self.config.max_schemas_from_directory,
                files.len()
            )));
        }

        let mut definitions = Vec::with_capacity(files.len());
        for (stem, file_name, entry_path) in files {
            let path_metadata = std::fs::symlink_metadata(&entry_path)
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;
            let file_type = path_metadata.file_type();
            if file_type.is_symlink() {
                return Err(SchemaError::LoadFailed(format!(
                    "refusing to load definition symlink: {file_name}"
                )));
            }
            if !file_type.is_file() {
                continue;
            }

            let file = std::fs::File::open(&entry_path).map_err(|err| {
                SchemaError::LoadFailed(format!(
                    "failed opening definition {}: {err}",
                    entry_path.display()
                ))
            })?;
            let opened_metadata = file
                .metadata()
                .map_err(|err| SchemaError::LoadFailed(err.to_string()))?;

            #[cfg(unix)]
            {
                if !same_file_identity(&path_metadata, &opened_metadata) {
                    return Err(SchemaError::LoadFailed(format!(
                        "definition file changed during load: {file_name}"
                    )));
                }
            }

            if opened_metadata.len() > self.config.max_schema_file_size as u64 {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large ({} bytes): {file_name}",
                    opened_metadata.len()
                )));
            }

            let max_bytes = self.config.max_schema_file_size;
            let read_limit = u64::try_from(max_bytes.saturating_add(1)).unwrap_or(u64::MAX);
            let mut content = String::new();
            file.take(read_limit)
                .read_to_string(&mut content)
                .map_err(|err| {
                    SchemaError::LoadFailed(format!(
                        "failed reading definition {}: {err}",
                        entry_path.display()
                    ))
                })?;
            if content.len() > max_bytes {
                return Err(SchemaError::LoadFailed(format!(
                    "definition file too large while reading: {file_name}"
                )));
            }

            definitions.push((format!("{package}/{stem}"), content));
        }

        Ok(definitions)
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn package_for_directory(path: &Path) -> Result<String> {
    let canonical = path
        .canonicalize()
        .map_err(|err| SchemaError::LoadFailed(format!("{}: {err}", path.display())))?;
    let dir_name = canonical.file_name().map(|name| name.to_string_lossy());
    let package = match dir_name.as_deref() {
        Some("msg") => canonical
            .parent()
            .and_then(Path::file_name)
            .map(|name| name.to_string_lossy().into_owned()),
        Some(name) => Some(name.to_string()),
        None => None,
    };
    package.ok_or_else(|| {
        SchemaError::LoadFailed(format!(
            "cannot derive package name from {}",
            path.display()
        ))
    })
}

#[cfg(unix)]
fn same_file_identity(
    path_metadata: &std::fs::Metadata,
    opened_metadata: &std::fs::Metadata,
) -> bool {
    use std::os::unix::fs::MetadataExt;
    path_metadata.dev() == opened_metadata.dev() && path_metadata.ino() == opened_metadata.ino()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::types::FieldType;

    const POINT: &str = "float64 x\nfloat64 y\nfloat64 z\n";
    const POSE: &str = "Point position\nPoint[] path\n";

    #[test]
    fn compile_and_get() {
        let mut registry = SchemaRegistry::new();
        registry.compile("geometry_msgs/Point", POINT).unwrap();

        assert!(registry.contains("geometry_msgs/Point"));
        assert_eq!(registry.get("geometry_msgs/Point").unwrap().fields().len(), 3);
        assert_eq!(registry.type_names(), vec!["geometry_msgs/Point"]);
    }

    #[test]
    fn package_relative_resolution() {
        let mut registry = SchemaRegistry::new();
        registry.compile("geometry_msgs/Point", POINT).unwrap();
        let pose = registry.compile("geometry_msgs/Pose", POSE).unwrap();

        assert_eq!(
            pose.fields()[0].field_type,
            FieldType::Composite("geometry_msgs/Point".to_string())
        );
        assert_eq!(pose.dependencies(), vec!["geometry_msgs/Point"]);
    }

    #[test]
    fn composite_fingerprint_uses_nested_digest() {
        let mut registry = SchemaRegistry::new();
        let point = registry.compile("geometry_msgs/Point", POINT).unwrap();
        let pose = registry.compile("geometry_msgs/Pose", POSE).unwrap();

        let expected = format!("{0} position\n{0} path", point.fingerprint());
        assert_eq!(pose.canonical_text(), expected);
    }

    #[test]
    fn nested_change_changes_outer_fingerprint() {
        let mut a = SchemaRegistry::new();
        a.compile("geometry_msgs/Point", POINT).unwrap();
        let pose_a = a.compile("geometry_msgs/Pose", POSE).unwrap();

        let mut b = SchemaRegistry::new();
        b.compile("geometry_msgs/Point", "float32 x\nfloat32 y\nfloat32 z\n")
            .unwrap();
        let pose_b = b.compile("geometry_msgs/Pose", POSE).unwrap();

        assert_ne!(pose_a.fingerprint(), pose_b.fingerprint());
    }

    #[test]
    fn header_resolves_to_std_msgs() {
        let mut registry = SchemaRegistry::new();
        registry
            .compile("std_msgs/Header", "uint32 seq\ntime stamp\nstring frame_id\n")
            .unwrap();
        let stamped = registry
            .compile("sensor/Range", "Header header\nfloat32 range\n")
            .unwrap();
        assert_eq!(stamped.dependencies(), vec!["std_msgs/Header"]);
    }

    #[test]
    fn failed_compile_leaves_registry_untouched() {
        let mut registry = SchemaRegistry::new();
        registry.compile("geometry_msgs/Point", POINT).unwrap();

        let err = registry.compile("geometry_msgs/Bad", "Missing m\n").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { .. }));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn self_reference_is_unknown() {
        let mut registry = SchemaRegistry::new();
        registry.compile("tree/Node", "int32 value\n").unwrap();
        let err = compile("tree/Node", "int32 value\nNode[] children\n", &registry).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownType { line: 2, .. }));
    }

    #[test]
    fn identical_reregistration_is_noop_and_conflict_is_rejected() {
        let mut registry = SchemaRegistry::new();
        registry.compile("geometry_msgs/Point", POINT).unwrap();
        registry
            .compile("geometry_msgs/Point", "# same\nfloat64 x\nfloat64 y\nfloat64 z")
            .unwrap();
        assert_eq!(registry.len(), 1);

        let err = registry
            .compile("geometry_msgs/Point", "float32 x\n")
            .unwrap_err();
        assert!(matches!(err, SchemaError::Conflict { .. }));
    }

    #[test]
    fn from_embedded_loads_in_order() {
        let registry = SchemaRegistry::from_embedded(&[
            ("geometry_msgs/Point", POINT),
            ("geometry_msgs/Pose", POSE),
        ])
        .unwrap();
        assert_eq!(
            registry.type_names(),
            vec!["geometry_msgs/Point", "geometry_msgs/Pose"]
        );
    }

    #[test]
    fn from_directory_compiles_in_dependency_order() {
        let dir = make_temp_dir("geometry_msgs");
        // Accel sorts first but depends on Twist.
        write_definition(&dir, "Accel.msg", "Twist twist\n");
        write_definition(&dir, "Point.msg", POINT);
        write_definition(&dir, "Pose.msg", POSE);
        write_definition(&dir, "Twist.msg", "float64 linear\nfloat64 angular\n");
        write_definition(&dir, "notes.txt", "not a definition");

        let registry = SchemaRegistry::from_directory(&dir).unwrap();
        let package = dir.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(registry.len(), 4);
        assert!(registry.contains(&format!("{package}/Accel")));

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn msg_directory_uses_parent_as_package() {
        let root = make_temp_dir("pkg");
        let msg_dir = root.join("msg");
        std::fs::create_dir_all(&msg_dir).unwrap();
        write_definition(&msg_dir, "Ping.msg", "string status\nint16 value1\nint16 value2\n");

        let registry = SchemaRegistry::from_directory(&msg_dir).unwrap();
        let package = root.file_name().unwrap().to_string_lossy().into_owned();
        let ping = registry.get(&format!("{package}/Ping")).unwrap();
        assert_eq!(ping.fingerprint().to_hex(), "a9ac828bf931795f5243ecde9378b11f");

        let _ = std::fs::remove_dir_all(root.parent().unwrap());
    }

    #[test]
    fn unresolvable_directory_reports_unknown_type() {
        let dir = make_temp_dir("broken");
        write_definition(&dir, "A.msg", "Missing m\n");
        write_definition(&dir, "B.msg", "int8 x\n");

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::UnknownType { .. })));

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn definition_count_limit_is_enforced() {
        let dir = make_temp_dir("count-limit");
        write_definition(&dir, "A.msg", "int8 x\n");
        write_definition(&dir, "B.msg", "int8 x\n");

        let config = RegistryConfig {
            max_schemas_from_directory: 1,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn definition_file_size_limit_is_enforced() {
        let dir = make_temp_dir("size-limit");
        write_definition(&dir, "A.msg", POINT);

        let config = RegistryConfig {
            max_schema_file_size: 8,
            ..RegistryConfig::default()
        };
        let result = SchemaRegistry::from_directory_with_config(&dir, config);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_definition_is_rejected() {
        let dir = make_temp_dir("symlink");
        let target = dir.join("target.txt");
        std::fs::write(&target, POINT).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("Point.msg")).unwrap();

        let result = SchemaRegistry::from_directory(&dir);
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));

        let _ = std::fs::remove_dir_all(dir.parent().unwrap());
    }

    #[test]
    fn missing_directory_fails() {
        let result = SchemaRegistry::from_directory(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(SchemaError::LoadFailed(_))));
    }

    fn make_temp_dir(package: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!(
                "msgprims-schema-{}-{}",
                std::process::id(),
                std::time::SystemTime::now()
                    .duration_since(std::time::UNIX_EPOCH)
                    .unwrap()
                    .as_nanos()
            ))
            .join(package);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_definition(dir: &Path, file_name: &str, contents: &str) {
        std::fs::write(dir.join(file_name), contents.as_bytes()).unwrap();
    }
}
