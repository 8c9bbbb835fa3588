use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::debug;

use crate::schema::errors::SchemaError;
use crate::schema::schema::Schema;

/// Loads and memoizes schema documents by absolute file path.
///
/// Documents parse as YAML or JSON depending on file extension. Each
/// distinct path is read from disk at most once; `load_count` exposes the
/// number of actual reads so memoization is observable in tests.
#[derive(Debug, Default)]
pub struct UriLoader {
    cache: RwLock<HashMap<PathBuf, Arc<Value>>>,
    loads: AtomicUsize,
}

impl UriLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `path`, reusing the memoized document when present.
    pub fn load(&self, path: &Path) -> Result<Arc<Value>, SchemaError> {
        {
            let cache = self.cache.read().expect("loader cache lock poisoned");
            if let Some(document) = cache.get(path) {
                return Ok(Arc::clone(document));
            }
        }

        let mut cache = self.cache.write().expect("loader cache lock poisoned");
        // Another thread may have loaded the document while we waited for
        // the write lock.
        if let Some(document) = cache.get(path) {
            return Ok(Arc::clone(document));
        }

        debug!(path = %path.display(), "loading schema document");
        let raw = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_yaml = matches!(
            path.extension().and_then(|ext| ext.to_str()),
            Some("yaml" | "yml")
        );
        let document: Value = if is_yaml {
            serde_yaml::from_str(&raw).map_err(|err| SchemaError::Parse {
                path: path.display().to_string(),
                detail: err.to_string(),
            })?
        } else {
            serde_json::from_str(&raw).map_err(|err| SchemaError::Parse {
                path: path.display().to_string(),
                detail: err.to_string(),
            })?
        };

        self.loads.fetch_add(1, Ordering::Relaxed);
        let document = Arc::new(document);
        cache.insert(path.to_path_buf(), Arc::clone(&document));
        Ok(document)
    }

    /// Number of documents actually read from disk.
    #[must_use]
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

/// A lazily-resolved pointer into a schema document.
///
/// The referenced fragment is computed on first [`data`](Self::data) access
/// and memoized; every holder of the same fully-qualified URI shares one
/// resolution.
#[derive(Debug)]
pub struct JsonReference {
    uri: String,
    file: PathBuf,
    pointer: String,
    loader: Arc<UriLoader>,
    data: OnceCell<Value>,
}

impl JsonReference {
    /// Fully qualified `file#pointer` form.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    #[must_use]
    pub fn file(&self) -> &Path {
        &self.file
    }

    #[must_use]
    pub fn pointer(&self) -> &str {
        &self.pointer
    }

    /// The referenced fragment, loaded and extracted on first access.
    pub fn data(&self) -> Result<&Value, SchemaError> {
        self.data.get_or_try_init(|| {
            let document = self.loader.load(&self.file)?;
            Ok(query_pointer(&document, &self.pointer)?.clone())
        })
    }
}

/// Resolves `$ref` URIs to shared [`JsonReference`]s.
///
/// The store is keyed by the fully qualified `file#pointer`, so identical
/// references anywhere in a schema graph share one entry and one fragment
/// resolution.
#[derive(Debug)]
pub struct JsonReferenceResolver {
    loader: Arc<UriLoader>,
    store: RwLock<HashMap<String, Arc<JsonReference>>>,
}

impl JsonReferenceResolver {
    #[must_use]
    pub fn new(loader: Arc<UriLoader>) -> Self {
        Self {
            loader,
            store: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve `reference` as seen from `current_file`.
    ///
    /// An empty file part (`#/components/...`) refers to the current
    /// document; a relative file part resolves against the current
    /// document's directory.
    pub fn resolve(
        &self,
        reference: &str,
        current_file: &Path,
    ) -> Result<Arc<JsonReference>, SchemaError> {
        let (file_part, pointer) = reference.split_once('#').unwrap_or((reference, ""));
        let file = if file_part.is_empty() {
            current_file.to_path_buf()
        } else {
            let joined = current_file
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(file_part);
            joined.canonicalize().unwrap_or(joined)
        };
        let uri = format!("{}#{}", file.display(), pointer);

        {
            let store = self.store.read().expect("reference store lock poisoned");
            if let Some(reference) = store.get(&uri) {
                return Ok(Arc::clone(reference));
            }
        }

        let mut store = self.store.write().expect("reference store lock poisoned");
        if let Some(reference) = store.get(&uri) {
            return Ok(Arc::clone(reference));
        }
        debug!(uri = %uri, "registering schema reference");
        let reference = Arc::new(JsonReference {
            uri: uri.clone(),
            file,
            pointer: pointer.to_string(),
            loader: Arc::clone(&self.loader),
            data: OnceCell::new(),
        });
        store.insert(uri, Arc::clone(&reference));
        Ok(reference)
    }
}

/// Walk a slash-separated pointer into `document`.
///
/// Accepts `#/a/b`, `/a/b` and `a/b` forms. A `\/` escape keeps a literal
/// slash inside one segment, which is how OpenAPI path keys (`/pets/{id}`)
/// are addressed. A missing segment fails with the first unresolvable name.
pub fn query_pointer<'a>(document: &'a Value, pointer: &str) -> Result<&'a Value, SchemaError> {
    let trimmed = pointer.strip_prefix('#').unwrap_or(pointer);
    let trimmed = trimmed.strip_prefix('/').unwrap_or(trimmed);
    if trimmed.is_empty() {
        return Ok(document);
    }

    let mut current = document;
    for segment in split_pointer(trimmed) {
        let next = match current {
            Value::Object(entries) => entries.get(&segment),
            Value::Array(elements) => segment
                .parse::<usize>()
                .ok()
                .and_then(|index| elements.get(index)),
            _ => None,
        };
        current = next.ok_or_else(|| SchemaError::ReferenceNotFound {
            segment,
            pointer: pointer.to_string(),
        })?;
    }
    Ok(current)
}

/// Escape a literal pointer segment so embedded slashes survive
/// [`query_pointer`] splitting.
#[must_use]
pub fn escape_pointer_segment(segment: &str) -> String {
    segment.replace('/', "\\/")
}

fn split_pointer(pointer: &str) -> Vec<String> {
    let mut segments = vec![String::new()];
    let mut chars = pointer.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' && chars.peek() == Some(&'/') {
            chars.next();
            if let Some(last) = segments.last_mut() {
                last.push('/');
            }
        } else if ch == '/' {
            segments.push(String::new());
        } else if let Some(last) = segments.last_mut() {
            last.push(ch);
        }
    }
    segments
}

/// An OpenAPI document with reference resolution.
///
/// Holds the document path, the shared loader and a resolver, so parts of
/// the document can be queried by pointer and parsed into [`Schema`]s with
/// `$ref`s resolved relative to the document.
#[derive(Debug)]
pub struct OpenApiSchema {
    path: PathBuf,
    loader: Arc<UriLoader>,
    resolver: JsonReferenceResolver,
}

impl OpenApiSchema {
    /// Load the document at `path` with a private loader.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, SchemaError> {
        Self::with_loader(path, Arc::new(UriLoader::new()))
    }

    /// Load the document at `path` through a shared loader. The document
    /// is read eagerly so a broken path fails at construction.
    pub fn with_loader(
        path: impl Into<PathBuf>,
        loader: Arc<UriLoader>,
    ) -> Result<Self, SchemaError> {
        let path = path.into();
        let path = path.canonicalize().unwrap_or(path);
        loader.load(&path)?;
        let resolver = JsonReferenceResolver::new(Arc::clone(&loader));
        Ok(Self {
            path,
            loader,
            resolver,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn loader(&self) -> &Arc<UriLoader> {
        &self.loader
    }

    #[must_use]
    pub fn resolver(&self) -> &JsonReferenceResolver {
        &self.resolver
    }

    /// Extract the fragment at `pointer` from the document.
    pub fn query(&self, pointer: &str) -> Result<Value, SchemaError> {
        let document = self.loader.load(&self.path)?;
        query_pointer(&document, pointer).cloned()
    }

    /// Extract and parse the schema at `pointer`, resolving `$ref`s
    /// relative to this document.
    pub fn parse_schema(&self, pointer: &str) -> Result<Schema, SchemaError> {
        let node = self.query(pointer)?;
        Schema::parse_resolved(&node, &self.resolver, &self.path)
    }
}
