//! Core store type, handle, and builder.

use crate::autosave::AutosaveWorker;
use crate::collection::Collection;
use crate::config::{StoreOptions, DEFAULT_PATH};
use crate::error::{Error, Result};
use crate::field::Field;
use crate::persist::{self, Recovery};
use crate::serializer::{JsonSerializer, Serializer};
use crate::signal::Readiness;
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Single-file JSON document store.
///
/// Holds an ordered set of named fields, each either a [`Collection`] or a
/// plain JSON value, and mirrors them to one JSON file. Opening a store
/// starts a loader thread (crash recovery, then load) and an autosave worker;
/// call [`wait_for_load`](Self::wait_for_load) before touching data so you
/// don't race the load, and close the [`StoreHandle`] to flush on shutdown.
///
/// Persistence never fails loudly. Load, save and recovery problems are
/// logged through `tracing` and the store carries on with what it has.
pub struct Store {
    path: PathBuf,
    options: StoreOptions,
    serializer: JsonSerializer,
    fields: RwLock<IndexMap<String, Field>>,
    loaded: Readiness,
    save_lock: Mutex<()>,
}

/// What one autosave tick did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// In-memory store, nothing to do.
    InMemory,
    /// Skipped: the initial load hasn't finished.
    NotLoaded,
    /// Skipped: another save is running.
    Busy,
    /// The snapshot reached the canonical file.
    Saved,
    /// The save ran but failed (already logged).
    Failed,
}

impl Store {
    /// Open (or create) a store at `path` with default options.
    pub fn open(path: impl AsRef<Path>) -> Result<StoreHandle> {
        Self::builder(path).build()
    }

    /// Open a store at [`DEFAULT_PATH`].
    pub fn open_default() -> Result<StoreHandle> {
        Self::open(DEFAULT_PATH)
    }

    /// A store that never touches the disk and is ready immediately.
    pub fn in_memory() -> Result<StoreHandle> {
        Self::builder(PathBuf::new()).in_memory(true).build()
    }

    /// Start configuring a new store. Call [`.build()`](StoreBuilder::build)
    /// when ready.
    pub fn builder(path: impl AsRef<Path>) -> StoreBuilder {
        StoreBuilder::new(path)
    }

    // ---- readiness ----

    /// `true` once the initial load has finished.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_set()
    }

    /// Block until the initial load has finished.
    pub fn wait_for_load(&self) {
        self.loaded.wait();
    }

    /// Like [`wait_for_load`](Self::wait_for_load) with an upper bound.
    /// Returns whether the store is loaded.
    pub fn wait_for_load_timeout(&self, timeout: Duration) -> bool {
        self.loaded.wait_timeout(timeout)
    }

    // ---- fields ----

    /// The collection called `name`, attaching an empty one if there is none.
    /// A scalar stored under `name` is replaced.
    pub fn collection(&self, name: &str) -> Collection {
        let mut fields = self.fields.write();
        match fields.get(name) {
            Some(Field::Collection(c)) => return c.clone(),
            Some(Field::Scalar(_)) => {
                warn!(field = name, "replacing scalar field with a collection");
            }
            None => {}
        }
        let c = Collection::new(name);
        fields.insert(name.to_owned(), Field::Collection(c.clone()));
        c
    }

    /// Attach `collection` under its own name, returning whatever was there.
    pub fn attach(&self, collection: Collection) -> Option<Field> {
        let name = collection.name().to_owned();
        self.fields.write().insert(name, Field::Collection(collection))
    }

    /// The collection called `name`, if that field exists and is one.
    #[must_use]
    pub fn get_collection(&self, name: &str) -> Option<Collection> {
        self.fields
            .read()
            .get(name)
            .and_then(Field::as_collection)
            .cloned()
    }

    /// Store a plain value under `name`, returning whatever was there.
    pub fn set(&self, name: impl Into<String>, value: impl Into<Value>) -> Option<Field> {
        self.fields
            .write()
            .insert(name.into(), Field::Scalar(value.into()))
    }

    /// Store any serde-serializable value under `name`.
    pub fn set_serialized<T: Serialize + ?Sized>(
        &self,
        name: impl Into<String>,
        value: &T,
    ) -> Result<()> {
        let value = serde_json::to_value(value).map_err(|e| Error::Serialize(e.to_string()))?;
        self.set(name, value);
        Ok(())
    }

    /// The persisted form of field `name`: the scalar itself, or
    /// `{name, rows}` for a collection.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.read().get(name).map(Field::to_value)
    }

    /// Decode field `name` as `T`. `Ok(None)` if there's no such field.
    pub fn get_as<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>> {
        match self.get(name) {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| Error::TypeMismatch(format!("field '{name}': {e}"))),
            None => Ok(None),
        }
    }

    /// Remove field `name`. Other fields keep their order.
    pub fn remove(&self, name: &str) -> Option<Field> {
        self.fields.write().shift_remove(name)
    }

    /// Field names in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.fields.read().keys().cloned().collect()
    }

    /// Number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.read().len()
    }

    /// `true` when the store has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.read().is_empty()
    }

    /// Everything that would be written to disk right now, in field order.
    #[must_use]
    pub fn snapshot(&self) -> Map<String, Value> {
        self.fields
            .read()
            .iter()
            .map(|(k, f)| (k.clone(), f.to_value()))
            .collect()
    }

    /// Path to the backing JSON file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with.
    #[must_use]
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// `true` if the store never touches the disk.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.options.in_memory
    }

    // ---- persistence ----

    /// Save now, waiting for any running save to finish first. Returns `true`
    /// when the snapshot reached the canonical file; failures are logged.
    ///
    /// Calling this before [`wait_for_load`](Self::wait_for_load) returns can
    /// overwrite the file with a premature, mostly empty snapshot.
    pub fn save(&self) -> bool {
        if self.options.in_memory {
            return false;
        }
        let _guard = self.save_lock.lock();
        self.save_locked()
    }

    /// One autosave attempt: skipped before the initial load and while
    /// another save runs, otherwise debounced and saved.
    pub fn autosave_tick(&self) -> Tick {
        if self.options.in_memory {
            return Tick::InMemory;
        }
        if !self.is_loaded() {
            debug!(path = %self.path.display(), "autosave skipped, store not loaded yet");
            return Tick::NotLoaded;
        }
        let Some(_guard) = self.save_lock.try_lock() else {
            debug!(path = %self.path.display(), "autosave skipped, save in progress");
            return Tick::Busy;
        };
        if !self.options.save_debounce.is_zero() {
            thread::sleep(self.options.save_debounce);
        }
        if self.save_locked() {
            Tick::Saved
        } else {
            Tick::Failed
        }
    }

    // ---- internal ----

    fn save_locked(&self) -> bool {
        let snapshot = self.snapshot();
        let bytes = match self.serializer.serialize(&snapshot) {
            Ok(b) => b,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to serialize store");
                return false;
            }
        };
        match persist::atomic_write(&self.path, &bytes, &self.serializer) {
            Ok(()) => {
                debug!(path = %self.path.display(), bytes = bytes.len(), "store saved");
                true
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to save store, make sure the file is writable"
                );
                false
            }
        }
    }

    fn load_from_disk(&self) {
        if let Err(e) = self.recover_and_load() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "failed to load store, make sure the file is readable"
            );
        } else if self.is_loaded() {
            return;
        }
        if !self.options.settle_delay.is_zero() {
            thread::sleep(self.options.settle_delay);
        }
        self.loaded.set();
    }

    /// Recovery and load proper. Marks the store loaded itself when there is
    /// nothing to adopt.
    fn recover_and_load(&self) -> Result<()> {
        // An unusable temporary file is treated like a torn write: the
        // canonical file is still the best data we have.
        match persist::recover(&self.path, &self.serializer) {
            Ok(Recovery::Promoted) => info!(
                path = %self.path.display(),
                tmp = %persist::tmp_path(&self.path).display(),
                "recovered from a crash"
            ),
            Ok(Recovery::TornWrite) => warn!(
                tmp = %persist::tmp_path(&self.path).display(),
                "ignoring torn temporary file"
            ),
            Ok(Recovery::NoTempFile) => {}
            Err(e) => warn!(
                tmp = %persist::tmp_path(&self.path).display(),
                error = %e,
                "crash recovery failed, loading the canonical file as is"
            ),
        }

        match persist::load(&self.path, &self.serializer) {
            Ok(Some(data)) => {
                let count = data.len();
                self.adopt(data);
                info!(path = %self.path.display(), fields = count, "store loaded");
                Ok(())
            }
            Ok(None) => {
                debug!(path = %self.path.display(), "no existing data, starting empty");
                self.loaded.set();
                Ok(())
            }
            Err(Error::Deserialize(e)) => {
                warn!(path = %self.path.display(), error = %e, "malformed store file, nothing loaded");
                self.loaded.set();
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Install loaded fields. A collection the application attached before the
    /// load finished keeps its handle and receives the loaded rows.
    fn adopt(&self, data: Map<String, Value>) {
        let mut fields = self.fields.write();
        for (key, value) in data {
            let field = Field::from_persisted(&key, value);
            if let (Field::Collection(loaded), Some(Field::Collection(existing))) =
                (&field, fields.get(&key))
            {
                existing.replace_rows(loaded.take_rows());
                continue;
            }
            fields.insert(key, field);
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("loaded", &self.is_loaded())
            .field("fields", &self.keys())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Configures and opens a [`Store`].
///
/// ```rust,no_run
/// use json_sets::Store;
/// use std::time::Duration;
///
/// let db = Store::builder("db.json")
///     .save_interval(Duration::from_secs(1))
///     .pretty(false)
///     .build()
///     .unwrap();
/// db.wait_for_load();
/// ```
pub struct StoreBuilder {
    path: PathBuf,
    options: StoreOptions,
}

impl StoreBuilder {
    fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options: StoreOptions::default(),
        }
    }

    /// Replace all options at once.
    pub fn options(mut self, options: StoreOptions) -> Self {
        self.options = options;
        self
    }

    /// Time between autosave attempts (default: 5 s).
    pub fn save_interval(mut self, interval: Duration) -> Self {
        self.options.save_interval = interval;
        self
    }

    /// Skip the disk entirely (default: off).
    pub fn in_memory(mut self, yes: bool) -> Self {
        self.options.in_memory = yes;
        self
    }

    /// Pause after loading before the store reports ready (default: 1 s).
    pub fn settle_delay(mut self, delay: Duration) -> Self {
        self.options.settle_delay = delay;
        self
    }

    /// Delay inside each autosave tick (default: 100 ms).
    pub fn save_debounce(mut self, delay: Duration) -> Self {
        self.options.save_debounce = delay;
        self
    }

    /// Write indented JSON (default: on).
    pub fn pretty(mut self, yes: bool) -> Self {
        self.options.pretty = yes;
        self
    }

    /// Open the store: start recovery and load in the background and start
    /// the autosave worker. Only configuration problems and thread spawn
    /// failures are reported here.
    pub fn build(self) -> Result<StoreHandle> {
        self.options.validate(&self.path)?;

        let serializer = if self.options.pretty {
            JsonSerializer::pretty()
        } else {
            JsonSerializer::compact()
        };
        let in_memory = self.options.in_memory;
        let interval = self.options.save_interval;

        let store = Arc::new(Store {
            path: self.path,
            options: self.options,
            serializer,
            fields: RwLock::new(IndexMap::new()),
            loaded: if in_memory {
                Readiness::ready()
            } else {
                Readiness::new()
            },
            save_lock: Mutex::new(()),
        });

        if in_memory {
            return Ok(StoreHandle {
                inner: store,
                worker: None,
                loader: None,
                closed: false,
            });
        }

        let load_ref = Arc::clone(&store);
        let loader = thread::Builder::new()
            .name("json-sets-loader".into())
            .spawn(move || load_ref.load_from_disk())?;

        let tick_ref = Arc::clone(&store);
        let worker = AutosaveWorker::start(interval, move || {
            tick_ref.autosave_tick();
        })?;

        Ok(StoreHandle {
            inner: store,
            worker: Some(worker),
            loader: Some(loader),
            closed: false,
        })
    }
}

impl std::fmt::Debug for StoreBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreBuilder")
            .field("path", &self.path)
            .field("options", &self.options)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Handle
// ---------------------------------------------------------------------------

/// Owns the store plus its loader and autosave threads.
///
/// Derefs to [`Store`] so you can call store methods directly on it. Use
/// [`shared`](Self::shared) to hand the store to other threads. Dropping the
/// handle does the same as [`close`](Self::close).
pub struct StoreHandle {
    inner: Arc<Store>,
    worker: Option<AutosaveWorker>,
    loader: Option<thread::JoinHandle<()>>,
    closed: bool,
}

impl StoreHandle {
    /// A shared reference to the store, e.g. for other threads.
    #[must_use]
    pub fn shared(&self) -> Arc<Store> {
        Arc::clone(&self.inner)
    }

    /// Stop autosaving and flush one last time. Waits for a running autosave
    /// and for the initial load before saving. Returns `true` when the final
    /// snapshot reached the canonical file.
    pub fn close(mut self) -> bool {
        self.shutdown()
    }

    fn shutdown(&mut self) -> bool {
        if self.closed {
            return false;
        }
        self.closed = true;

        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
        if let Some(loader) = self.loader.take() {
            if loader.join().is_err() {
                error!(path = %self.inner.path.display(), "loader thread panicked, skipping final save");
                return false;
            }
        }
        self.inner.wait_for_load();
        self.inner.save()
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::ops::Deref for StoreHandle {
    type Target = Store;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for StoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(&*self.inner, f)
    }
}
