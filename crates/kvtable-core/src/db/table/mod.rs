//! Module: table
//! Responsibility: bind a record type to its owner, name and primary index;
//! the only write path into the store.
//! Does not own: key traversal (see `db::index`, `db::cursor`).
//!
//! Invariants:
//! - `init` runs exactly once; every other operation fails before it.
//! - `upsert` encodes key and value before touching the store, so an encode
//!   or size failure leaves the store unchanged.
//! - `erase` of an absent key fails; it is never a silent no-op.


use crate::{
    db::{
        codec::{KeyCodec, pack_value, value_packed_size},
        cursor::Cursor,
        host::KvHost,
        identity::{Name, TablePath},
        index::{Index, IndexBinding, Iter},
    },
    error::InternalError,
    obs::sink::{self, MetricsEvent},
    traits::Record,
};
use kvtable_config::KvConfig;

///
/// TableState
///

struct TableState<'h, H: KvHost, R: Record> {
    region: Name,
    path: TablePath,
    primary: Index<'h, H, R>,
}

///
/// Table
///
/// Typed records of one kind, stored under one owner and table name and
/// addressed by their primary key.
///

pub struct Table<'h, H: KvHost, R: Record> {
    host: &'h H,
    config: KvConfig,
    debug: bool,
    state: Option<TableState<'h, H, R>>,
}

impl<'h, H: KvHost, R: Record> Table<'h, H, R> {
    /// Unbound table using the default configuration.
    #[must_use]
    pub fn new(host: &'h H) -> Self {
        Self::with_config(host, KvConfig::default())
    }

    /// Unbound table; `config` is validated by `init`.
    #[must_use]
    pub fn with_config(host: &'h H, config: KvConfig) -> Self {
        let debug = config.debug;

        Self {
            host,
            config,
            debug,
            state: None,
        }
    }

    /// Enable debug lines for this table and its primary index.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    fn debug_log(&self, s: impl Into<String>) {
        if self.debug {
            println!("[debug] {}", s.into());
        }
    }

    #[must_use]
    pub const fn config(&self) -> &KvConfig {
        &self.config
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Bind owner, table name and primary index. Must be called once,
    /// before any other operation.
    pub fn init(
        &mut self,
        owner: Name,
        table: Name,
        mut primary: Index<'h, H, R>,
    ) -> Result<(), InternalError> {
        let path = TablePath::new(owner, table);
        if self.state.is_some() {
            return Err(InternalError::table_invariant(format!(
                "table {path} is already initialized"
            )));
        }

        self.config.validate()?;
        let region = Name::try_from_str(&self.config.region)
            .map_err(|err| InternalError::table_invariant(format!("region: {err}")))?;
        let max_value_bytes = usize::try_from(self.config.max_value_bytes)
            .map_err(|_| InternalError::table_invariant("max_value_bytes does not fit usize"))?;

        primary.bind(IndexBinding {
            host: self.host,
            region,
            path,
            cursor_pool_size: self.config.cursor_pool_size,
            max_value_bytes,
            debug: self.debug,
        })?;

        self.debug_log(format!(
            "init {path} in region {region} with index '{}'",
            primary.name()
        ));
        self.state = Some(TableState {
            region,
            path,
            primary,
        });

        Ok(())
    }

    fn state(&self) -> Result<&TableState<'h, H, R>, InternalError> {
        self.state
            .as_ref()
            .ok_or_else(|| InternalError::not_initialized("table"))
    }

    /// The bound primary index.
    pub fn primary(&self) -> Result<&Index<'h, H, R>, InternalError> {
        Ok(&self.state()?.primary)
    }

    pub fn path(&self) -> Result<TablePath, InternalError> {
        Ok(self.state()?.path)
    }

    // ─────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────

    /// Insert or replace the record stored under its primary key.
    pub fn upsert(&self, value: &R) -> Result<(), InternalError> {
        let state = self.state()?;
        let key = state.primary.key_of(value);

        let key_size = key.packed_size();
        if key_size > self.config.max_key_bytes as usize {
            return Err(InternalError::store_unsupported(format!(
                "key {key:?} packs to {key_size} bytes (limit {})",
                self.config.max_key_bytes
            )));
        }
        let value_size = value_packed_size(value)?;
        if value_size > self.config.max_value_bytes as usize {
            return Err(InternalError::store_unsupported(format!(
                "value for {key:?} packs to {value_size} bytes (limit {})",
                self.config.max_value_bytes
            )));
        }

        let raw_key = state.primary.pack_key(&key)?;
        let raw_value = pack_value(value)?;
        self.host
            .set(state.region, state.path.owner, &raw_key, &raw_value)?;

        sink::record(MetricsEvent::Upsert { path: state.path });
        self.debug_log(format!(
            "upsert {}: {key:?} ({value_size} bytes)",
            state.path
        ));

        Ok(())
    }

    /// Remove the record under `key`. Fails if there is none.
    pub fn erase(&self, key: &R::Key) -> Result<(), InternalError> {
        let state = self.state()?;
        state.primary.erase(key)?;

        sink::record(MetricsEvent::Erase { path: state.path });

        Ok(())
    }

    // ─────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────

    pub fn get(&self, key: &R::Key) -> Result<Option<R>, InternalError> {
        let cursor = self.find(key)?;
        if cursor.is_end()? {
            return Ok(None);
        }

        cursor.value().map(Some)
    }

    pub fn contains(&self, key: &R::Key) -> Result<bool, InternalError> {
        self.state()?.primary.contains(key)
    }

    pub fn find(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.find(key)
    }

    pub fn begin(&self) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.begin()
    }

    pub fn end(&self) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.end()
    }

    pub fn lower_bound(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.lower_bound(key)
    }

    pub fn upper_bound(&self, key: &R::Key) -> Result<Cursor<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.upper_bound(key)
    }

    /// Inclusive ascending scan; see [`Index::range`].
    pub fn range(&self, low: &R::Key, high: &R::Key) -> Result<Vec<R>, InternalError> {
        self.state()?.primary.range(low, high)
    }

    pub fn iter(&self) -> Result<Iter<'_, 'h, H, R>, InternalError> {
        self.state()?.primary.iter()
    }
}
