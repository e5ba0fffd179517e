//! Runtime construction of column store and index pairs.

use crate::erased::ErasedIndex;
use crate::index::SecondaryIndex;
use crate::item::{HandleOrder, IndexItem, ItemComparer};
use crate::key::{IndexKey, KeyComparer};
use bytes::Bytes;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tessera_common::{Date, IndexConfig, Result, TesseraError, Timestamp, TypeId};
use tessera_store::{ColumnStore, ErasedColumn};

/// A column store and the secondary index reading keys from it.
#[derive(Clone)]
pub struct IndexedColumn<I> {
    pub column: Arc<dyn ErasedColumn>,
    pub index: Arc<dyn ErasedIndex<I>>,
}

impl<I> IndexedColumn<I> {
    /// Type tag of the keys.
    pub fn key_type(&self) -> TypeId {
        self.column.item_type()
    }
}

impl<I> std::fmt::Debug for IndexedColumn<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexedColumn")
            .field("key_type", &self.column.item_type())
            .field("nullable", &self.column.is_nullable())
            .field("keys", &self.index.key_count())
            .finish()
    }
}

/// Builds an indexed column for one key type.
pub type IndexConstructor<I> = fn(&IndexConfig, Arc<dyn ItemComparer<I>>) -> Result<IndexedColumn<I>>;

/// Key comparer and null sentinel overrides for a new index.
///
/// Unset fields fall back to the key type's defaults.
pub struct KeyOptions<K> {
    pub key_comparer: Option<Arc<dyn KeyComparer<K>>>,
    pub null_key: Option<K>,
}

impl<K> Default for KeyOptions<K> {
    fn default() -> Self {
        Self {
            key_comparer: None,
            null_key: None,
        }
    }
}

impl<K: IndexKey> KeyOptions<K> {
    pub fn with_key_comparer(mut self, key_comparer: Arc<dyn KeyComparer<K>>) -> Self {
        self.key_comparer = Some(key_comparer);
        self
    }

    pub fn with_null_key(mut self, null_key: K) -> Self {
        self.null_key = Some(null_key);
        self
    }

    fn apply<I: IndexItem>(self, mut index: SecondaryIndex<I, K>) -> SecondaryIndex<I, K> {
        if let Some(key_comparer) = self.key_comparer {
            index = index.with_key_comparer(key_comparer);
        }
        if let Some(null_key) = self.null_key {
            index = index.with_null_key(null_key);
        }
        index
    }
}

/// Builds an index over a null-wrapped store, for value-type keys.
pub fn build_nullable<I: IndexItem, K: IndexKey>(
    config: &IndexConfig,
    comparer: Arc<dyn ItemComparer<I>>,
) -> Result<IndexedColumn<I>> {
    build_nullable_with::<I, K>(config, comparer, KeyOptions::default())
}

/// Builds an index over a direct store, for text and binary keys.
pub fn build_direct<I: IndexItem, K: IndexKey>(
    config: &IndexConfig,
    comparer: Arc<dyn ItemComparer<I>>,
) -> Result<IndexedColumn<I>> {
    build_direct_with::<I, K>(config, comparer, KeyOptions::default())
}

fn build_nullable_with<I: IndexItem, K: IndexKey>(
    config: &IndexConfig,
    comparer: Arc<dyn ItemComparer<I>>,
    options: KeyOptions<K>,
) -> Result<IndexedColumn<I>> {
    let store = Arc::new(ColumnStore::<Option<K>>::new(config.store)?);
    let index = options.apply(SecondaryIndex::<I, K>::nullable(store.clone(), comparer));
    Ok(IndexedColumn {
        column: store,
        index: Arc::new(index),
    })
}

fn build_direct_with<I: IndexItem, K: IndexKey>(
    config: &IndexConfig,
    comparer: Arc<dyn ItemComparer<I>>,
    options: KeyOptions<K>,
) -> Result<IndexedColumn<I>> {
    let store = Arc::new(ColumnStore::<K>::new(config.store)?);
    let index = options.apply(SecondaryIndex::<I, K>::direct(store.clone(), comparer));
    Ok(IndexedColumn {
        column: store,
        index: Arc::new(index),
    })
}

/// Constructor for a built-in key type: null-wrapped for value types,
/// direct for text and binary.
fn builtin_constructor<I: IndexItem>(key_type: TypeId) -> Option<IndexConstructor<I>> {
    fn pick<I: IndexItem, K: IndexKey>(key_type: TypeId) -> IndexConstructor<I> {
        if key_type.is_value_type() {
            build_nullable::<I, K>
        } else {
            build_direct::<I, K>
        }
    }

    let constructor = match key_type {
        TypeId::Boolean => pick::<I, bool>(key_type),
        TypeId::Int8 => pick::<I, i8>(key_type),
        TypeId::Int16 => pick::<I, i16>(key_type),
        TypeId::Int32 => pick::<I, i32>(key_type),
        TypeId::Int64 => pick::<I, i64>(key_type),
        TypeId::UInt8 => pick::<I, u8>(key_type),
        TypeId::UInt16 => pick::<I, u16>(key_type),
        TypeId::UInt32 => pick::<I, u32>(key_type),
        TypeId::UInt64 => pick::<I, u64>(key_type),
        TypeId::Float32 => pick::<I, f32>(key_type),
        TypeId::Float64 => pick::<I, f64>(key_type),
        TypeId::Date => pick::<I, Date>(key_type),
        TypeId::Timestamp => pick::<I, Timestamp>(key_type),
        TypeId::Text => pick::<I, String>(key_type),
        TypeId::Binary => pick::<I, Bytes>(key_type),
        TypeId::Null => return None,
    };
    Some(constructor)
}

/// Registry from key type to indexed-column constructor.
///
/// Value-type keys (booleans, numbers, dates, timestamps) get a null-wrapped
/// store so NULL stays distinct from zero on the boxed path. Text and binary
/// keys get a direct store.
pub struct IndexFactory<I> {
    config: IndexConfig,
    constructors: FxHashMap<TypeId, IndexConstructor<I>>,
}

impl<I: IndexItem> IndexFactory<I> {
    /// Creates a factory with a constructor for every built-in key type.
    pub fn new(config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let mut factory = Self {
            config,
            constructors: FxHashMap::default(),
        };
        for key_type in TypeId::KEY_TYPES {
            if let Some(constructor) = builtin_constructor::<I>(key_type) {
                factory.register(key_type, constructor);
            }
        }
        Ok(factory)
    }

    /// Returns the configuration new columns are created with.
    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Installs `constructor` for `key_type`, returning the one it replaces.
    pub fn register(
        &mut self,
        key_type: TypeId,
        constructor: IndexConstructor<I>,
    ) -> Option<IndexConstructor<I>> {
        self.constructors.insert(key_type, constructor)
    }

    /// Returns true if a constructor is registered for `key_type`.
    pub fn supports(&self, key_type: TypeId) -> bool {
        self.constructors.contains_key(&key_type)
    }

    /// Creates an indexed column for `key_type`.
    pub fn create(
        &self,
        key_type: TypeId,
        comparer: Arc<dyn ItemComparer<I>>,
    ) -> Result<IndexedColumn<I>> {
        let constructor = self
            .constructors
            .get(&key_type)
            .ok_or_else(|| TesseraError::UnsupportedType(format!("no index for key type {}", key_type)))?;
        let column = constructor(&self.config, comparer)?;
        tracing::debug!(
            %key_type,
            nullable = column.column.is_nullable(),
            block_size = self.config.store.block_size,
            "created indexed column"
        );
        Ok(column)
    }

    /// Creates an indexed column ordering items by handle.
    pub fn create_default(&self, key_type: TypeId) -> Result<IndexedColumn<I>> {
        self.create(key_type, Arc::new(HandleOrder))
    }

    /// Creates an indexed column for key type `K` with key overrides.
    ///
    /// The store layout follows the built-in rule for `K` regardless of any
    /// constructor registered for its type id.
    pub fn create_keyed<K: IndexKey>(
        &self,
        comparer: Arc<dyn ItemComparer<I>>,
        options: KeyOptions<K>,
    ) -> Result<IndexedColumn<I>> {
        let key_type = K::TYPE_ID;
        let column = if key_type.is_value_type() {
            build_nullable_with::<I, K>(&self.config, comparer, options)?
        } else {
            build_direct_with::<I, K>(&self.config, comparer, options)?
        };
        tracing::debug!(
            %key_type,
            nullable = column.column.is_nullable(),
            block_size = self.config.store.block_size,
            "created indexed column with key overrides"
        );
        Ok(column)
    }
}

impl<I> std::fmt::Debug for IndexFactory<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexFactory")
            .field("config", &self.config)
            .field("types", &self.constructors.len())
            .finish()
    }
}
