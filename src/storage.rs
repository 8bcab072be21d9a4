//! The object table and its lifecycle.
//!
//! A [`Storage`] owns every live entity, keyed by `"<Class>.<id>"` in
//! insertion order, together with the [`Persistor`] that writes the table
//! out as one JSON document and reads it back. There is no secondary index:
//! class filtered queries scan the table.

// other keepers use HashMap, but the table must remember insertion order
use indexmap::IndexMap;
use seahash::SeaHasher;
use serde_json::Value;
use std::hash::BuildHasherDefault;
use tracing::{debug, info};

use crate::error::{HbnbError, InputError, Result};
use crate::model::{Entity, key_for};
use crate::persist::{Document, PersistenceMode, Persistor};
use crate::registry::{Class, Field};

pub type TableHasher = BuildHasherDefault<SeaHasher>;
pub type Table = IndexMap<String, Entity, TableHasher>;

#[derive(Debug)]
pub struct Storage {
    persistor: Persistor,
    objects: Table,
}

impl Storage {
    /// An empty store. Nothing is read until [`Storage::reload`] is called.
    pub fn new(mode: PersistenceMode) -> Self {
        Self {
            persistor: Persistor::new(mode),
            objects: Table::default(),
        }
    }

    /// A store filled from whatever the persisted document holds.
    pub fn open(mode: PersistenceMode) -> Result<Self> {
        let mut storage = Self::new(mode);
        storage.reload()?;
        Ok(storage)
    }

    /// The live table. Entries may be changed in place; call
    /// [`Storage::save`] to make the change durable.
    pub fn all(&self) -> &Table {
        &self.objects
    }
    pub fn all_mut(&mut self) -> &mut Table {
        &mut self.objects
    }

    /// Registers an entity under its store key. An entity already under the
    /// same key is replaced. Returns the key.
    pub fn new_object(&mut self, entity: Entity) -> String {
        let key = entity.key();
        self.objects.insert(key.clone(), entity);
        key
    }

    /// Registers and persists an entity, returning its id. When the save
    /// fails the entity is unregistered again.
    pub fn insert(&mut self, entity: Entity) -> Result<String> {
        let id = entity.id().to_string();
        let key = entity.key();
        let displaced = self.objects.insert(key.clone(), entity);
        if let Err(e) = self.save() {
            match displaced {
                Some(previous) => {
                    self.objects.insert(key, previous);
                }
                None => {
                    self.objects.shift_remove(&key);
                }
            }
            return Err(e);
        }
        Ok(id)
    }

    /// Constructs, registers and persists a new entity of `class`,
    /// returning its id.
    pub fn create(&mut self, class: Class) -> Result<String> {
        self.insert(Entity::new(class))
    }

    pub fn get(&self, key: &str) -> Option<&Entity> {
        self.objects.get(key)
    }
    pub fn lookup(&self, class: Class, id: &str) -> Option<&Entity> {
        self.objects.get(&key_for(class, id))
    }
    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }
    pub fn len(&self) -> usize {
        self.objects.len()
    }
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Removes an entity and persists the smaller table. `None` (and no
    /// save) when the key is unknown. A failed save puts the entity back in
    /// its old position.
    pub fn destroy(&mut self, key: &str) -> Result<Option<Entity>> {
        let Some((index, key, entity)) = self.objects.shift_remove_full(key) else {
            return Ok(None);
        };
        match self.save() {
            Ok(()) => Ok(Some(entity)),
            Err(e) => {
                self.objects.shift_insert(index, key, entity);
                Err(e)
            }
        }
    }

    /// Applies `change` to the entity under `key`, refreshes its
    /// `updated_at` and persists. A failed save restores the entity as it
    /// was before the change.
    pub fn modify<F>(&mut self, key: &str, change: F) -> Result<()>
    where
        F: FnOnce(&mut Entity),
    {
        let entity = self
            .objects
            .get_mut(key)
            .ok_or(InputError::NoInstanceFound)?;
        let before = entity.clone();
        change(entity);
        entity.touch();
        if let Err(e) = self.save() {
            if let Some(entity) = self.objects.get_mut(key) {
                *entity = before;
            }
            return Err(e);
        }
        Ok(())
    }

    /// Entities of one class (or of every class) in table order.
    pub fn of_class(&self, class: Option<Class>) -> impl Iterator<Item = &Entity> + '_ {
        self.objects
            .values()
            .filter(move |entity| class.is_none_or(|c| entity.class() == c))
    }

    /// The number of store keys carrying the class prefix.
    pub fn count(&self, class: Class) -> usize {
        let prefix = format!("{}.", class.name());
        self.objects.keys().filter(|key| key.starts_with(&prefix)).count()
    }

    /// Serializes the whole table and replaces the persisted document.
    pub fn save(&mut self) -> Result<()> {
        let document: Document = self
            .objects
            .iter()
            .map(|(key, entity)| (key.clone(), Value::Object(entity.to_mapping())))
            .collect();
        self.persistor.write(&document)?;
        debug!(entities = document.len(), flush = self.persistor.flushes(), "store saved");
        Ok(())
    }

    /// Replaces the table with the persisted document. A missing document
    /// leaves the table as it is. Any entry that cannot be reconstructed
    /// fails the whole reload and the current table is kept.
    pub fn reload(&mut self) -> Result<()> {
        let Some(document) = self.persistor.read()? else {
            return Ok(());
        };
        let mut restored = Table::with_capacity_and_hasher(document.len(), TableHasher::default());
        for (key, value) in document {
            let Value::Object(mapping) = value else {
                return Err(HbnbError::DataCorruption {
                    message: format!("entry {key} is not a mapping"),
                });
            };
            let entity = Entity::from_mapping(mapping)?;
            if entity.key() != key {
                return Err(HbnbError::DataCorruption {
                    message: format!("entry {key} holds {}", entity.key()),
                });
            }
            restored.insert(key, entity);
        }
        info!(entities = restored.len(), "store reloaded");
        self.objects = restored;
        Ok(())
    }

    /// How many documents have been written by this store.
    pub fn flushes(&self) -> usize {
        self.persistor.flushes()
    }

    /// The classes entities can be created from.
    pub fn classes() -> &'static [Class] {
        &Class::ALL
    }

    /// Declared fields and their coercions, per class.
    pub fn attributes() -> impl Iterator<Item = (Class, &'static [Field])> {
        Class::ALL.iter().map(|class| (*class, class.fields()))
    }
}
