//! HBnB console – an interactive interpreter over a small flat-file object store.
//!
//! The store holds entities of a closed set of classes (`BaseModel`, `User`,
//! `State`, `City`, `Amenity`, `Place`, `Review`):
//! * An [`model::Entity`] has an opaque string identity, a creation and an
//!   update timestamp, and class specific attributes.
//! * The [`registry::Class`] enum is the registry of classes: every class
//!   declares its fields and how text input is coerced into them.
//! * A [`storage::Storage`] keeps every entity under `"<Class>.<id>"` and
//!   writes the whole table out as one JSON document through a
//!   [`persist::Persistor`]. Each persisted mapping carries a `__class__`
//!   discriminator, so reloading rebuilds the exact class of every entity.
//!
//! ## Modules
//! * [`registry`] – Classes and their declared fields.
//! * [`datatype`] – Coercions, numeric inference and value rendering.
//! * [`model`] – Entities and their mapping (de)serialization.
//! * [`persist`] – Reading and atomically replacing the JSON document.
//! * [`storage`] – The object table: create, lookup, delete, save, reload.
//! * [`command`] – Grammar for both line syntaxes (see `command.pest`).
//! * [`console`] – The interpreter executing commands against a storage.
//! * [`config`] – Layered settings for the console binary.
//!
//! ## Console Syntax
//! Lines are either verb first (`show User <id>`) or dotted calls
//! (`User.show("<id>")`). Dotted calls are rewritten to the verb first line
//! they stand for, except `Class.update("<id>", {...})`, which assigns every
//! key of the literal and saves once.
//!
//! ## Quick Start
//! ```
//! use hbnb::{console::Console, persist::PersistenceMode, storage::Storage};
//! let mut console = Console::new(Storage::new(PersistenceMode::InMemory));
//! let id = console.execute_collect("create State").unwrap().text();
//! let shown = console.execute_collect(&format!("show State {id}")).unwrap().text();
//! assert!(shown.starts_with(&format!("[State] ({id})")));
//! assert!(shown.contains("'name': ''"));
//! ```

pub mod command;
pub mod config;
pub mod console;
pub mod datatype;
pub mod error;
pub mod model;
pub mod persist;
pub mod registry;
pub mod storage;
