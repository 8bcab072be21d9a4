// used for the creation and update timestamps
use chrono::{NaiveDateTime, SubsecRound, TimeDelta, Utc};
// attributes keep their insertion order (serde_json is built with preserve_order)
use serde_json::{Map, Value};
use uuid::Uuid;

// used to print out readable forms of an entity
use std::fmt;

use crate::datatype::{Repr, quote};
use crate::error::{HbnbError, Result};
use crate::registry::Class;

/// Field naming the concrete class in a persisted mapping.
pub const DISCRIMINATOR: &str = "__class__";
/// Timestamps are written with exactly six fractional digits.
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";
// %.f also accepts a timestamp without a fraction
const TIME_PARSE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Attributes that belong to every entity and are never assigned from input.
pub const PROTECTED: [&str; 3] = ["id", "created_at", "updated_at"];

pub fn is_protected(attribute: &str) -> bool {
    PROTECTED.contains(&attribute)
}

pub fn key_for(class: Class, id: &str) -> String {
    format!("{}.{}", class.name(), id)
}

pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, TIME_PARSE_FORMAT).ok()
}

fn now() -> NaiveDateTime {
    // the document only keeps microseconds, so neither do we
    Utc::now().naive_utc().trunc_subsecs(6)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    class: Class,
    id: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
    attributes: Map<String, Value>,
}

impl Entity {
    /// A fresh entity with a new identity, both timestamps set to now and
    /// every declared field at its default.
    pub fn new(class: Class) -> Self {
        let now = now();
        Self {
            class,
            id: Uuid::new_v4().to_string(),
            created_at: now,
            updated_at: now,
            attributes: class
                .fields()
                .iter()
                .map(|field| (field.name.to_string(), field.coercion.default_value()))
                .collect(),
        }
    }

    /// Rebuilds an entity from its persisted mapping, adopting the stored
    /// identity and timestamps. Fields are taken verbatim; declared fields
    /// absent from the mapping get their defaults.
    pub fn from_mapping(mapping: Map<String, Value>) -> Result<Self> {
        let class = match mapping.get(DISCRIMINATOR) {
            Some(Value::String(name)) => name.parse::<Class>()?,
            Some(_) => return Err(corrupt(format!("'{DISCRIMINATOR}' is not a string"))),
            None => return Err(corrupt(format!("mapping without '{DISCRIMINATOR}'"))),
        };
        let id = match mapping.get("id") {
            Some(Value::String(id)) => id.clone(),
            _ => return Err(corrupt(format!("{class} mapping without a string 'id'"))),
        };
        let created_at = stored_time(&mapping, "created_at", &id)?;
        let updated_at = stored_time(&mapping, "updated_at", &id)?;

        let mut entity = Self {
            class,
            id,
            created_at,
            updated_at,
            attributes: Map::new(),
        };
        for field in class.fields() {
            entity
                .attributes
                .insert(field.name.to_string(), field.coercion.default_value());
        }
        for (name, value) in mapping {
            if name == DISCRIMINATOR || is_protected(&name) {
                continue;
            }
            entity.attributes.insert(name, value);
        }
        Ok(entity)
    }

    /// The persisted mapping: identity, timestamps, attributes and the
    /// class discriminator.
    pub fn to_mapping(&self) -> Map<String, Value> {
        let mut mapping = Map::new();
        mapping.insert("id".to_string(), Value::String(self.id.clone()));
        mapping.insert("created_at".to_string(), Value::String(format_time(&self.created_at)));
        mapping.insert("updated_at".to_string(), Value::String(format_time(&self.updated_at)));
        for (name, value) in &self.attributes {
            mapping.insert(name.clone(), value.clone());
        }
        mapping.insert(DISCRIMINATOR.to_string(), Value::String(self.class.name().to_string()));
        mapping
    }

    pub fn class(&self) -> Class {
        self.class
    }
    pub fn id(&self) -> &str {
        &self.id
    }
    pub fn key(&self) -> String {
        key_for(self.class, &self.id)
    }
    pub fn created_at(&self) -> NaiveDateTime {
        self.created_at
    }
    pub fn updated_at(&self) -> NaiveDateTime {
        self.updated_at
    }
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }

    /// Assigns an attribute. Identity and timestamps cannot be assigned;
    /// the return value tells whether the assignment happened.
    pub fn set(&mut self, attribute: &str, value: Value) -> bool {
        if is_protected(attribute) {
            return false;
        }
        self.attributes.insert(attribute.to_string(), value);
        true
    }

    /// Marks the entity as modified. `updated_at` always moves forward, even
    /// when the clock has not advanced since the last touch.
    pub fn touch(&mut self) {
        let now = now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + TimeDelta::microseconds(1)
        };
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "[{}] ({}) {{'id': {}, 'created_at': {}, 'updated_at': {}",
            self.class,
            self.id,
            quote(&self.id),
            quote(&format_time(&self.created_at)),
            quote(&format_time(&self.updated_at)),
        )?;
        for (name, value) in &self.attributes {
            write!(f, ", {}: {}", quote(name), Repr(value))?;
        }
        write!(f, "}}")
    }
}

fn stored_time(mapping: &Map<String, Value>, field: &str, id: &str) -> Result<NaiveDateTime> {
    match mapping.get(field) {
        Some(Value::String(text)) => parse_time(text)
            .ok_or_else(|| corrupt(format!("'{field}' of {id} is not a timestamp: {text}"))),
        _ => Err(corrupt(format!("'{field}' of {id} is missing"))),
    }
}

fn corrupt(message: String) -> HbnbError {
    HbnbError::DataCorruption { message }
}
