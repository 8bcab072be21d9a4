//! The closed set of entity classes and their declared fields.
//!
//! Every class resolves to a static field table. A field names an
//! attribute, and its [`Coercion`] both converts external text into the
//! attribute's in-memory type and provides the attribute's default value.
//! `BaseModel` declares no fields of its own; identity and timestamps are
//! carried by every entity (see [`crate::model::Entity`]).

use std::fmt;
use std::str::FromStr;

use crate::datatype::Coercion;
use crate::error::HbnbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub coercion: Coercion,
}

const fn field(name: &'static str, coercion: Coercion) -> Field {
    Field { name, coercion }
}

const BASE_MODEL: &[Field] = &[];
const USER: &[Field] = &[
    field("email", Coercion::Text),
    field("password", Coercion::Text),
    field("first_name", Coercion::Text),
    field("last_name", Coercion::Text),
];
const STATE: &[Field] = &[field("name", Coercion::Text)];
const CITY: &[Field] = &[
    field("state_id", Coercion::Text),
    field("name", Coercion::Text),
];
const AMENITY: &[Field] = &[field("name", Coercion::Text)];
const PLACE: &[Field] = &[
    field("city_id", Coercion::Text),
    field("user_id", Coercion::Text),
    field("name", Coercion::Text),
    field("description", Coercion::Text),
    field("number_rooms", Coercion::Integer),
    field("number_bathrooms", Coercion::Integer),
    field("max_guest", Coercion::Integer),
    field("price_by_night", Coercion::Integer),
    field("latitude", Coercion::Float),
    field("longitude", Coercion::Float),
    field("amenity_ids", Coercion::List),
];
const REVIEW: &[Field] = &[
    field("place_id", Coercion::Text),
    field("user_id", Coercion::Text),
    field("text", Coercion::Text),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Class {
    BaseModel,
    User,
    State,
    City,
    Amenity,
    Place,
    Review,
}

impl Class {
    pub const ALL: [Class; 7] = [
        Class::BaseModel,
        Class::User,
        Class::State,
        Class::City,
        Class::Amenity,
        Class::Place,
        Class::Review,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Class::BaseModel => "BaseModel",
            Class::User => "User",
            Class::State => "State",
            Class::City => "City",
            Class::Amenity => "Amenity",
            Class::Place => "Place",
            Class::Review => "Review",
        }
    }

    pub fn fields(&self) -> &'static [Field] {
        match self {
            Class::BaseModel => BASE_MODEL,
            Class::User => USER,
            Class::State => STATE,
            Class::City => CITY,
            Class::Amenity => AMENITY,
            Class::Place => PLACE,
            Class::Review => REVIEW,
        }
    }

    /// The declared coercion for an attribute, if the class declares it.
    pub fn coercion(&self, attribute: &str) -> Option<Coercion> {
        self.fields()
            .iter()
            .find(|field| field.name == attribute)
            .map(|field| field.coercion)
    }

    /// Lookup by exact (case sensitive) name.
    pub fn lookup(name: &str) -> Option<Class> {
        Class::ALL.iter().copied().find(|class| class.name() == name)
    }
}

impl FromStr for Class {
    type Err = HbnbError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Class::lookup(s).ok_or_else(|| HbnbError::UnknownClass(s.to_string()))
    }
}

impl fmt::Display for Class {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
