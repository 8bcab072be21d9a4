
use thiserror::Error;

/// Problems with what the user typed. These are printed verbatim and never
/// mutate the store.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("** class name missing **")]
    ClassNameMissing,
    #[error("** class doesn't exist **")]
    ClassDoesNotExist,
    #[error("** instance id missing **")]
    InstanceIdMissing,
    #[error("** no instance found **")]
    NoInstanceFound,
    #[error("** attribute name missing **")]
    AttributeNameMissing,
    #[error("** value missing **")]
    ValueMissing,
    #[error("** attribute can't be updated **")]
    ReadOnlyAttribute,
    #[error("** invalid dictionary **")]
    InvalidDictionary,
}

#[derive(Error, Debug)]
pub enum HbnbError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Data corruption: {message}")]
    DataCorruption { message: String },
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Input(#[from] InputError),
}

pub type Result<T> = std::result::Result<T, HbnbError>;

// Helper conversions
impl From<serde_json::Error> for HbnbError {
    fn from(e: serde_json::Error) -> Self { Self::DataCorruption { message: e.to_string() } }
}
impl From<config::ConfigError> for HbnbError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
