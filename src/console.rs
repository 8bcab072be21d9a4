//! The command interpreter.
//!
//! A [`Console`] owns the [`Storage`] and executes one line at a time. Every
//! line is first reduced to a [`Command`] by [`parse_line`]; only then are
//! its parts checked, always in the same order (class name, class, id,
//! instance, attribute, value). The first failed check is printed and
//! nothing is mutated. Successful mutations are persisted before the call
//! returns.

use std::io::{BufRead, Write};

use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use crate::command::{Change, Command, Verb, parse_line};
use crate::datatype::{Coercion, infer, quote_list};
use crate::error::{HbnbError, InputError, Result};
use crate::model::{Entity, is_protected, key_for};
use crate::registry::Class;
use crate::storage::Storage;

/// Whether the read loop should keep going after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything a line printed, plus what the loop should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub lines: Vec<String>,
    pub flow: Flow,
}

impl Response {
    /// All printed output joined back together.
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }
}

const HELP: [(&str, &str); 9] = [
    ("EOF", "Exit the console at end of input."),
    ("all", "Print every instance, or every instance of a class: all [<class>]"),
    ("count", "Print the number of instances of a class: count <class>"),
    ("create", "Create an instance and print its id: create <class> [<key>=<value> ...]"),
    ("destroy", "Delete an instance: destroy <class> <id>"),
    ("help", "List commands, or describe one: help [<command>]"),
    ("quit", "Exit the console."),
    ("show", "Print an instance: show <class> <id>"),
    ("update", "Set an attribute of an instance: update <class> <id> <attribute> <value>"),
];

pub struct Console {
    storage: Storage,
}

impl Console {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }
    pub fn storage(&self) -> &Storage {
        &self.storage
    }
    pub fn into_storage(self) -> Storage {
        self.storage
    }

    /// Executes a line, printing to standard output.
    pub fn execute(&mut self, line: &str) -> Result<Flow> {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        self.execute_to(line, &mut out)
    }

    /// Executes a line and returns what it printed.
    pub fn execute_collect(&mut self, line: &str) -> Result<Response> {
        let mut buffer = Vec::new();
        let flow = self.execute_to(line, &mut buffer)?;
        let text = String::from_utf8_lossy(&buffer);
        Ok(Response {
            lines: text.lines().map(String::from).collect(),
            flow,
        })
    }

    /// Executes a line, writing its output to `out`. Input problems are
    /// written as their message; every other error is returned.
    pub fn execute_to<W: Write>(&mut self, line: &str, out: &mut W) -> Result<Flow> {
        let command = parse_line(line);
        debug!(?command, "parsed");
        match self.dispatch(command, out) {
            Ok(flow) => Ok(flow),
            Err(HbnbError::Input(refusal)) => {
                writeln!(out, "{refusal}")?;
                Ok(Flow::Continue)
            }
            Err(e) => Err(e),
        }
    }

    /// Reads and executes lines until `quit`, `EOF` or the end of `input`.
    /// Errors that are not input problems are reported and the loop goes on.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, out: &mut W, prompt: Option<&str>) -> Result<()> {
        let mut lines = input.lines();
        loop {
            if let Some(prompt) = prompt {
                write!(out, "{prompt}")?;
                out.flush()?;
            }
            let Some(line) = lines.next() else {
                writeln!(out)?;
                break;
            };
            match self.execute_to(&line?, out) {
                Ok(Flow::Quit) => break,
                Ok(Flow::Continue) => (),
                Err(e) => {
                    error!(error = %e, "command failed");
                    writeln!(out, "** {e} **")?;
                }
            }
        }
        out.flush()?;
        Ok(())
    }

    fn dispatch<W: Write>(&mut self, command: Command, out: &mut W) -> Result<Flow> {
        match command {
            Command::Empty => (),
            Command::Unknown(line) => warn!(%line, "unknown syntax"),
            Command::Quit => return Ok(Flow::Quit),
            Command::Eof => {
                writeln!(out)?;
                return Ok(Flow::Quit);
            }
            Command::Help { topic } => help(topic.as_deref(), out)?,
            Command::Create { class, params } => self.create(class.as_deref(), &params, out)?,
            Command::Show { class, id } => {
                let key = self.existing_key(class.as_deref(), id.as_deref())?;
                if let Some(entity) = self.storage.get(&key) {
                    writeln!(out, "{entity}")?;
                }
            }
            Command::Destroy { class, id } => {
                let key = self.existing_key(class.as_deref(), id.as_deref())?;
                self.storage.destroy(&key)?;
                info!(%key, "destroyed");
            }
            Command::All { class } => {
                let class = match class.as_deref() {
                    Some(name) => Some(Class::lookup(name).ok_or(InputError::ClassDoesNotExist)?),
                    None => None,
                };
                let shown = self.storage.of_class(class).map(|entity| entity.to_string());
                writeln!(out, "{}", quote_list(shown))?;
            }
            Command::Count { class } => {
                let class = resolve_class(class.as_deref())?;
                writeln!(out, "{}", self.storage.count(class))?;
            }
            Command::Update { class, id, change } => {
                let key = self.existing_key(class.as_deref(), id.as_deref())?;
                match change {
                    Change::Single { attribute, value } => {
                        self.update(&key, attribute.as_deref(), value.as_deref())?
                    }
                    Change::Dict(literal) => self.update_dict(&key, &literal)?,
                }
            }
        }
        Ok(Flow::Continue)
    }

    fn create<W: Write>(&mut self, class: Option<&str>, params: &[String], out: &mut W) -> Result<()> {
        let class = resolve_class(class)?;
        let mut entity = Entity::new(class);
        for param in params {
            match parse_param(class, param) {
                Some((attribute, value)) => {
                    entity.set(attribute, value);
                }
                None => debug!(%param, "create parameter skipped"),
            }
        }
        let id = self.storage.insert(entity)?;
        writeln!(out, "{id}")?;
        Ok(())
    }

    /// Runs the class name, class, id and instance checks and returns the
    /// store key of the instance.
    fn existing_key(&self, class: Option<&str>, id: Option<&str>) -> Result<String> {
        let class = resolve_class(class)?;
        let id = id.filter(|id| !id.is_empty()).ok_or(InputError::InstanceIdMissing)?;
        let key = key_for(class, id);
        if !self.storage.contains(&key) {
            return Err(InputError::NoInstanceFound.into());
        }
        Ok(key)
    }

    fn update(&mut self, key: &str, attribute: Option<&str>, value: Option<&str>) -> Result<()> {
        let attribute = attribute.ok_or(InputError::AttributeNameMissing)?;
        let value = value.ok_or(InputError::ValueMissing)?;
        if is_protected(attribute) {
            return Err(InputError::ReadOnlyAttribute.into());
        }
        let class = self
            .storage
            .get(key)
            .map(|entity| entity.class())
            .ok_or(InputError::NoInstanceFound)?;
        let typed = typed_value(class, attribute, value);
        self.storage.modify(key, |entity| {
            entity.set(attribute, typed);
        })
    }

    /// Applies every key of a brace delimited literal, then saves once.
    fn update_dict(&mut self, key: &str, literal: &str) -> Result<()> {
        let assignments: Map<String, Value> = serde_json::from_str(&literal.replace('\'', "\""))
            .map_err(|e| {
                debug!(%literal, error = %e, "dictionary rejected");
                InputError::InvalidDictionary
            })?;
        self.storage.modify(key, |entity| {
            let class = entity.class();
            for (attribute, value) in assignments {
                if is_protected(&attribute) {
                    warn!(%attribute, "protected attribute skipped");
                    continue;
                }
                let value = match class.coercion(&attribute) {
                    Some(coercion) => coerce_or_keep(coercion, value),
                    None => value,
                };
                entity.set(&attribute, value);
            }
        })
    }
}

fn resolve_class(name: Option<&str>) -> Result<Class> {
    let name = name.filter(|n| !n.is_empty()).ok_or(InputError::ClassNameMissing)?;
    Class::lookup(name).ok_or_else(|| InputError::ClassDoesNotExist.into())
}

/// The in-memory value for raw update text. Quotes are stripped from a
/// quoted value; a declared coercion always wins, and without one an
/// unquoted value is inferred as float or integer.
fn typed_value(class: Class, attribute: &str, raw: &str) -> Value {
    let quoted = raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"');
    let text = if quoted { raw.replace('"', "") } else { raw.to_string() };
    match class.coercion(attribute) {
        Some(coercion) => coerce_or_keep(coercion, Value::String(text)),
        None if quoted => Value::String(text),
        None => infer(&text),
    }
}

fn coerce_or_keep(coercion: Coercion, value: Value) -> Value {
    match coercion.coerce(&value) {
        Some(coerced) => coerced,
        None => {
            debug!(%coercion, ?value, "value kept as given");
            value
        }
    }
}

/// `key=value` from `create`. Quoted values are text with `_` read as a
/// space; bare values must be numbers. Anything else is skipped.
fn parse_param(class: Class, param: &str) -> Option<(&str, Value)> {
    let (attribute, raw) = param.split_once('=')?;
    if attribute.is_empty() || is_protected(attribute) {
        return None;
    }
    let value = if raw.len() >= 2 && raw.starts_with('"') && raw.ends_with('"') {
        Value::String(raw[1..raw.len() - 1].replace("\\\"", "\"").replace('_', " "))
    } else {
        match infer(raw) {
            Value::String(_) => return None,
            number => number,
        }
    };
    let value = match class.coercion(attribute) {
        Some(coercion) => coerce_or_keep(coercion, value),
        None => value,
    };
    Some((attribute, value))
}

fn help<W: Write>(topic: Option<&str>, out: &mut W) -> Result<()> {
    match topic {
        None => {
            writeln!(out, "Documented commands (type help <topic>):")?;
            writeln!(out, "========================================")?;
            writeln!(out, "{}", Verb::DOCUMENTED.join("  "))?;
        }
        Some(topic) => match HELP.iter().find(|(verb, _)| *verb == topic) {
            Some((_, text)) => writeln!(out, "{text}")?,
            None => writeln!(out, "*** No help on {topic}")?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quoted_values_skip_inference() {
        assert_eq!(typed_value(Class::User, "age", "\"42\""), json!("42"));
        assert_eq!(typed_value(Class::User, "age", "42"), json!(42));
        assert_eq!(typed_value(Class::User, "height", "1.85"), json!(1.85));
        assert_eq!(typed_value(Class::User, "nick", "b3tty"), json!("b3tty"));
    }

    #[test]
    fn declared_coercion_wins() {
        assert_eq!(typed_value(Class::Place, "number_rooms", "\"3\""), json!(3));
        assert_eq!(typed_value(Class::Place, "latitude", "7"), json!(7.0));
        assert_eq!(typed_value(Class::Place, "name", "12"), json!("12"));
        assert_eq!(typed_value(Class::Place, "max_guest", "many"), json!("many"));
    }

    #[test]
    fn create_params() {
        assert_eq!(
            parse_param(Class::Place, "name=\"My_little_house\""),
            Some(("name", json!("My little house")))
        );
        assert_eq!(parse_param(Class::Place, "price_by_night=300"), Some(("price_by_night", json!(300))));
        assert_eq!(parse_param(Class::Place, "latitude=37.77"), Some(("latitude", json!(37.77))));
        assert_eq!(parse_param(Class::Place, "max_guest=lots"), None);
        assert_eq!(parse_param(Class::Place, "id=\"mine\""), None);
        assert_eq!(parse_param(Class::Place, "novalue"), None);
    }
}
