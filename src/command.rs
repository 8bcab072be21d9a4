//! Turns raw console lines into [`Command`]s.
//!
//! Two surface syntaxes are accepted:
//! * verb first: `update User 1234 first_name "Betty"`
//! * dotted call: `User.update("1234", "first_name", "Betty")`
//!
//! A dotted call is rewritten into the verb first line it stands for and
//! that line is parsed like any other, except for `update` with a brace
//! delimited literal, which becomes a [`Change::Dict`]. The grammar lives in
//! `command.pest`. No validation happens here: a [`Command`] carries the raw
//! tokens and the console checks them in order.

use lazy_static::lazy_static;
use pest::Parser;
use pest::iterators::Pair;
use pest_derive::Parser;
use regex::Regex;
use tracing::debug;

#[derive(Parser)]
#[grammar = "command.pest"]
pub struct CommandParser;

lazy_static! {
    // class, id, attribute, then either a double quoted value or a bare token
    static ref ARGUMENTS: Regex =
        Regex::new(r#"^(\S+)(?:\s(\S+)(?:\s(\S+)(?:\s("[^"]*"|\S+))?)?)?"#).unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Create,
    Show,
    Destroy,
    All,
    Count,
    Update,
    Quit,
    Eof,
    Help,
}

impl Verb {
    pub const DOCUMENTED: [&'static str; 9] =
        ["EOF", "all", "count", "create", "destroy", "help", "quit", "show", "update"];

    pub fn from_token(token: &str) -> Option<Verb> {
        Some(match token {
            "create" => Verb::Create,
            "show" => Verb::Show,
            "destroy" => Verb::Destroy,
            "all" => Verb::All,
            "count" => Verb::Count,
            "update" => Verb::Update,
            "quit" => Verb::Quit,
            "EOF" => Verb::Eof,
            "help" => Verb::Help,
            _ => return None,
        })
    }
}

/// What an `update` assigns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// One attribute and its raw value text, either possibly missing.
    Single {
        attribute: Option<String>,
        value: Option<String>,
    },
    /// A brace delimited literal with any number of assignments.
    Dict(String),
}

/// The canonical form every line is reduced to before anything is checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Empty,
    /// Neither syntax matched; the trimmed line is kept for logging.
    Unknown(String),
    Quit,
    /// Like `Quit`, but the console first ends the output line.
    Eof,
    Help { topic: Option<String> },
    Create { class: Option<String>, params: Vec<String> },
    Show { class: Option<String>, id: Option<String> },
    Destroy { class: Option<String>, id: Option<String> },
    All { class: Option<String> },
    Count { class: Option<String> },
    Update { class: Option<String>, id: Option<String>, change: Change },
}

/// Whitespace separated tokens of a verb's arguments, the way every verb
/// except `create` reads them.
#[derive(Debug, Default, PartialEq, Eq)]
struct Arguments {
    class: Option<String>,
    id: Option<String>,
    attribute: Option<String>,
    value: Option<String>,
}

impl Arguments {
    fn tokenize(rest: &str) -> Self {
        let Some(captures) = ARGUMENTS.captures(rest) else {
            return Self::default();
        };
        let group = |i: usize| captures.get(i).map(|m| m.as_str().to_string());
        Self {
            class: group(1),
            id: group(2),
            attribute: group(3),
            value: group(4),
        }
    }
}

pub fn parse_line(line: &str) -> Command {
    parse_with(Rule::line, line)
}

/// Parses a line that may only be in verb first form.
pub fn parse_canonical(line: &str) -> Command {
    parse_with(Rule::canonical_line, line)
}

fn parse_with(rule: Rule, line: &str) -> Command {
    let parsed = match CommandParser::parse(rule, line) {
        Ok(mut pairs) => pairs.next(),
        Err(e) => {
            debug!(error = %e, "line matches neither syntax");
            None
        }
    };
    let Some(parsed) = parsed else {
        return Command::Unknown(line.trim().to_string());
    };
    for pair in parsed.into_inner() {
        match pair.as_rule() {
            Rule::call => return rewrite_call(pair),
            Rule::canonical => return canonical(pair),
            _ => (),
        }
    }
    Command::Empty
}

fn canonical(pair: Pair<Rule>) -> Command {
    let mut verb = None;
    let mut rest = "";
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::verb => verb = Verb::from_token(inner.as_str()),
            Rule::rest => rest = inner.as_str().trim(),
            _ => (),
        }
    }
    let Some(verb) = verb else {
        return Command::Unknown(rest.to_string());
    };
    let args = Arguments::tokenize(rest);
    match verb {
        Verb::Create => {
            let mut words = rest.split_whitespace().map(String::from);
            Command::Create {
                class: words.next(),
                params: words.collect(),
            }
        }
        Verb::Show => Command::Show { class: args.class, id: args.id },
        Verb::Destroy => Command::Destroy { class: args.class, id: args.id },
        Verb::All => Command::All { class: args.class },
        Verb::Count => Command::Count { class: args.class },
        Verb::Update => Command::Update {
            class: args.class,
            id: args.id,
            change: Change::Single {
                attribute: args.attribute,
                value: args.value,
            },
        },
        Verb::Help => Command::Help { topic: args.class },
        Verb::Quit => Command::Quit,
        Verb::Eof => Command::Eof,
    }
}

fn rewrite_call(pair: Pair<Rule>) -> Command {
    let (mut class, mut method, mut arguments) = ("", "", "");
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::class_name => class = inner.as_str(),
            Rule::method => method = inner.as_str(),
            Rule::arguments => arguments = inner.as_str(),
            _ => (),
        }
    }

    let (uid, remainder) = split_call_arguments(arguments);
    let mut assignment = String::new();
    if method == "update" {
        if let Some(remainder) = remainder {
            if remainder.len() >= 2 && remainder.starts_with('{') && remainder.ends_with('}') {
                return Command::Update {
                    class: non_empty(class),
                    id: non_empty(&uid),
                    change: Change::Dict(remainder),
                };
            }
            assignment = split_attribute_value(&remainder);
        }
    }

    let rewritten = format!("{method} {class} {uid} {assignment}");
    debug!(call = %format!("{class}.{method}({arguments})"), %rewritten, "dotted call rewritten");
    match parse_canonical(&rewritten) {
        // a call never ends the session
        Command::Quit | Command::Eof => Command::Empty,
        command => command,
    }
}

/// `"<id>", <remainder>` into its parts. Without a leading quoted id the
/// whole argument text is the id.
fn split_call_arguments(arguments: &str) -> (String, Option<String>) {
    let Ok(mut pairs) = CommandParser::parse(Rule::call_arguments, arguments) else {
        return (arguments.to_string(), None);
    };
    let (mut uid, mut remainder) = (String::new(), None);
    if let Some(parsed) = pairs.next() {
        for inner in parsed.into_inner() {
            match inner.as_rule() {
                Rule::uid => uid = inner.as_str().to_string(),
                Rule::remainder => remainder = non_empty(inner.as_str()),
                _ => (),
            }
        }
    }
    (uid, remainder)
}

/// `"<attribute>", <value>` into `<attribute> <value>`, or an empty string
/// when the text has another shape.
fn split_attribute_value(remainder: &str) -> String {
    let Ok(mut pairs) = CommandParser::parse(Rule::attribute_value, remainder) else {
        return String::new();
    };
    let (mut attribute, mut value) = ("", "");
    if let Some(parsed) = pairs.next() {
        for inner in parsed.into_inner() {
            match inner.as_rule() {
                Rule::attribute => attribute = inner.as_str(),
                Rule::value => value = inner.as_str(),
                _ => (),
            }
        }
    }
    format!("{attribute} {value}")
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}
