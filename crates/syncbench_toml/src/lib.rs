//! Reader for the subset of TOML used by syncbench settings files
//!
//! Supported are comments, `[table]` and `[dotted.table]` headers, bare, quoted and dotted keys, basic strings, integers (decimal, hexadecimal, octal and binary), floats, booleans and arrays.
//! Array tables, inline tables, literal strings and dates are not supported.

use core::fmt;
use std::collections::HashMap;

pub mod str_parser;

use str_parser::{ParserError, StrParser};

/// TOML parsing error
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct TomlParseError(pub ParserError);

impl fmt::Display for TomlParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!("Failed to parse toml at {}:{}, err: {}", self.0.line, self.0.column, self.0.msg))
    }
}

impl std::error::Error for TomlParseError {}

#[derive(Clone, PartialEq, Debug)]
pub enum Item {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Array(Vec<Item>),
    Table(Table),
}

impl Item {
    /// Get the TOML name of the type of the item
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::String(_)  => "string",
            Item::Integer(_) => "integer",
            Item::Float(_)   => "float",
            Item::Boolean(_) => "boolean",
            Item::Array(_)   => "array",
            Item::Table(_)   => "table",
        }
    }
}

/// Toml table, keeping its items in insertion order
#[derive(Clone, PartialEq, Debug, Default)]
pub struct Table {
    items   : Vec<(String, Item)>,
    mapping : HashMap<String, usize>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an item into the table.
    ///
    /// Returns `false` if an item with the same key already exists.
    pub fn insert(&mut self, key: String, item: Item) -> bool {
        if self.mapping.contains_key(&key) {
            return false;
        }
        self.mapping.insert(key.clone(), self.items.len());
        self.items.push((key, item));
        true
    }

    /// Get an item from the table
    pub fn get_item(&self, key: &str) -> Option<&Item> {
        self.mapping.get(key).map(|&idx| &self.items[idx].1)
    }

    /// Get an item of a given type from the table
    pub fn get<T: FromTomlItem + ?Sized>(&self, key: &str) -> Option<&T> {
        self.get_item(key).and_then(T::from_item)
    }

    /// Get a sub-table
    pub fn get_table(&self, key: &str) -> Option<&Table> {
        self.get(key)
    }

    /// Iterate over all items in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Item)> {
        self.items.iter().map(|(key, item)| (key.as_str(), item))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the table at the end of `keys`, adding any table that does not exist yet.
    ///
    /// Returns `None` if one of the keys points to a non-table item.
    fn get_or_add_table(&mut self, keys: &[String]) -> Option<&mut Table> {
        let Some((first, rest)) = keys.split_first() else {
            return Some(self);
        };

        let idx = match self.mapping.get(first) {
            Some(&idx) => idx,
            None => {
                self.insert(first.clone(), Item::Table(Table::new()));
                self.items.len() - 1
            },
        };
        match &mut self.items[idx].1 {
            Item::Table(table) => table.get_or_add_table(rest),
            _ => None,
        }
    }

    /// Insert an item at a dotted key path.
    fn insert_path(&mut self, keys: &[String], item: Item) -> bool {
        let Some((last, parents)) = keys.split_last() else {
            return false;
        };
        match self.get_or_add_table(parents) {
            Some(table) => table.insert(last.clone(), item),
            None => false,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default)]
pub struct Toml {
    table : Table,
}

impl Toml {
    /// Create a new, empty toml
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse toml from a string
    pub fn parse(source: &str) -> Result<Self, TomlParseError> {
        Parser::new(source).parse()
    }

    /// Get an element from the root table
    pub fn get(&self, key: &str) -> Option<&Item> {
        self.table.get_item(key)
    }

    /// Get a table from the root table
    pub fn get_table(&self, key: &str) -> Option<&Table> {
        self.table.get_table(key)
    }

    /// Get the root table
    pub fn root(&self) -> &Table {
        &self.table
    }
}

struct Parser<'a> {
    parser : StrParser<'a>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self { parser: StrParser::new(source) }
    }

    fn parse(&mut self) -> Result<Toml, TomlParseError> {
        let mut toml = Toml::new();
        let mut cur_table = Vec::new();

        self.parser.consume_whitespace(true);
        while self.parser.can_parse() {
            match self.parser.peek() {
                Some('#') => self.parser.consume_to_eol(),
                Some('[') => {
                    self.parser.consume_char('[');
                    self.parser.consume_whitespace(false);
                    let keys = self.parse_keys()?;
                    self.parser.consume_whitespace(false);
                    if !self.parser.consume_char(']') {
                        return Err(self.error("Table header is not closed"));
                    }
                    if toml.table.get_or_add_table(&keys).is_none() {
                        return Err(self.error("Path does not point to a table"));
                    }
                    cur_table = keys;
                },
                _ => {
                    let (keys, item) = self.parse_key_item()?;
                    let inserted = toml.table.get_or_add_table(&cur_table)
                        .map_or(false, |table| table.insert_path(&keys, item));
                    if !inserted {
                        return Err(self.error("Duplicate key, or key path does not point to a table"));
                    }
                },
            }

            self.parse_end_of_line()?;
            self.parser.consume_whitespace(true);
        }
        Ok(toml)
    }

    // After an entry, only a comment may follow on the same line
    fn parse_end_of_line(&mut self) -> Result<(), TomlParseError> {
        self.parser.consume_whitespace(false);
        if self.parser.peek() == Some('#') {
            self.parser.consume_to_eol();
        }
        if self.parser.can_parse() && !self.parser.consume_char('\n') {
            return Err(self.error("Expected a new line"));
        }
        Ok(())
    }

    fn parse_key_item(&mut self) -> Result<(Vec<String>, Item), TomlParseError> {
        let keys = self.parse_keys()?;
        self.parser.consume_whitespace(false);
        if !self.parser.consume_char('=') {
            return Err(self.error("Key is not followed by an `=`"));
        }
        self.parser.consume_whitespace(false);
        let item = self.parse_item()?;
        Ok((keys, item))
    }

    fn parse_keys(&mut self) -> Result<Vec<String>, TomlParseError> {
        let mut keys = Vec::new();
        loop {
            let key = if self.parser.peek() == Some('"') {
                self.parse_basic_string()?
            } else {
                let key = self.parser.extract_until(|ch: char| !ch.is_ascii_alphanumeric() && ch != '-' && ch != '_');
                if key.is_empty() {
                    return Err(self.error("Invalid key"));
                }
                key.to_string()
            };
            keys.push(key);

            self.parser.consume_whitespace(false);
            if !self.parser.consume_char('.') {
                return Ok(keys);
            }
            self.parser.consume_whitespace(false);
        }
    }

    fn parse_item(&mut self) -> Result<Item, TomlParseError> {
        let Some(first) = self.parser.peek() else {
            return Err(self.error("End of file"));
        };

        match first {
            '"' => self.parse_basic_string().map(Item::String),
            '[' => self.parse_array(),
            't' | 'f' => {
                let word = self.parser.extract_until(|ch: char| !ch.is_ascii_alphanumeric());
                match word {
                    "true" => Ok(Item::Boolean(true)),
                    "false" => Ok(Item::Boolean(false)),
                    _ => Err(self.error("Invalid item")),
                }
            },
            ch if ch.is_ascii_digit() || ch == '-' || ch == '+' || ch == 'i' || ch == 'n' => self.parse_number(),
            _ => Err(self.error("Invalid item")),
        }
    }

    fn parse_basic_string(&mut self) -> Result<String, TomlParseError> {
        let valid = self.parser.consume_char('"');
        debug_assert!(valid);

        let mut res = String::new();
        loop {
            let Some(ch) = self.parser.peek() else {
                return Err(self.error("String is not closed"));
            };
            self.parser.consume_count(ch.len_utf8());

            match ch {
                '"' => return Ok(res),
                '\n' => return Err(self.error("String is not closed before the end of the line")),
                '\\' => {
                    let escaped = match self.parser.peek() {
                        Some('"')  => '"',
                        Some('\\') => '\\',
                        Some('n')  => '\n',
                        Some('t')  => '\t',
                        Some('r')  => '\r',
                        _ => return Err(self.error("Invalid escape sequence")),
                    };
                    self.parser.consume_count(1);
                    res.push(escaped);
                },
                ch => res.push(ch),
            }
        }
    }

    fn parse_number(&mut self) -> Result<Item, TomlParseError> {
        let literal = self.parser.extract_until(|ch: char| !ch.is_ascii_alphanumeric() && ch != '-' && ch != '+' && ch != '_' && ch != '.');
        let mut s = literal.to_string();
        s.retain(|ch| ch != '_');

        let (negative, digits) = match s.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, s.strip_prefix('+').unwrap_or(&s)),
        };

        let radix = if digits.starts_with("0x") {
            Some(16)
        } else if digits.starts_with("0o") {
            Some(8)
        } else if digits.starts_with("0b") {
            Some(2)
        } else {
            None
        };

        if digits == "inf" {
            Ok(Item::Float(if negative { f64::NEG_INFINITY } else { f64::INFINITY }))
        } else if digits == "nan" {
            Ok(Item::Float(f64::NAN))
        } else if let Some(radix) = radix {
            match i64::from_str_radix(&digits[2..], radix) {
                Ok(val) if !negative => Ok(Item::Integer(val)),
                _ => Err(self.error("Invalid integer literal")),
            }
        } else if s.contains(['.', 'e', 'E']) {
            s.parse::<f64>().map(Item::Float).map_err(|_| self.error("Invalid float literal"))
        } else {
            s.parse::<i64>().map(Item::Integer).map_err(|_| self.error("Invalid integer literal"))
        }
    }

    fn parse_array(&mut self) -> Result<Item, TomlParseError> {
        let valid = self.parser.consume_char('[');
        debug_assert!(valid);

        let mut arr = Vec::new();
        loop {
            self.skip_array_whitespace();
            if self.parser.consume_char(']') {
                return Ok(Item::Array(arr));
            }

            arr.push(self.parse_item()?);

            self.skip_array_whitespace();
            if !self.parser.consume_char(',') {
                self.skip_array_whitespace();
                return if self.parser.consume_char(']') {
                    Ok(Item::Array(arr))
                } else {
                    Err(self.error("Array was not ended correctly"))
                };
            }
        }
    }

    // Arrays may span multiple lines and contain comments
    fn skip_array_whitespace(&mut self) {
        loop {
            self.parser.consume_whitespace(true);
            if self.parser.peek() == Some('#') {
                self.parser.consume_to_eol();
            } else {
                return;
            }
        }
    }

    fn error(&self, msg: &'static str) -> TomlParseError {
        TomlParseError(self.parser.error(msg))
    }
}

pub trait FromTomlItem {
    fn from_item(item: &Item) -> Option<&Self>;
}

impl FromTomlItem for Item {
    fn from_item(item: &Item) -> Option<&Self> {
        Some(item)
    }
}

macro_rules! impl_from_toml_item {
    ($ty:ty => $iden:ident) => {
        impl FromTomlItem for $ty {
            fn from_item(item: &Item) -> Option<&Self> {
                if let Item::$iden(s) = item {
                    Some(s)
                } else {
                    None
                }
            }
        }
    };
}
impl_from_toml_item!(String => String);
impl_from_toml_item!(i64 => Integer);
impl_from_toml_item!(f64 => Float);
impl_from_toml_item!(bool => Boolean);
impl_from_toml_item!(Vec<Item> => Array);
impl_from_toml_item!(Table => Table);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tables_and_values() {
        let toml = Toml::parse(r#"
# leading comment
title = "sync \"bench\""

[benchmark]
workers = 4
iterations = 10_000
kinds = [
    "mutex", # baseline
    "monitor",
]
track-occupancy = true

[dining.timing]
think-ms = 0x10
ratio = 0.5
"#).unwrap();

        assert_eq!(toml.root().get::<String>("title").map(String::as_str), Some("sync \"bench\""));

        let bench = toml.get_table("benchmark").unwrap();
        assert_eq!(bench.get::<i64>("workers"), Some(&4));
        assert_eq!(bench.get::<i64>("iterations"), Some(&10_000));
        assert_eq!(bench.get::<bool>("track-occupancy"), Some(&true));
        assert_eq!(bench.get::<Vec<Item>>("kinds").map(Vec::len), Some(2));
        assert_eq!(bench.iter().map(|(key, _)| key).collect::<Vec<_>>(), ["workers", "iterations", "kinds", "track-occupancy"]);

        let timing = toml.get_table("dining").and_then(|dining| dining.get_table("timing")).unwrap();
        assert_eq!(timing.get::<i64>("think-ms"), Some(&16));
        assert_eq!(timing.get::<f64>("ratio"), Some(&0.5));
    }

    #[test]
    fn dotted_keys() {
        let toml = Toml::parse("log.level = \"info\"\nlog.always-flush = false").unwrap();
        let log = toml.get_table("log").unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log.get::<String>("level").map(String::as_str), Some("info"));
    }

    #[test]
    fn numbers() {
        let toml = Toml::parse("a = -12\nb = +3\nc = 1e3\nd = -inf\ne = 0b101").unwrap();
        assert_eq!(toml.get("a"), Some(&Item::Integer(-12)));
        assert_eq!(toml.get("b"), Some(&Item::Integer(3)));
        assert_eq!(toml.get("c"), Some(&Item::Float(1000.0)));
        assert_eq!(toml.get("d"), Some(&Item::Float(f64::NEG_INFINITY)));
        assert_eq!(toml.get("e"), Some(&Item::Integer(5)));
    }

    #[test]
    fn errors() {
        let err = Toml::parse("a = 1\na = 2").unwrap_err();
        assert_eq!(err.0.line, 2);

        assert!(Toml::parse("[open").is_err());
        assert!(Toml::parse("key 1").is_err());
        assert!(Toml::parse("key = \"unterminated").is_err());
        assert!(Toml::parse("key = [1, 2").is_err());
        assert!(Toml::parse("key = 1 2").is_err());
        assert!(Toml::parse("a = 1\n[a]").is_err());
        assert!(Toml::parse("flag = maybe").is_err());
    }

    #[test]
    fn empty_document() {
        let toml = Toml::parse("\n# nothing here\n\n").unwrap();
        assert!(toml.root().is_empty());
    }
}
