//! Reader for MDL-shaped text.
//!
//! Turns rendered text back into a tree of [`Section`]s so callers can inspect
//! what a document contains (block counts, tags, line endpoints) without
//! string matching. The grammar is line oriented:
//!
//! ```text
//! document  := ws section ws EOF
//! section   := IDENT inline-ws '{' entries '}'
//! entries   := (ws (section | parameter))* ws
//! parameter := IDENT inline-ws (QUOTED | VALUE-TO-END-OF-LINE)
//! ```
//!
//! Values are not escaped by the writer. A quoted value runs from its opening
//! `"` to the first `"` that ends a line, so it may span several lines.

use winnow::{
    Parser as _,
    ascii::{multispace0, space0},
    combinator::{cut_err, eof, opt},
    error::{AddContext, ContextError, ErrMode, ModalResult},
    stream::{LocatingSlice, Location, Stream},
    token::{take_till, take_while},
};

use crate::error::ReadError;

type Input<'a> = LocatingSlice<&'a str>;
type IResult<O> = ModalResult<O, ContextError<&'static str>>;

/// A parameter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A double-quoted string, without its quotes.
    Text(String),
    /// A bracketed, comma-separated list such as a `Position`.
    List(Vec<String>),
    /// Anything else, such as `on` or `10.0`.
    Bare(String),
}

impl Value {
    fn from_raw(raw: &str) -> Self {
        if let Some(inner) = raw.strip_prefix('"').and_then(|rest| rest.strip_suffix('"')) {
            return Value::Text(inner.to_owned());
        }
        if let Some(inner) = raw.strip_prefix('[').and_then(|rest| rest.strip_suffix(']')) {
            let items = inner
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_owned)
                .collect();
            return Value::List(items);
        }
        Value::Bare(raw.to_owned())
    }

    /// Returns the string content of a quoted or bare value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) | Value::Bare(text) => Some(text),
            Value::List(_) => None,
        }
    }

    /// Returns the items of a list value.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

/// A `key value` line inside a section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    key: String,
    value: Value,
}

impl Parameter {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

/// A named `{ ... }` section with its parameters and nested sections in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    parameters: Vec<Parameter>,
    sections: Vec<Section>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            parameters: Vec::new(),
            sections: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Returns the value of the first parameter named `key`.
    pub fn parameter(&self, key: &str) -> Option<&Value> {
        self.parameters
            .iter()
            .find(|parameter| parameter.key == key)
            .map(Parameter::value)
    }

    /// Iterates over the direct child sections named `name`.
    pub fn sections_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Section> {
        self.sections
            .iter()
            .filter(move |section| section.name == name)
    }

    /// Returns the first direct child section named `name`.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }
}

enum Entry {
    Parameter(Parameter),
    Section(Section),
}

fn identifier<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_').parse_next(input)
}

fn blank<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    multispace0.parse_next(input)
}

fn inline_space<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    space0.parse_next(input)
}

fn open_brace(input: &mut Input<'_>) -> IResult<char> {
    '{'.parse_next(input)
}

fn close_brace(input: &mut Input<'_>) -> IResult<char> {
    '}'.parse_next(input)
}

fn rest_of_line<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    take_till(1.., ['\r', '\n']).parse_next(input)
}

/// Byte length of the quoted value at the start of `text`, closing quote
/// included.
fn quoted_len(text: &str) -> Option<usize> {
    text.match_indices('"').skip(1).find_map(|(index, _)| {
        let after = text[index + 1..].trim_start_matches([' ', '\t']);
        (after.is_empty() || after.starts_with(['\r', '\n'])).then_some(index + 1)
    })
}

fn quoted_value<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    let text: &'a str = **input;
    match quoted_len(text) {
        Some(len) => Ok(input.next_slice(len)),
        None => Err(ErrMode::Cut(ContextError::new().add_context(
            input,
            &input.checkpoint(),
            "closing quote",
        ))),
    }
}

fn end_of_input<'a>(input: &mut Input<'a>) -> IResult<&'a str> {
    eof.parse_next(input)
}

fn entry(input: &mut Input<'_>) -> IResult<Entry> {
    let key = cut_err(identifier)
        .context("parameter or section name")
        .parse_next(input)?;
    inline_space(input)?;

    if opt(open_brace).parse_next(input)?.is_some() {
        return section_body(input, key).map(Entry::Section);
    }

    let raw = if input.starts_with('"') {
        quoted_value(input)?
    } else {
        cut_err(rest_of_line)
            .context("parameter value")
            .parse_next(input)?
    };

    Ok(Entry::Parameter(Parameter {
        key: key.to_owned(),
        value: Value::from_raw(raw.trim()),
    }))
}

/// Parses entries after an opening brace up to and including the closing one.
fn section_body(input: &mut Input<'_>, name: &str) -> IResult<Section> {
    let mut section = Section::new(name);

    loop {
        blank(input)?;

        if opt(close_brace).parse_next(input)?.is_some() {
            return Ok(section);
        }

        if input.is_empty() {
            return Err(ErrMode::Cut(ContextError::new().add_context(
                input,
                &input.checkpoint(),
                "closing brace",
            )));
        }

        match entry(input)? {
            Entry::Parameter(parameter) => section.parameters.push(parameter),
            Entry::Section(child) => section.sections.push(child),
        }
    }
}

fn document(input: &mut Input<'_>) -> IResult<Section> {
    blank(input)?;
    let name = cut_err(identifier)
        .context("section name")
        .parse_next(input)?;
    inline_space(input)?;
    cut_err(open_brace)
        .context("opening brace")
        .parse_next(input)?;

    let root = section_body(input, name)?;

    blank(input)?;
    cut_err(end_of_input)
        .context("end of input")
        .parse_next(input)?;

    Ok(root)
}

/// Reads MDL text into its root section.
///
/// # Errors
///
/// Returns a [`ReadError`] naming what was expected and the byte offset at
/// which reading stopped.
///
/// # Examples
///
/// ```
/// let root = flowsketch_mdl::read("Model {\n  Name \"M\"\n  System {\n  }\n}\n").unwrap();
///
/// assert_eq!(root.name(), "Model");
/// assert_eq!(root.parameter("Name").and_then(|v| v.as_text()), Some("M"));
/// assert!(root.section("System").is_some());
/// ```
pub fn read(text: &str) -> Result<Section, ReadError> {
    let mut input = LocatingSlice::new(text);

    document(&mut input).map_err(|err| {
        let offset = input.current_token_start();
        let expected = match err {
            ErrMode::Backtrack(ctx) | ErrMode::Cut(ctx) => ctx.context().next().copied(),
            ErrMode::Incomplete(_) => None,
        };
        match expected {
            Some(expected) => ReadError::new(format!("expected {expected}"), offset),
            None => ReadError::new("unexpected input", offset),
        }
    })
}
