//! Class metadata lexer for extended Lua scripts
//!
//! An extended script starts with a class declaration comment and an optional
//! block of field declarations:
//!
//! ```lua
//! ---@class Enemy: Unit
//! ---@field public hp number
//! ---@field public drops Item[]
//! Enemy = {}
//! ```
//!
//! Leading blank lines and ordinary `--` comments are skipped. The first line
//! after them must be the class declaration, otherwise the source is reported
//! as [`Error::MalformedClassDeclaration`] and callers treat it as plain Lua.
//!
//! Field collection starts right after the declaration and stops at the first
//! line that is neither a field declaration nor a separator (blank or bare
//! `---`). Only `public` fields are kept.

use crate::{Error, FieldToken, Result};
use nom::{
    bytes::complete::{tag, take_while1},
    character::complete::{char, multispace0, multispace1},
    combinator::opt,
    sequence::{preceded, tuple},
    IResult,
};
use std::path::Path;
use tracing::trace;

/// Parsed class header of an extended Lua script
#[derive(Debug, Clone, PartialEq)]
pub struct ClassMetadata {
    class_name: String,
    base_class_name: Option<String>,
    normalized_script: String,
    fields: Vec<FieldToken>,
}

impl ClassMetadata {
    /// Parse an extended Lua source
    pub fn parse(source: &str) -> Result<Self> {
        if source.trim().is_empty() {
            return Err(Error::EmptySource);
        }

        // Lines passed over before the declaration, terminators included
        let mut skipped: Vec<&str> = Vec::new();
        let mut consumed = 0;
        let mut declaration = None;

        for line in source.split_inclusive('\n') {
            consumed += line.len();
            let text = line.trim_end_matches(&['\n', '\r'][..]);
            if is_skippable(text) {
                skipped.push(line);
                continue;
            }
            declaration = Some(text);
            break;
        }

        let line = declaration.unwrap_or_default();
        let (_, (class_name, base_class_name)) =
            class_declaration(line).map_err(|_| Error::MalformedClassDeclaration {
                line: line.to_string(),
            })?;

        if base_class_name == Some(class_name) {
            return Err(Error::BaseClassCycle {
                chain: vec![class_name.to_string(), class_name.to_string()],
            });
        }

        let rest = &source[consumed..];
        let fields = read_fields(rest);

        // Declaration first so the host reports body lines at their source numbers
        let normalized_script = format!("{}\n{}{}", line, skipped.concat(), rest);

        Ok(Self {
            class_name: class_name.to_string(),
            base_class_name: base_class_name.map(str::to_string),
            normalized_script,
            fields,
        })
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn base_class_name(&self) -> Option<&str> {
        self.base_class_name.as_deref()
    }

    /// Script text with the class declaration as line 1
    pub fn normalized_script(&self) -> &str {
        &self.normalized_script
    }

    /// Public fields in declaration order
    pub fn fields(&self) -> &[FieldToken] {
        &self.fields
    }

    /// Host directive that registers this class, e.g. `RegClass(Enemy,'Enemy','Unit')`
    pub fn registration_command(&self) -> String {
        match &self.base_class_name {
            Some(base) => format!(
                "RegClass({0},'{0}','{1}')",
                self.class_name, base
            ),
            None => format!("RegClass({0},'{0}')", self.class_name),
        }
    }
}

/// True for lines of the form `---@...`
pub fn is_metadata_comment(line: &str) -> bool {
    metadata_prefix(line).is_ok()
}

/// Class name for a script file: the file name up to its first dot
///
/// `Assets/Lua/Enemy.lua.txt` becomes `Enemy`.
pub fn class_name_from_file(file_name: &str) -> &str {
    let base = Path::new(file_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(file_name);
    base.split('.').next().unwrap_or(base)
}

/// Source for a freshly created class script
pub fn class_template(class_name: &str) -> String {
    format!("---@class {0}\n{0} = {{}}\n", class_name)
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || (trimmed.starts_with("--") && !is_metadata_comment(line))
}

fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed == "---"
}

fn read_fields(body: &str) -> Vec<FieldToken> {
    let mut fields = Vec::new();
    for line in body.lines() {
        if is_separator(line) {
            continue;
        }
        match field_declaration(line) {
            Ok((_, token)) if token.is_public() => fields.push(token),
            Ok((_, token)) => trace!("Skipping non-public field: {}", token),
            Err(_) => break,
        }
    }
    fields
}

// Grammar

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn type_expression(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '[' | ']'))(input)
}

// `---`, optional whitespace, `@`
fn metadata_prefix(input: &str) -> IResult<&str, ()> {
    let (input, _) = tuple((multispace0, tag("---"), multispace0, char('@')))(input)?;
    Ok((input, ()))
}

// `---@class Name` with optional `: Base`
fn class_declaration(input: &str) -> IResult<&str, (&str, Option<&str>)> {
    let (input, _) = metadata_prefix(input)?;
    let (input, _) = tag("class")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = identifier(input)?;
    let (input, base) = opt(preceded(
        tuple((multispace0, char(':'), multispace0)),
        identifier,
    ))(input)?;
    Ok((input, (name, base)))
}

// `---@field modifier name Type`
fn field_declaration(input: &str) -> IResult<&str, FieldToken> {
    let (input, _) = metadata_prefix(input)?;
    let (input, _) = tag("field")(input)?;
    let (input, _) = multispace1(input)?;
    let (input, modifier) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, name) = identifier(input)?;
    let (input, _) = multispace1(input)?;
    let (input, declared_type) = type_expression(input)?;
    Ok((input, FieldToken::new(name, declared_type, modifier)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENEMY: &str = "---@class Enemy: Unit\n---@field public hp number\n---@field public name string\nEnemy = {}";

    #[test]
    fn test_parse_enemy() {
        let meta = ClassMetadata::parse(ENEMY).unwrap();
        assert_eq!(meta.class_name(), "Enemy");
        assert_eq!(meta.base_class_name(), Some("Unit"));
        assert_eq!(
            meta.fields(),
            &[
                FieldToken::new("hp", "number", "public"),
                FieldToken::new("name", "string", "public"),
            ]
        );
    }

    #[test]
    fn test_class_without_base() {
        let meta = ClassMetadata::parse("---@class Foo\nFoo = {}\n").unwrap();
        assert_eq!(meta.class_name(), "Foo");
        assert_eq!(meta.base_class_name(), None);
        assert!(meta.fields().is_empty());
    }

    #[test]
    fn test_declaration_whitespace_variants() {
        for source in [
            "---@class Foo",
            "  --- @class Foo",
            "---@class\tFoo : Bar",
            "---@class Foo:Bar -- trailing note",
        ] {
            let meta = ClassMetadata::parse(source).unwrap();
            assert_eq!(meta.class_name(), "Foo", "source: {:?}", source);
        }

        let meta = ClassMetadata::parse("---@class Foo : Bar").unwrap();
        assert_eq!(meta.base_class_name(), Some("Bar"));
    }

    #[test]
    fn test_missing_declaration_is_malformed() {
        for source in [
            "local x = 1\nreturn x",
            "-- just a comment",
            "---@field public hp number\n---@class Foo",
            "---@classFoo",
            "---@class",
        ] {
            let err = ClassMetadata::parse(source).unwrap_err();
            assert!(err.is_not_annotated(), "source: {:?}, got {:?}", source, err);
        }
    }

    #[test]
    fn test_code_before_declaration_is_plain() {
        let err = ClassMetadata::parse("print('hi')\n---@class Foo\n").unwrap_err();
        match err {
            Error::MalformedClassDeclaration { line } => assert_eq!(line, "print('hi')"),
            other => panic!("Expected MalformedClassDeclaration, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(ClassMetadata::parse(""), Err(Error::EmptySource)));
        assert!(matches!(
            ClassMetadata::parse("  \n\t\n"),
            Err(Error::EmptySource)
        ));
    }

    #[test]
    fn test_self_inheritance_flagged() {
        let err = ClassMetadata::parse("---@class Loop: Loop\nLoop = {}").unwrap_err();
        assert!(matches!(err, Error::BaseClassCycle { .. }));
    }

    #[test]
    fn test_only_public_fields_kept() {
        let source = "---@class Foo\n---@field private secret string\n---@field public speed float\n---@field protected x number\nFoo = {}";
        let meta = ClassMetadata::parse(source).unwrap();
        let names: Vec<&str> = meta.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["speed"]);
    }

    #[test]
    fn test_field_scan_stops_at_code() {
        let source = "---@class Foo\n---@field public a number\nFoo = {}\n---@field public b number\n";
        let meta = ClassMetadata::parse(source).unwrap();
        assert_eq!(meta.fields().len(), 1);
        assert_eq!(meta.fields()[0].name(), "a");
    }

    #[test]
    fn test_field_scan_crosses_separators() {
        let source = "---@class Foo\n\n---@field public a number\n---\n---@field public b Item[]\nFoo = {}";
        let meta = ClassMetadata::parse(source).unwrap();
        let fields: Vec<(&str, &str)> = meta
            .fields()
            .iter()
            .map(|f| (f.name(), f.declared_type()))
            .collect();
        assert_eq!(fields, vec![("a", "number"), ("b", "Item[]")]);
    }

    #[test]
    fn test_malformed_field_stops_scan() {
        let source = "---@class Foo\n---@field public a\n---@field public b number\n";
        let meta = ClassMetadata::parse(source).unwrap();
        assert!(meta.fields().is_empty());
    }

    #[test]
    fn test_dotted_types_and_trailing_text() {
        let source = "---@class Foo\n---@field public tint UnityEngine.Color the tint\r\nFoo = {}";
        let meta = ClassMetadata::parse(source).unwrap();
        assert_eq!(meta.fields()[0].declared_type(), "UnityEngine.Color");
    }

    #[test]
    fn test_normalized_script_moves_declaration_first() {
        let source = "-- header comment\n\n---@class Foo\n---@field public a number\nFoo = {}\n";
        let meta = ClassMetadata::parse(source).unwrap();
        let lines: Vec<&str> = meta.normalized_script().lines().collect();
        assert_eq!(
            lines,
            vec![
                "---@class Foo",
                "-- header comment",
                "",
                "---@field public a number",
                "Foo = {}",
            ]
        );
        // Body keeps its source line number
        let body_line = source.lines().position(|l| l == "Foo = {}").unwrap();
        let normalized_line = lines.iter().position(|l| *l == "Foo = {}").unwrap();
        assert_eq!(body_line, normalized_line);
    }

    #[test]
    fn test_normalized_script_unchanged_when_declaration_first() {
        let meta = ClassMetadata::parse(ENEMY).unwrap();
        assert_eq!(meta.normalized_script(), ENEMY);
    }

    #[test]
    fn test_registration_command() {
        let meta = ClassMetadata::parse(ENEMY).unwrap();
        assert_eq!(meta.registration_command(), "RegClass(Enemy,'Enemy','Unit')");

        let meta = ClassMetadata::parse("---@class Unit\nUnit = {}").unwrap();
        assert_eq!(meta.registration_command(), "RegClass(Unit,'Unit')");
    }

    #[test]
    fn test_class_name_from_file() {
        assert_eq!(class_name_from_file("Enemy.lua.txt"), "Enemy");
        assert_eq!(class_name_from_file("Assets/Lua/Unit.lua"), "Unit");
        assert_eq!(class_name_from_file("Plain"), "Plain");
    }

    #[test]
    fn test_class_template_parses() {
        let source = class_template("Door");
        let meta = ClassMetadata::parse(&source).unwrap();
        assert_eq!(meta.class_name(), "Door");
        assert!(source.contains("Door = {}"));
    }

    #[test]
    fn test_metadata_comment_predicate() {
        assert!(is_metadata_comment("---@type Foo"));
        assert!(is_metadata_comment("  --- @class Foo"));
        assert!(!is_metadata_comment("-- @class Foo"));
        assert!(!is_metadata_comment("local x"));
    }
}
