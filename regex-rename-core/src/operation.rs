use crate::tags::{self, Segment};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Case transformation applied by [`OperationSpec::ChangeCase`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    Lower,
    Upper,
    /// First letter of every word upper case, the rest lower case. A word starts at the
    /// beginning of the name or after any character that is not alphanumeric.
    Title,
}

impl CaseMode {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::Lower => name.to_lowercase(),
            Self::Upper => name.to_uppercase(),
            Self::Title => title_case(name),
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Lower => "lower",
            Self::Upper => "upper",
            Self::Title => "title",
        }
    }
}

impl FromStr for CaseMode {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lower" | "lowercase" => Ok(Self::Lower),
            "upper" | "uppercase" => Ok(Self::Upper),
            "title" | "titlecase" => Ok(Self::Title),
            _ => Err(OperationParseError::UnknownCase(s.to_string())),
        }
    }
}

fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut word_start = true;

    for ch in name.chars() {
        if ch.is_alphanumeric() {
            if word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            word_start = false;
        } else {
            out.push(ch);
            word_start = true;
        }
    }

    out
}

/// Regex replacement within the base name.
///
/// The pattern is compiled once here. A pattern that fails to compile makes the
/// operation a pass-through rather than an error, so half-typed patterns never break a
/// preview.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaceSpec {
    pattern: String,
    replacement: String,
    #[serde(skip)]
    regex: Option<Regex>,
}

impl ReplaceSpec {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern).ok();
        Self {
            pattern,
            replacement: replacement.into(),
            regex,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn replacement(&self) -> &str {
        &self.replacement
    }

    pub fn is_valid(&self) -> bool {
        self.regex.is_some()
    }

    fn perform(&self, file_name: &str, file_index: usize) -> String {
        let Some(regex) = &self.regex else {
            return file_name.to_string();
        };

        // Tags are expanded before capture references, and the digits they produce are
        // kept out of the reference parser so `$1<00>` can never turn into group 101.
        let pieces = tags::segments(&self.replacement, file_index);
        let (base, extension) = split_extension(file_name);

        let replaced = regex.replace_all(base, |caps: &Captures<'_>| {
            let mut dst = String::new();
            for piece in &pieces {
                match piece {
                    Segment::Text(template) => expand_references(template, caps, &mut dst),
                    Segment::Number(number) => dst.push_str(number),
                }
            }
            dst
        });

        format!("{replaced}{extension}")
    }
}

/// Append `template` to `dst` with capture references substituted.
///
/// `$N`, `${N}`, `${name}` and `\N` refer to groups. Digits after `$` or `\` use the
/// longest prefix that names a group of the pattern; otherwise the text is literal.
/// `$$` and `\\` produce a single `$` and `\`.
fn expand_references(template: &str, caps: &Captures<'_>, dst: &mut String) {
    let mut rest = template;

    while let Some(at) = rest.find(['$', '\\']) {
        dst.push_str(&rest[..at]);
        let marker = &rest[at..=at];
        let after = &rest[at + 1..];

        if after.starts_with(marker) {
            dst.push_str(marker);
            rest = &after[1..];
            continue;
        }

        match group_reference(marker, after, caps.len()) {
            Some((group, consumed)) => {
                let matched = match group {
                    GroupRef::Index(index) => caps.get(index),
                    GroupRef::Name(name) => caps.name(name),
                };
                if let Some(m) = matched {
                    dst.push_str(m.as_str());
                }
                rest = &after[consumed..];
            },
            None => {
                dst.push_str(marker);
                rest = after;
            },
        }
    }

    dst.push_str(rest);
}

enum GroupRef<'a> {
    Index(usize),
    Name(&'a str),
}

/// Parse the reference following `marker`, returning it and the bytes it spans.
fn group_reference<'a>(
    marker: &str,
    after: &'a str,
    group_count: usize,
) -> Option<(GroupRef<'a>, usize)> {
    let digits = after.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        return (1..=digits).rev().find_map(|len| {
            let index = after[..len].parse::<usize>().ok()?;
            (index < group_count).then_some((GroupRef::Index(index), len))
        });
    }

    if marker == "$" && after.starts_with('{') {
        let close = after.find('}')?;
        let name = &after[1..close];
        if name.is_empty() {
            return None;
        }
        let group = name
            .parse::<usize>()
            .map_or(GroupRef::Name(name), GroupRef::Index);
        return Some((group, close + 1));
    }

    None
}

impl PartialEq for ReplaceSpec {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.replacement == other.replacement
    }
}

impl Eq for ReplaceSpec {}

/// One step of a naming pipeline.
///
/// Text arguments of `Prefix`, `Suffix`, `Insert` and the replacement of `Replace` may
/// contain numbering tags (see [`crate::tags`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OperationSpec {
    Replace(ReplaceSpec),
    Prefix { text: String },
    Suffix { text: String },
    /// Insert at a character offset into the base name, clamped to its bounds.
    Insert { position: i64, text: String },
    ChangeExtension { new_extension: String },
    RemoveExtension,
    ChangeCase { mode: CaseMode },
}

impl OperationSpec {
    pub fn replace(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self::Replace(ReplaceSpec::new(pattern, replacement))
    }

    pub fn prefix(text: impl Into<String>) -> Self {
        Self::Prefix { text: text.into() }
    }

    pub fn suffix(text: impl Into<String>) -> Self {
        Self::Suffix { text: text.into() }
    }

    pub fn insert(position: i64, text: impl Into<String>) -> Self {
        Self::Insert {
            position,
            text: text.into(),
        }
    }

    pub fn change_extension(new_extension: impl Into<String>) -> Self {
        Self::ChangeExtension {
            new_extension: new_extension.into(),
        }
    }

    pub fn change_case(mode: CaseMode) -> Self {
        Self::ChangeCase { mode }
    }

    /// False only for a `Replace` whose pattern does not compile.
    pub fn is_valid(&self) -> bool {
        match self {
            Self::Replace(spec) => spec.is_valid(),
            _ => true,
        }
    }

    /// Transform `file_name` for the file at `file_index`.
    pub fn perform(&self, file_name: &str, file_index: usize) -> String {
        match self {
            Self::Replace(spec) => spec.perform(file_name, file_index),
            Self::Prefix { text } => {
                let mut out = tags::expand(text, file_index);
                out.push_str(file_name);
                out
            },
            Self::Suffix { text } => {
                let (base, extension) = split_extension(file_name);
                format!("{base}{}{extension}", tags::expand(text, file_index))
            },
            Self::Insert { position, text } => {
                let (base, extension) = split_extension(file_name);
                let at = char_to_byte_offset(base, *position);
                format!(
                    "{}{}{}{extension}",
                    &base[..at],
                    tags::expand(text, file_index),
                    &base[at..]
                )
            },
            Self::ChangeExtension { new_extension } => {
                let (base, _) = split_extension(file_name);
                let mut out = base.to_string();
                if !new_extension.is_empty() {
                    if !new_extension.starts_with('.') {
                        out.push('.');
                    }
                    out.push_str(new_extension);
                }
                out
            },
            Self::RemoveExtension => split_extension(file_name).0.to_string(),
            Self::ChangeCase { mode } => mode.apply(file_name),
        }
    }
}

/// Split a file name into base name and extension (extension keeps its leading dot).
///
/// Only the last dot counts, and only when it is not the first character, so
/// `.bashrc` has no extension while `archive.tar.gz` has `.gz`.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(dot) if dot > 0 => file_name.split_at(dot),
        _ => (file_name, ""),
    }
}

fn char_to_byte_offset(text: &str, position: i64) -> usize {
    let Ok(chars) = usize::try_from(position) else {
        return 0;
    };
    text.char_indices().nth(chars).map_or(text.len(), |(i, _)| i)
}

/// Error parsing an operation from its command-line form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OperationParseError {
    #[error("unknown operation '{0}' (expected replace, prefix, suffix, insert, ext, remove-ext or case)")]
    UnknownKind(String),
    #[error("operation '{0}' needs an argument")]
    MissingArgument(String),
    #[error("invalid insert position '{0}'")]
    InvalidPosition(String),
    #[error("unknown case mode '{0}' (expected lower, upper or title)")]
    UnknownCase(String),
    #[error("replace expects a delimited pattern and replacement, e.g. replace:/foo/bar/")]
    MalformedReplace,
}

/// Parses the command-line form of an operation:
///
/// ```text
/// replace:/PATTERN/REPLACEMENT/   any delimiter character works: replace:|a/b|c|
/// prefix:TEXT
/// suffix:TEXT
/// insert:POSITION:TEXT
/// ext:EXTENSION                   an empty extension drops the current one
/// remove-ext
/// case:lower|upper|title
/// ```
impl FromStr for OperationSpec {
    type Err = OperationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, argument) = match s.split_once(':') {
            Some((kind, argument)) => (kind, Some(argument)),
            None => (s, None),
        };
        let kind = kind.trim().to_lowercase();

        match kind.as_str() {
            "replace" => parse_replace(required(&kind, argument)?),
            "prefix" => Ok(Self::prefix(required(&kind, argument)?)),
            "suffix" => Ok(Self::suffix(required(&kind, argument)?)),
            "insert" => {
                let (position, text) = required(&kind, argument)?
                    .split_once(':')
                    .ok_or_else(|| OperationParseError::MissingArgument(kind.clone()))?;
                let position = position
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| OperationParseError::InvalidPosition(position.to_string()))?;
                Ok(Self::insert(position, text))
            },
            "ext" | "change-ext" | "change_ext" => {
                Ok(Self::change_extension(required(&kind, argument)?))
            },
            "remove-ext" | "remove_ext" => Ok(Self::RemoveExtension),
            "case" | "change-case" | "change_case" => {
                Ok(Self::change_case(required(&kind, argument)?.parse()?))
            },
            other => Err(OperationParseError::UnknownKind(other.to_string())),
        }
    }
}

fn required<'a>(kind: &str, argument: Option<&'a str>) -> Result<&'a str, OperationParseError> {
    argument.ok_or_else(|| OperationParseError::MissingArgument(kind.to_string()))
}

fn parse_replace(argument: &str) -> Result<OperationSpec, OperationParseError> {
    let delimiter = argument
        .chars()
        .next()
        .ok_or(OperationParseError::MalformedReplace)?;
    let body = &argument[delimiter.len_utf8()..];
    let (pattern, rest) = body
        .split_once(delimiter)
        .ok_or(OperationParseError::MalformedReplace)?;
    let replacement = rest.strip_suffix(delimiter).unwrap_or(rest);
    Ok(OperationSpec::replace(pattern, replacement))
}

/// Writes the command-line form accepted by `FromStr`.
impl fmt::Display for OperationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(spec) => {
                let delimiter = ['/', '|', '#', '~', '%', '!']
                    .into_iter()
                    .find(|d| !spec.pattern.contains(*d) && !spec.replacement.contains(*d))
                    .unwrap_or('/');
                write!(
                    f,
                    "replace:{d}{}{d}{}{d}",
                    spec.pattern,
                    spec.replacement,
                    d = delimiter
                )
            },
            Self::Prefix { text } => write!(f, "prefix:{text}"),
            Self::Suffix { text } => write!(f, "suffix:{text}"),
            Self::Insert { position, text } => write!(f, "insert:{position}:{text}"),
            Self::ChangeExtension { new_extension } => write!(f, "ext:{new_extension}"),
            Self::RemoveExtension => write!(f, "remove-ext"),
            Self::ChangeCase { mode } => write!(f, "case:{}", mode.as_str()),
        }
    }
}
