//! # Decoded Marker Values
//!
//! A [`MarkerValue`] is one marker occurrence bound to its definition: the
//! marker name, where it came from, which engine consumes it, and its
//! arguments decoded into [`ArgValue`]s. [`MarkerSet`] holds every value for
//! one location in source order.
//!
//! Values render back to canonical marker text with [`MarkerValue::render`];
//! parsing the rendered line yields an equal value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use markgen_core::Location;
use markgen_gates::GateExpr;

use crate::registry::{Contributor, ANONYMOUS};

// ─── Paths ───────────────────────────────────────────────────────────

/// A field path expression such as `.status.conditions[0].type`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JsonPath {
    segments: Vec<String>,
}

impl JsonPath {
    /// Parse path text. The text must start with `.`, every segment must be
    /// non-empty, and brackets must balance.
    pub fn parse(text: &str) -> Result<Self, String> {
        let Some(rest) = text.strip_prefix('.') else {
            return Err("path must start with '.'".to_string());
        };
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut depth = 0usize;
        for c in rest.chars() {
            match c {
                '[' => {
                    depth += 1;
                    current.push(c);
                }
                ']' => {
                    if depth == 0 {
                        return Err("unbalanced ']' in path".to_string());
                    }
                    depth -= 1;
                    current.push(c);
                }
                '.' if depth == 0 => {
                    if current.is_empty() {
                        return Err("empty path segment".to_string());
                    }
                    segments.push(std::mem::take(&mut current));
                }
                c if c.is_whitespace() && depth == 0 => {
                    return Err("whitespace in path".to_string());
                }
                c => current.push(c),
            }
        }
        if depth != 0 {
            return Err("unbalanced '[' in path".to_string());
        }
        if current.is_empty() {
            return Err("empty path segment".to_string());
        }
        segments.push(current);
        Ok(Self { segments })
    }

    /// Build a path from segments.
    pub fn from_segments(segments: Vec<String>) -> Self {
        Self { segments }
    }

    /// Path segments, brackets included.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl std::fmt::Display for JsonPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for seg in &self.segments {
            write!(f, ".{seg}")?;
        }
        Ok(())
    }
}

// ─── Sub-records ─────────────────────────────────────────────────────

/// One `name~k=v.k2=v2` section of a sub-record argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Section {
    /// Section name, the text before `~`.
    pub name: String,
    /// Entries in written order.
    pub entries: Vec<(String, String)>,
}

impl Section {
    /// First value for a key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A composite argument made of `&`-joined sections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubRecord {
    /// Sections in written order.
    pub sections: Vec<Section>,
}

impl SubRecord {
    /// Parse sub-record text. Quoted keys and values may contain `.` and `&`.
    pub fn parse(text: &str) -> Result<Self, String> {
        if text.is_empty() {
            return Err("empty sub-record".to_string());
        }
        let mut sections = Vec::new();
        for part in split_unquoted(text, '&')? {
            let Some((name, body)) = part.split_once('~') else {
                return Err(format!("section '{part}' is missing '~'"));
            };
            if name.is_empty() {
                return Err("section name is empty".to_string());
            }
            let mut entries = Vec::new();
            for entry in split_unquoted(body, '.')? {
                let Some((k, v)) = split_key_value(&entry) else {
                    return Err(format!("entry '{entry}' in section '{name}' is missing '='"));
                };
                entries.push((unquote(k)?, unquote(v)?));
            }
            sections.push(Section {
                name: name.to_string(),
                entries,
            });
        }
        Ok(Self { sections })
    }

    /// Sections with a given name.
    pub fn sections_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Section> {
        self.sections.iter().filter(move |s| s.name == name)
    }
}

impl std::fmt::Display for SubRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, section) in self.sections.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}~", section.name)?;
            for (j, (k, v)) in section.entries.iter().enumerate() {
                if j > 0 {
                    f.write_str(".")?;
                }
                write!(f, "{}={}", quote_if_needed(k, ".=&~"), quote_if_needed(v, ".=&~,"))?;
            }
        }
        Ok(())
    }
}

// ─── Lexical helpers ─────────────────────────────────────────────────

/// Split on `sep` outside double quotes, backticks, and `{}`/`[]` nesting.
pub(crate) fn split_unquoted(text: &str, sep: char) -> Result<Vec<String>, String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => {
                current.push(c);
                loop {
                    match chars.next() {
                        Some('\\') => {
                            current.push('\\');
                            match chars.next() {
                                Some(escaped) => current.push(escaped),
                                None => return Err("unterminated quoted string".to_string()),
                            }
                        }
                        Some('"') => {
                            current.push('"');
                            break;
                        }
                        Some(other) => current.push(other),
                        None => return Err("unterminated quoted string".to_string()),
                    }
                }
            }
            '`' => {
                current.push(c);
                loop {
                    match chars.next() {
                        Some('`') => {
                            current.push('`');
                            break;
                        }
                        Some(other) => current.push(other),
                        None => return Err("unterminated raw string".to_string()),
                    }
                }
            }
            '{' | '[' => {
                depth += 1;
                current.push(c);
            }
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            }
            c if c == sep && depth == 0 => parts.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    parts.push(current);
    Ok(parts)
}

/// Split `key=value` at the first `=` outside quotes.
pub(crate) fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match in_quote {
            Some(q) => {
                if escaped {
                    escaped = false;
                } else if c == '\\' && q == '"' {
                    escaped = true;
                } else if c == q {
                    in_quote = None;
                }
            }
            None => match c {
                '"' | '`' => in_quote = Some(c),
                '=' => return Some((&text[..i], &text[i + 1..])),
                _ => {}
            },
        }
    }
    None
}

/// Remove one layer of `"..."` or `` `...` `` quoting; other text is returned as is.
pub(crate) fn unquote(text: &str) -> Result<String, String> {
    if let Some(inner) = text.strip_prefix('`') {
        return inner
            .strip_suffix('`')
            .map(str::to_string)
            .ok_or_else(|| "unterminated raw string".to_string());
    }
    let Some(inner) = text.strip_prefix('"') else {
        return Ok(text.to_string());
    };
    let mut out = String::new();
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => return Err("unterminated quoted string".to_string()),
            },
            '"' => {
                if chars.next().is_some() {
                    return Err("text after closing quote".to_string());
                }
                return Ok(out);
            }
            other => out.push(other),
        }
    }
    Err("unterminated quoted string".to_string())
}

/// Quote `text` when it contains any delimiter in `specials` or would
/// otherwise not survive re-parsing.
pub(crate) fn quote_if_needed(text: &str, specials: &str) -> String {
    let needs = text.is_empty()
        || text.contains(['"', '`'])
        || text.contains(['{', '}', '[', ']'])
        || text.chars().any(|c| c.is_whitespace() || specials.contains(c));
    if !needs {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ─── Argument values ─────────────────────────────────────────────────

/// A decoded argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    /// String argument.
    String(String),
    /// Integer argument.
    Int(i64),
    /// Number argument, integer or float as written.
    Number(serde_json::Number),
    /// Boolean argument.
    Bool(bool),
    /// String list argument.
    StringList(Vec<String>),
    /// Path argument.
    Path(JsonPath),
    /// Sub-record argument.
    Record(SubRecord),
    /// Gate expression argument.
    Gate(GateExpr),
    /// Free-form argument.
    Any(serde_json::Value),
}

impl ArgValue {
    /// String content, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an integer.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Number content; integers are widened.
    pub fn as_number(&self) -> Option<serde_json::Number> {
        match self {
            Self::Number(n) => Some(n.clone()),
            Self::Int(i) => Some((*i).into()),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// List content, if this is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::StringList(items) => Some(items),
            _ => None,
        }
    }

    /// Render in canonical marker syntax.
    pub fn render(&self) -> String {
        match self {
            Self::String(s) => quote_if_needed(s, ",;=&~"),
            Self::Int(i) => i.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::StringList(items) => items
                .iter()
                .map(|i| quote_if_needed(i, ",;=&~"))
                .collect::<Vec<_>>()
                .join(";"),
            Self::Path(p) => p.to_string(),
            Self::Record(r) => r.to_string(),
            Self::Gate(g) => g.to_string(),
            Self::Any(v) => v.to_string(),
        }
    }
}

// ─── Marker values ───────────────────────────────────────────────────

/// One marker occurrence bound to its definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerValue {
    /// Marker name.
    pub name: String,
    /// Originating comment block.
    pub location: Location,
    /// Consuming engine.
    pub contributor: Contributor,
    /// Decoded arguments in written order.
    pub args: IndexMap<String, ArgValue>,
}

impl MarkerValue {
    /// The unnamed argument of a `+name=value` marker.
    pub fn value(&self) -> Option<&ArgValue> {
        self.args.get(ANONYMOUS)
    }

    /// A named argument.
    pub fn get(&self, key: &str) -> Option<&ArgValue> {
        self.args.get(key)
    }

    /// A string argument.
    pub fn string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ArgValue::as_str)
    }

    /// An integer argument.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ArgValue::as_int)
    }

    /// A number argument.
    pub fn number(&self, key: &str) -> Option<serde_json::Number> {
        self.get(key).and_then(ArgValue::as_number)
    }

    /// A boolean argument; absent means `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key).and_then(ArgValue::as_bool).unwrap_or(false)
    }

    /// A list argument; absent means empty.
    pub fn list(&self, key: &str) -> &[String] {
        self.get(key).and_then(ArgValue::as_list).unwrap_or(&[])
    }

    /// A path argument.
    pub fn path(&self, key: &str) -> Option<&JsonPath> {
        match self.get(key) {
            Some(ArgValue::Path(p)) => Some(p),
            _ => None,
        }
    }

    /// A sub-record argument.
    pub fn record(&self, key: &str) -> Option<&SubRecord> {
        match self.get(key) {
            Some(ArgValue::Record(r)) => Some(r),
            _ => None,
        }
    }

    /// A gate expression argument.
    pub fn gate(&self, key: &str) -> Option<&GateExpr> {
        match self.get(key) {
            Some(ArgValue::Gate(g)) => Some(g),
            _ => None,
        }
    }

    /// Canonical marker text for this value, including the leading `+`.
    pub fn render(&self) -> String {
        if let Some(value) = self.value() {
            return format!("+{}={}", self.name, value.render());
        }
        if self.args.is_empty() {
            return format!("+{}", self.name);
        }
        let args: Vec<String> = self
            .args
            .iter()
            .map(|(k, v)| format!("{k}={}", v.render()))
            .collect();
        format!("+{}:{}", self.name, args.join(","))
    }
}

/// Every marker value attached to one location, in source order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkerSet {
    values: Vec<MarkerValue>,
}

impl MarkerSet {
    /// An empty set.
    pub const fn new() -> Self {
        Self { values: Vec::new() }
    }

    /// Append a value.
    pub fn push(&mut self, value: MarkerValue) {
        self.values.push(value);
    }

    /// First value with a name.
    pub fn get(&self, name: &str) -> Option<&MarkerValue> {
        self.values.iter().find(|v| v.name == name)
    }

    /// Every value with a name, in source order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MarkerValue> {
        self.values.iter().filter(move |v| v.name == name)
    }

    /// Whether any value has a name.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Values consumed by one engine, in source order.
    pub fn by_contributor(&self, contributor: Contributor) -> impl Iterator<Item = &MarkerValue> {
        self.values.iter().filter(move |v| v.contributor == contributor)
    }

    /// All values in source order.
    pub fn iter(&self) -> std::slice::Iter<'_, MarkerValue> {
        self.values.iter()
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<'a> IntoIterator for &'a MarkerSet {
    type Item = &'a MarkerValue;
    type IntoIter = std::slice::Iter<'a, MarkerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
