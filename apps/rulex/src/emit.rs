//! YAML re-writer for rule sources.
//!
//! The rule is read as parser events, so what the author wrote survives:
//! - every scalar keeps its style: plain, `'single'`, `"double"`, literal
//!   `|` or folded `>`;
//! - full-line `#` comments stay in front of the entry that follows them,
//!   and trailing comments stay on their line;
//! - key order is the file's.
//!
//! Indentation is fixed whatever the author used: mappings indent by 2 and
//! sequences sit 2 columns under their key (`  - item`). Flow collections
//! come out as blocks unless empty (`{}`, `[]`). A scalar whose style cannot
//! hold its value at the new position is written double-quoted. Anchors are
//! renamed `a1`, `a2`, ... in the order they appear.

use std::collections::VecDeque;
use yaml_rust2::parser::{Event, Parser};
use yaml_rust2::scanner::TScalarStyle;

const MAP_INDENT: usize = 2;
const SEQ_OFFSET: usize = 2;

struct Node {
    kind: Kind,
    /// Zero when the node has no anchor.
    anchor: usize,
    /// 0-based source line where the node starts.
    line: usize,
    trailing: Option<String>,
}

enum Kind {
    Scalar(String, TScalarStyle),
    Alias(usize),
    Seq(Vec<Node>),
    Map(Vec<(Node, Node)>),
}

/// Re-write the first document of `src`, leaving out the top-level `skip` keys.
pub fn reformat(src: &str, skip: &[&str]) -> Result<String, String> {
    let lines: Vec<&str> = src.lines().collect();
    let mut reader = Reader {
        parser: Parser::new(src.chars()),
        lines: &lines,
        first_line: 0,
        multiline: Vec::new(),
    };
    let root = reader.document()?;
    let mut w = Writer {
        out: String::new(),
        comments: full_line_comments(&lines, &reader.multiline),
    };
    match &root {
        Some(Node {
            kind: Kind::Map(entries),
            anchor: 0,
            ..
        }) if !entries.is_empty() => w.map(entries, 0, skip),
        Some(node) => {
            w.flush(node.line, 0);
            w.out.push_str(&inline(node, false));
            w.out.push('\n');
        }
        None => {}
    }
    w.flush(usize::MAX, 0);
    Ok(w.out)
}

struct Reader<'a, T: Iterator<Item = char>> {
    parser: Parser<T>,
    lines: &'a [&'a str],
    first_line: usize,
    /// Start line and value of scalars that may span several source lines.
    multiline: Vec<(usize, String)>,
}

impl<T: Iterator<Item = char>> Reader<'_, T> {
    fn next(&mut self) -> Result<(Event, usize, usize), String> {
        let (event, mark) = self.parser.next_token().map_err(|e| e.to_string())?;
        Ok((event, mark.line().saturating_sub(self.first_line), mark.col()))
    }

    fn document(&mut self) -> Result<Option<Node>, String> {
        loop {
            let (event, mark) = self.parser.next_token().map_err(|e| e.to_string())?;
            match event {
                Event::StreamStart => self.first_line = mark.line(),
                Event::DocumentStart { .. } => {}
                Event::StreamEnd => return Ok(None),
                other => {
                    let line = mark.line().saturating_sub(self.first_line);
                    return self.node(other, line, mark.col()).map(Some);
                }
            }
        }
    }

    fn node(&mut self, event: Event, line: usize, col: usize) -> Result<Node, String> {
        let mut trailing = None;
        let (kind, anchor) = match event {
            Event::Scalar(value, style, anchor, ..) => {
                if is_block(style) || value.contains('\n') {
                    self.multiline.push((line, value.clone()));
                }
                trailing = self
                    .lines
                    .get(line)
                    .and_then(|text| trailing_comment(text, col, style, &value));
                (Kind::Scalar(value, style), anchor)
            }
            Event::Alias(id) => (Kind::Alias(id), 0),
            Event::SequenceStart(anchor, ..) => {
                let mut items = Vec::new();
                loop {
                    let (event, l, c) = self.next()?;
                    if matches!(event, Event::SequenceEnd) {
                        break;
                    }
                    items.push(self.node(event, l, c)?);
                }
                (Kind::Seq(items), anchor)
            }
            Event::MappingStart(anchor, ..) => {
                let mut entries = Vec::new();
                loop {
                    let (event, l, c) = self.next()?;
                    if matches!(event, Event::MappingEnd) {
                        break;
                    }
                    let key = self.node(event, l, c)?;
                    let (event, l, c) = self.next()?;
                    entries.push((key, self.node(event, l, c)?));
                }
                (Kind::Map(entries), anchor)
            }
            other => return Err(format!("unexpected {other:?} at line {}", line + 1)),
        };
        Ok(Node {
            kind,
            anchor,
            line,
            trailing,
        })
    }
}

struct Writer {
    out: String,
    /// Full-line comments not yet written, by source line.
    comments: VecDeque<(usize, String)>,
}

impl Writer {
    /// Write the pending comments found above `line`.
    fn flush(&mut self, line: usize, indent: usize) {
        while self.comments.front().is_some_and(|(at, _)| *at < line) {
            if let Some((_, text)) = self.comments.pop_front() {
                self.out.push_str(&pad(indent));
                self.out.push_str(&text);
                self.out.push('\n');
            }
        }
    }

    fn map(&mut self, entries: &[(Node, Node)], indent: usize, skip: &[&str]) {
        for (key, value) in entries {
            if matches!(&key.kind, Kind::Scalar(k, _) if skip.contains(&k.as_str())) {
                continue;
            }
            self.flush(key.line, indent);
            let head = format!("{}{}:", pad(indent), inline(key, false));
            self.value(&head, value, indent, key.trailing.as_deref());
        }
    }

    fn seq(&mut self, items: &[Node], indent: usize) {
        for item in items {
            self.flush(item.line, indent);
            let body = match &item.kind {
                Kind::Map(entries) if !entries.is_empty() && item.anchor == 0 => {
                    Some(self.nested(|w| w.map(entries, indent + 2, &[])))
                }
                Kind::Seq(inner) if !inner.is_empty() && item.anchor == 0 => {
                    Some(self.nested(|w| w.seq(inner, indent + 2)))
                }
                _ => None,
            };
            match body {
                // nested block starts on the dash line
                Some(body) => {
                    self.out.push_str(&pad(indent));
                    self.out.push_str("- ");
                    self.out.push_str(body.get(indent + 2..).unwrap_or(&body));
                }
                None => self.value(&format!("{}-", pad(indent)), item, indent, None),
            }
        }
    }

    /// Render into a separate buffer that shares the pending comments.
    fn nested(&mut self, f: impl FnOnce(&mut Writer)) -> String {
        let mut sub = Writer {
            out: String::new(),
            comments: std::mem::take(&mut self.comments),
        };
        f(&mut sub);
        self.comments = sub.comments;
        sub.out
    }

    /// Write `head` followed by `node`: nested collections go on the next
    /// lines, scalars on the same line. `key_comment` trails a key whose
    /// value starts on the next line.
    fn value(&mut self, head: &str, node: &Node, indent: usize, key_comment: Option<&str>) {
        self.out.push_str(head);
        match &node.kind {
            Kind::Map(entries) if !entries.is_empty() => {
                self.open(node.anchor, key_comment);
                self.map(entries, indent + MAP_INDENT, &[]);
            }
            Kind::Seq(items) if !items.is_empty() => {
                self.open(node.anchor, key_comment);
                self.seq(items, indent + SEQ_OFFSET);
            }
            Kind::Scalar(value, style) if is_block(*style) => {
                match block(value, *style, indent + 2) {
                    Some((header, body)) => {
                        self.out.push(' ');
                        if node.anchor != 0 {
                            self.out.push_str(&format!("&a{} ", node.anchor));
                        }
                        self.out.push_str(&header);
                        self.out.push('\n');
                        self.out.push_str(&body);
                    }
                    None => self.scalar_line(node),
                }
            }
            _ => self.scalar_line(node),
        }
    }

    fn open(&mut self, anchor: usize, comment: Option<&str>) {
        if anchor != 0 {
            self.out.push_str(&format!(" &a{anchor}"));
        }
        if let Some(c) = comment {
            self.out.push(' ');
            self.out.push_str(c);
        }
        self.out.push('\n');
    }

    fn scalar_line(&mut self, node: &Node) {
        let text = inline(node, false);
        if !text.is_empty() {
            self.out.push(' ');
            self.out.push_str(&text);
        }
        if let Some(c) = &node.trailing {
            self.out.push(' ');
            self.out.push_str(c);
        }
        self.out.push('\n');
    }
}

/// Single-line rendering of any node; collections use flow style.
fn inline(node: &Node, in_flow: bool) -> String {
    let text = match &node.kind {
        Kind::Scalar(value, style) => scalar(value, *style, in_flow),
        Kind::Alias(id) => return format!("*a{id}"),
        Kind::Seq(items) => {
            let items: Vec<String> = items.iter().map(|i| inline(i, true)).collect();
            format!("[{}]", items.join(", "))
        }
        Kind::Map(entries) => {
            let items: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}: {}", inline(k, true), inline(v, true)))
                .collect();
            format!("{{{}}}", items.join(", "))
        }
    };
    match (node.anchor, text.is_empty()) {
        (0, _) => text,
        (a, true) => format!("&a{a}"),
        (a, false) => format!("&a{a} {text}"),
    }
}

/// A scalar in its authored style when that fits on one line.
fn scalar(value: &str, style: TScalarStyle, in_flow: bool) -> String {
    const FLOW_INDICATORS: &[char] = &[',', '[', ']', '{', '}'];
    let one_line = !value.contains('\n');
    match style {
        TScalarStyle::Plain if one_line && !(in_flow && value.contains(FLOW_INDICATORS)) => {
            value.to_string()
        }
        TScalarStyle::SingleQuoted if one_line => format!("'{}'", value.replace('\'', "''")),
        _ => double_quoted(value),
    }
}

fn double_quoted(s: &str) -> String {
    // JSON strings are valid YAML double-quoted scalars
    serde_json::to_string(s).unwrap_or_else(|_| format!("'{}'", s.replace('\'', "''")))
}

fn is_block(style: TScalarStyle) -> bool {
    !matches!(
        style,
        TScalarStyle::Plain | TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted
    )
}

/// Header (`|`, `>-`, ...) and indented body of a block scalar, or `None`
/// when `value` cannot be written back exactly as one.
fn block(value: &str, style: TScalarStyle, indent: usize) -> Option<(String, String)> {
    let body = value.trim_end_matches('\n');
    let breaks = value.len() - body.len();
    if body.is_empty() || value.chars().any(|c| c.is_control() && c != '\n' && c != '\t') {
        return None;
    }
    let lines: Vec<&str> = body.split('\n').collect();
    // whitespace-only lines and an indented first line confuse indentation detection
    if lines.iter().any(|l| !l.is_empty() && l.trim().is_empty()) {
        return None;
    }
    if lines.iter().find(|l| !l.is_empty())?.starts_with(' ') {
        return None;
    }
    let folded = !matches!(style, TScalarStyle::Literal)
        && !lines.iter().any(|l| l.starts_with(&[' ', '\t'][..]));
    let rows = if folded { fold(&lines) } else { lines };

    let mut text = String::new();
    for row in rows {
        if !row.is_empty() {
            text.push_str(&pad(indent));
            text.push_str(row);
        }
        text.push('\n');
    }
    for _ in 1..breaks {
        text.push('\n');
    }
    let chomp = match breaks {
        0 => "-",
        1 => "",
        _ => "+",
    };
    Some((format!("{}{chomp}", if folded { '>' } else { '|' }), text))
}

/// Source rows of a folded scalar: a line break in the value is a blank line.
fn fold<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    let mut rows = Vec::with_capacity(lines.len() * 2);
    for (i, line) in lines.iter().enumerate() {
        rows.push(*line);
        if !line.is_empty() && i + 1 < lines.len() {
            rows.push("");
        }
    }
    rows
}

/// The `# ...` text after a scalar (or after a key's `:`) on its line.
fn trailing_comment(text: &str, col: usize, style: TScalarStyle, value: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    let end = scalar_end(&chars, col, style, value)?;
    let rest: String = chars.get(end..)?.iter().collect();
    let rest = rest.trim_start();
    let rest = rest.strip_prefix(':').map(str::trim_start).unwrap_or(rest);
    rest.starts_with('#').then(|| rest.trim_end().to_string())
}

/// Char index just past a single-line scalar written at `col`.
fn scalar_end(chars: &[char], col: usize, style: TScalarStyle, value: &str) -> Option<usize> {
    match style {
        TScalarStyle::Plain => {
            let end = col + value.chars().count();
            let raw = chars.get(col..end)?;
            raw.iter().copied().eq(value.chars()).then_some(end)
        }
        TScalarStyle::SingleQuoted | TScalarStyle::DoubleQuoted => {
            let quote = *chars.get(col)?;
            if quote != '\'' && quote != '"' {
                return None;
            }
            let mut i = col + 1;
            while i < chars.len() {
                match chars[i] {
                    '\\' if quote == '"' => i += 2,
                    '\'' if quote == '\'' && chars.get(i + 1) == Some(&'\'') => i += 2,
                    c if c == quote => return Some(i + 1),
                    _ => i += 1,
                }
            }
            None
        }
        _ => None,
    }
}

/// Full-line comments, minus lines that belong to a multi-line scalar.
fn full_line_comments(lines: &[&str], multiline: &[(usize, String)]) -> VecDeque<(usize, String)> {
    lines
        .iter()
        .enumerate()
        .filter_map(|(i, text)| {
            let t = text.trim();
            if !t.starts_with('#') {
                return None;
            }
            let inside = multiline.iter().any(|(start, value)| {
                i > *start
                    && i <= start + 2 * value.matches('\n').count() + 1
                    && value.lines().any(|l| l.trim() == t)
            });
            (!inside).then(|| (i, t.to_string()))
        })
        .collect()
}

fn pad(n: usize) -> String {
    " ".repeat(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_yaml::Value as Yaml;

    fn same_data(a: &str, b: &str) {
        let a: Yaml = serde_yaml::from_str(a).unwrap();
        let b: Yaml = serde_yaml::from_str(b).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_authored_quoting_and_comments_survive() {
        let src = "# Flags weasel words\nextends: existence\nmessage: \"Avoid '%s'.\"\nignorecase: yes\nlevel: 'error'\ndescription: Gone.\ntokens:\n    - 'X'\n";
        let out = reformat(src, &["description"]).unwrap();
        assert_eq!(
            out,
            "# Flags weasel words\nextends: existence\nmessage: \"Avoid '%s'.\"\nignorecase: yes\nlevel: 'error'\ntokens:\n  - 'X'\n"
        );
    }

    #[test]
    fn test_layout_is_fixed() {
        let src = "extends: substitution\nmessage: \"Use '%s' instead of '%s'.\"\nlevel: warning\nignorecase: true\nswap:\n    utilize: use\n    leverage: use\ntokens:\n- alpha\n-   beta\n";
        let out = reformat(src, &[]).unwrap();
        assert_eq!(
            out,
            "extends: substitution\nmessage: \"Use '%s' instead of '%s'.\"\nlevel: warning\nignorecase: true\nswap:\n  utilize: use\n  leverage: use\ntokens:\n  - alpha\n  - beta\n"
        );
    }

    #[test]
    fn test_nested_sequences_and_maps() {
        let src = "items:\n  - name: a\n    tags: [x, y]\n  - - 1\n    - 2\n  - {}\nempty: []\n";
        let out = reformat(src, &[]).unwrap();
        assert_eq!(
            out,
            "items:\n  - name: a\n    tags:\n      - x\n      - y\n  - - 1\n    - 2\n  - {}\nempty: []\n"
        );
        same_data(src, &out);
    }

    #[test]
    fn test_comments_follow_their_entries() {
        let src = "level: error # loud\nswap: # pairs\n    # first pair\n    a: b\n    c: d\n# closing\n";
        let out = reformat(src, &[]).unwrap();
        assert_eq!(
            out,
            "level: error # loud\nswap: # pairs\n  # first pair\n  a: b\n  c: d\n# closing\n"
        );
    }

    #[test]
    fn test_skipped_key_takes_its_block_along() {
        let src = "extends: existence\ndescription: |\n  Why.\n\n  # not a comment\nlevel: 'warning'\n";
        let out = reformat(src, &["description"]).unwrap();
        assert_eq!(out, "extends: existence\nlevel: 'warning'\n");
    }

    #[test]
    fn test_block_scalars_keep_their_style() {
        let src = "raw: |\n    one\n    # not a comment\nfold: >\n  a b\n  c\n\n  d\nkeep: |+\n  x\n\nlast: 1\n";
        let out = reformat(src, &[]).unwrap();
        assert_eq!(
            out,
            "raw: |\n  one\n  # not a comment\nfold: >\n  a b c\n\n  d\nkeep: |+\n  x\n\nlast: 1\n"
        );
        same_data(src, &out);
    }

    #[test]
    fn test_styles_that_cannot_hold_the_value() {
        let src = "a: 'one\n\n  two'\nb: |2\n    indented\n  less\n";
        let out = reformat(src, &[]).unwrap();
        assert_eq!(out, "a: \"one\\ntwo\"\nb: \"  indented\\nless\\n\"\n");
        same_data(src, &out);
    }

    #[test]
    fn test_scalars_anchors_and_order() {
        let src = "z: 1\na: 2.5\nm: null\nn: ~\nb: false\nempty:\nbase: &lvl error\nagain: *lvl\n";
        let out = reformat(src, &[]).unwrap();
        assert!(out.starts_with("z: 1\na: 2.5\nm: null\nn: ~\nb: false\nempty:\n"));
        same_data(src, &out);
        assert_eq!(reformat("{}\n", &[]).unwrap(), "{}\n");
    }
}
