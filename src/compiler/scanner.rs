//! Quote- and bracket-aware scanning over card text.
//!
//! Every splitting decision the compiler makes (comment start, the
//! assignment `=`, list commas, slice ranges) goes through [`scan`], so the
//! quote and nesting rules live in one place.

/// Lexical position of one character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Context {
    /// Inside a double-quoted string (the quotes themselves count as inside).
    pub quoted: bool,
    /// Open `[` enclosing the character.
    pub brackets: usize,
    /// Open `(` enclosing the character.
    pub parens: usize,
}

impl Context {
    /// Outside quotes, brackets and parentheses.
    pub fn top_level(self) -> bool {
        !self.quoted && self.brackets == 0 && self.parens == 0
    }
}

/// Walk `text` yielding each character with its byte offset and context.
///
/// Opening and closing delimiters report the context they sit in, so the
/// `[` and `]` of `a[1]` are both at bracket depth 0. A stray closer does not
/// underflow; [`check_balanced`] reports it.
pub fn scan(text: &str) -> impl Iterator<Item = (usize, char, Context)> + '_ {
    let mut ctx = Context::default();
    text.char_indices().map(move |(i, ch)| {
        if ch == '"' {
            ctx.quoted = !ctx.quoted;
            return (i, ch, Context { quoted: true, ..ctx });
        }
        if ctx.quoted {
            return (i, ch, ctx);
        }
        match ch {
            '[' => {
                let here = ctx;
                ctx.brackets += 1;
                (i, ch, here)
            }
            '(' => {
                let here = ctx;
                ctx.parens += 1;
                (i, ch, here)
            }
            ']' => {
                ctx.brackets = ctx.brackets.saturating_sub(1);
                (i, ch, ctx)
            }
            ')' => {
                ctx.parens = ctx.parens.saturating_sub(1);
                (i, ch, ctx)
            }
            _ => (i, ch, ctx),
        }
    })
}

/// Byte offset of the first `target` outside quotes.
pub fn find_unquoted(text: &str, target: char) -> Option<usize> {
    scan(text).find(|(_, ch, ctx)| *ch == target && !ctx.quoted).map(|(i, _, _)| i)
}

/// Byte offset of the assignment `=`: the first one outside quotes that is
/// not part of `==`, `!=`, `<=` or `>=`.
pub fn find_assignment(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    scan(text)
        .filter(|(_, ch, ctx)| *ch == '=' && !ctx.quoted)
        .map(|(i, _, _)| i)
        .find(|&i| {
            let prev = i.checked_sub(1).and_then(|p| bytes.get(p)).copied();
            let next = bytes.get(i + 1).copied();
            !matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) && next != Some(b'=')
        })
}

/// Remove all whitespace outside double-quoted strings. Returns `None` when a
/// quote is left open.
pub fn strip_whitespace(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    let mut quotes = 0usize;
    for (_, ch, ctx) in scan(text) {
        if ch == '"' {
            quotes += 1;
        }
        if ctx.quoted || !ch.is_whitespace() {
            out.push(ch);
        }
    }
    (quotes % 2 == 0).then_some(out)
}

/// Report the first bracket or parenthesis that does not pair up.
pub fn check_balanced(text: &str) -> Result<(), String> {
    let mut stack = Vec::new();
    for (_, ch, ctx) in scan(text) {
        if ctx.quoted {
            continue;
        }
        match ch {
            '[' | '(' => stack.push(ch),
            ']' | ')' => {
                let open = if ch == ']' { '[' } else { '(' };
                if stack.pop() != Some(open) {
                    return Err(format!("unmatched '{ch}' in '{text}'"));
                }
            }
            _ => {}
        }
    }
    match stack.last() {
        Some(open) => Err(format!("unmatched '{open}' in '{text}'")),
        None => Ok(()),
    }
}

/// Split on `sep` where it occurs at top level.
pub fn split_top_level(text: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (i, ch, ctx) in scan(text) {
        if ch == sep && ctx.top_level() {
            parts.push(text.get(start..i).unwrap_or_default());
            start = i + ch.len_utf8();
        }
    }
    parts.push(text.get(start..).unwrap_or_default());
    parts
}

/// True when `sep` occurs at top level.
pub fn has_top_level(text: &str, sep: char) -> bool {
    scan(text).any(|(_, ch, ctx)| ch == sep && ctx.top_level())
}

/// When all of `text` is one bracketed group (`[1,2]`), its inside.
pub fn bracketed_body(text: &str) -> Option<&str> {
    if !text.starts_with('[') {
        return None;
    }
    let close = scan(text)
        .skip(1)
        .find(|(_, ch, ctx)| *ch == ']' && !ctx.quoted && ctx.brackets == 0)
        .map(|(i, _, _)| i)?;
    (close + 1 == text.len()).then(|| text.get(1..close).unwrap_or_default())
}

/// True when a `:` sits directly inside brackets, outside quotes.
pub fn has_range(text: &str) -> bool {
    scan(text).any(|(_, ch, ctx)| ch == ':' && !ctx.quoted && ctx.brackets > 0)
}

/// A piece of a slice expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Copied as is, including any bracket without a colon.
    Text(String),
    /// `[lower:upper]`; an omitted upper bound is `None`.
    Range { lower: usize, upper: Option<usize> },
}

/// Break `prefix[lo:hi]suffix...` into segments.
pub fn segments(text: &str) -> Result<Vec<Segment>, String> {
    let mut out = Vec::new();
    let mut text_start = 0;
    let mut open: Option<usize> = None;

    for (i, ch, ctx) in scan(text) {
        if ctx.quoted || ctx.brackets != 0 {
            continue;
        }
        match (ch, open) {
            ('[', None) => open = Some(i),
            (']', Some(o)) => {
                open = None;
                let body = text.get(o + 1..i).unwrap_or_default();
                if !has_top_level_colon(body) {
                    continue;
                }
                if o > text_start {
                    out.push(Segment::Text(text.get(text_start..o).unwrap_or_default().to_string()));
                }
                out.push(parse_range(body)?);
                text_start = i + 1;
            }
            _ => {}
        }
    }
    if text_start < text.len() {
        out.push(Segment::Text(text.get(text_start..).unwrap_or_default().to_string()));
    }
    Ok(out)
}

fn has_top_level_colon(body: &str) -> bool {
    scan(body).any(|(_, ch, ctx)| ch == ':' && !ctx.quoted && ctx.brackets == 0)
}

fn parse_range(body: &str) -> Result<Segment, String> {
    let mut bounds = body.split(':');
    let (Some(lower), Some(upper), None) = (bounds.next(), bounds.next(), bounds.next()) else {
        return Err(format!("expected one ':' in slice '[{body}]'"));
    };
    let bound = |s: &str| -> Result<Option<usize>, String> {
        if s.is_empty() {
            return Ok(None);
        }
        s.parse::<usize>()
            .map(Some)
            .map_err(|_| format!("slice bound '{s}' is not a non-negative integer"))
    };
    let lower = bound(lower)?.unwrap_or(0);
    let upper = bound(upper)?;
    if upper.is_some_and(|u| u < lower) {
        return Err(format!("slice '[{body}]' ends before it starts"));
    }
    Ok(Segment::Range { lower, upper })
}
