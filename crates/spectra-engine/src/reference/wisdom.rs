//! The reference engine's wisdom store and its text form.
//!
//! ```text
//! (spectra-wisdom-0.1.0
//!   (c2c forward measure (2048) (radix2))
//!   (r2c forward patient (4 97) (radix2 bluestein))
//! )
//! ```
//!
//! One entry per `(kind, direction, extents)` problem records the
//! effort it was planned at and the winning strategy of every axis.
//! Entries keep insertion order, so exports are deterministic.

use std::fmt::Write as _;

use indexmap::IndexMap;
use smallvec::SmallVec;
use spectra_core::{Direction, Effort, TransformKind};

use super::kernel::Strategy;

/// Engine name as it appears in the wisdom header.
pub(crate) const HEADER_PREFIX: &str = "spectra-wisdom-";

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) struct WisdomKey {
    pub(crate) kind: TransformKind,
    pub(crate) direction: Direction,
    pub(crate) extents: SmallVec<[usize; 4]>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct WisdomEntry {
    pub(crate) effort: Effort,
    pub(crate) strategies: SmallVec<[Strategy; 4]>,
}

#[derive(Default)]
pub(crate) struct WisdomStore {
    entries: IndexMap<WisdomKey, WisdomEntry>,
}

impl WisdomStore {
    /// Entry for `key` planned at `effort` or higher.
    pub(crate) fn lookup(&self, key: &WisdomKey, effort: Effort) -> Option<&WisdomEntry> {
        self.entries.get(key).filter(|e| e.effort >= effort)
    }

    /// Record an entry unless an equal-or-stronger one already exists.
    pub(crate) fn record(&mut self, key: WisdomKey, entry: WisdomEntry) {
        match self.entries.get_mut(&key) {
            Some(existing) if existing.effort >= entry.effort => {}
            Some(existing) => *existing = entry,
            None => {
                self.entries.insert(key, entry);
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Render the store as wisdom text.
    pub(crate) fn to_text(&self, version: &str) -> String {
        let mut out = format!("({HEADER_PREFIX}{version}\n");
        for (key, entry) in &self.entries {
            let extents = join(key.extents.iter());
            let strategies = join(entry.strategies.iter().map(|s| s.token()));
            let _ = writeln!(
                out,
                "  ({} {} {} ({extents}) ({strategies}))",
                key.kind.token(),
                direction_token(key.direction),
                entry.effort.token(),
            );
        }
        out.push_str(")\n");
        out
    }

    /// Parse wisdom text and merge it in. All-or-nothing: on a parse
    /// error nothing is merged.
    pub(crate) fn merge_text(&mut self, text: &str) -> bool {
        match parse(text) {
            Some(parsed) => {
                for (key, entry) in parsed {
                    self.record(key, entry);
                }
                true
            }
            None => false,
        }
    }
}

fn join<I>(items: I) -> String
where
    I: Iterator,
    I::Item: std::fmt::Display,
{
    let mut out = String::new();
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{item}");
    }
    out
}

fn direction_token(direction: Direction) -> &'static str {
    match direction {
        Direction::Forward => "forward",
        Direction::Backward => "backward",
    }
}

fn parse_direction(token: &str) -> Option<Direction> {
    match token {
        "forward" => Some(Direction::Forward),
        "backward" => Some(Direction::Backward),
        _ => None,
    }
}

fn parse(text: &str) -> Option<Vec<(WisdomKey, WisdomEntry)>> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());
    let header = lines.next()?;
    let version = header.strip_prefix('(')?.strip_prefix(HEADER_PREFIX)?;
    // An empty store may close on the header line.
    if let Some(v) = version.strip_suffix(')') {
        if v.is_empty() || v.contains(char::is_whitespace) {
            return None;
        }
        return lines.next().is_none().then(Vec::new);
    }
    if version.is_empty() || version.contains(char::is_whitespace) {
        return None;
    }

    let mut entries = Vec::new();
    let mut closed = false;
    for line in lines {
        if closed {
            return None;
        }
        if line == ")" {
            closed = true;
            continue;
        }
        entries.push(parse_entry(line)?);
    }
    closed.then_some(entries)
}

fn parse_entry(line: &str) -> Option<(WisdomKey, WisdomEntry)> {
    let body = line.strip_prefix('(')?.strip_suffix(')')?;
    let (head, rest) = body.split_once('(')?;
    let mut head = head.split_whitespace();
    let kind = TransformKind::from_token(head.next()?)?;
    let direction = parse_direction(head.next()?)?;
    let effort = Effort::from_token(head.next()?)?;
    if head.next().is_some() {
        return None;
    }

    let (extents, rest) = rest.split_once(')')?;
    let extents: SmallVec<[usize; 4]> = extents
        .split_whitespace()
        .map(|t| t.parse::<usize>().ok().filter(|&n| n > 0))
        .collect::<Option<_>>()?;
    let strategies = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    let strategies: SmallVec<[Strategy; 4]> = strategies
        .split_whitespace()
        .map(Strategy::from_token)
        .collect::<Option<_>>()?;

    if extents.is_empty() || strategies.len() != extents.len() {
        return None;
    }
    let applicable = extents
        .iter()
        .zip(strategies.iter())
        .all(|(&n, s)| s.applies_to(n));
    if !applicable {
        return None;
    }
    // Real transforms are always forward (r2c) or backward (c2r).
    let consistent = match kind {
        TransformKind::ComplexToComplex => true,
        TransformKind::RealToComplex => direction == Direction::Forward,
        TransformKind::ComplexToReal => direction == Direction::Backward,
    };
    if !consistent {
        return None;
    }

    Some((
        WisdomKey {
            kind,
            direction,
            extents,
        },
        WisdomEntry { effort, strategies },
    ))
}
