//! Filter string parser and assembler.
//!
//! [`parse`] converts a raw RFC 4515 filter string into a tree of
//! [`Node`]s; [`assemble`] is the structural inverse, re-emitting the
//! canonical parenthesized form. Balanced groups are extracted with an
//! explicit character scan tracking parenthesis depth, so arbitrary
//! nesting is handled without recursive regular expressions.
//!
//! Multiple independent root-level filters are permitted: parsing
//! `(cn=Steve)(sn=Bauman)` yields two nodes in order.

use std::fmt;

use crate::error::{FilterError, Result};

// ============================================================================
// Operators
// ============================================================================

/// Comparison operator of a condition node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompOp {
    /// `>=`
    Gte,
    /// `<=`
    Lte,
    /// `~=`
    Approx,
    /// `=`
    Eq,
}

impl CompOp {
    /// Operators in split precedence order.
    ///
    /// Two-character operators are checked before `=` so that `cn~=Steve`
    /// splits on `~=` rather than on the `=` it contains.
    pub const PRECEDENCE: [CompOp; 4] = [Self::Gte, Self::Lte, Self::Approx, Self::Eq];

    /// The operator's literal form.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Approx => "~=",
            Self::Eq => "=",
        }
    }
}

/// Boolean operator of a group node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupOp {
    /// `&`
    And,
    /// `|`
    Or,
    /// `!`
    Not,
}

impl GroupOp {
    /// The operator's literal form.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::And => "&",
            Self::Or => "|",
            Self::Not => "!",
        }
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// A leaf condition: `(attribute op value)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionNode {
    /// The condition as it was parsed, including parentheses.
    pub raw: String,
    /// Attribute name, left of the operator.
    pub attribute: String,
    /// Comparison operator.
    pub operator: CompOp,
    /// Value, right of the operator.
    pub value: String,
}

/// A boolean group: `(op child1 child2 …)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupNode {
    /// The group as it was parsed, including parentheses.
    pub raw: String,
    /// Boolean operator.
    pub operator: GroupOp,
    /// Child nodes in order of appearance.
    pub children: Vec<Node>,
}

/// One parsed filter node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A leaf condition.
    Condition(ConditionNode),
    /// A boolean group of child nodes.
    Group(GroupNode),
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Condition(c) => {
                write!(f, "({}{}{})", c.attribute, c.operator.symbol(), c.value)
            }
            Self::Group(g) => {
                write!(f, "({}", g.operator.symbol())?;
                for child in &g.children {
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// ============================================================================
// Parsing
// ============================================================================

/// Parses a raw filter string into an ordered sequence of root nodes.
///
/// ## Errors
///
/// Fails with a distinct [`FilterError`] per malformation: an unmatched
/// `(`, an unmatched `)`, a group with no recognized operator prefix, or
/// a condition with no recognized comparison operator. No partial tree is
/// returned.
pub fn parse(input: &str) -> Result<Vec<Node>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let segments = split_segments(trimmed)?;
    let mut nodes = Vec::with_capacity(segments.len());
    for segment in segments {
        nodes.push(parse_segment(segment)?);
    }
    Ok(nodes)
}

/// Serializes a sequence of nodes back into canonical filter form.
///
/// For any syntactically valid input `s`, `assemble(&parse(s)?)` is a
/// whitespace-normalized, redundant-parenthesis-stripped equivalent of
/// `s`, and re-parsing it yields a structurally identical tree.
#[must_use]
pub fn assemble(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.to_string());
    }
    out
}

/// A top-level piece of the input: a balanced `(…)` group, or bare text
/// found outside any parentheses.
enum Segment<'a> {
    Wrapped(&'a str),
    Bare(&'a str),
}

fn split_segments(input: &str) -> Result<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut depth = 0usize;
    let mut group_start = 0usize;
    let mut bare_start: Option<usize> = None;

    for (i, c) in input.char_indices() {
        match c {
            '(' => {
                if depth == 0 {
                    if let Some(start) = bare_start.take() {
                        push_bare(&mut segments, &input[start..i]);
                    }
                    group_start = i + 1;
                }
                depth += 1;
            }
            ')' => {
                if depth == 0 {
                    return Err(FilterError::UnopenedGroup(input.to_string()));
                }
                depth -= 1;
                if depth == 0 {
                    segments.push(Segment::Wrapped(&input[group_start..i]));
                }
            }
            _ => {
                if depth == 0 && bare_start.is_none() && !c.is_whitespace() {
                    bare_start = Some(i);
                }
            }
        }
    }

    if depth > 0 {
        return Err(FilterError::UnclosedGroup(input.to_string()));
    }
    if let Some(start) = bare_start {
        push_bare(&mut segments, &input[start..]);
    }
    Ok(segments)
}

fn push_bare<'a>(segments: &mut Vec<Segment<'a>>, text: &'a str) {
    let text = text.trim();
    if !text.is_empty() {
        segments.push(Segment::Bare(text));
    }
}

fn parse_segment(segment: Segment<'_>) -> Result<Node> {
    match segment {
        Segment::Bare(text) => parse_condition(text),
        Segment::Wrapped(content) => parse_group_content(content.trim()),
    }
}

/// Parses the content found between one pair of parentheses.
fn parse_group_content(content: &str) -> Result<Node> {
    match content.chars().next() {
        Some('&') => parse_group(GroupOp::And, content),
        Some('|') => parse_group(GroupOp::Or, content),
        Some('!') => parse_group(GroupOp::Not, content),
        Some('(') => {
            if fully_wrapped(content) {
                // Redundant nesting: strip one layer and keep descending.
                parse_group_content(content[1..content.len() - 1].trim())
            } else {
                Err(FilterError::MissingGroupOperator(format!("({content})")))
            }
        }
        _ => parse_condition(content),
    }
}

fn parse_group(operator: GroupOp, content: &str) -> Result<Node> {
    let children = parse(&content[1..])?;
    Ok(Node::Group(GroupNode {
        raw: format!("({content})"),
        operator,
        children,
    }))
}

fn parse_condition(text: &str) -> Result<Node> {
    for operator in CompOp::PRECEDENCE {
        if let Some(idx) = text.find(operator.symbol()) {
            let attribute = text[..idx].trim().to_string();
            let value = text[idx + operator.symbol().len()..].trim().to_string();
            return Ok(Node::Condition(ConditionNode {
                raw: format!("({text})"),
                attribute,
                operator,
                value,
            }));
        }
    }
    Err(FilterError::MissingConditionOperator(text.to_string()))
}

/// Checks whether `content` begins with `(` whose matching `)` is the
/// final character, i.e. the whole content is one wrapped group.
fn fully_wrapped(content: &str) -> bool {
    let mut depth = 0usize;
    for (i, c) in content.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return i == content.len() - 1;
                }
            }
            _ => {}
        }
    }
    false
}
