//! The nested comparison result shared by all comparators.
//!
//! A [`DiffNode`] holds a success flag, an optional name and comment, a flat
//! list of [`FieldDiff`] leaves and a list of nested child nodes. The success
//! flag is maintained as leaves and children are added: a node is
//! unsuccessful exactly when one of its scored leaves failed, one of its
//! children failed, or it was explicitly marked failed (e.g. "not found").

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of comparing one expected value against one actual value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The actual value satisfies the expectation.
    Match,
    /// The actual value does not satisfy the expectation.
    Mismatch,
    /// Shown for reference only, never scored.
    Info,
    /// The expectation itself could not be evaluated.
    Error,
}

impl Outcome {
    /// Maps a boolean verdict onto `Match`/`Mismatch`.
    pub fn from_match(matched: bool) -> Self {
        if matched {
            Self::Match
        } else {
            Self::Mismatch
        }
    }

    /// Returns `true` for outcomes that make the enclosing node fail.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Mismatch | Self::Error)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Match => write!(f, "match"),
            Self::Mismatch => write!(f, "mismatch"),
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A single leaf: one field (or column) compared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub name: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub outcome: Outcome,
    /// Evaluation error text, present only for [`Outcome::Error`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FieldDiff {
    pub fn new(
        name: impl Into<String>,
        expected: Option<&str>,
        actual: Option<&str>,
        outcome: Outcome,
    ) -> Self {
        Self {
            name: name.into(),
            expected: expected.map(str::to_string),
            actual: actual.map(str::to_string),
            outcome,
            error: None,
        }
    }

    /// A leaf that is shown but never scored.
    pub fn info(name: impl Into<String>, expected: Option<&str>, actual: Option<&str>) -> Self {
        Self::new(name, expected, actual, Outcome::Info)
    }

    /// A leaf whose expectation could not be evaluated.
    pub fn error(
        name: impl Into<String>,
        expected: Option<&str>,
        actual: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(name, expected, actual, Outcome::Error)
        }
    }
}

/// Totals of leaf outcomes in a subtree.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub matched: usize,
    pub mismatched: usize,
    pub info: usize,
    pub errors: usize,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Match => self.matched += 1,
            Outcome::Mismatch => self.mismatched += 1,
            Outcome::Info => self.info += 1,
            Outcome::Error => self.errors += 1,
        }
    }
}

/// A node of the comparison result tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDiff>,
    #[serde(default)]
    children: Vec<DiffNode>,
    /// Children that were scored but not kept (row storage limits).
    #[serde(default, skip_serializing_if = "is_zero")]
    omitted: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl Default for DiffNode {
    fn default() -> Self {
        Self {
            name: None,
            success: true,
            comment: None,
            fields: Vec::new(),
            children: Vec::new(),
            omitted: 0,
        }
    }
}

impl DiffNode {
    /// Create an empty, successful node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty, successful node with a block name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Create a failed leaf node carrying only a comment.
    pub fn failed(comment: impl Into<String>) -> Self {
        Self {
            success: false,
            comment: Some(comment.into()),
            ..Self::default()
        }
    }

    /// Create a successful node carrying only a comment.
    pub fn passed(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(comment.into()),
            ..Self::default()
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn fields(&self) -> &[FieldDiff] {
        &self.fields
    }

    pub fn children(&self) -> &[DiffNode] {
        &self.children
    }

    /// Number of scored children that were dropped instead of stored.
    pub fn omitted(&self) -> usize {
        self.omitted
    }

    /// Explicitly fail this node, e.g. for a duplicate row whose cells match.
    pub fn mark_failed(&mut self) {
        self.success = false;
    }

    pub fn push_field(&mut self, field: FieldDiff) {
        if field.outcome.is_failure() {
            self.success = false;
        }
        self.fields.push(field);
    }

    pub fn push_child(&mut self, child: DiffNode) {
        if !child.success {
            self.success = false;
        }
        self.children.push(child);
    }

    /// Score a child without storing it.
    pub fn omit_child(&mut self, child: &DiffNode) {
        if !child.success {
            self.success = false;
        }
        self.omitted += 1;
    }

    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&DiffNode> {
        self.children.iter().find(|c| c.name.as_deref() == Some(name))
    }

    /// Find a leaf of this node by field name.
    pub fn field(&self, name: &str) -> Option<&FieldDiff> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Count leaf outcomes across the whole subtree.
    pub fn counts(&self) -> OutcomeCounts {
        let mut counts = OutcomeCounts::default();
        self.walk(&mut |node| {
            for field in &node.fields {
                counts.record(field.outcome);
            }
        });
        counts
    }

    /// Returns `true` if any leaf in the subtree could not be evaluated.
    ///
    /// Lets a report tell "assertion failed" apart from "could not evaluate".
    pub fn has_errors(&self) -> bool {
        self.fields.iter().any(|f| f.outcome == Outcome::Error)
            || self.children.iter().any(DiffNode::has_errors)
    }

    /// Depth-first, pre-order traversal.
    pub fn walk<F: FnMut(&DiffNode)>(&self, visit: &mut F) {
        visit(self);
        for child in &self.children {
            child.walk(visit);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_node_is_success() {
        let node = DiffNode::new();
        assert!(node.is_success());
        assert!(node.fields().is_empty());
        assert!(node.children().is_empty());
    }

    #[test]
    fn info_leaf_does_not_fail_node() {
        let mut node = DiffNode::new();
        node.push_field(FieldDiff::info("Comment", None, Some("x")));
        node.push_field(FieldDiff::new("Qty", Some("5"), Some("5"), Outcome::Match));
        assert!(node.is_success());
    }

    #[test]
    fn mismatch_and_error_fail_node() {
        let mut a = DiffNode::new();
        a.push_field(FieldDiff::new("Qty", Some("5"), Some("6"), Outcome::Mismatch));
        assert!(!a.is_success());

        let mut b = DiffNode::new();
        b.push_field(FieldDiff::error("Qty", Some("@{asNumber()}"), Some("6"), "bad"));
        assert!(!b.is_success());
        assert!(b.has_errors());
    }

    #[test]
    fn failed_child_propagates() {
        let mut parent = DiffNode::named("Repeating groups");
        parent.push_child(DiffNode::named("ok"));
        assert!(parent.is_success());
        parent.push_child(DiffNode::failed("not found"));
        assert!(!parent.is_success());
    }

    #[test]
    fn omitted_child_still_scored() {
        let mut section = DiffNode::named("Failed rows");
        section.omit_child(&DiffNode::failed("row"));
        assert!(!section.is_success());
        assert_eq!(section.omitted(), 1);
        assert!(section.children().is_empty());
    }

    #[test]
    fn counts_cover_subtree() {
        let mut child = DiffNode::named("c");
        child.push_field(FieldDiff::new("a", Some("1"), Some("1"), Outcome::Match));
        child.push_field(FieldDiff::info("b", None, Some("2")));
        let mut root = DiffNode::new();
        root.push_field(FieldDiff::new("x", Some("1"), Some("2"), Outcome::Mismatch));
        root.push_child(child);

        let counts = root.counts();
        assert_eq!(counts.matched, 1);
        assert_eq!(counts.mismatched, 1);
        assert_eq!(counts.info, 1);
        assert_eq!(counts.errors, 0);
    }

    #[test]
    fn serialized_shape() {
        let mut root = DiffNode::named("Message check result");
        root.push_field(FieldDiff::new("Price", Some("10"), Some("10"), Outcome::Match));
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["fields"][0]["name"], "Price");
        assert_eq!(json["fields"][0]["outcome"], "match");
        assert!(json["children"].as_array().unwrap().is_empty());
        assert!(json.get("omitted").is_none());
    }
}
