//! The structural comparator.
//!
//! The leaf fields of a message are compared first, then every repeating
//! group type the expected message declares. Each expected sub-message
//! claims the first unclaimed actual sub-message of the same type whose key
//! fields agree, and the pair is compared recursively. Without declared key
//! fields a sub-message is identified by all of its non-service fields.

use std::collections::BTreeSet;

use concord_index::CandidatePool;
use concord_matcher::{InfoIndication, MatchResult, ValueMatcher};
use concord_types::{
    DiffNode, ExtraPolicy, FieldDiff, MessageView, Outcome, MSG_TYPE, SUB_MSG_SOURCE, SUB_MSG_TYPE,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::capture::{Capture, FieldList};
use crate::config::MessageCompareConfig;
use crate::error::{MessageError, MessageResult};

pub const MESSAGE_CHECK_RESULT: &str = "Message check result";
pub const REPEATING_GROUPS: &str = "Repeating groups";
pub const TYPES_DONT_MATCH: &str = "Message types don't match.";

/// Result of a message comparison.
#[derive(Clone, Debug, Serialize)]
pub struct MessageDiff {
    pub result: DiffNode,
    /// Non-empty fields of the actual message, with `save_fields`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_fields: Option<FieldList>,
    /// Non-empty fields per matched sub-action, with `save_sub_fields`.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sub_output_fields: Vec<(String, FieldList)>,
}

impl MessageDiff {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Compares tree-shaped messages under one configuration.
#[derive(Clone, Debug)]
pub struct MessageComparator {
    config: MessageCompareConfig,
    matcher: ValueMatcher,
}

impl MessageComparator {
    pub fn new(config: MessageCompareConfig) -> Self {
        Self {
            matcher: ValueMatcher::new(config.case_sensitive),
            config,
        }
    }

    pub fn config(&self) -> &MessageCompareConfig {
        &self.config
    }

    /// Compare `actual` against `expected`.
    ///
    /// Fails only if the expected message type itself cannot be evaluated;
    /// every other problem is reported inside the result.
    pub fn compare<M: MessageView>(&self, expected: &M, actual: &M) -> MessageResult<MessageDiff> {
        debug!(
            fields = expected.field_names().len(),
            groups = expected.sub_message_types().len(),
            "comparing messages"
        );
        let mut capture = Capture::default();
        let result = self.compare_message(expected, actual, None, &mut capture)?;
        debug!(
            success = result.is_success(),
            errors = result.has_errors(),
            "message comparison finished"
        );
        Ok(MessageDiff {
            result,
            output_fields: capture.fields,
            sub_output_fields: capture.sub_fields,
        })
    }

    fn compare_message<M: MessageView>(
        &self,
        expected: &M,
        actual: &M,
        group: Option<&str>,
        capture: &mut Capture,
    ) -> MessageResult<DiffNode> {
        let name = match group {
            Some(kind) => expected.field(SUB_MSG_SOURCE).unwrap_or(kind),
            None => MESSAGE_CHECK_RESULT,
        };
        if !self.types_match(expected, actual)? {
            let mut node = DiffNode::failed(TYPES_DONT_MATCH);
            node.name = Some(name.to_string());
            return Ok(node);
        }

        let mut node = DiffNode::named(name);
        match group {
            Some(kind) => {
                if self.config.save_sub_fields {
                    capture.save_sub(name, actual);
                }
                let sub_type = expected.field(SUB_MSG_TYPE).unwrap_or(kind);
                node.push_field(FieldDiff::new(SUB_MSG_TYPE, Some(sub_type), Some(sub_type), Outcome::Match));
            }
            None => {
                if self.config.save_fields {
                    capture.save_root(actual);
                }
            }
        }

        for field in expected.field_names() {
            if self.config.is_service_field(field) {
                continue;
            }
            node.push_field(self.matcher.compare_field(
                field,
                expected.field(field),
                actual.field(field),
                InfoIndication::NullOrEmpty,
            ));
        }

        if expected.has_sub_messages() {
            node.push_child(self.compare_groups(expected, actual, capture)?);
        }
        Ok(node)
    }

    fn types_match<M: MessageView>(&self, expected: &M, actual: &M) -> MessageResult<bool> {
        match expected.field(MSG_TYPE).filter(|t| !t.is_empty()) {
            Some(kind) => self
                .matcher
                .matches(kind, actual.field(MSG_TYPE))
                .map_err(MessageError::MessageType),
            None => Ok(true),
        }
    }

    fn compare_groups<M: MessageView>(&self, expected: &M, actual: &M, capture: &mut Capture) -> MessageResult<DiffNode> {
        let mut block = DiffNode::named(REPEATING_GROUPS);
        for kind in expected.sub_message_types() {
            let keys = self.config.key_fields(kind);
            let mut pool = CandidatePool::new(actual.sub_messages(kind));

            for exp in expected.sub_messages(kind) {
                let mut errors = Vec::new();
                let claimed = pool.take_first(|candidate| self.identifies(exp, candidate, keys, &mut errors));
                let mut sub = match claimed {
                    Some((_, act)) => self.compare_message(exp, act, Some(kind), capture)?,
                    None => not_found(kind, exp),
                };
                for error in errors {
                    sub.push_field(error);
                }
                block.push_child(sub);
            }

            if self.config.extra_groups.is_reported() {
                let extras: Vec<&M> = pool.remaining().map(|(_, m)| m).collect();
                if !extras.is_empty() {
                    debug!(group = kind, count = extras.len(), "extra repeating groups");
                    block.push_child(self.extra_groups(kind, &extras));
                }
            }
        }
        Ok(block)
    }

    /// Whether `candidate` is the actual counterpart of `expected`. An
    /// expression error on a key field rules the candidate out and is
    /// recorded once in `errors`.
    fn identifies<M: MessageView>(
        &self,
        expected: &M,
        candidate: &M,
        keys: Option<&BTreeSet<String>>,
        errors: &mut Vec<FieldDiff>,
    ) -> bool {
        let fields: Vec<&str> = match keys {
            Some(keys) => keys.iter().map(String::as_str).collect(),
            None => expected
                .field_names()
                .into_iter()
                .filter(|name| !self.config.is_service_field(name))
                .collect(),
        };
        for field in fields {
            match self.field_agrees(field, expected, candidate) {
                Ok(true) => {}
                Ok(false) => return false,
                Err(e) => {
                    warn!(field, error = %e, "cannot evaluate key field");
                    if !errors.iter().any(|f| f.name == field) {
                        errors.push(FieldDiff::error(field, expected.field(field), None, e.to_string()));
                    }
                    return false;
                }
            }
        }
        true
    }

    /// An empty expected value agrees with anything.
    fn field_agrees<M: MessageView>(&self, field: &str, expected: &M, candidate: &M) -> MatchResult<bool> {
        match expected.field(field).filter(|v| !v.is_empty()) {
            Some(exp) => self.matcher.matches(exp, candidate.field(field)),
            None => Ok(true),
        }
    }

    fn extra_groups<M: MessageView>(&self, kind: &str, extras: &[&M]) -> DiffNode {
        let fail = self.config.extra_groups == ExtraPolicy::Fail;
        let outcome = if fail { Outcome::Mismatch } else { Outcome::Info };
        let mut block = DiffNode::named(format!("Extra repeating groups with type '{kind}'"));
        for extra in extras {
            let mut node = DiffNode::new();
            for field in extra.field_names() {
                node.push_field(FieldDiff::new(field, None, extra.field(field), outcome));
            }
            block.push_child(node);
        }
        if fail {
            block.mark_failed();
        }
        block
    }
}

fn not_found<M: MessageView>(kind: &str, expected: &M) -> DiffNode {
    let sub_type = expected.field(SUB_MSG_TYPE).unwrap_or(kind);
    let source = expected.field(SUB_MSG_SOURCE);
    let mut node = DiffNode::failed(format!(
        "Repeating group with type '{sub_type}' from sub-action '{}' not found in received message",
        source.unwrap_or_default()
    ));
    node.name = source.map(str::to_string);
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord_types::Message;

    fn order(kind: &str) -> Message {
        Message::new()
            .with_field(MSG_TYPE, kind)
            .with_field("Side", "Buy")
            .with_field("Qty", "100")
    }

    fn party(source: &str, id: &str, role: &str) -> Message {
        Message::new()
            .with_field(SUB_MSG_TYPE, "Party")
            .with_field(SUB_MSG_SOURCE, source)
            .with_field("PartyId", id)
            .with_field("Role", role)
    }

    #[test]
    fn main_fields_compared() {
        let cmp = MessageComparator::new(MessageCompareConfig::default());
        let expected = order("NewOrder").with_field("Note", "");
        let actual = order("NewOrder").with_field("Qty", "200");
        let diff = cmp.compare(&expected, &actual).unwrap();

        let root = &diff.result;
        assert_eq!(root.name.as_deref(), Some(MESSAGE_CHECK_RESULT));
        assert!(!root.is_success());
        assert!(root.field(MSG_TYPE).is_none());
        assert_eq!(root.field("Side").unwrap().outcome, Outcome::Match);
        assert_eq!(root.field("Qty").unwrap().outcome, Outcome::Mismatch);
        assert_eq!(root.field("Note").unwrap().outcome, Outcome::Info);
        assert!(root.children().is_empty());
    }

    #[test]
    fn type_mismatch_short_circuits() {
        let cmp = MessageComparator::new(MessageCompareConfig::default());
        let diff = cmp.compare(&order("NewOrder"), &order("Cancel")).unwrap();
        assert!(!diff.is_success());
        assert_eq!(diff.result.comment.as_deref(), Some(TYPES_DONT_MATCH));
        assert!(diff.result.fields().is_empty());
    }

    #[test]
    fn type_may_be_an_expression() {
        let cmp = MessageComparator::new(MessageCompareConfig::default());
        let expected = order("@{isNotEmpty}");
        assert!(cmp.compare(&expected, &order("Cancel")).unwrap().is_success());

        let broken = order("@{isBetween(1)}");
        let err = cmp.compare(&broken, &order("Cancel")).unwrap_err();
        assert!(matches!(err, MessageError::MessageType(_)));
    }

    #[test]
    fn absent_expected_type_is_not_checked() {
        let cmp = MessageComparator::new(MessageCompareConfig::default());
        let untyped = Message::new().with_field("Side", "Buy").with_field("Qty", "100");
        let diff = cmp.compare(&untyped, &order("Trade")).unwrap();
        assert!(diff.is_success());
        assert!(diff.result.comment.is_none());

        let empty_type = order("");
        assert!(cmp.compare(&empty_type, &order("Trade")).unwrap().is_success());
        assert!(!cmp.compare(&untyped, &order("Trade").with_field("Qty", "1")).unwrap().is_success());
    }

    #[test]
    fn groups_without_keys_match_on_all_fields() {
        let cmp = MessageComparator::new(MessageCompareConfig::default());
        let expected = order("NewOrder")
            .with_sub_message("Party", party("p2", "B", "Seller"))
            .with_sub_message("Party", party("p1", "A", "Buyer"));
        let actual = order("NewOrder")
            .with_sub_message("Party", party("x", "A", "Buyer"))
            .with_sub_message("Party", party("y", "B", "Seller"));
        let diff = cmp.compare(&expected, &actual).unwrap();
        assert!(diff.is_success());

        let groups = diff.result.child(REPEATING_GROUPS).unwrap();
        let names: Vec<_> = groups.children().iter().filter_map(|c| c.name.as_deref()).collect();
        assert_eq!(names, vec!["p2", "p1"]);
        let first = &groups.children()[0];
        assert_eq!(first.fields()[0].name, SUB_MSG_TYPE);
        assert_eq!(first.field("PartyId").unwrap().actual.as_deref(), Some("B"));
    }

    #[test]
    fn extra_groups_follow_policy() {
        let expected = order("NewOrder").with_sub_message("Party", party("p1", "A", "Buyer"));
        let actual = order("NewOrder")
            .with_sub_message("Party", party("x", "A", "Buyer"))
            .with_sub_message("Party", party("y", "C", "Broker"));
        let extra_name = "Extra repeating groups with type 'Party'";

        let ignore = MessageComparator::new(MessageCompareConfig::default());
        let diff = ignore.compare(&expected, &actual).unwrap();
        assert!(diff.is_success());
        assert!(diff.result.child(REPEATING_GROUPS).unwrap().child(extra_name).is_none());

        let info = MessageComparator::new(MessageCompareConfig {
            extra_groups: ExtraPolicy::Info,
            ..MessageCompareConfig::default()
        });
        let diff = info.compare(&expected, &actual).unwrap();
        assert!(diff.is_success());
        let block = diff.result.child(REPEATING_GROUPS).unwrap().child(extra_name).unwrap();
        assert_eq!(block.children().len(), 1);
        assert_eq!(block.children()[0].field("PartyId").unwrap().outcome, Outcome::Info);

        let fail = MessageComparator::new(MessageCompareConfig {
            extra_groups: ExtraPolicy::Fail,
            ..MessageCompareConfig::default()
        });
        let diff = fail.compare(&expected, &actual).unwrap();
        assert!(!diff.is_success());
        let block = diff.result.child(REPEATING_GROUPS).unwrap().child(extra_name).unwrap();
        assert_eq!(block.children()[0].field("Role").unwrap().outcome, Outcome::Mismatch);
    }

    #[test]
    fn key_field_error_recorded_on_unmatched_block() {
        let config = MessageCompareConfig::default().with_group_keys("Party", ["PartyId"]);
        let cmp = MessageComparator::new(config);
        let expected = order("NewOrder").with_sub_message("Party", party("p1", "@{isGreaterThan(x)}", "Buyer"));
        let actual = order("NewOrder")
            .with_sub_message("Party", party("x", "1", "Buyer"))
            .with_sub_message("Party", party("y", "2", "Buyer"));
        let diff = cmp.compare(&expected, &actual).unwrap();
        assert!(!diff.is_success());
        assert!(diff.result.has_errors());

        let block = &diff.result.child(REPEATING_GROUPS).unwrap().children()[0];
        assert!(block.comment.as_deref().unwrap().contains("not found"));
        assert_eq!(block.fields().len(), 1);
        assert_eq!(block.field("PartyId").unwrap().outcome, Outcome::Error);
    }

    #[test]
    fn captures_output_fields() {
        let config = MessageCompareConfig {
            save_fields: true,
            save_sub_fields: true,
            ..MessageCompareConfig::default()
        };
        let cmp = MessageComparator::new(config);
        let expected = order("NewOrder").with_sub_message("Party", party("p1", "A", ""));
        let actual = order("NewOrder")
            .with_field("OrderId", "42")
            .with_sub_message("Party", party("x", "A", "Buyer"));
        let diff = cmp.compare(&expected, &actual).unwrap();

        let fields = diff.output_fields.unwrap();
        assert!(fields.contains(&("OrderId".to_string(), "42".to_string())));
        assert_eq!(diff.sub_output_fields.len(), 1);
        assert_eq!(diff.sub_output_fields[0].0, "p1");
        assert!(diff.sub_output_fields[0]
            .1
            .contains(&("Role".to_string(), "Buyer".to_string())));
    }

    #[test]
    fn comparator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<MessageComparator>();
    }
}
