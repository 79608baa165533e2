use concord_message::{MessageCompareConfig, MessageComparator, REPEATING_GROUPS};
use concord_types::{Message, Outcome, MSG_TYPE, SUB_MSG_SOURCE, SUB_MSG_TYPE};

fn leg(source: &str, id: &str, qty: &str) -> Message {
    Message::new()
        .with_field(SUB_MSG_TYPE, "Leg")
        .with_field(SUB_MSG_SOURCE, source)
        .with_field("LegId", id)
        .with_field("Qty", qty)
}

fn trade() -> Message {
    Message::new()
        .with_field(MSG_TYPE, "Trade")
        .with_field("TradeId", "T1")
}

#[test]
fn missing_leg_reported_with_its_sub_action() {
    let config = MessageCompareConfig::default().with_group_keys("Leg", ["LegId"]);
    let comparator = MessageComparator::new(config);
    let expected = trade()
        .with_sub_message("Leg", leg("leg-action-1", "1", "10"))
        .with_sub_message("Leg", leg("leg-action-2", "2", "20"));
    let actual = trade().with_sub_message("Leg", leg("ignored", "2", "20"));

    let diff = comparator.compare(&expected, &actual).unwrap();
    assert!(!diff.is_success());

    let groups = diff.result.child(REPEATING_GROUPS).unwrap();
    assert_eq!(groups.children().len(), 2);

    let missing = &groups.children()[0];
    assert!(!missing.is_success());
    assert_eq!(
        missing.comment.as_deref(),
        Some("Repeating group with type 'Leg' from sub-action 'leg-action-1' not found in received message")
    );

    let matched = groups.child("leg-action-2").unwrap();
    assert!(matched.is_success());
    assert_eq!(matched.field("LegId").unwrap().outcome, Outcome::Match);
    assert_eq!(matched.field("Qty").unwrap().outcome, Outcome::Match);
}

#[test]
fn key_match_then_value_mismatch() {
    let config = MessageCompareConfig::default().with_group_keys("Leg", ["LegId"]);
    let comparator = MessageComparator::new(config);
    let expected = trade().with_sub_message("Leg", leg("l1", "1", "@{isGreaterThan(5)}"));
    let actual = trade().with_sub_message("Leg", leg("a", "1", "3"));

    let diff = comparator.compare(&expected, &actual).unwrap();
    let block = diff.result.child(REPEATING_GROUPS).unwrap().child("l1").unwrap();
    assert_eq!(block.field("Qty").unwrap().outcome, Outcome::Mismatch);
    assert!(!diff.result.has_errors());
}

#[test]
fn nested_groups_recurse() {
    let fee = |source: &str, amount: &str| {
        Message::new()
            .with_field(SUB_MSG_TYPE, "Fee")
            .with_field(SUB_MSG_SOURCE, source)
            .with_field("Amount", amount)
    };
    let config = MessageCompareConfig::default().with_group_keys("Leg", ["LegId"]);
    let comparator = MessageComparator::new(config);
    let expected = trade().with_sub_message(
        "Leg",
        leg("l1", "1", "10").with_sub_message("Fee", fee("f1", "@{asNumber(1.5)}")),
    );
    let actual = trade().with_sub_message(
        "Leg",
        leg("a", "1", "10").with_sub_message("Fee", fee("b", "1.50")),
    );

    let diff = comparator.compare(&expected, &actual).unwrap();
    assert!(diff.is_success());
    let leg_block = diff.result.child(REPEATING_GROUPS).unwrap().child("l1").unwrap();
    let fee_block = leg_block.child(REPEATING_GROUPS).unwrap().child("f1").unwrap();
    assert_eq!(fee_block.field("Amount").unwrap().outcome, Outcome::Match);
}

#[test]
fn result_serializes_with_captured_fields() {
    let config = MessageCompareConfig {
        save_fields: true,
        ..MessageCompareConfig::default()
    };
    let comparator = MessageComparator::new(config);
    let diff = comparator.compare(&trade(), &trade()).unwrap();
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(json["result"]["name"], "Message check result");
    assert_eq!(json["result"]["success"], true);
    assert_eq!(json["result"]["fields"][0]["name"], "TradeId");
    assert_eq!(json["output_fields"][0][0], "MsgType");
    assert!(json.get("sub_output_fields").is_none());
}
