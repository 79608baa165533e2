//! Tree-shaped messages with named repeating groups.
//!
//! A message is an ordered field-value map plus, per repeating-group type,
//! an ordered list of sub-messages that may nest further groups.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Field carrying the message type.
pub const MSG_TYPE: &str = "MsgType";
/// Field carrying the repeating-group type of a sub-message.
pub const SUB_MSG_TYPE: &str = "SubMsgType";
/// Field carrying the id of the sub-action that declared a sub-message.
pub const SUB_MSG_SOURCE: &str = "SubMsgSource";

/// Read-only view of a message, as consumed by the structural comparator.
pub trait MessageView {
    /// Value of a field, `None` if absent.
    fn field(&self, name: &str) -> Option<&str>;

    /// Field names in declaration order.
    fn field_names(&self) -> Vec<&str>;

    /// Repeating-group types in declaration order.
    fn sub_message_types(&self) -> Vec<&str>;

    /// Sub-messages of one group type, in order. Empty if the type is absent.
    fn sub_messages(&self, kind: &str) -> &[Self]
    where
        Self: Sized;

    fn has_sub_messages(&self) -> bool {
        !self.sub_message_types().is_empty()
    }
}

/// In-memory message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, with = "ordered_map")]
    fields: Vec<(String, String)>,
    #[serde(default, with = "ordered_map", skip_serializing_if = "Vec::is_empty")]
    groups: Vec<(String, Vec<Message>)>,
}

impl Message {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    /// Builder-style sub-message append.
    pub fn with_sub_message(mut self, kind: impl Into<String>, sub: Message) -> Self {
        self.add_sub_message(kind, sub);
        self
    }

    /// Set a field, replacing its value in place if it already exists.
    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn add_sub_message(&mut self, kind: impl Into<String>, sub: Message) {
        let kind = kind.into();
        match self.groups.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, subs)) => subs.push(sub),
            None => self.groups.push((kind, vec![sub])),
        }
    }

    /// All fields in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl MessageView for Message {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(n, _)| n.as_str()).collect()
    }

    fn sub_message_types(&self) -> Vec<&str> {
        self.groups.iter().map(|(k, _)| k.as_str()).collect()
    }

    fn sub_messages(&self, kind: &str) -> &[Self] {
        self.groups
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, subs)| subs.as_slice())
            .unwrap_or(&[])
    }
}

/// Serializes `Vec<(K, V)>` as a map while keeping entry order on both ways.
mod ordered_map {
    use super::*;

    pub fn serialize<S, K, V>(entries: &[(K, V)], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        K: Serialize,
        V: Serialize,
    {
        let mut map = serializer.serialize_map(Some(entries.len()))?;
        for (k, v) in entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }

    pub fn deserialize<'de, D, K, V>(deserializer: D) -> Result<Vec<(K, V)>, D::Error>
    where
        D: Deserializer<'de>,
        K: Deserialize<'de>,
        V: Deserialize<'de>,
    {
        struct EntriesVisitor<K, V>(PhantomData<(K, V)>);

        impl<'de, K, V> Visitor<'de> for EntriesVisitor<K, V>
        where
            K: Deserialize<'de>,
            V: Deserialize<'de>,
        {
            type Value = Vec<(K, V)>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some(entry) = access.next_entry()? {
                    entries.push(entry);
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(id: &str) -> Message {
        Message::new()
            .with_field(SUB_MSG_TYPE, "Leg")
            .with_field("LegId", id)
    }

    #[test]
    fn fields_keep_declaration_order() {
        let msg = Message::new()
            .with_field("Z", "1")
            .with_field("A", "2")
            .with_field("Z", "3");
        assert_eq!(msg.field_names(), vec!["Z", "A"]);
        assert_eq!(msg.field("Z"), Some("3"));
        assert_eq!(msg.field("missing"), None);
    }

    #[test]
    fn groups_by_type() {
        let msg = Message::new()
            .with_sub_message("Leg", leg("1"))
            .with_sub_message("Party", Message::new().with_field("PartyId", "P"))
            .with_sub_message("Leg", leg("2"));
        assert_eq!(msg.sub_message_types(), vec!["Leg", "Party"]);
        assert_eq!(msg.sub_messages("Leg").len(), 2);
        assert_eq!(msg.sub_messages("Leg")[1].field("LegId"), Some("2"));
        assert!(msg.sub_messages("Fee").is_empty());
        assert!(msg.has_sub_messages());
    }

    #[test]
    fn json_round_trip_keeps_order() {
        let json = r#"{"fields":{"MsgType":"Order","Zeta":"1","Alpha":"2"},
                       "groups":{"Leg":[{"fields":{"LegId":"1"}}]}}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.field_names(), vec!["MsgType", "Zeta", "Alpha"]);
        assert_eq!(msg.sub_messages("Leg")[0].field("LegId"), Some("1"));

        let text = serde_json::to_string(&msg).unwrap();
        assert!(text.find("Zeta").unwrap() < text.find("Alpha").unwrap());
    }
}
