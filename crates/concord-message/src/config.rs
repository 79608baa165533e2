//! Message comparison settings.

use std::collections::{BTreeMap, BTreeSet};

use concord_types::{ExtraPolicy, MSG_TYPE, SUB_MSG_SOURCE, SUB_MSG_TYPE};
use serde::{Deserialize, Serialize};

use crate::error::MessageResult;

/// Configuration of a message comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageCompareConfig {
    /// Routing and metadata fields that are never compared as data.
    pub service_fields: BTreeSet<String>,
    /// Treatment of actual sub-messages no expected sub-message claimed.
    pub extra_groups: ExtraPolicy,
    /// Per repeating-group type, the fields that identify a sub-message.
    /// Types without an entry are matched on all their non-service fields.
    pub group_key_fields: BTreeMap<String, BTreeSet<String>>,
    pub case_sensitive: bool,
    /// Expose the non-empty fields of the actual message.
    pub save_fields: bool,
    /// Expose the non-empty fields of every matched actual sub-message.
    pub save_sub_fields: bool,
}

impl Default for MessageCompareConfig {
    fn default() -> Self {
        Self {
            service_fields: [MSG_TYPE, SUB_MSG_TYPE, SUB_MSG_SOURCE]
                .into_iter()
                .map(str::to_string)
                .collect(),
            extra_groups: ExtraPolicy::Ignore,
            group_key_fields: BTreeMap::new(),
            case_sensitive: true,
            save_fields: false,
            save_sub_fields: false,
        }
    }
}

impl MessageCompareConfig {
    pub fn from_toml_str(text: &str) -> MessageResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Builder-style key field declaration for one group type.
    pub fn with_group_keys<I, S>(mut self, group: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_key_fields
            .insert(group.into(), fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn is_service_field(&self, name: &str) -> bool {
        self.service_fields.contains(name)
    }

    /// Declared key fields of a group type; `None` if there are none.
    pub fn key_fields(&self, group: &str) -> Option<&BTreeSet<String>> {
        self.group_key_fields.get(group).filter(|keys| !keys.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = MessageCompareConfig::default();
        assert!(config.is_service_field(MSG_TYPE));
        assert!(config.is_service_field(SUB_MSG_SOURCE));
        assert!(!config.is_service_field("Price"));
        assert_eq!(config.extra_groups, ExtraPolicy::Ignore);
        assert!(config.case_sensitive);
    }

    #[test]
    fn parses_toml() {
        let text = r#"
            extra_groups = "fail"
            save_sub_fields = true

            [group_key_fields]
            Leg = ["LegId"]
            Party = []
        "#;
        let config = MessageCompareConfig::from_toml_str(text).unwrap();
        assert_eq!(config.extra_groups, ExtraPolicy::Fail);
        assert!(config.save_sub_fields);
        assert!(config.is_service_field(SUB_MSG_TYPE));
        assert_eq!(
            config.key_fields("Leg").map(|k| k.iter().map(String::as_str).collect::<Vec<_>>()),
            Some(vec!["LegId"])
        );
        assert!(config.key_fields("Party").is_none());
        assert!(config.key_fields("Fee").is_none());
    }

    #[test]
    fn rejects_unknown_policy() {
        let err = MessageCompareConfig::from_toml_str("extra_groups = \"maybe\"").unwrap_err();
        assert!(err.to_string().starts_with("failed to parse"));
    }
}
