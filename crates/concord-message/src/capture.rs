//! Output field capture: the values of the actual message a caller may
//! want to reuse after a successful check.

use concord_types::MessageView;

/// Ordered name-value pairs.
pub type FieldList = Vec<(String, String)>;

/// Non-empty fields of a message in declaration order.
pub fn non_empty_fields<M: MessageView>(message: &M) -> FieldList {
    message
        .field_names()
        .into_iter()
        .filter_map(|name| {
            message
                .field(name)
                .filter(|value| !value.is_empty())
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}

/// Fields captured during one comparison.
#[derive(Debug, Default)]
pub(crate) struct Capture {
    pub fields: Option<FieldList>,
    pub sub_fields: Vec<(String, FieldList)>,
}

impl Capture {
    pub fn save_root<M: MessageView>(&mut self, actual: &M) {
        self.fields = Some(non_empty_fields(actual));
    }

    /// Record a matched sub-message. A repeated sub-action id replaces the
    /// earlier entry in place.
    pub fn save_sub<M: MessageView>(&mut self, sub_action: &str, actual: &M) {
        let fields = non_empty_fields(actual);
        match self.sub_fields.iter_mut().find(|(id, _)| id == sub_action) {
            Some((_, existing)) => *existing = fields,
            None => self.sub_fields.push((sub_action.to_string(), fields)),
        }
    }
}
