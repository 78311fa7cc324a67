// Ordered `application/x-www-form-urlencoded` field lists.
//
// Device forms repeat keys (`portid=0&portid=3`) and some CGIs read
// fields positionally, so insertion order is preserved exactly.

use std::fmt;

/// Name of the discriminator field every device form carries.
pub const CMD_FIELD: &str = "cmd";

/// An ordered list of form fields, repeated keys allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields(Vec<(String, String)>);

impl FormFields {
    /// Start a form with its `cmd` discriminator.
    pub fn new(cmd: &str) -> Self {
        Self(vec![(CMD_FIELD.to_owned(), cmd.to_owned())])
    }

    /// Append one field.
    pub fn push(&mut self, name: impl Into<String>, value: impl fmt::Display) -> &mut Self {
        self.0.push((name.into(), value.to_string()));
        self
    }

    /// Builder-style [`push`](Self::push).
    pub fn with(mut self, name: impl Into<String>, value: impl fmt::Display) -> Self {
        self.push(name, value);
        self
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value for `name`, in submission order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.0
            .iter()
            .filter(move |(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// URL-encode into a request body.
    pub fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// Decode a urlencoded body back into fields.
    pub fn decode(body: &str) -> Self {
        Self(
            url::form_urlencoded::parse(body.as_bytes())
                .into_owned()
                .collect(),
        )
    }
}
