//! Declared table schemas
//!
//! Each managed table declares its header names (the wire contract, in
//! column order) and the fields composing its natural key. Schemas come from
//! the caller as configuration; nothing beyond header whitespace trimming is
//! discovered dynamically.

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    headers: Vec<String>,
    key_fields: Vec<String>,
}

impl TableSchema {
    /// Declare a schema. Panics if a key field is not among the headers:
    /// schemas are static configuration, so this is a programming error,
    /// not a runtime condition.
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        headers: impl IntoIterator<Item = S>,
        key_fields: impl IntoIterator<Item = S>,
    ) -> Self {
        let name = name.into();
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let key_fields: Vec<String> = key_fields.into_iter().map(Into::into).collect();
        assert!(
            !key_fields.is_empty(),
            "schema '{}' declares no key fields",
            name
        );
        for field in &key_fields {
            assert!(
                headers.iter().any(|h| h == field),
                "schema '{}' key field '{}' is not a header",
                name,
                field
            );
        }
        Self {
            name,
            headers,
            key_fields,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn key_fields(&self) -> &[String] {
        &self.key_fields
    }

    /// The field identifying which entity a row belongs to, by convention
    /// the first key field (e.g. Username).
    pub fn entity_field(&self) -> &str {
        &self.key_fields[0]
    }
}
