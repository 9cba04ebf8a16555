use std::fmt;

/// Raw SQL text produced by the translator.
///
/// This is untrusted input: the generator can hallucinate write statements,
/// injection attempts, or semantically wrong filters. A `GeneratedSql` is
/// never sent to the database; it can only be turned into a [`SafeSql`] by
/// `SqlGuard::validate`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSql(String);

impl GeneratedSql {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeneratedSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A statement that has passed every gate and rewrite of the SQL guard.
///
/// Invariants: begins with a read-only introducer, contains no statement
/// separator and no comment syntax, no write/DDL verbs, and carries an
/// explicit row LIMIT at or below the configured cap. Immutable once built;
/// this is the only form the executor ever receives.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SafeSql(String);

impl SafeSql {
    /// Only the SQL guard constructs this type.
    pub(crate) fn new(text: String) -> Self {
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for SafeSql {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
