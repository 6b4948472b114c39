use serde::{Deserialize, Serialize};
use std::fmt;

/// The two disjoint billing-code families.
///
/// Serialized with the wire labels the rest of the healthcare world uses
/// (`"ICD-10"` and `"CPT"`), so catalog files, index metadata, and API
/// responses all agree on spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CodeSystem {
    #[serde(rename = "ICD-10")]
    Diagnosis,
    #[serde(rename = "CPT")]
    Procedure,
}

impl CodeSystem {
    /// Wire label for this system.
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeSystem::Diagnosis => "ICD-10",
            CodeSystem::Procedure => "CPT",
        }
    }

    /// Coerce a free-form label into the closed two-value enum.
    ///
    /// Anything that does not start with `CPT` (case-insensitive) is treated
    /// as the diagnosis system. Model output is not trusted to spell the
    /// system consistently, so this is deliberately permissive.
    pub fn from_label(label: &str) -> Self {
        if label.trim().to_ascii_uppercase().starts_with("CPT") {
            CodeSystem::Procedure
        } else {
            CodeSystem::Diagnosis
        }
    }
}

impl fmt::Display for CodeSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable catalog record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeEntry {
    pub code: String,
    pub system: CodeSystem,
    pub description: String,
}

impl CodeEntry {
    pub fn new(
        code: impl Into<String>,
        system: CodeSystem,
        description: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            system,
            description: description.into(),
        }
    }

    /// The text that gets embedded for this entry: code and description
    /// joined so retrieval can match on either.
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.code, self.description)
    }
}
