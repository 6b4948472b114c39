use std::collections::HashSet;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, warn};

use crate::error::CatalogError;
use crate::types::{CodeEntry, CodeSystem};

const CODE_ALIASES: &[&str] = &["code", "codes", "icd10_code", "cpt_code", "hcpcs_code"];
const DESCRIPTION_ALIASES: &[&str] = &["description", "desc", "display", "long_description"];

/// Load one code system from a CSV file.
///
/// Header matching is alias-based and case/punctuation-insensitive, so
/// `Codes`, `code`, and `ICD10 Code` all resolve. Rows with an empty code or
/// description are skipped; duplicate codes keep the first row seen.
pub fn load_codes_from_csv(
    path: &Path,
    system: CodeSystem,
) -> Result<Vec<CodeEntry>, CatalogError> {
    let file = std::fs::File::open(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader.headers()?.clone();
    let code_idx =
        find_header_index(&headers, CODE_ALIASES).ok_or_else(|| CatalogError::MissingColumn {
            path: path.to_path_buf(),
            expected: CODE_ALIASES.join(", "),
        })?;
    let desc_idx = find_header_index(&headers, DESCRIPTION_ALIASES).ok_or_else(|| {
        CatalogError::MissingColumn {
            path: path.to_path_buf(),
            expected: DESCRIPTION_ALIASES.join(", "),
        }
    })?;

    let mut entries = Vec::new();
    let mut seen = HashSet::new();
    let mut skipped = 0usize;

    for record in reader.records() {
        let record = record?;
        let code = clean_field(record.get(code_idx).unwrap_or_default());
        let description = clean_field(record.get(desc_idx).unwrap_or_default());

        if code.is_empty() || description.is_empty() {
            skipped += 1;
            continue;
        }
        if !seen.insert(code.clone()) {
            skipped += 1;
            continue;
        }
        entries.push(CodeEntry::new(code, system, description));
    }

    if skipped > 0 {
        warn!(
            path = %path.display(),
            system = %system,
            skipped,
            "skipped empty or duplicate catalog rows"
        );
    }
    debug!(
        path = %path.display(),
        system = %system,
        count = entries.len(),
        "loaded catalog entries"
    );
    Ok(entries)
}

/// Load both code systems and concatenate, diagnosis entries first.
pub fn load_catalog(
    diagnosis_csv: &Path,
    procedure_csv: &Path,
) -> Result<Vec<CodeEntry>, CatalogError> {
    let mut entries = load_codes_from_csv(diagnosis_csv, CodeSystem::Diagnosis)?;
    entries.extend(load_codes_from_csv(procedure_csv, CodeSystem::Procedure)?);
    Ok(entries)
}

fn normalize_header_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

fn find_header_index(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    let normalized: Vec<String> = headers.iter().map(normalize_header_name).collect();
    for alias in aliases {
        let target = normalize_header_name(alias);
        if let Some((idx, _)) = normalized.iter().enumerate().find(|(_, h)| **h == target) {
            return Some(idx);
        }
    }
    None
}

/// Trim and collapse interior whitespace runs to single spaces.
fn clean_field(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
