use code_index::Candidate;
use retrieve::Entity;

use crate::types::RefineConfig;

/// Candidate-pool prompt. The closed-world instruction ("choose only from
/// the provided Candidates") is enforced by instruction only; downstream
/// code accepts the model's output as-is.
const REFINE_TEMPLATE: &str = r#"You are a highly accurate clinical coding assistant specializing in ICD-10 and CPT classification.
You are given:
- A clinical note or EHR-style report written by a physician.
- Extracted medical entities (diagnoses, symptoms, procedures, medications, etc.).
- A list of candidate medical codes retrieved from a knowledge base (ICD-10 and CPT).

GOAL:
- Select only the most relevant codes from the provided Candidate list.
- Prioritize primary diagnosis codes (ICD-10) and procedural/service codes (CPT).
- Include multiple relevant codes if the report clearly contains multiple billable conditions or services.
- If a category (ICD or CPT) is not clearly applicable, return the top few clinically relevant matches (maximum {limit} items).

OUTPUT FORMAT (VERY IMPORTANT):
- Return ONLY a valid JSON array.
- Do NOT include any extra text, comments, explanation, or code fences.
- Each element in the array must be an object with the following keys:
  {
    "code": "...",
    "system": "ICD-10" or "CPT",
    "description": "...",
    "score": 0.0,
    "reason": "One-sentence justification linking this code to the clinical text."
  }

GUIDANCE:
- Do NOT invent or hallucinate codes; choose only from the provided Candidates.
- Use both ClinicalText and Entities to decide which codes are relevant.
- If multiple candidate codes are similar, choose the most specific and clinically appropriate.
- Use concise, factual reasoning for each selected code.
- Ensure the returned JSON is syntactically valid and directly parsable.

ClinicalText:
{clinical_text}

Entities:
{entities}

Candidates:
{candidates}

Return up to {limit} items.
JSON array ONLY, no surrounding text."#;

/// No-pool prompt: the model proposes codes from the text alone.
const DIRECT_TEMPLATE: &str = r#"You are a senior clinical coding specialist. Read the clinical text and propose all clinically relevant billing and diagnosis codes.

REQUIREMENTS:
- Include both ICD-10 (diagnoses) and CPT (procedures, visits/E&M, imaging, therapy) as applicable.
- Prefer specific, standard, and commonly used codes based on the clinical context.
- Do NOT invent codes; only return codes you are confident are justified by the text.
- Deduplicate entries and avoid redundant near-duplicate codes.

OUTPUT FORMAT (VERY IMPORTANT):
- Return ONLY a valid JSON array.
- Do NOT include any extra text, comments, explanation, or code fences.
- Each element in the array must be an object with the following keys:
  {
    "code": "...",
    "system": "ICD-10" or "CPT",
    "description": "...",
    "score": number between 0 and 1,
    "reason": "Short justification based on the clinical text."
  }

ClinicalText:
{clinical_text}

Entities (optional):
{entities}

Return JSON array ONLY."#;

/// Appended verbatim for the single strict retry after a parse failure.
pub(crate) const STRICT_SUFFIX: &str =
    "\n\nIMPORTANT: Return a JSON array ONLY. No comments, no code fences, no surrounding text.";

pub(crate) fn build_refine_prompt(
    text: &str,
    entities: &[Entity],
    candidates: &[Candidate],
    limit: usize,
    cfg: &RefineConfig,
) -> String {
    let pool = &candidates[..candidates.len().min(cfg.max_candidates)];
    REFINE_TEMPLATE
        .replace("{clinical_text}", &truncate_chars(text, cfg.text_budget))
        .replace("{entities}", &json_budget(entities, cfg.entities_budget))
        .replace("{candidates}", &json_budget(pool, cfg.candidates_budget))
        .replace("{limit}", &limit.to_string())
}

pub(crate) fn build_direct_prompt(text: &str, entities: &[Entity], cfg: &RefineConfig) -> String {
    DIRECT_TEMPLATE
        .replace(
            "{clinical_text}",
            &truncate_chars(text, cfg.direct_text_budget),
        )
        .replace("{entities}", &json_budget(entities, cfg.entities_budget))
}

fn json_budget<T: serde::Serialize + ?Sized>(value: &T, budget: usize) -> String {
    let serialized = serde_json::to_string(value).unwrap_or_else(|_| "[]".to_string());
    truncate_chars(&serialized, budget)
}

/// Char-boundary-safe truncation.
fn truncate_chars(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        s.chars().take(max_chars).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::CodeSystem;

    #[test]
    fn refine_prompt_carries_all_sections() {
        let candidates = vec![Candidate {
            code: "I10".into(),
            system: CodeSystem::Diagnosis,
            description: "Essential hypertension".into(),
            score: 0.8,
        }];
        let prompt = build_refine_prompt(
            "BP elevated at follow-up",
            &[],
            &candidates,
            5,
            &RefineConfig::default(),
        );
        assert!(prompt.contains("BP elevated at follow-up"));
        assert!(prompt.contains("Essential hypertension"));
        assert!(prompt.contains("Return up to 5 items."));
        assert!(!prompt.contains("{limit}"));
        assert!(!prompt.contains("{clinical_text}"));
    }

    #[test]
    fn candidate_list_capped() {
        let candidates: Vec<Candidate> = (0..40)
            .map(|i| Candidate {
                code: format!("C{i:03}"),
                system: CodeSystem::Diagnosis,
                description: "filler".into(),
                score: 0.5,
            })
            .collect();
        let prompt = build_refine_prompt("note", &[], &candidates, 5, &RefineConfig::default());
        assert!(prompt.contains("C019"));
        assert!(!prompt.contains("C020"));
    }

    #[test]
    fn text_budget_truncates_on_char_boundary() {
        let text = "é".repeat(5000);
        let prompt = build_refine_prompt(&text, &[], &[], 5, &RefineConfig::default());
        // Non-ASCII truncation must not split a code point.
        assert!(prompt.contains(&"é".repeat(4000)));
        assert!(!prompt.contains(&"é".repeat(4001)));
    }

    #[test]
    fn direct_prompt_has_larger_text_budget() {
        let text = "x".repeat(5000);
        let prompt = build_direct_prompt(&text, &[], &RefineConfig::default());
        assert!(prompt.contains(&"x".repeat(5000)));
    }
}
