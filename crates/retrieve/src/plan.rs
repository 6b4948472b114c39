use std::collections::HashSet;

use crate::types::{Entity, RetrieveConfig};

/// Assemble the query texts for one request: the full note, the strongest
/// entity phrases, and any triggered keyword expansions, in that order.
pub(crate) fn build_query_plan(
    text: &str,
    entities: &[Entity],
    cfg: &RetrieveConfig,
) -> Vec<String> {
    let mut queries = vec![text.to_string()];
    queries.extend(select_entity_phrases(entities, cfg));

    let lowered = text.to_lowercase();
    for rule in &cfg.expansions {
        if rule
            .triggers
            .iter()
            .any(|trigger| lowered.contains(trigger.as_str()))
        {
            queries.extend(rule.phrases.iter().cloned());
        }
    }

    queries
}

/// Longest entity phrases first, case-insensitively deduplicated, capped at
/// `max_entity_phrases`. Short spans are noise from the extractor and are
/// dropped outright.
fn select_entity_phrases(entities: &[Entity], cfg: &RetrieveConfig) -> Vec<String> {
    let mut phrases: Vec<&str> = entities
        .iter()
        .map(|e| e.text.trim())
        .filter(|t| t.chars().count() >= cfg.min_phrase_chars)
        .collect();
    phrases.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));

    let mut seen = HashSet::new();
    phrases
        .into_iter()
        .filter(|t| seen.insert(t.to_lowercase()))
        .take(cfg.max_entity_phrases)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(text: &str) -> Entity {
        Entity {
            text: text.to_string(),
            label: "TEST".to_string(),
            start: 0,
            end: text.len(),
        }
    }

    #[test]
    fn full_text_always_first() {
        let queries = build_query_plan("knee pain", &[], &RetrieveConfig::default());
        assert_eq!(queries[0], "knee pain");
    }

    #[test]
    fn entity_phrases_sorted_by_length_and_capped() {
        let entities = vec![
            entity("acl"),
            entity("acl tear of the right knee"),
            entity("knee pain"),
            entity("meniscus injury"),
            entity("mri"),
        ];
        let queries = build_query_plan("note text", &entities, &RetrieveConfig::default());
        assert_eq!(
            &queries[1..],
            &[
                "acl tear of the right knee".to_string(),
                "meniscus injury".to_string(),
                "knee pain".to_string(),
            ]
        );
    }

    #[test]
    fn entity_phrases_dedup_case_insensitively() {
        let entities = vec![entity("Knee Pain"), entity("knee pain"), entity("KNEE PAIN")];
        let queries = build_query_plan("note", &entities, &RetrieveConfig::default());
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[1], "Knee Pain");
    }

    #[test]
    fn short_phrases_dropped() {
        let entities = vec![entity("ct"), entity("mr"), entity("mri")];
        let queries = build_query_plan("note", &entities, &RetrieveConfig::default());
        assert_eq!(&queries[1..], &["mri".to_string()]);
    }

    #[test]
    fn mri_cue_triggers_imaging_expansion() {
        let queries = build_query_plan(
            "Patient underwent MRI of the right knee",
            &[],
            &RetrieveConfig::default(),
        );
        assert!(queries.contains(&"magnetic resonance imaging".to_string()));
    }

    #[test]
    fn multiple_triggers_emit_rule_once() {
        // "arthroscopic" and "repair" hit the same rule; phrases appear once.
        let queries = build_query_plan(
            "arthroscopic repair of the meniscus",
            &[],
            &RetrieveConfig::default(),
        );
        let count = queries
            .iter()
            .filter(|q| *q == "surgical procedure")
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn no_cues_means_just_the_note() {
        let queries = build_query_plan("routine note", &[], &RetrieveConfig::default());
        assert_eq!(queries.len(), 1);
    }
}
