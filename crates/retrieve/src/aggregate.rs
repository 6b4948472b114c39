use std::collections::HashMap;

use catalog::CodeSystem;
use code_index::Candidate;

use crate::types::RetrieveConfig;

/// Fuse the raw hit lists from every query into one ranked candidate pool.
///
/// Duplicates collapse by `(code, system)`, keeping the highest score seen
/// and the description that came with it. Each survivor then gets a single
/// flat boost when its system's lexical cues appear in the note, and the
/// pool sorts by descending score. The sort is stable, so equal scores keep
/// first-seen order.
pub(crate) fn aggregate(
    hit_lists: Vec<Vec<Candidate>>,
    text: &str,
    cfg: &RetrieveConfig,
) -> Vec<Candidate> {
    let mut pool: Vec<Candidate> = Vec::new();
    let mut by_key: HashMap<(String, CodeSystem), usize> = HashMap::new();

    for candidate in hit_lists.into_iter().flatten() {
        let key = (candidate.code.clone(), candidate.system);
        match by_key.get(&key) {
            Some(&idx) => {
                if candidate.score > pool[idx].score {
                    pool[idx].score = candidate.score;
                    pool[idx].description = candidate.description;
                }
            }
            None => {
                by_key.insert(key, pool.len());
                pool.push(candidate);
            }
        }
    }

    let lowered = text.to_lowercase();
    let boost_diagnosis = cue_present(&lowered, &cfg.diagnosis_cues);
    let boost_procedure = cue_present(&lowered, &cfg.procedure_cues);
    for candidate in &mut pool {
        let boosted = match candidate.system {
            CodeSystem::Diagnosis => boost_diagnosis,
            CodeSystem::Procedure => boost_procedure,
        };
        if boosted {
            candidate.score += cfg.boost;
        }
    }

    pool.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    pool
}

fn cue_present(lowered_text: &str, cues: &[String]) -> bool {
    cues.iter().any(|cue| lowered_text.contains(cue.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(code: &str, system: CodeSystem, description: &str, score: f32) -> Candidate {
        Candidate {
            code: code.to_string(),
            system,
            description: description.to_string(),
            score,
        }
    }

    #[test]
    fn duplicates_keep_max_score_and_its_description() {
        let pool = aggregate(
            vec![
                vec![candidate("I10", CodeSystem::Diagnosis, "first wording", 0.5)],
                vec![candidate("I10", CodeSystem::Diagnosis, "second wording", 0.75)],
            ],
            "neutral note",
            &RetrieveConfig::default(),
        );
        assert_eq!(pool.len(), 1);
        assert!((pool[0].score - 0.75).abs() < 1e-6);
        assert_eq!(pool[0].description, "second wording");
    }

    #[test]
    fn same_code_different_system_stays_separate() {
        let pool = aggregate(
            vec![vec![
                candidate("0001", CodeSystem::Diagnosis, "dx", 0.4),
                candidate("0001", CodeSystem::Procedure, "px", 0.4),
            ]],
            "neutral note",
            &RetrieveConfig::default(),
        );
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn boost_is_flat_even_with_many_cues() {
        // "pain", "tear", and "fracture" all cue diagnosis; boost applies once.
        let pool = aggregate(
            vec![vec![candidate("M25.561", CodeSystem::Diagnosis, "knee", 0.5)]],
            "pain from a tear and a fracture",
            &RetrieveConfig::default(),
        );
        assert!((pool[0].score - 0.58).abs() < 1e-6);
    }

    #[test]
    fn boost_applies_per_system() {
        let pool = aggregate(
            vec![vec![
                candidate("M25.561", CodeSystem::Diagnosis, "knee pain", 0.5),
                candidate("29881", CodeSystem::Procedure, "arthroscopy", 0.5),
            ]],
            "knee pain noted on exam",
            &RetrieveConfig::default(),
        );
        let dx = pool.iter().find(|c| c.code == "M25.561").unwrap();
        let px = pool.iter().find(|c| c.code == "29881").unwrap();
        assert!((dx.score - 0.58).abs() < 1e-6);
        assert!((px.score - 0.5).abs() < 1e-6);
    }

    #[test]
    fn boost_applied_after_dedup_not_per_hit() {
        // Two hits for the same code; max is kept first, then one boost.
        let pool = aggregate(
            vec![
                vec![candidate("I10", CodeSystem::Diagnosis, "a", 0.5)],
                vec![candidate("I10", CodeSystem::Diagnosis, "b", 0.75)],
            ],
            "hypertension noted",
            &RetrieveConfig::default(),
        );
        assert_eq!(pool.len(), 1);
        assert!((pool[0].score - 0.83).abs() < 1e-6);
    }

    #[test]
    fn sorted_descending_with_stable_ties() {
        let pool = aggregate(
            vec![vec![
                candidate("A", CodeSystem::Diagnosis, "first in", 0.6),
                candidate("B", CodeSystem::Diagnosis, "tied with A", 0.6),
                candidate("C", CodeSystem::Diagnosis, "highest", 0.9),
            ]],
            "neutral note",
            &RetrieveConfig::default(),
        );
        let codes: Vec<&str> = pool.iter().map(|c| c.code.as_str()).collect();
        assert_eq!(codes, vec!["C", "A", "B"]);
    }

    #[test]
    fn empty_input_yields_empty_pool() {
        let pool = aggregate(vec![], "anything", &RetrieveConfig::default());
        assert!(pool.is_empty());
    }
}
