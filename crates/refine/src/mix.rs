use std::collections::HashSet;

use catalog::CodeSystem;
use code_index::Candidate;

use crate::types::Suggestion;

/// Reason attached to pool entries pulled in by mix backfill.
pub const BACKFILL_REASON: &str =
    "Added from retrieval candidates to balance diagnosis and procedure coverage.";

/// Enforce a diagnosis/procedure mix on the hybrid path.
///
/// Selection order: the refined list's first diagnosis item
/// unconditionally, then its procedure items up to `k`, then backfill from
/// the aggregated pool (diagnosis first, then procedure). Membership is
/// keyed on `(code, system)` so a re-scored or re-described duplicate can
/// never be selected twice.
pub fn enforce_mix(refined: &[Suggestion], pool: &[Candidate], k: usize) -> Vec<Suggestion> {
    if k == 0 {
        return Vec::new();
    }

    let mut selected: HashSet<(String, CodeSystem)> = HashSet::new();
    let mut out: Vec<Suggestion> = Vec::new();

    if let Some(first_dx) = refined
        .iter()
        .find(|s| s.system == CodeSystem::Diagnosis)
    {
        selected.insert((first_dx.code.clone(), first_dx.system));
        out.push(first_dx.clone());
    }

    for item in refined.iter().filter(|s| s.system == CodeSystem::Procedure) {
        if out.len() >= k {
            break;
        }
        if selected.insert((item.code.clone(), item.system)) {
            out.push(item.clone());
        }
    }

    for system in [CodeSystem::Diagnosis, CodeSystem::Procedure] {
        for candidate in pool.iter().filter(|c| c.system == system) {
            if out.len() >= k {
                break;
            }
            if selected.insert((candidate.code.clone(), candidate.system)) {
                out.push(Suggestion {
                    code: candidate.code.clone(),
                    system: candidate.system,
                    description: candidate.description.clone(),
                    score: candidate.score,
                    reason: BACKFILL_REASON.to_string(),
                });
            }
        }
    }

    out.truncate(k);
    out
}
