use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::calendar::Phase;
use crate::models::{Severity, SymptomLikelihood, SymptomLogEntry};

/// Symptoms most often logged during `phase`, as a percentage of the days
/// logged in that phase.
pub fn likely_symptoms(entries: &[SymptomLogEntry], phase: Phase, limit: usize) -> Vec<SymptomLikelihood> {
    rank(entries.iter().filter(|e| e.cycle_phase_at_logging == phase), limit)
}

/// Phase-agnostic variant over the whole history.
pub fn most_common_symptoms(entries: &[SymptomLogEntry], limit: usize) -> Vec<SymptomLikelihood> {
    rank(entries.iter(), limit)
}

struct Tally {
    days: BTreeSet<NaiveDate>,
    worst: Severity,
}

fn rank<'a>(entries: impl Iterator<Item = &'a SymptomLogEntry>, limit: usize) -> Vec<SymptomLikelihood> {
    let mut logged_days = BTreeSet::new();
    let mut by_symptom: BTreeMap<&str, Tally> = BTreeMap::new();

    for entry in entries {
        logged_days.insert(entry.date);
        let tally = by_symptom.entry(entry.symptom_id.as_str()).or_insert_with(|| Tally {
            days: BTreeSet::new(),
            worst: entry.severity,
        });
        tally.days.insert(entry.date);
        tally.worst = tally.worst.max(entry.severity);
    }

    if logged_days.is_empty() {
        return Vec::new();
    }
    let total = logged_days.len() as f64;

    let mut ranked: Vec<SymptomLikelihood> = by_symptom
        .into_iter()
        .filter_map(|(symptom_id, tally)| {
            let last_seen = *tally.days.last()?;
            Some(SymptomLikelihood {
                symptom_id: symptom_id.to_string(),
                occurrences: tally.days.len(),
                likelihood: tally.days.len() as f64 * 100.0 / total,
                last_seen,
                worst_severity: tally.worst,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.occurrences
            .cmp(&a.occurrences)
            .then_with(|| b.last_seen.cmp(&a.last_seen))
            .then_with(|| a.symptom_id.cmp(&b.symptom_id))
    });
    ranked.truncate(limit);
    ranked
}
