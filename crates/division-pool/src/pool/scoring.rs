use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;

use super::domain::{Choice, PredictionRow, ScoredPredictor, SubjectId, SubjectKey};

/// Point totals per predictor, iterated in order of first appearance in the prediction table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scoreboard {
    entries: Vec<ScoredPredictor>,
}

impl Scoreboard {
    pub fn get(&self, predictor_name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|entry| entry.predictor_name == predictor_name)
            .map(|entry| entry.points)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScoredPredictor> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_map(&self) -> BTreeMap<String, u32> {
        self.entries
            .iter()
            .map(|entry| (entry.predictor_name.clone(), entry.points))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Scoreboard {
    type Item = &'a ScoredPredictor;
    type IntoIter = std::slice::Iter<'a, ScoredPredictor>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Score every predictor against the current choices.
///
/// A predictor earns one point per subject whose chosen category equals its guess exactly.
/// Rows sharing a predictor name count as one predictor, and a subject chosen more than
/// once in `choices` still yields at most one point, so the result does not depend on the
/// order of either input.
pub fn score(choices: &[Choice], predictions: &[PredictionRow]) -> Scoreboard {
    let mut order: Vec<&str> = Vec::new();
    let mut hits: HashMap<&str, HashSet<SubjectId>> = HashMap::new();

    for row in predictions {
        let name = row.predictor_name.as_str();
        if !hits.contains_key(name) {
            hits.insert(name, HashSet::new());
            order.push(name);
        }
    }

    for choice in choices {
        let key = SubjectKey::from_name(&choice.subject_name);
        for row in predictions {
            if row.guess_for(&key) == Some(choice.category.as_str()) {
                if let Some(subjects) = hits.get_mut(row.predictor_name.as_str()) {
                    subjects.insert(choice.subject_id);
                }
            }
        }
    }

    let entries: Vec<ScoredPredictor> = order
        .into_iter()
        .map(|name| ScoredPredictor {
            predictor_name: name.to_string(),
            points: hits.get(name).map_or(0, |subjects| subjects.len() as u32),
        })
        .collect();

    debug!(
        choices = choices.len(),
        predictors = entries.len(),
        "scored predictions"
    );

    Scoreboard { entries }
}
