use std::collections::HashMap;
use std::mem;

use serde::Serialize;

use super::domain::{LeaderboardEntry, Movement, RankedEntry};
use super::scoring::Scoreboard;

/// Predictors ordered by points, best first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Ranking {
    entries: Vec<RankedEntry>,
}

impl Ranking {
    pub fn entries(&self) -> &[RankedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn rank_of(&self, predictor_name: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|entry| entry.predictor_name == predictor_name)
            .map(|entry| entry.rank)
    }
}

/// Sort descending by points. `sort_by` is stable, so ties keep scoreboard order.
pub fn rank(scored: &Scoreboard) -> Ranking {
    let mut ordered: Vec<_> = scored.iter().collect();
    ordered.sort_by(|a, b| b.points.cmp(&a.points));

    let entries = ordered
        .into_iter()
        .enumerate()
        .map(|(rank, scored)| RankedEntry {
            predictor_name: scored.predictor_name.clone(),
            points: scored.points,
            rank,
        })
        .collect();

    Ranking { entries }
}

/// Classify every entry of `current` against its index in `previous`.
pub fn classify_movement(previous: &Ranking, current: &Ranking) -> Vec<LeaderboardEntry> {
    let previous_ranks: HashMap<&str, usize> = previous
        .entries
        .iter()
        .map(|entry| (entry.predictor_name.as_str(), entry.rank))
        .collect();

    current
        .entries
        .iter()
        .map(|entry| {
            let movement = match previous_ranks.get(entry.predictor_name.as_str()) {
                None => Movement::New,
                Some(&before) if entry.rank < before => Movement::Up,
                Some(&before) if entry.rank > before => Movement::Down,
                Some(_) => Movement::Same,
            };
            LeaderboardEntry {
                entry: entry.clone(),
                movement,
            }
        })
        .collect()
}

/// First `k` entries, best first.
pub fn top(entries: &[LeaderboardEntry], k: usize) -> Vec<LeaderboardEntry> {
    entries.iter().take(k).cloned().collect()
}

/// Last `k` entries, worst first. May overlap with [`top`] on short rankings.
pub fn bottom(entries: &[LeaderboardEntry], k: usize) -> Vec<LeaderboardEntry> {
    entries.iter().rev().take(k).cloned().collect()
}

/// Holds the two most recent rankings so movement can be re-derived on every read.
#[derive(Debug, Clone, Default)]
pub struct MovementTracker {
    previous: Ranking,
    current: Ranking,
}

impl MovementTracker {
    /// Replace the current ranking; the displaced one becomes the comparison baseline.
    pub fn advance(&mut self, next: Ranking) {
        self.previous = mem::replace(&mut self.current, next);
    }

    pub fn current(&self) -> &Ranking {
        &self.current
    }

    pub fn previous(&self) -> &Ranking {
        &self.previous
    }

    pub fn entries(&self) -> Vec<LeaderboardEntry> {
        classify_movement(&self.previous, &self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::domain::{Choice, PredictionRow};
    use crate::pool::scoring::score;
    use chrono::{TimeZone, Utc};

    fn board(points: &[(&str, u32)]) -> Scoreboard {
        let mut predictions = Vec::new();
        let mut choices = Vec::new();
        let mut next_subject = 0;
        for (name, count) in points {
            let mut row = PredictionRow::new(*name);
            for _ in 0..*count {
                next_subject += 1;
                let subject = format!("Subject {next_subject}");
                row.insert_guess(&subject, "DCD");
                choices.push(Choice {
                    id: next_subject,
                    subject_id: next_subject,
                    subject_name: subject,
                    category: "DCD".to_string(),
                    timestamp: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
                });
            }
            predictions.push(row);
        }
        score(&choices, &predictions)
    }

    fn names(ranking: &Ranking) -> Vec<&str> {
        ranking
            .entries()
            .iter()
            .map(|entry| entry.predictor_name.as_str())
            .collect()
    }

    #[test]
    fn ranks_descending_with_zero_based_index() {
        let ranking = rank(&board(&[("Carol", 1), ("Bob", 2)]));
        assert_eq!(
            ranking.entries(),
            &[
                RankedEntry {
                    predictor_name: "Bob".to_string(),
                    points: 2,
                    rank: 0
                },
                RankedEntry {
                    predictor_name: "Carol".to_string(),
                    points: 1,
                    rank: 1
                },
            ]
        );
    }

    #[test]
    fn ties_keep_scoreboard_order() {
        let ranking = rank(&board(&[("Zed", 1), ("Amy", 2), ("Max", 1), ("Ida", 1)]));
        assert_eq!(names(&ranking), vec!["Amy", "Zed", "Max", "Ida"]);
    }

    #[test]
    fn movement_tracks_position_changes() {
        let mut tracker = MovementTracker::default();
        tracker.advance(rank(&board(&[("Bob", 2), ("Carol", 1)])));
        tracker.advance(rank(&board(&[("Bob", 2), ("Carol", 3)])));

        let entries = tracker.entries();
        assert_eq!(entries[0].entry.predictor_name, "Carol");
        assert_eq!(entries[0].entry.rank, 0);
        assert_eq!(entries[0].movement, Movement::Up);
        assert_eq!(entries[1].entry.predictor_name, "Bob");
        assert_eq!(entries[1].movement, Movement::Down);
    }

    #[test]
    fn identical_rankings_classify_as_same() {
        let scored = board(&[("Bob", 2), ("Carol", 1), ("Dani", 0)]);
        let first = rank(&scored);
        let second = rank(&scored);
        assert_eq!(first, second);
        assert!(classify_movement(&first, &second)
            .iter()
            .all(|entry| entry.movement == Movement::Same));
    }

    #[test]
    fn unseen_predictors_are_new() {
        let previous = rank(&board(&[("Bob", 1)]));
        let current = rank(&board(&[("Bob", 1), ("Erin", 0)]));
        let movements: Vec<_> = classify_movement(&previous, &current)
            .into_iter()
            .map(|entry| entry.movement)
            .collect();
        assert_eq!(movements, vec![Movement::Same, Movement::New]);

        let fresh = MovementTracker::default();
        assert!(fresh.entries().is_empty());
    }

    #[test]
    fn slices_overlap_on_short_rankings() {
        let tracker = {
            let mut tracker = MovementTracker::default();
            tracker.advance(rank(&board(&[("Bob", 2), ("Carol", 1)])));
            tracker
        };
        let entries = tracker.entries();

        let best = top(&entries, 3);
        let worst = bottom(&entries, 3);
        assert_eq!(best.len(), 2);
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].entry.predictor_name, "Carol");
        assert_eq!(worst[0].entry.rank, 1);
        assert_eq!(worst[1].entry.predictor_name, "Bob");

        assert!(top(&[], 3).is_empty());
        assert!(bottom(&[], 3).is_empty());
    }
}
