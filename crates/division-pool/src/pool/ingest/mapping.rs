use std::collections::HashSet;

use tracing::warn;

use super::parser::RawRow;
use crate::pool::domain::{Person, PredictionRow};

/// Header names that may carry the predictor's name, in lookup order.
const PREDICTOR_COLUMNS: [&str; 2] = ["NOME COMPLETO", "guesser_name"];
/// Bookkeeping columns of the prediction export that are never subjects.
const PREDICTION_META_COLUMNS: [&str; 2] = ["Id", "id"];

pub(crate) fn people_from_rows(rows: Vec<RawRow>) -> Vec<Person> {
    let mut people = Vec::with_capacity(rows.len());

    for row in rows {
        let raw_id = field(&row, "id");
        let Ok(id) = raw_id.parse::<i64>() else {
            warn!(id = raw_id, "skipping roster row without a numeric id");
            continue;
        };

        let photo = field(&row, "photo");
        people.push(Person {
            id,
            name: field(&row, "name").to_string(),
            department: field(&row, "department").to_string(),
            photo_ref: (!photo.is_empty()).then(|| photo.to_string()),
        });
    }

    people
}

pub(crate) fn predictions_from_rows(rows: Vec<RawRow>) -> Vec<PredictionRow> {
    let mut seen = HashSet::new();
    let mut predictions = Vec::with_capacity(rows.len());

    for row in rows {
        let Some(column) = PREDICTOR_COLUMNS
            .iter()
            .copied()
            .find(|column| !field(&row, column).is_empty())
        else {
            warn!("skipping prediction row without a predictor name");
            continue;
        };

        let name = field(&row, column).to_string();
        if !seen.insert(name.clone()) {
            warn!(predictor = %name, "duplicate predictor row ignored");
            continue;
        }

        let mut prediction = PredictionRow::new(name);
        for (header, value) in &row {
            if PREDICTOR_COLUMNS.contains(&header.as_str())
                || PREDICTION_META_COLUMNS.contains(&header.as_str())
            {
                continue;
            }
            prediction.insert_guess(header, value);
        }
        predictions.push(prediction);
    }

    predictions
}

fn field<'a>(row: &'a RawRow, name: &str) -> &'a str {
    row.get(name).map(String::as_str).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::domain::SubjectKey;
    use crate::pool::ingest::parser::parse_table;
    use std::io::Cursor;

    #[test]
    fn roster_rows_become_people() {
        let rows = parse_table(Cursor::new(
            "id,name,department,photo\n1,Ana Silva,Auditoria,ana.jpg\n2,Caio Lima,Controle,\nx,Broken,Row,\n",
        ))
        .expect("parses");
        let people = people_from_rows(rows);

        assert_eq!(people.len(), 2);
        assert_eq!(people[0].photo_ref.as_deref(), Some("ana.jpg"));
        assert_eq!(people[1].id, 2);
        assert!(people[1].photo_ref.is_none());
    }

    #[test]
    fn predictor_name_resolved_from_either_column() {
        let rows = parse_table(Cursor::new(
            "Id,NOME COMPLETO,guesser_name,ANA SILVA,CAIO LIMA\n1,Bob,,DCD,\n2,,Carol,DCI,DTI\n3,,,DCD,DCD\n",
        ))
        .expect("parses");
        let predictions = predictions_from_rows(rows);

        assert_eq!(predictions.len(), 2);
        assert_eq!(predictions[0].predictor_name, "Bob");
        assert_eq!(predictions[0].guesses.len(), 1);
        assert_eq!(predictions[1].predictor_name, "Carol");
        assert_eq!(
            predictions[1].guess_for(&SubjectKey::from_name("Caio Lima")),
            Some("DTI")
        );
    }

    #[test]
    fn first_row_wins_for_duplicate_predictors() {
        let rows = parse_table(Cursor::new(
            "NOME COMPLETO,ANA SILVA\nBob,DCD\nBob,DCI\n",
        ))
        .expect("parses");
        let predictions = predictions_from_rows(rows);

        assert_eq!(predictions.len(), 1);
        assert_eq!(
            predictions[0].guess_for(&SubjectKey::from_name("Ana Silva")),
            Some("DCD")
        );
    }
}
