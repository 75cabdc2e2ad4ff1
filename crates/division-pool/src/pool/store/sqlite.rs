use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{collection_name, next_choice_id, PoolGateway, StoreError, CHOICES, PEOPLE, PREDICTIONS};
use crate::pool::domain::{Choice, ChoiceDraft, Person, PredictionRow, SubjectKey};

#[derive(Debug, Clone)]
struct Tables {
    choices: String,
    people: String,
    predictors: String,
    cells: String,
}

impl Tables {
    fn for_namespace(namespace: &str) -> Self {
        let predictors = collection_name(namespace, PREDICTIONS);
        Self {
            choices: collection_name(namespace, CHOICES),
            people: collection_name(namespace, PEOPLE),
            cells: format!("{predictors}_cells"),
            predictors,
        }
    }
}

/// Relational gateway. Row order is carried in explicit sequence columns so reads match
/// the key-value backend exactly.
pub struct SqliteGateway {
    conn: Mutex<Connection>,
    tables: Tables,
}

impl SqliteGateway {
    pub fn open(path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open(path)?, namespace)
    }

    pub fn open_in_memory(namespace: &str) -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?, namespace)
    }

    fn with_connection(conn: Connection, namespace: &str) -> Result<Self, StoreError> {
        let tables = Tables::for_namespace(namespace);
        conn.execute_batch(&format!(
            "
            CREATE TABLE IF NOT EXISTS {choices} (
                id INTEGER PRIMARY KEY,
                subject_id INTEGER NOT NULL UNIQUE,
                subject_name TEXT NOT NULL,
                category TEXT NOT NULL,
                recorded_at TEXT NOT NULL,
                created_seq INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {people} (
                position INTEGER PRIMARY KEY,
                id INTEGER NOT NULL,
                name TEXT NOT NULL,
                department TEXT NOT NULL,
                photo TEXT
            );
            CREATE TABLE IF NOT EXISTS {predictors} (
                position INTEGER PRIMARY KEY,
                name TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS {cells} (
                position INTEGER NOT NULL,
                subject_key TEXT NOT NULL,
                category TEXT NOT NULL,
                PRIMARY KEY (position, subject_key)
            );
            ",
            choices = tables.choices,
            people = tables.people,
            predictors = tables.predictors,
            cells = tables.cells,
        ))?;

        Ok(Self {
            conn: Mutex::new(conn),
            tables,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("sqlite connection poisoned".to_string()))
    }

    fn select_choices(&self) -> String {
        format!(
            "SELECT id, subject_id, subject_name, category, recorded_at FROM {}",
            self.tables.choices
        )
    }
}

impl PoolGateway for SqliteGateway {
    fn read_choices(&self) -> Result<Vec<Choice>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "{} ORDER BY created_seq DESC",
            self.select_choices()
        ))?;
        let rows = stmt.query_map([], choice_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn write_choices(&self, choices: &[Choice]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", self.tables.choices), [])?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} (id, subject_id, subject_name, category, recorded_at, created_seq)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                self.tables.choices
            ))?;
            let total = choices.len() as i64;
            for (index, choice) in choices.iter().enumerate() {
                insert.execute(params![
                    choice.id,
                    choice.subject_id,
                    choice.subject_name,
                    choice.category,
                    choice.timestamp.to_rfc3339(),
                    total - index as i64,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_choice(&self, draft: ChoiceDraft) -> Result<Choice, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let table = &self.tables.choices;

        let existing: Option<i64> = tx
            .query_row(
                &format!("SELECT id FROM {table} WHERE subject_id = ?1"),
                params![draft.subject_id],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(id) => {
                tx.execute(
                    &format!(
                        "UPDATE {table} SET subject_name = ?1, category = ?2, recorded_at = ?3
                         WHERE id = ?4"
                    ),
                    params![
                        draft.subject_name,
                        draft.category,
                        draft.recorded_at.to_rfc3339(),
                        id
                    ],
                )?;
            }
            None => {
                let (highest_id, highest_seq): (i64, i64) = tx.query_row(
                    &format!("SELECT COALESCE(MAX(id), 0), COALESCE(MAX(created_seq), 0) FROM {table}"),
                    [],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                tx.execute(
                    &format!(
                        "INSERT INTO {table} (id, subject_id, subject_name, category, recorded_at, created_seq)
                         VALUES (?1, ?2, ?3, ?4, ?5, ?6)"
                    ),
                    params![
                        next_choice_id(highest_id, &draft),
                        draft.subject_id,
                        draft.subject_name,
                        draft.category,
                        draft.recorded_at.to_rfc3339(),
                        highest_seq + 1,
                    ],
                )?;
            }
        }

        let choice = tx.query_row(
            &format!("{} WHERE subject_id = ?1", self.select_choices()),
            params![draft.subject_id],
            choice_from_row,
        )?;
        tx.commit()?;
        Ok(choice)
    }

    fn read_people(&self) -> Result<Vec<Person>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT id, name, department, photo FROM {} ORDER BY position",
            self.tables.people
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(Person {
                id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                photo_ref: row.get(3)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn write_people(&self, people: &[Person]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", self.tables.people), [])?;
        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {} (position, id, name, department, photo) VALUES (?1, ?2, ?3, ?4, ?5)",
                self.tables.people
            ))?;
            for (position, person) in people.iter().enumerate() {
                insert.execute(params![
                    position as i64,
                    person.id,
                    person.name,
                    person.department,
                    person.photo_ref,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn read_predictions(&self) -> Result<Vec<PredictionRow>, StoreError> {
        let conn = self.lock()?;
        let mut rows: Vec<(i64, PredictionRow)> = {
            let mut stmt = conn.prepare(&format!(
                "SELECT position, name FROM {} ORDER BY position",
                self.tables.predictors
            ))?;
            let mapped = stmt.query_map([], |row| {
                Ok((row.get::<_, i64>(0)?, PredictionRow::new(row.get::<_, String>(1)?)))
            })?;
            mapped.collect::<Result<Vec<_>, _>>()?
        };

        let mut stmt = conn.prepare(&format!(
            "SELECT position, subject_key, category FROM {}",
            self.tables.cells
        ))?;
        let cells = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;
        for cell in cells {
            let (position, subject_key, category) = cell?;
            if let Some((_, row)) = rows.iter_mut().find(|(pos, _)| *pos == position) {
                row.insert_guess(&subject_key, &category);
            }
        }

        Ok(rows.into_iter().map(|(_, row)| row).collect())
    }

    fn write_predictions(&self, rows: &[PredictionRow]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DELETE FROM {}", self.tables.cells), [])?;
        tx.execute(&format!("DELETE FROM {}", self.tables.predictors), [])?;
        {
            let mut predictor = tx.prepare(&format!(
                "INSERT INTO {} (position, name) VALUES (?1, ?2)",
                self.tables.predictors
            ))?;
            let mut cell = tx.prepare(&format!(
                "INSERT INTO {} (position, subject_key, category) VALUES (?1, ?2, ?3)",
                self.tables.cells
            ))?;
            for (position, row) in rows.iter().enumerate() {
                let position = position as i64;
                predictor.execute(params![position, row.predictor_name])?;
                for (key, category) in &row.guesses {
                    cell.execute(params![position, key.as_str(), category])?;
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for table in [
            &self.tables.choices,
            &self.tables.people,
            &self.tables.cells,
            &self.tables.predictors,
        ] {
            tx.execute(&format!("DELETE FROM {table}"), [])?;
        }
        tx.commit()?;
        Ok(())
    }
}

fn choice_from_row(row: &Row<'_>) -> rusqlite::Result<Choice> {
    let recorded_at: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&recorded_at)
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(err)))?
        .with_timezone(&Utc);

    Ok(Choice {
        id: row.get(0)?,
        subject_id: row.get(1)?,
        subject_name: row.get(2)?,
        category: row.get(3)?,
        timestamp,
    })
}
