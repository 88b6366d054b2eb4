// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Question repository.
//!
//! Questions are the bingo challenges. Ids come from the `question_id`
//! sequence; display order is `order_index`, ties broken by id.

use chrono::{DateTime, Utc};
use redb::ReadableTable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::super::database::{next_sequence, QUESTIONS, SCAN_GUARD};
use super::super::{BingoDatabase, DbError, DbResult};

const QUESTION_SEQUENCE: &str = "question_id";

/// A bingo challenge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Question {
    pub id: u64,
    /// Position on the board (ascending)
    pub order_index: i32,
    /// Challenge text, may embed a decorative emoji
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Partial update for a question.
#[derive(Debug, Clone, Default)]
pub struct QuestionPatch {
    pub text: Option<String>,
    pub order_index: Option<i32>,
}

pub struct QuestionRepository<'a> {
    db: &'a BingoDatabase,
}

impl<'a> QuestionRepository<'a> {
    pub fn new(db: &'a BingoDatabase) -> Self {
        Self { db }
    }

    pub fn get(&self, question_id: u64) -> DbResult<Option<Question>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS)?;
        match table.get(question_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// All questions in board order.
    pub fn list(&self) -> DbResult<Vec<Question>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS)?;

        let mut questions: Vec<Question> = Vec::new();
        for entry in table.iter()? {
            let (_, value) = entry?;
            questions.push(serde_json::from_slice(value.value())?);
        }
        questions.sort_by(|a, b| a.order_index.cmp(&b.order_index).then(a.id.cmp(&b.id)));
        Ok(questions)
    }

    pub fn create(&self, text: &str, order_index: i32) -> DbResult<Question> {
        let write_txn = self.db.begin_write()?;
        let question = {
            let id = next_sequence(&write_txn, QUESTION_SEQUENCE)?;
            let question = Question {
                id,
                order_index,
                text: text.to_string(),
                created_at: Utc::now(),
            };
            let mut table = write_txn.open_table(QUESTIONS)?;
            let json = serde_json::to_vec(&question)?;
            table.insert(id, json.as_slice())?;
            question
        };
        write_txn.commit()?;
        Ok(question)
    }

    pub fn update(&self, question_id: u64, patch: QuestionPatch) -> DbResult<Question> {
        let write_txn = self.db.begin_write()?;
        let question = {
            let mut table = write_txn.open_table(QUESTIONS)?;
            let existing = table
                .get(question_id)?
                .map(|v| v.value().to_vec())
                .ok_or_else(|| DbError::NotFound(format!("Question {question_id}")))?;

            let mut question: Question = serde_json::from_slice(&existing)?;
            if let Some(text) = patch.text {
                question.text = text;
            }
            if let Some(order_index) = patch.order_index {
                question.order_index = order_index;
            }

            let json = serde_json::to_vec(&question)?;
            table.insert(question_id, json.as_slice())?;
            question
        };
        write_txn.commit()?;
        Ok(question)
    }

    /// Delete a question that nobody has completed yet.
    pub fn delete(&self, question_id: u64) -> DbResult<()> {
        let suffix = format!("|{question_id}");
        let write_txn = self.db.begin_write()?;
        {
            let guard = write_txn.open_table(SCAN_GUARD)?;
            for entry in guard.iter()? {
                let (key, _) = entry?;
                if key.value().ends_with(&suffix) {
                    return Err(DbError::Conflict(format!(
                        "Question {question_id} already has scans"
                    )));
                }
            }

            let mut table = write_txn.open_table(QUESTIONS)?;
            if table.remove(question_id)?.is_none() {
                return Err(DbError::NotFound(format!("Question {question_id}")));
            }
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn count(&self) -> DbResult<usize> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(QUESTIONS)?;
        let mut count = 0;
        for entry in table.iter()? {
            entry?;
            count += 1;
        }
        Ok(count)
    }
}
