use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::model::{AnswerRecord, Question, QuestionId, Response, SubmittedAnswer};

/// Current response per question of one session.
///
/// Last write wins; records are never removed one by one, only all at once
/// when the session restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerStore {
    records: BTreeMap<QuestionId, AnswerRecord>,
}

impl AnswerStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Grade `response` against `question` and replace any earlier record.
    ///
    /// A response that does not fit the question's kind still replaces the
    /// earlier record, as an answer that earns nothing.
    pub fn record_answer(&mut self, question: &Question, response: Response) -> &AnswerRecord {
        let record = AnswerRecord::grade(question, response);
        match self.records.entry(question.id()) {
            Entry::Occupied(mut entry) => {
                entry.insert(record);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(record),
        }
    }

    #[must_use]
    pub fn get(&self, question_id: QuestionId) -> Option<&AnswerRecord> {
        self.records.get(&question_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records ordered by question id.
    pub fn iter(&self) -> impl Iterator<Item = (QuestionId, &AnswerRecord)> {
        self.records.iter().map(|(id, record)| (*id, record))
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }

    #[must_use]
    pub fn to_submitted(&self) -> Vec<SubmittedAnswer> {
        self.iter()
            .map(|(id, record)| SubmittedAnswer::from_record(id, record))
            .collect()
    }
}
