use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ItemId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ItemError {
    #[error("item prompt cannot be empty")]
    EmptyPrompt,

    #[error("item answer cannot be empty")]
    EmptyAnswer,

    #[error("choices must include the correct answer {answer:?}")]
    AnswerNotInChoices { answer: String },

    #[error("duplicate choice {0:?}")]
    DuplicateChoice(String),

    #[error("choice list needs at least two entries, got {0}")]
    TooFewChoices(usize),
}

//
// ─── QUIZ ITEM TRAIT ───────────────────────────────────────────────────────────
//

/// What the progression engine needs to know about a quiz unit.
///
/// `answer()` is the identity of the correct answer: a submitted candidate is
/// correct exactly when it equals this text.
pub trait QuizItem: Clone {
    fn id(&self) -> ItemId;
    fn prompt(&self) -> &str;
    fn answer(&self) -> &str;

    /// Pre-authored options, or `None` when distractors must be generated.
    fn choices(&self) -> Option<&[String]> {
        None
    }

    /// Shown with the feedback after an answer.
    fn explanation(&self) -> Option<&str> {
        None
    }

    fn fun_fact(&self) -> Option<&str> {
        None
    }
}

//
// ─── METADATA ──────────────────────────────────────────────────────────────────
//

/// Optional presentation extras attached to an item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMeta {
    #[serde(default)]
    pub explanation: Option<String>,
    #[serde(default)]
    pub fun_fact: Option<String>,
    /// Reference to an image or map asset, resolved by the shell.
    #[serde(default)]
    pub media: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

impl ItemMeta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.explanation.is_none()
            && self.fun_fact.is_none()
            && self.media.is_none()
            && self.icon.is_none()
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated item as it comes out of a content dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDraft {
    pub prompt: String,
    pub answer: String,
    #[serde(default)]
    pub choices: Option<Vec<String>>,
    #[serde(default, flatten)]
    pub meta: ItemMeta,
}

impl ItemDraft {
    /// Draft for an item whose options are generated from other items' answers.
    #[must_use]
    pub fn open(prompt: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            answer: answer.into(),
            choices: None,
            meta: ItemMeta::default(),
        }
    }

    /// Draft for a multiple-choice item with curated options.
    #[must_use]
    pub fn multiple_choice<S: Into<String>>(
        prompt: impl Into<String>,
        choices: impl IntoIterator<Item = S>,
        correct_index: usize,
    ) -> Self {
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();
        let answer = choices.get(correct_index).cloned().unwrap_or_default();
        Self {
            prompt: prompt.into(),
            answer,
            choices: Some(choices),
            meta: ItemMeta::default(),
        }
    }

    /// Draft for a true/false statement.
    #[must_use]
    pub fn true_false(statement: impl Into<String>, is_true: bool) -> Self {
        let answer = if is_true { "True" } else { "False" };
        Self {
            prompt: statement.into(),
            answer: answer.to_string(),
            choices: Some(vec!["True".to_string(), "False".to_string()]),
            meta: ItemMeta::default(),
        }
    }

    #[must_use]
    pub fn with_meta(mut self, meta: ItemMeta) -> Self {
        self.meta = meta;
        self
    }

    /// Validate the draft and assign it an id.
    ///
    /// Text is trimmed. Curated choices must be unique and contain the answer.
    ///
    /// # Errors
    ///
    /// Returns `ItemError` when the prompt or answer is blank or the choice
    /// list is inconsistent with the answer.
    pub fn validate(self, id: ItemId) -> Result<Item, ItemError> {
        let prompt = self.prompt.trim().to_string();
        if prompt.is_empty() {
            return Err(ItemError::EmptyPrompt);
        }
        let answer = self.answer.trim().to_string();
        if answer.is_empty() {
            return Err(ItemError::EmptyAnswer);
        }

        let choices = match self.choices {
            None => None,
            Some(raw) => {
                let choices: Vec<String> = raw.into_iter().map(|c| c.trim().to_string()).collect();
                if choices.len() < 2 {
                    return Err(ItemError::TooFewChoices(choices.len()));
                }
                let mut seen = HashSet::with_capacity(choices.len());
                for choice in &choices {
                    if !seen.insert(choice.as_str()) {
                        return Err(ItemError::DuplicateChoice(choice.clone()));
                    }
                }
                if !seen.contains(answer.as_str()) {
                    return Err(ItemError::AnswerNotInChoices { answer });
                }
                Some(choices)
            }
        };

        Ok(Item {
            id,
            prompt,
            answer,
            choices,
            meta: self.meta,
        })
    }
}

//
// ─── ITEM ──────────────────────────────────────────────────────────────────────
//

/// One immutable quiz unit.
///
/// Only `ItemDraft::validate` builds one; deserialize the draft instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Item {
    id: ItemId,
    prompt: String,
    answer: String,
    choices: Option<Vec<String>>,
    meta: ItemMeta,
}

impl Item {
    #[must_use]
    pub fn meta(&self) -> &ItemMeta {
        &self.meta
    }

    /// Index of the correct answer within the curated choices, if any.
    #[must_use]
    pub fn correct_index(&self) -> Option<usize> {
        self.choices
            .as_ref()
            .and_then(|choices| choices.iter().position(|c| *c == self.answer))
    }
}

impl QuizItem for Item {
    fn id(&self) -> ItemId {
        self.id
    }

    fn prompt(&self) -> &str {
        &self.prompt
    }

    fn answer(&self) -> &str {
        &self.answer
    }

    fn choices(&self) -> Option<&[String]> {
        self.choices.as_deref()
    }

    fn explanation(&self) -> Option<&str> {
        self.meta.explanation.as_deref()
    }

    fn fun_fact(&self) -> Option<&str> {
        self.meta.fun_fact.as_deref()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_prompt_is_rejected() {
        let err = ItemDraft::open("   ", "Austin").validate(ItemId::new(1)).unwrap_err();
        assert_eq!(err, ItemError::EmptyPrompt);
    }

    #[test]
    fn blank_answer_is_rejected() {
        let err = ItemDraft::open("Capital of Texas?", " ")
            .validate(ItemId::new(1))
            .unwrap_err();
        assert_eq!(err, ItemError::EmptyAnswer);
    }

    #[test]
    fn multiple_choice_keeps_curated_order() {
        let item = ItemDraft::multiple_choice("3 x 4 = ?", ["7", "12", "34", "1"], 1)
            .validate(ItemId::new(7))
            .unwrap();
        assert_eq!(item.answer(), "12");
        assert_eq!(item.correct_index(), Some(1));
        assert_eq!(item.choices().unwrap(), ["7", "12", "34", "1"]);
    }

    #[test]
    fn out_of_range_correct_index_fails_validation() {
        let err = ItemDraft::multiple_choice("2 + 2 = ?", ["3", "4"], 5)
            .validate(ItemId::new(1))
            .unwrap_err();
        assert_eq!(err, ItemError::EmptyAnswer);
    }

    #[test]
    fn duplicate_choices_are_rejected() {
        let mut draft = ItemDraft::open("Largest planet?", "Jupiter");
        draft.choices = Some(vec!["Jupiter".into(), "Mars".into(), "Mars".into()]);
        let err = draft.validate(ItemId::new(1)).unwrap_err();
        assert_eq!(err, ItemError::DuplicateChoice("Mars".into()));
    }

    #[test]
    fn choices_must_contain_answer() {
        let mut draft = ItemDraft::open("Largest planet?", "Jupiter");
        draft.choices = Some(vec!["Saturn".into(), "Mars".into()]);
        let err = draft.validate(ItemId::new(1)).unwrap_err();
        assert!(matches!(err, ItemError::AnswerNotInChoices { .. }));
    }

    #[test]
    fn true_false_builds_two_choices() {
        let item = ItemDraft::true_false("The sun is a star.", true)
            .validate(ItemId::new(3))
            .unwrap();
        assert_eq!(item.answer(), "True");
        assert_eq!(item.choices().map(<[String]>::len), Some(2));
        assert!(item.meta().is_empty());
    }
}
