use crate::model::{Item, QuizItem};

/// Source of the static content one activity runs over.
///
/// Providers hand out the full list every time; the engine shuffles its own
/// copy. An empty list means the content is not available yet.
pub trait ContentProvider {
    type Item: QuizItem;

    fn items(&self) -> Vec<Self::Item>;
}

impl ContentProvider for Vec<Item> {
    type Item = Item;

    fn items(&self) -> Vec<Item> {
        self.clone()
    }
}

impl ContentProvider for [Item] {
    type Item = Item;

    fn items(&self) -> Vec<Item> {
        self.to_vec()
    }
}
