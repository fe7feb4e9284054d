use std::collections::BTreeSet;

use crate::api::models::Message;

/// Ids marked for a bulk action. Only ever holds ids of the displayed
/// collection; the owner prunes it whenever messages leave.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: BTreeSet<String>,
}

impl Selection {
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.ids.iter().map(String::as_str)
    }

    pub fn select(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn deselect(&mut self, id: &str) -> bool {
        self.ids.remove(id)
    }

    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            return false;
        }

        self.ids.insert(id.to_string());
        true
    }

    /// Selects every displayed message unless all of them already are, in
    /// which case the selection is cleared.
    pub fn toggle_all(&mut self, displayed: &[Message]) {
        let all_selected = !displayed.is_empty()
            && displayed
                .iter()
                .all(|message| self.ids.contains(&message.id));

        if all_selected {
            self.ids.clear();
        } else {
            self.ids = displayed.iter().map(|message| message.id.clone()).collect();
        }
    }

    pub fn retain_displayed(&mut self, displayed: &[Message]) {
        self.ids
            .retain(|id| displayed.iter().any(|message| &message.id == id));
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(ids: &[&str]) -> Vec<Message> {
        ids.iter()
            .map(|id| Message {
                id: id.to_string(),
                ..Message::default()
            })
            .collect()
    }

    #[test]
    fn toggle_all_selects_everything_when_partially_selected() {
        let displayed = messages(&["a", "b", "c"]);
        let mut selection = Selection::default();
        selection.select("b");

        selection.toggle_all(&displayed);

        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn toggle_all_clears_when_everything_selected() {
        let displayed = messages(&["a", "b"]);
        let mut selection = Selection::default();
        selection.toggle_all(&displayed);
        selection.toggle_all(&displayed);

        assert!(selection.is_empty());
    }

    #[test]
    fn toggle_all_on_empty_collection_stays_empty() {
        let mut selection = Selection::default();
        selection.toggle_all(&[]);
        assert!(selection.is_empty());
    }

    #[test]
    fn prunes_ids_that_left_the_collection() {
        let mut selection = Selection::default();
        selection.select("a");
        selection.select("gone");

        selection.retain_displayed(&messages(&["a", "b"]));

        assert!(selection.contains("a"));
        assert!(!selection.contains("gone"));
    }
}
