use crate::model::EventRecord;

/// The record highlighted on both the map and the list, stored by id.
///
/// Nothing checks that the id still exists after a refresh; an orphaned id
/// simply matches no record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    id: Option<String>,
}

impl Selection {
    pub fn select(&mut self, record: &EventRecord) {
        self.select_id(&record.id);
    }

    pub fn select_id(&mut self, id: &str) {
        if self.current() != Some(id) {
            tracing::debug!(id, "selection changed");
            self.id = Some(id.to_string());
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_selected(&self, record: &EventRecord) -> bool {
        self.current() == Some(record.id.as_str())
    }
}
