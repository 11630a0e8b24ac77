/// Maximum number of cities remembered.
pub const MAX_HISTORY: usize = 5;

/// Recently searched cities, most recent first.
///
/// Entries are unique (exact, case-sensitive match) and there are never more
/// than [`MAX_HISTORY`] of them. Adding a city that is already present leaves
/// the order untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchHistory {
    entries: Vec<String>,
}

impl SearchHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a history from persisted entries, dropping later duplicates and
    /// anything past the cap.
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut history = Self::new();
        for entry in entries {
            if history.entries.len() == MAX_HISTORY {
                break;
            }
            if !history.contains(&entry) {
                history.entries.push(entry);
            }
        }
        history
    }

    /// Record a city. Returns `true` if the history changed.
    pub fn add(&mut self, city: &str) -> bool {
        if self.contains(city) {
            return false;
        }
        self.entries.insert(0, city.to_string());
        self.entries.truncate(MAX_HISTORY);
        true
    }

    pub fn contains(&self, city: &str) -> bool {
        self.entries.iter().any(|e| e == city)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
