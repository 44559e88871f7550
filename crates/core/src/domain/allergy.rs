use serde::{Deserialize, Serialize};

/// Maps a restriction keyword the user may say to the allergy label used in answers and
/// the value the recipe search API expects for its allergy filter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllergyEntry {
    pub keyword: String,
    pub label: String,
    #[serde(default)]
    pub search_value: Option<String>,
}

impl AllergyEntry {
    pub fn new(keyword: impl Into<String>, label: impl Into<String>) -> Self {
        Self { keyword: keyword.into(), label: label.into(), search_value: None }
    }

    pub fn search_value(mut self, value: impl Into<String>) -> Self {
        self.search_value = Some(value.into());
        self
    }
}

/// Immutable keyword lookup. Matching is exact and case-sensitive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllergyTable {
    entries: Vec<AllergyEntry>,
}

impl AllergyTable {
    pub fn new(entries: Vec<AllergyEntry>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, keyword: &str) -> Option<&AllergyEntry> {
        self.entries.iter().find(|entry| entry.keyword == keyword)
    }

    /// Search filter value for an accumulated label. Labels that are not in the table
    /// are passed through unchanged.
    pub fn search_value_for_label<'a>(&'a self, label: &'a str) -> &'a str {
        self.entries
            .iter()
            .find(|entry| entry.label == label)
            .and_then(|entry| entry.search_value.as_deref())
            .unwrap_or(label)
    }

    pub fn entries(&self) -> &[AllergyEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AllergyTable {
    fn default() -> Self {
        Self::new(default_allergies())
    }
}

pub fn default_allergies() -> Vec<AllergyEntry> {
    [
        ("dairy", "Dairy-Free", "396^Dairy-Free"),
        ("egg", "Egg-Free", "397^Egg-Free"),
        ("gluten", "Gluten-Free", "393^Gluten-Free"),
        ("peanut", "Peanut-Free", "394^Peanut-Free"),
        ("seafood", "Seafood-Free", "398^Seafood-Free"),
        ("sesame", "Sesame-Free", "399^Sesame-Free"),
        ("soy", "Soy-Free", "400^Soy-Free"),
        ("sulfite", "Sulfite-Free", "401^Sulfite-Free"),
        ("tree nut", "Tree Nut-Free", "395^Tree Nut-Free"),
        ("wheat", "Wheat-Free", "392^Wheat-Free"),
    ]
    .into_iter()
    .map(|(keyword, label, search_value)| {
        AllergyEntry::new(keyword, label).search_value(search_value)
    })
    .collect()
}
