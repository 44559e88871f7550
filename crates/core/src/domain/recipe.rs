use serde::{Deserialize, Serialize};

/// A recipe returned by the search collaborator, with ingredient lines already scaled to
/// the requested servings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDetails {
    pub name: String,
    pub recipe_url: String,
    pub scaled_ingredients: Vec<String>,
}

/// Optional search filters. Empty lists and `None` are left out of the request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub allergy: Vec<String>,
    /// Maximum total time in seconds, as produced by the duration parser.
    pub time: Option<String>,
    pub excluded_ingredient: Vec<String>,
}

impl SearchOptions {
    pub fn is_empty(&self) -> bool {
        self.allergy.is_empty() && self.time.is_none() && self.excluded_ingredient.is_empty()
    }
}
