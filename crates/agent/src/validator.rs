use recipebot_core::config::DEFAULT_DONE_SENTINEL;
use recipebot_core::dialog::validation::ValidationResult;
use recipebot_core::domain::allergy::AllergyTable;
use recipebot_core::domain::slot::{SlotName, Slots};
use recipebot_core::session::ConversationContext;

pub const ASK_RECIPE_TYPE: &str = "What kind of meal do you want to make?";
pub const ASK_SERVINGS: &str = "How many people are you serving?";
pub const ASK_RESTRICTIONS: &str =
    "Are there any allergies or dietary restrictions I should know about?";
pub const ASK_MORE_RESTRICTIONS: &str = "Would you like to add any more restrictions?";

/// Decides whether a recipe request may proceed to fulfillment.
///
/// Slots are checked in a fixed order and the first unset slot is asked for. Every
/// restriction other than the done sentinel is recorded in the conversation context and
/// the user is asked for another one, so constraints can be listed over several turns.
#[derive(Clone, Debug)]
pub struct SlotValidator {
    allergies: AllergyTable,
    done_sentinel: String,
}

impl Default for SlotValidator {
    fn default() -> Self {
        Self::new(AllergyTable::default(), DEFAULT_DONE_SENTINEL)
    }
}

impl SlotValidator {
    pub fn new(allergies: AllergyTable, done_sentinel: impl Into<String>) -> Self {
        Self { allergies, done_sentinel: done_sentinel.into() }
    }

    pub fn allergies(&self) -> &AllergyTable {
        &self.allergies
    }

    pub fn validate_slots(
        &self,
        slots: &Slots,
        context: &mut ConversationContext,
    ) -> ValidationResult {
        self.validate(
            slots.value(SlotName::RecipeType),
            slots.value(SlotName::Servings),
            slots.value(SlotName::Restrictions),
            context,
        )
    }

    pub fn validate(
        &self,
        recipe_type: Option<&str>,
        servings: Option<&str>,
        restrictions: Option<&str>,
        context: &mut ConversationContext,
    ) -> ValidationResult {
        if filled(recipe_type).is_none() {
            return ValidationResult::invalid(SlotName::RecipeType, ASK_RECIPE_TYPE);
        }
        if filled(servings).is_none() {
            return ValidationResult::invalid(SlotName::Servings, ASK_SERVINGS);
        }
        let Some(restriction) = filled(restrictions) else {
            return ValidationResult::invalid(SlotName::Restrictions, ASK_RESTRICTIONS);
        };

        if restriction == self.done_sentinel {
            return ValidationResult::valid();
        }

        match self.allergies.lookup(restriction) {
            Some(entry) => context.record_allergy(entry.label.clone()),
            None => context.record_restriction(restriction),
        }
        ValidationResult::invalid(SlotName::Restrictions, ASK_MORE_RESTRICTIONS)
    }
}

/// Trimmed slot text, `None` when the slot is missing or blank.
fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
