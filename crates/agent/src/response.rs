use recipebot_core::domain::recipe::RecipeDetails;
use recipebot_core::grammar::join_with_and;
use recipebot_core::session::ConversationContext;

/// Builds the final answer: recipe name and link, one bullet per ingredient, then the
/// allergy and excluded-ingredient clauses when the user stated any.
pub fn compose_response(details: &RecipeDetails, context: &ConversationContext) -> String {
    let mut response = format!(
        "Here is a recipe called {name}. The full instructions are available at: {url}. \n\
         Based on the desired servings, you will need: ",
        name = details.name,
        url = details.recipe_url,
    );

    for ingredient in &details.scaled_ingredients {
        response.push_str("\n- ");
        response.push_str(ingredient);
    }

    let has_allergies = !context.allergies.is_empty();
    if has_allergies {
        response.push_str(&format!(
            "\nThis recipe should be {}.",
            join_with_and(&context.allergies)
        ));
    }

    if !context.restrictions.is_empty() {
        let also = if has_allergies { "also " } else { "" };
        response.push_str(&format!(
            "\nThis recipe should {also}be free of the following ingredients: {}.",
            join_with_and(&context.restrictions)
        ));
    }

    response
}
