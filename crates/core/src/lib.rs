pub mod config;
pub mod dialog;
pub mod domain;
pub mod duration;
pub mod errors;
pub mod grammar;
pub mod session;

pub use dialog::actions::{
    close, delegate, elicit_slot, DialogAction, DialogResponse, FulfillmentState,
};
pub use dialog::validation::{build_validation_result, Message, ValidationResult};
pub use domain::allergy::{AllergyEntry, AllergyTable};
pub use domain::recipe::{RecipeDetails, SearchOptions};
pub use domain::slot::{SlotName, Slots};
pub use domain::turn::{CurrentIntent, InvocationSource, SessionAttributes, Turn};
pub use duration::{parse_duration_seconds, DurationError};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use grammar::join_with_and;
pub use session::{ConversationContext, InMemorySessionStore, SessionKey, SessionStore};
