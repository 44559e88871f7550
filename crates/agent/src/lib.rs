//! Agent Runtime - slot filling and fulfillment for the recipe intent
//!
//! This crate is the dialog logic behind the recipe bot:
//! - Validates the `RecipeType`, `Servings`, and `Restrictions` slots turn by turn
//! - Accumulates allergies and excluded ingredients the user mentions along the way
//! - Calls the recipe search collaborator once every slot is settled
//! - Composes the spoken/written answer with the ingredient list
//!
//! # Architecture
//!
//! One platform turn flows through:
//! 1. **Dispatch** (`runtime`) - route on intent name and invocation source
//! 2. **Validation** (`validator`) - first missing or open slot wins
//! 3. **Search** (`search`) - pluggable `RecipeSearch` backend
//! 4. **Response** (`response`) - ingredient list plus allergy/restriction clauses
//!
//! # State
//!
//! Accumulated constraints live in a `ConversationContext` owned by the caller and keyed
//! by session, never in process globals.

pub mod response;
pub mod runtime;
pub mod search;
pub mod validator;
