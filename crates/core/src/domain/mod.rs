pub mod allergy;
pub mod recipe;
pub mod slot;
pub mod turn;
