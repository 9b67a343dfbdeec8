pub mod selection;
pub mod state;
