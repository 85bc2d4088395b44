pub mod row;
pub mod settings;
pub mod state;
