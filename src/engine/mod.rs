pub mod bands;
pub mod derive;
pub mod reconcile;
