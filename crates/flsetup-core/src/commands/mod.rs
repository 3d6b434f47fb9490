pub mod doctor;
pub mod firebase;
pub mod setup;
