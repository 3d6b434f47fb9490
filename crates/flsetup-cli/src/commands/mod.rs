pub mod doctor;
pub mod projects;
pub mod setup;
