pub mod catalog;
pub mod dashboard;
pub mod editor;
pub mod login;
pub mod not_found;
pub mod scenarios;
