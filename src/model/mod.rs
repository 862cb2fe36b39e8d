pub mod expert;
pub mod news;
pub mod portfolio;
pub mod profile;
pub mod quote;
pub mod signal;
