//! This is the library of the review bot.
//! It keeps pull requests moving through code review by reassigning them between their
//! authors, reviewers and project owners.
pub mod bot;
pub mod config;
pub mod github;
pub mod permissions;
pub mod utils;

#[cfg(test)]
mod tests;
