//! HTTP handlers

pub mod health;
pub mod verify;
pub mod accuracy;
pub mod model;

#[cfg(test)]
mod tests;
