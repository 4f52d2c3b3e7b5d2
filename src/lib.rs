//! Formulation and solution of energy hub design and dispatch problems.
#![warn(missing_docs)]
pub mod capacity;
pub mod cli;
pub mod converter;
pub mod finance;
pub mod hub;
pub mod id;
pub mod input;
pub mod log;
pub mod model;
pub mod network;
pub mod optimisation;
pub mod output;
pub mod settings;
pub mod storage;
pub mod stream;
pub mod units;

#[cfg(test)]
mod fixture;
