//! archrisk - Architecture threat-model risk evaluation
//!
//! Evaluates a model of technical assets, data assets, communication links,
//! trust boundaries and shared runtimes against a catalog of risk rules.

pub mod cli;
pub mod config;
pub mod graph;
pub mod models;
pub mod reporters;
pub mod risks;
pub mod rules;
pub mod scoring;
