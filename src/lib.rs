//! Wellness Planner — conversational pregnancy and postpartum plan builder.

pub mod assets;
pub mod channels;
pub mod config;
pub mod error;
pub mod export;
pub mod llm;
pub mod planner;
pub mod wellness;
