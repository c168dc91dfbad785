//! tickerbot — Messenger bot answering crypto and stock price questions.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod nlu;
pub mod providers;
pub mod safety;
