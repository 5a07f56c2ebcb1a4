pub mod config;
pub mod llm;
pub mod shared;
pub mod storage;
pub mod tickets;
pub mod web;
