// src/ingest/providers/mod.rs
pub mod newsapi;
pub mod rss;
pub mod story_index;
