//! # Crawler Module
//!
//! Implements the batch engine that turns a keyword list into saved images.
//!
//! ## Key Components
//!
//! - **Crawler**: owns the shared components and runs batches
//! - **KeywordCrawler**: search page → candidates → images for one keyword, under a deadline
//! - **Keyword workers**: the bounded pool that drains the keyword channel
//!
//! ## Architecture
//!
//! A feeder task pushes keywords into a bounded channel. A fixed number of worker tasks pull
//! from it, each crawling one keyword at a time in a dedicated task, and push one report per
//! keyword into the outcome channel that the `Crawler` drains.

mod core;
mod keyword_task;
#[cfg(test)]
pub(crate) mod testing;
mod worker;

pub use core::Crawler;
pub use keyword_task::KeywordCrawler;
pub(crate) use worker::spawn_keyword_workers;
