pub mod acquisition;
pub mod challenge;
pub mod config;
pub mod entities;
pub mod extractor;
pub mod fetcher;
pub mod repositories;
pub mod scheduler;
