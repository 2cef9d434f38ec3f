pub mod cache;
pub mod config;
pub mod extractor;
pub mod fetcher;
pub mod ingest;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod server;
