pub mod chat;
pub mod core;
pub mod documents;
pub mod history;
pub mod ingest;
pub mod llm;
pub mod server;
pub mod state;
pub mod vector;
