pub mod app;
pub mod config;
pub mod dom;
pub mod event_loop;
pub mod normalizer;
pub mod paths;
pub mod rules;
pub mod scheduler;
pub mod watcher;
