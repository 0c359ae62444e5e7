pub mod operations;
pub mod watcher;
