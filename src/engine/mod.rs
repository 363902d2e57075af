// Engine orchestration: metadata resolution and content synchronization.

pub mod assets;
pub mod dependencies;
pub mod downloader;
pub mod report;
pub mod resolver;
pub mod stats;
