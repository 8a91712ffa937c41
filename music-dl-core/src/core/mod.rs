pub mod collection;
pub mod events;
pub mod filename;
pub mod process;
pub mod progress;
pub mod sweeper;
pub mod transcode;
pub mod workspace;
