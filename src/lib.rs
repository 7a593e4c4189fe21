pub mod config;
pub mod content;
pub mod data;
pub mod entity;
pub mod error;
pub mod item;
pub mod protocol;
pub mod quest;
pub mod session;
pub mod storage;
