pub mod caption;
pub mod config;
pub mod logging;
pub mod media;

pub mod control;
pub mod downloader;
pub mod persist;
pub mod pipeline;
pub mod resolver;
pub mod storage;
pub mod url_model;
