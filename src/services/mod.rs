pub mod extension;
pub mod sniffer;
pub mod storage;
pub mod upload_service;
