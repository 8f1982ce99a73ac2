pub mod storage;
pub mod transcoder;
