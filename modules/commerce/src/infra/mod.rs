pub mod payment;
pub mod storage;
