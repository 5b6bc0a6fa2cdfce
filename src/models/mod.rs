pub mod common;
pub mod ecg;
pub mod record;
pub mod user;
