pub mod ops_fetch;
pub mod ops_status;
