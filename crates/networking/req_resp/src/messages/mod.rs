pub mod meta_data;
pub mod ping;
