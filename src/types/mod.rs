pub mod token;
pub mod token_id;
pub mod token_cache;
pub mod response;
