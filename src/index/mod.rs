pub mod hash_bucket;
pub mod hash_index;
pub mod key_hash;
