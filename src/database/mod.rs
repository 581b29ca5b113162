pub mod db;
pub mod memory;
pub mod mongo;
pub mod redis;
pub mod store;

pub use db::connect_to_mongo;
pub use memory::MemoryStore;
pub use mongo::MongoStore;
pub use self::redis::{RedisService, connect_to_redis};
pub use store::{Store, StoreError};
