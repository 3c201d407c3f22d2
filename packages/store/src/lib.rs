pub mod config;
pub mod gateway;
pub mod models;
pub mod query;

mod memory;
pub use memory::MemoryGateway;

pub use config::LivreboxConfig;
pub use gateway::{Cardinality, Gateway, GatewayError, GatewayResult, UploadOptions};
pub use models::{
    Book, CandidateBook, Follow, Identity, NewBook, NewPost, Post, Profile, ReadStatus, Record,
    Session, Table,
};
pub use query::{Order, Query};
