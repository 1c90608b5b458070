pub mod entity;
pub mod error;
pub mod memory;
pub mod repository;

pub use entity::{Entity, EntityMeta};
pub use error::DataError;
pub use memory::InMemoryRepository;
pub use repository::Repository;

pub mod prelude {
    //! Re-exports of the most commonly used data types.
    pub use crate::{DataError, Entity, EntityMeta, InMemoryRepository, Repository};
}
