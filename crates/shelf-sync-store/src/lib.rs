pub mod blocks;
pub mod error;
pub mod memory;
pub mod notion;
pub mod property;
pub mod record;
pub mod traits;

pub use blocks::{Block, ChildPage, StoredBlock};
pub use error::StoreError;
pub use memory::{CallLog, MemoryStore};
pub use notion::NotionStore;
pub use property::{Codec, PropertyKind, PropertyValue};
pub use record::{decode_record, RecordField, RecordPatch};
pub use traits::{RecordStore, APPEND_BATCH_LIMIT};
