pub mod annotation;
pub mod item;
pub mod rating;
pub mod record;
pub mod status;

pub use annotation::{Annotation, AnnotationSet, Chapter};
pub use item::{AuthorRef, ItemDetail, ItemKind, ReadProgress, ShelfEntry, SourceItem};
pub use rating::{RatingScale, RawRating};
pub use record::{MappedRecord, TargetRecord, Watermark};
pub use status::{ArchiveLabel, RecordStatus};
