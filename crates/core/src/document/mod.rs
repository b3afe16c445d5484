pub mod category;
pub mod id;
pub mod model;
pub mod source;

pub use category::{Category, CategoryTable};
pub use id::ItemKey;
pub use model::{MirrorDocument, MirrorPatch};
pub use source::SourcePost;
