pub mod adapter;
pub mod document;
pub mod embedder;
pub mod extract;
pub mod preprocess;

pub use adapter::{Embedder, Index, IndexHit, InMemoryIndex, RetrievalAdapter, OVERFETCH_FACTOR};
pub use document::{Document, DocumentCategory, DocumentMetadata};
pub use embedder::HashingEmbedder;
pub use extract::extract;
pub use preprocess::{process, MetadataFilter, PreprocessedQuery, DEFAULT_BOOST_FACTOR};
