// Gapminder dataset access

pub mod observation;
pub mod source;
pub mod store;

pub use observation::{Dataset, Observation};
pub use source::{source_for, BundledSource, DatasetSource, FileSource};
pub use store::DatasetStore;
