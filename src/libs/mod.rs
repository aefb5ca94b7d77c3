pub mod chooser;
pub mod error;
pub mod flags;
pub mod index;
pub mod insert_size;
pub mod io;
pub mod percentile;
pub mod pipeline;
pub mod sam;
pub mod select;
pub mod seq;
