pub mod config;
pub mod expand;
pub mod grammar;
pub mod pipeline;
pub mod postprocess;
pub mod preprocess;
pub mod random;
pub mod table;
pub mod unfold;
