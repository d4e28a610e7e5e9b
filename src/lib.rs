pub mod config;
pub mod constants;
pub mod error;
pub mod indicators;
pub mod pipeline;
#[cfg(test)]
pub mod test;
pub mod util {
    pub mod feature_engineering;
    pub mod file_utils;
    pub mod label_generator;
    pub mod pre_processor;
    pub mod test_utils;
}

pub use config::PipelineConfig;
pub use error::{PrepError, Result, Stage};
pub use pipeline::prep_data;
