pub mod file_utils_tests;
pub mod label_generator_tests;
pub mod pipeline_tests;
