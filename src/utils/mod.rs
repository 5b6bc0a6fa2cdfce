pub mod sample_filters;
