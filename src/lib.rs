pub mod logger;
pub mod ndvi_pipeline;
