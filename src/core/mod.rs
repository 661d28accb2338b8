pub mod allergens;
pub mod etl;
pub mod generate;
pub mod grid;
pub mod pipeline;
pub mod rules;

pub use crate::domain::model::TransformResult;
pub use crate::domain::ports::{ConfigProvider, DocumentRenderer, Packager, Pipeline, Storage};
pub use crate::utils::error::Result;
