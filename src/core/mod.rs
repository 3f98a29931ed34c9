pub mod catalog;
pub mod drinking;
pub mod enrichment;
pub mod estimator;
pub mod label;
pub mod marketplace;
pub mod model_output;
pub mod pairing;
pub mod query;
pub mod resolver;

pub use crate::domain::model::{PriceQuery, PriceResult, UpdateSet, WineRecord};
pub use crate::domain::ports::{GenerativeModel, PriceEstimator, PriceSource};
pub use crate::utils::error::Result;
