pub mod handler_traits;
pub mod sink_traits;

pub use handler_traits::EventHandler;
pub use sink_traits::{FieldValue, Record, TimeSeriesSink};
