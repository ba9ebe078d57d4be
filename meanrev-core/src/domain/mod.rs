//! Domain types for the decision core

pub mod fill;
pub mod instrument;
pub mod intent;
pub mod position;
pub mod sample;

pub use fill::{FillOutcome, FillReport};
pub use instrument::{InstrumentError, InstrumentSpec};
pub use intent::{IntentAction, IntentReason, TradeIntent};
pub use position::{Position, Side};
pub use sample::{PriceSample, SampleRejection};
