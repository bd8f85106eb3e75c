pub mod calibration_flow;
pub mod item_ctx;

pub use calibration_flow::{CalibrationFlow, FlowDeps, REFERENCE_ANSWER};
pub use item_ctx::ItemCtx;
