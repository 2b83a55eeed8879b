//! Convenience re-exports for common test utilities.
//!
//! ```rust,ignore
//! use twinslot_test_helpers::prelude::*;
//! ```

pub use crate::fixtures::{
    FIXTURE_RESET_OFFSET, FIXTURE_SP, firmware_image, image_with_version, memory_partitions,
    provision, small_layout,
};
pub use crate::mock::{
    FakeDevice, Notification, PartitionCall, RecordingBootControl, RecordingPartitions,
    RecordingPresenter, ScriptedAcquisition, ScriptedTransfer, TransferEvent,
};
pub use crate::must::{must, must_some};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;
