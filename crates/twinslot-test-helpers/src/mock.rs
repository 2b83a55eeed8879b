//! Recording and scripted collaborators.
//!
//! Every double records what it was asked to do so tests can assert on the
//! exact order of operations.

use std::collections::VecDeque;

use twinslot_boot::{BootControl, HaltReason, VectorTable};
use twinslot_partition::{MemoryMap, PartitionResult, Slot, SlotReader, SlotWriter, Trailer};
use twinslot_update::{
    Acquisition, AcquisitionError, DeviceControl, Locator, Presenter, StatusKind, Transfer,
    TransferError, TransferObserver, TransferStatus, UpdateErrorKind,
};

/// One call made through a [`RecordingPartitions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PartitionCall {
    Read { slot: Slot, offset: u32, len: usize },
    ReadTrailer(Slot),
    Verify(Slot),
    Erase(Slot),
    Write { slot: Slot, offset: u32, len: usize },
    WriteTrailer(Slot),
    MarkValid(Slot),
    MarkInvalid(Slot),
}

impl PartitionCall {
    /// Whether the call changes flash contents.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::Erase(_)
                | Self::Write { .. }
                | Self::WriteTrailer(_)
                | Self::MarkValid(_)
                | Self::MarkInvalid(_)
        )
    }
}

/// Wraps a [`SlotWriter`] and records every call in order.
#[derive(Debug)]
pub struct RecordingPartitions<P> {
    inner: P,
    calls: Vec<PartitionCall>,
}

impl<P> RecordingPartitions<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            calls: Vec::new(),
        }
    }

    pub fn calls(&self) -> &[PartitionCall] {
        &self.calls
    }

    /// Calls that changed flash, plus verifications, in order.
    pub fn install_sequence(&self) -> Vec<PartitionCall> {
        self.calls
            .iter()
            .filter(|c| c.is_mutation() || matches!(c, PartitionCall::Verify(_)))
            .copied()
            .collect()
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut P {
        &mut self.inner
    }

    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<P: SlotReader> SlotReader for RecordingPartitions<P> {
    fn layout(&self) -> &MemoryMap {
        self.inner.layout()
    }

    fn current_slot(&self) -> Option<Slot> {
        self.inner.current_slot()
    }

    fn target_slot(&self) -> Slot {
        self.inner.target_slot()
    }

    fn read(&mut self, slot: Slot, offset: u32, buf: &mut [u8]) -> PartitionResult<()> {
        self.calls.push(PartitionCall::Read {
            slot,
            offset,
            len: buf.len(),
        });
        self.inner.read(slot, offset, buf)
    }

    fn read_trailer(&mut self, slot: Slot) -> PartitionResult<Trailer> {
        self.calls.push(PartitionCall::ReadTrailer(slot));
        self.inner.read_trailer(slot)
    }

    fn verify(&mut self, slot: Slot) -> bool {
        self.calls.push(PartitionCall::Verify(slot));
        self.inner.verify(slot)
    }
}

impl<P: SlotWriter> SlotWriter for RecordingPartitions<P> {
    fn erase(&mut self, slot: Slot) -> PartitionResult<()> {
        self.calls.push(PartitionCall::Erase(slot));
        self.inner.erase(slot)
    }

    fn write(&mut self, slot: Slot, offset: u32, data: &[u8]) -> PartitionResult<()> {
        self.calls.push(PartitionCall::Write {
            slot,
            offset,
            len: data.len(),
        });
        self.inner.write(slot, offset, data)
    }

    fn write_trailer(&mut self, slot: Slot, trailer: &Trailer) -> PartitionResult<()> {
        self.calls.push(PartitionCall::WriteTrailer(slot));
        self.inner.write_trailer(slot, trailer)
    }

    fn mark_valid(&mut self, slot: Slot) -> PartitionResult<()> {
        self.calls.push(PartitionCall::MarkValid(slot));
        self.inner.mark_valid(slot)
    }

    fn mark_invalid(&mut self, slot: Slot) -> PartitionResult<()> {
        self.calls.push(PartitionCall::MarkInvalid(slot));
        self.inner.mark_invalid(slot)
    }
}

/// [`Acquisition`] that replays queued results, then times out.
#[derive(Debug, Default)]
pub struct ScriptedAcquisition {
    script: VecDeque<Result<String, AcquisitionError>>,
    timeouts: Vec<u32>,
}

impl ScriptedAcquisition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_locator(text: &str) -> Self {
        let mut acquisition = Self::new();
        acquisition.push_ok(text);
        acquisition
    }

    pub fn push_ok(&mut self, text: &str) {
        self.script.push_back(Ok(text.to_string()));
    }

    pub fn push_err(&mut self, err: AcquisitionError) {
        self.script.push_back(Err(err));
    }

    /// Timeout passed to each `acquire` call.
    pub fn timeouts(&self) -> &[u32] {
        &self.timeouts
    }
}

impl Acquisition for ScriptedAcquisition {
    fn acquire(&mut self, timeout_ms: u32) -> Result<String, AcquisitionError> {
        self.timeouts.push(timeout_ms);
        self.script
            .pop_front()
            .unwrap_or(Err(AcquisitionError::Timeout { timeout_ms }))
    }
}

/// Callback emitted by a [`ScriptedTransfer`] during `fetch`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEvent {
    Status(TransferStatus),
    Progress { received: usize, total: Option<usize> },
}

/// [`Transfer`] that replays a callback script and returns a fixed result.
#[derive(Debug, Clone)]
pub struct ScriptedTransfer {
    result: Result<Vec<u8>, TransferError>,
    script: Vec<TransferEvent>,
    requests: Vec<(String, usize)>,
}

impl ScriptedTransfer {
    /// Serve `image`, reporting connect, 0/50/100% progress and completion.
    pub fn serving(image: Vec<u8>) -> Self {
        let total = image.len();
        let script = vec![
            TransferEvent::Status(TransferStatus::Connecting),
            TransferEvent::Status(TransferStatus::Downloading),
            TransferEvent::Progress {
                received: 0,
                total: Some(total),
            },
            TransferEvent::Progress {
                received: total / 2,
                total: Some(total),
            },
            TransferEvent::Progress {
                received: total,
                total: Some(total),
            },
            TransferEvent::Status(TransferStatus::Complete),
        ];
        Self {
            result: Ok(image),
            script,
            requests: Vec::new(),
        }
    }

    /// Fail with `err` after reporting a connect attempt.
    pub fn failing(err: TransferError) -> Self {
        Self {
            result: Err(err),
            script: vec![
                TransferEvent::Status(TransferStatus::Connecting),
                TransferEvent::Status(TransferStatus::Failed),
            ],
            requests: Vec::new(),
        }
    }

    /// Replace the callback script.
    pub fn with_script(mut self, script: Vec<TransferEvent>) -> Self {
        self.script = script;
        self
    }

    /// Locator text and capacity of each `fetch` call.
    pub fn requests(&self) -> &[(String, usize)] {
        &self.requests
    }
}

impl Transfer for ScriptedTransfer {
    fn fetch(
        &mut self,
        locator: &Locator,
        capacity: usize,
        observer: &mut dyn TransferObserver,
    ) -> Result<Vec<u8>, TransferError> {
        self.requests.push((locator.as_str().to_string(), capacity));
        for event in &self.script {
            match *event {
                TransferEvent::Status(status) => observer.on_status(status),
                TransferEvent::Progress { received, total } => {
                    observer.on_progress(received, total);
                }
            }
        }
        match &self.result {
            Ok(image) if image.len() > capacity => Err(TransferError::TooLarge { capacity }),
            other => other.clone(),
        }
    }
}

/// One notification seen by a [`RecordingPresenter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    Status(StatusKind),
    Progress(u8),
    Error(UpdateErrorKind),
    Message(String),
}

/// [`Presenter`] that keeps every notification.
#[derive(Debug, Default)]
pub struct RecordingPresenter {
    notifications: Vec<Notification>,
}

impl RecordingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn statuses(&self) -> Vec<StatusKind> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Status(s) => Some(*s),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Progress(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<UpdateErrorKind> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Error(e) => Some(*e),
                _ => None,
            })
            .collect()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .iter()
            .filter_map(|n| match n {
                Notification::Message(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl Presenter for RecordingPresenter {
    fn notify_status(&mut self, status: StatusKind) {
        self.notifications.push(Notification::Status(status));
    }

    fn notify_progress(&mut self, percent: u8) {
        self.notifications.push(Notification::Progress(percent));
    }

    fn notify_error(&mut self, kind: UpdateErrorKind) {
        self.notifications.push(Notification::Error(kind));
    }

    fn notify_message(&mut self, text: &str) {
        self.notifications.push(Notification::Message(text.to_string()));
    }
}

/// [`DeviceControl`] that records delays and resets instead of performing them.
#[derive(Debug, Default)]
pub struct FakeDevice {
    pub delays: Vec<u32>,
    pub resets: usize,
}

impl FakeDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DeviceControl for FakeDevice {
    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn reset(&mut self) {
        self.resets += 1;
    }
}

/// [`BootControl`] that records the hand-over and answers maintenance polls
/// from a script.
#[derive(Debug, Default)]
pub struct RecordingBootControl {
    maintenance: VecDeque<bool>,
    pub polls: usize,
    pub delays: Vec<u32>,
    pub halts: Vec<HaltReason>,
    pub jumps: Vec<(Slot, VectorTable)>,
}

impl RecordingBootControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a maintenance request on poll number `polls` (0-based).
    pub fn maintenance_after(polls: usize) -> Self {
        let mut script: VecDeque<bool> = std::iter::repeat_n(false, polls).collect();
        script.push_back(true);
        Self {
            maintenance: script,
            ..Self::default()
        }
    }

    /// Total time spent in `delay_ms`.
    pub fn waited_ms(&self) -> u32 {
        self.delays.iter().sum()
    }
}

impl BootControl for RecordingBootControl {
    fn poll_maintenance(&mut self) -> bool {
        self.polls += 1;
        self.maintenance.pop_front().unwrap_or(false)
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
    }

    fn halt(&mut self, reason: HaltReason) {
        self.halts.push(reason);
    }

    fn jump(&mut self, slot: Slot, vectors: VectorTable) {
        self.jumps.push((slot, vectors));
    }
}
