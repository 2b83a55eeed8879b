//! The step-driven update state machine.
//!
//! ```text
//! Idle ──request──▶ Scanning ──▶ Downloading ──▶ Verifying ──▶ Writing ──▶ Complete ─▶ reset
//!                      │              │              │             │
//!                      └──────────────┴──────────────┴─────────────┴──▶ Failed{kind}
//! ```
//!
//! Each call to [`UpdateOrchestrator::step`] advances at most one state.

use alloc::format;
use alloc::vec::Vec;

use tracing::{debug, error, info, warn};
use twinslot_partition::{PartitionError, Slot, SlotWriter, Trailer, checksum};
use twinslot_version::{current_version, extract_embedded_version, needs_update};

use crate::collaborators::{Acquisition, DeviceControl, Presenter, StatusKind, Transfer};
use crate::config::{InvalidationPolicy, UpdateConfig};
use crate::error::{UpdateError, UpdateErrorKind, UpdateResult};
use crate::locator::Locator;
use crate::progress::ProgressRelay;
use crate::state::{Session, UpdateState};

/// Drives one update cycle at a time over injected collaborators.
///
/// - `P`: partition write path
/// - `A`: locator acquisition
/// - `T`: image transfer
/// - `N`: notification sink
/// - `D`: delay and reset
#[derive(Debug)]
pub struct UpdateOrchestrator<P, A, T, N, D> {
    partitions: P,
    acquisition: A,
    transfer: T,
    presenter: N,
    device: D,
    config: UpdateConfig,
    session: Session,
    staging: Vec<u8>,
    pending: bool,
}

impl<P, A, T, N, D> UpdateOrchestrator<P, A, T, N, D>
where
    P: SlotWriter,
    A: Acquisition,
    T: Transfer,
    N: Presenter,
    D: DeviceControl,
{
    /// Create an idle orchestrator.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::InvalidConfiguration`] if `config` fails
    /// validation.
    pub fn new(
        partitions: P,
        acquisition: A,
        transfer: T,
        presenter: N,
        device: D,
        config: UpdateConfig,
    ) -> UpdateResult<Self> {
        config.validate()?;
        Ok(Self {
            partitions,
            acquisition,
            transfer,
            presenter,
            device,
            config,
            session: Session::default(),
            staging: Vec::new(),
            pending: false,
        })
    }

    /// Signal that an update should start on the next step.
    ///
    /// # Errors
    ///
    /// Returns [`UpdateError::UpdateInProgress`] unless the machine is idle.
    pub fn request_update(&mut self) -> UpdateResult<()> {
        let state = self.session.state;
        if state != UpdateState::Idle {
            return Err(UpdateError::UpdateInProgress { state });
        }
        self.pending = true;
        self.session.error = None;
        debug!("update requested");
        Ok(())
    }

    /// Whether a request is waiting for the next step.
    #[must_use]
    pub fn has_pending_update(&self) -> bool {
        self.pending
    }

    /// Advance the machine by at most one state and return the new state.
    pub fn step(&mut self) -> UpdateState {
        match self.session.state {
            UpdateState::Idle => {
                if self.pending {
                    self.pending = false;
                    self.enter(UpdateState::Scanning);
                }
            }
            UpdateState::Scanning => self.step_scan(),
            UpdateState::Downloading => self.step_download(),
            UpdateState::Verifying => self.step_verify(),
            UpdateState::Writing => self.step_write(),
            UpdateState::Complete | UpdateState::Failed { .. } => {}
        }
        self.session.state
    }

    /// Step until the machine parks in a terminal state, or until it is idle
    /// with nothing pending, or until `max_steps` steps have run.
    pub fn run_cycle(&mut self, max_steps: usize) -> UpdateState {
        for _ in 0..max_steps {
            let state = self.step();
            if state.is_terminal() || (state == UpdateState::Idle && !self.pending) {
                break;
            }
        }
        self.session.state
    }

    /// Abort a running cycle and return to `Idle`.
    ///
    /// Only effective in `Scanning`, `Downloading`, `Verifying` or `Writing`.
    /// Flash operations already performed are not undone. Returns whether the
    /// cancel took effect.
    pub fn cancel(&mut self) -> bool {
        if !self.session.state.is_in_progress() {
            debug!("cancel ignored in state {:?}", self.session.state);
            return false;
        }
        info!("update cancelled in state {:?}", self.session.state);
        self.return_to_idle();
        true
    }

    /// Return a `Complete` or `Failed` machine to `Idle` so a new cycle can
    /// be requested. Returns whether the machine was re-armed.
    pub fn rearm(&mut self) -> bool {
        if !self.session.state.is_terminal() {
            return false;
        }
        info!("update re-armed from {:?}", self.session.state);
        self.return_to_idle();
        true
    }

    /// Current machine state.
    #[must_use]
    pub fn state(&self) -> UpdateState {
        self.session.state
    }

    /// Error of the last failed cycle.
    #[must_use]
    pub fn error(&self) -> Option<UpdateErrorKind> {
        self.session.error
    }

    /// Session data of the running cycle.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &UpdateConfig {
        &self.config
    }

    /// Partition write path.
    pub fn partitions(&self) -> &P {
        &self.partitions
    }

    /// Mutable partition write path.
    pub fn partitions_mut(&mut self) -> &mut P {
        &mut self.partitions
    }

    /// Notification sink.
    pub fn presenter(&self) -> &N {
        &self.presenter
    }

    /// Device control.
    pub fn device(&self) -> &D {
        &self.device
    }

    /// Locator acquisition.
    pub fn acquisition(&self) -> &A {
        &self.acquisition
    }

    /// Image transfer.
    pub fn transfer(&self) -> &T {
        &self.transfer
    }

    fn enter(&mut self, state: UpdateState) {
        info!("update state {:?} -> {:?}", self.session.state, state);
        self.session.state = state;
        self.presenter.notify_status(state.status_kind());
    }

    fn fail(&mut self, kind: UpdateErrorKind) {
        error!("update failed: {}", kind);
        self.park_failed(kind);
        self.presenter.notify_error(kind);
    }

    fn park_failed(&mut self, kind: UpdateErrorKind) {
        self.staging.clear();
        self.session.error = Some(kind);
        self.enter(UpdateState::Failed { error: kind });
    }

    fn return_to_idle(&mut self) {
        self.staging.clear();
        self.session.reset();
        self.presenter.notify_status(StatusKind::Idle);
    }

    fn step_scan(&mut self) {
        let text = match self.acquisition.acquire(self.config.acquisition_timeout_ms) {
            Ok(text) => text,
            Err(err) => {
                warn!("acquisition failed: {}", err);
                self.fail(UpdateErrorKind::AcquisitionFailed);
                return;
            }
        };

        match Locator::parse(&text, &self.config) {
            Ok(locator) => {
                info!("update source: {}", locator);
                self.session.locator = Some(locator);
                self.enter(UpdateState::Downloading);
            }
            Err(err) => {
                warn!("rejected locator: {}", err);
                self.fail(UpdateErrorKind::InvalidSource);
            }
        }
    }

    fn step_download(&mut self) {
        let Some(locator) = self.session.locator.clone() else {
            self.fail(UpdateErrorKind::InvalidSource);
            return;
        };
        let capacity = self.partitions.layout().body_capacity() as usize;

        let mut relay = ProgressRelay::new(&mut self.presenter);
        let result = self.transfer.fetch(&locator, capacity, &mut relay);
        let reported_failure = relay.reported_failure();

        match result {
            Ok(_) if reported_failure => self.fail(UpdateErrorKind::TransferFailed),
            Ok(image) if image.is_empty() || image.len() > capacity => {
                warn!(
                    "transfer returned {} bytes, capacity is {}",
                    image.len(),
                    capacity
                );
                self.fail(UpdateErrorKind::TransferFailed);
            }
            Ok(image) => {
                info!("staged {} byte image", image.len());
                self.staging = image;
                self.enter(UpdateState::Verifying);
            }
            Err(err) => {
                warn!("transfer failed: {}", err);
                self.fail(UpdateErrorKind::TransferFailed);
            }
        }
    }

    fn step_verify(&mut self) {
        let offset = self.config.embedded_version_offset;
        let target = match extract_embedded_version(&self.staging, offset) {
            Ok(version) => version,
            Err(err) => {
                warn!("{}", err);
                self.fail(UpdateErrorKind::VersionCheckFailed);
                return;
            }
        };

        match current_version(&mut self.partitions, offset) {
            Ok(current) if !needs_update(&current, &target) => {
                info!("image version {} is already running", target);
                self.presenter
                    .notify_message(&format!("firmware {target} is already installed"));
                self.park_failed(UpdateErrorKind::VersionCheckFailed);
                return;
            }
            Ok(current) => info!("updating {} -> {}", current, target),
            Err(err) => warn!("current version unavailable ({}), proceeding", err),
        }

        self.session.target_version = Some(target);
        self.enter(UpdateState::Writing);
    }

    fn step_write(&mut self) {
        match self.install() {
            Ok(()) => {
                self.staging.clear();
                self.enter(UpdateState::Complete);
                self.presenter.notify_status(StatusKind::Rebooting);
                info!("resetting in {} ms", self.config.reset_delay_ms);
                self.device.delay_ms(self.config.reset_delay_ms);
                self.device.reset();
            }
            Err(kind) => self.fail(kind),
        }
    }

    fn install(&mut self) -> Result<(), UpdateErrorKind> {
        let target = self.partitions.target_slot();
        let current = self.partitions.current_slot();
        let version = self
            .session
            .target_version
            .ok_or(UpdateErrorKind::VersionCheckFailed)?;
        let policy = self.config.invalidation;

        if policy == InvalidationPolicy::BeforeErase {
            self.invalidate(current)?;
        }

        self.partitions.erase(target).map_err(|err| {
            error!("{}", err);
            UpdateErrorKind::FlashEraseFailed
        })?;

        self.partitions
            .write(target, 0, &self.staging)
            .map_err(|err| {
                error!("{}", err);
                UpdateErrorKind::FlashWriteFailed
            })?;

        let size = u32::try_from(self.staging.len())
            .map_err(|_overflow| UpdateErrorKind::FlashWriteFailed)?;
        let trailer = Trailer::new(version.pack(), checksum(&self.staging), size);
        self.partitions
            .write_trailer(target, &trailer)
            .map_err(|err| {
                error!("{}", err);
                UpdateErrorKind::FlashWriteFailed
            })?;

        if !self.partitions.verify(target) {
            error!("slot {} failed verification after install", target);
            return Err(UpdateErrorKind::IntegrityCheckFailed);
        }

        if policy == InvalidationPolicy::AfterVerify {
            self.invalidate(current)?;
        }

        info!("slot {} installed with version {}", target, version);
        Ok(())
    }

    fn invalidate(&mut self, current: Option<Slot>) -> Result<(), UpdateErrorKind> {
        let Some(slot) = current else {
            debug!("no running slot to invalidate");
            return Ok(());
        };
        match self.partitions.mark_invalid(slot) {
            Ok(()) => Ok(()),
            Err(PartitionError::BadMagic { .. }) => {
                warn!("running slot {} has no trailer to invalidate", slot);
                Ok(())
            }
            Err(err) => {
                error!("{}", err);
                Err(UpdateErrorKind::FlashWriteFailed)
            }
        }
    }
}
