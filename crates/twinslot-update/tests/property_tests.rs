//! Property-based tests for the update orchestrator.

#![cfg(test)]

use proptest::prelude::*;
use twinslot_partition::{MemoryMap, Slot};
use twinslot_test_helpers::prelude::*;
use twinslot_update::{
    Locator, LocatorError, UpdateConfig, UpdateErrorKind, UpdateOrchestrator, UpdateState,
    progress::percent,
};
use twinslot_version::FirmwareVersion;

const RUNNING: FirmwareVersion = FirmwareVersion::new(2, 1, 0, 0);

fn arb_target() -> impl Strategy<Value = FirmwareVersion> {
    (0u8..4, 0u8..4, 0u8..4, 0u8..4).prop_map(|(a, b, c, d)| FirmwareVersion::new(a, b, c, d))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_cancel_only_acts_while_running(target in arb_target(), steps in 0usize..8) {
        let layout = MemoryMap::DEFAULT;
        let mut partitions = must(memory_partitions(layout, Some(Slot::A)));
        must(provision(
            &mut partitions,
            Slot::A,
            &firmware_image(&layout, Slot::A, RUNNING, 0x400),
            RUNNING,
        ));
        let mut orchestrator = must(UpdateOrchestrator::new(
            RecordingPartitions::new(partitions),
            ScriptedAcquisition::with_locator("https://fw.example.net/image.bin"),
            ScriptedTransfer::serving(firmware_image(&layout, Slot::B, target, 0x400)),
            RecordingPresenter::new(),
            FakeDevice::new(),
            UpdateConfig::default(),
        ));
        must(orchestrator.request_update());
        for _ in 0..steps {
            orchestrator.step();
        }

        let before = orchestrator.state();
        let cancelled = orchestrator.cancel();
        prop_assert_eq!(cancelled, before.is_in_progress());
        if cancelled {
            prop_assert_eq!(orchestrator.state(), UpdateState::Idle);
            prop_assert_eq!(orchestrator.error(), None);
        } else {
            prop_assert_eq!(orchestrator.state(), before);
        }

        let expected = if target == RUNNING {
            UpdateState::Failed { error: UpdateErrorKind::VersionCheckFailed }
        } else {
            UpdateState::Complete
        };
        if steps >= 5 {
            prop_assert_eq!(before, expected);
        }
    }

    #[test]
    fn prop_percent_is_monotonic_and_bounded(total in 1usize..1_000_000, a in 0usize..2_000_000, b in 0usize..2_000_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let p_lo = percent(lo, Some(total));
        let p_hi = percent(hi, Some(total));
        prop_assert!(p_lo <= p_hi);
        prop_assert!(p_hi.is_some_and(|p| p <= 100));
    }

    #[test]
    fn prop_locator_rejects_whitespace(prefix in "[a-z]{1,20}", suffix in "[a-z]{0,20}", ws in prop::sample::select(vec![' ', '\t', '\n', '\r'])) {
        let config = UpdateConfig::default();
        let text = format!("https://{prefix}{ws}{suffix}");
        let index = "https://".len() + prefix.len();
        prop_assert_eq!(Locator::parse(&text, &config), Err(LocatorError::InvalidCharacter(index)));
    }

    #[test]
    fn prop_well_formed_locators_round_trip(host in "[a-z]{1,30}", path in "[a-z0-9/._-]{0,60}") {
        let config = UpdateConfig::default();
        let text = format!("https://{host}.example/{path}");
        let locator = Locator::parse(&text, &config);
        prop_assert_eq!(locator.map(|l| l.as_str().to_string()), Ok(text));
    }
}
