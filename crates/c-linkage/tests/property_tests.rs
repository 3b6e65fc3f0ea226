//! Property-based tests for native call descriptor assembly.
//!
//! Uses `proptest` to generate signatures and configurations and verify:
//! - Every descriptor follows the placement rules of its configuration
//! - Stack offsets strictly decrease starting just past the shadow space
//! - Assembly is deterministic
//! - Callee-saved masks never depend on the signature

use c_linkage::test_harness::*;
use c_linkage::{AbiConfig, Location, MachineSignature, MachineType, Target, build_c_descriptor};
use proptest::prelude::*;

fn machine_type_strategy() -> impl Strategy<Value = MachineType> {
    proptest::sample::select(MachineType::ALL.to_vec())
}

fn signature_strategy() -> impl Strategy<Value = MachineSignature> {
    (
        proptest::collection::vec(machine_type_strategy(), 0..=2),
        proptest::collection::vec(machine_type_strategy(), 0..24),
    )
        .prop_map(|(returns, params)| MachineSignature::new(returns, params))
}

fn target_config_strategy() -> impl Strategy<Value = &'static AbiConfig> {
    proptest::sample::select(Target::ALL.to_vec()).prop_map(Target::config)
}

fn synthetic_config_strategy() -> impl Strategy<Value = AbiConfig> {
    (0usize..=16, 1usize..=2, 0u32..8)
        .prop_map(|(params, returns, shadow)| config_with(params, returns, shadow))
}

proptest! {
    #[test]
    fn descriptor_follows_target_layout(
        config in target_config_strategy(),
        sig in signature_strategy(),
    ) {
        let desc = build_c_descriptor(config, &sig);
        assert_descriptor_layout(config, &desc);
    }

    #[test]
    fn descriptor_follows_synthetic_layout(
        config in synthetic_config_strategy(),
        params in 0usize..32,
        returns in 0usize..=2,
    ) {
        let returns = returns.min(config.return_registers().len());
        let sig = int_signature(returns, params);
        let desc = build_c_descriptor(&config, &sig);
        assert_descriptor_layout(&config, &desc);
        prop_assert_eq!(
            desc.stack_parameter_count(),
            params.saturating_sub(config.param_registers().len())
        );
    }

    #[test]
    fn stack_offsets_strictly_decrease(
        config in synthetic_config_strategy(),
        params in 0usize..32,
    ) {
        let sig = int_signature(0, params);
        let desc = build_c_descriptor(&config, &sig);

        let offsets: Vec<i32> = desc
            .location_signature()
            .params()
            .iter()
            .filter_map(|loc| loc.as_stack_offset())
            .collect();
        if let Some(first) = offsets.first() {
            prop_assert_eq!(i64::from(*first), -1 - i64::from(config.stack_shadow_words()));
        }
        for pair in offsets.windows(2) {
            prop_assert!(pair[1] < pair[0]);
        }
    }

    #[test]
    fn assembly_is_deterministic(
        config in target_config_strategy(),
        sig in signature_strategy(),
    ) {
        let first = build_c_descriptor(config, &sig);
        let second = build_c_descriptor(config, &sig);
        prop_assert_eq!(first.location_signature(), second.location_signature());
        prop_assert_eq!(first.callee_saved_registers(), second.callee_saved_registers());
        prop_assert_eq!(first.callee_saved_fp_registers(), second.callee_saved_fp_registers());
        prop_assert_eq!(first, second);
    }

    #[test]
    fn callee_saved_masks_are_verbatim(
        config in target_config_strategy(),
        sig in signature_strategy(),
    ) {
        let desc = build_c_descriptor(config, &sig);
        prop_assert_eq!(desc.callee_saved_registers(), config.callee_saved());
        prop_assert_eq!(desc.callee_saved_fp_registers(), config.callee_saved_fp());
        prop_assert_eq!(desc.target_location(), Location::AnyRegister);
    }

    #[test]
    fn signature_text_round_trips(sig in signature_strategy()) {
        let parsed: MachineSignature = sig.to_string().parse().unwrap();
        prop_assert_eq!(parsed, sig);
    }
}
