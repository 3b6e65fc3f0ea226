//! Test harness for c-linkage unit and integration tests
//!
//! Builds signatures and synthetic ABI configurations, and checks the
//! placement rules every native call descriptor must follow.
//!
//! # Example
//!
//! ```rust
//! use c_linkage::test_harness::*;
//! use c_linkage::build_c_descriptor;
//!
//! let config = config_with(4, 2, 0);
//! let sig = int_signature(1, 6);
//! let desc = build_c_descriptor(&config, &sig);
//!
//! assert_descriptor_layout(&config, &desc);
//! ```

#![allow(
    clippy::must_use_candidate,
    clippy::manual_assert,
    clippy::missing_panics_doc
)]

use crate::abi::{AbiConfig, Register};
use crate::descriptor::CallDescriptor;
use crate::location::Location;
use crate::machine::{MachineSignature, MachineType};

static RETURN_POOL: [Register; 2] = [Register::new(0), Register::new(1)];

static PARAM_POOL: [Register; 16] = [
    Register::new(2),
    Register::new(3),
    Register::new(4),
    Register::new(5),
    Register::new(6),
    Register::new(7),
    Register::new(8),
    Register::new(9),
    Register::new(10),
    Register::new(11),
    Register::new(12),
    Register::new(13),
    Register::new(14),
    Register::new(15),
    Register::new(16),
    Register::new(17),
];

/// Callee-saved mask used by [`config_with`]: r20-r23.
pub const SYNTHETIC_CALLEE_SAVED: u64 = 0xF << 20;

/// Callee-saved FP mask used by [`config_with`]: f8-f15.
pub const SYNTHETIC_CALLEE_SAVED_FP: u64 = 0xFF << 8;

/// A synthetic configuration with the given register counts and shadow space.
///
/// Return registers are r0/r1, parameter registers start at r2.
pub fn config_with(param_regs: usize, return_regs: usize, shadow_words: u32) -> AbiConfig {
    assert!(param_regs <= PARAM_POOL.len(), "at most 16 parameter registers");
    AbiConfig::new(
        "synthetic",
        &PARAM_POOL[..param_regs],
        &RETURN_POOL[..return_regs],
        SYNTHETIC_CALLEE_SAVED,
        SYNTHETIC_CALLEE_SAVED_FP,
        shadow_words,
    )
}

/// Signature with `returns` and `params` values, all `i32`.
pub fn int_signature(returns: usize, params: usize) -> MachineSignature {
    MachineSignature::new(
        vec![MachineType::Int32; returns],
        vec![MachineType::Int32; params],
    )
}

/// Parse a signature, panicking on malformed text.
pub fn signature(text: &str) -> MachineSignature {
    text.parse()
        .unwrap_or_else(|e| panic!("bad test signature '{text}': {e}"))
}

/// Check every placement rule of `desc` against `config`.
pub fn assert_descriptor_layout(config: &AbiConfig, desc: &CallDescriptor<'_>) {
    let sig = desc.machine_signature();
    let locations = desc.location_signature();

    assert_eq!(
        locations.len(),
        sig.return_count() + sig.parameter_count(),
        "location count"
    );
    assert_eq!(locations.return_count(), sig.return_count());

    for (i, loc) in locations.returns().iter().enumerate() {
        assert_eq!(
            *loc,
            Location::Register(config.return_registers()[i]),
            "return {i}"
        );
    }

    let param_regs = config.param_registers();
    let mut expected_offset = -1 - i64::from(config.stack_shadow_words());
    for (i, loc) in locations.params().iter().enumerate() {
        if i < param_regs.len() {
            assert_eq!(*loc, Location::Register(param_regs[i]), "parameter {i}");
        } else {
            assert_eq!(
                loc.as_stack_offset().map(i64::from),
                Some(expected_offset),
                "parameter {i}"
            );
            expected_offset -= 1;
        }
    }

    assert_eq!(desc.callee_saved_registers(), config.callee_saved());
    assert_eq!(desc.callee_saved_fp_registers(), config.callee_saved_fp());
    assert_eq!(desc.target_location(), Location::AnyRegister);
    assert_eq!(desc.target_type(), MachineType::Pointer);
}
