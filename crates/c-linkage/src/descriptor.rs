//! Native call descriptor assembly.
//!
//! Returns are placed in the configuration's return registers. Parameters
//! fill the parameter registers left to right, and the rest spill to
//! consecutive stack words starting just past the shadow space:
//!
//! ```text
//!   caller sp
//!   -1 .. -shadow          reserved shadow words (x64 Windows: 4)
//!   -(1 + shadow)          first stack parameter
//!   -(2 + shadow)          second stack parameter
//!   ...
//! ```

use std::fmt;

use crate::abi::{AbiConfig, HOST, RegList, Register};
use crate::location::{Location, LocationSignature, LocationSignatureBuilder};
use crate::machine::{MachineSignature, MachineType};

/// Diagnostic for the fatal unsupported-architecture path.
pub const UNSUPPORTED_ARCHITECTURE: &str =
    "requested C call descriptor on unsupported architecture";

/// Debug name carried by every native call descriptor.
pub const C_CALL_DEBUG_NAME: &str = "c-call";

/// How the call target is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallKind {
    /// Call to a raw machine address held in a register.
    Address,
}

/// Descriptor flags. Native calls never set any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CallFlags(u32);

impl CallFlags {
    pub const NONE: CallFlags = CallFlags(0);

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// Everything a code generator needs to emit one kind of native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDescriptor<'sig> {
    kind: CallKind,
    target_type: MachineType,
    target_location: Location,
    machine_sig: &'sig MachineSignature,
    location_sig: LocationSignature,
    managed_parameter_count: usize,
    callee_saved: RegList,
    callee_saved_fp: RegList,
    flags: CallFlags,
    debug_name: &'static str,
}

impl<'sig> CallDescriptor<'sig> {
    #[must_use]
    pub const fn kind(&self) -> CallKind {
        self.kind
    }

    #[must_use]
    pub const fn target_type(&self) -> MachineType {
        self.target_type
    }

    #[must_use]
    pub const fn target_location(&self) -> Location {
        self.target_location
    }

    #[must_use]
    pub const fn machine_signature(&self) -> &'sig MachineSignature {
        self.machine_sig
    }

    #[must_use]
    pub const fn location_signature(&self) -> &LocationSignature {
        &self.location_sig
    }

    #[must_use]
    pub fn return_count(&self) -> usize {
        self.machine_sig.return_count()
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.machine_sig.parameter_count()
    }

    /// Parameters plus the call target.
    #[must_use]
    pub fn input_count(&self) -> usize {
        1 + self.parameter_count()
    }

    /// Always 0: native calls carry no managed receiver/argument count.
    #[must_use]
    pub const fn managed_parameter_count(&self) -> usize {
        self.managed_parameter_count
    }

    #[must_use]
    pub fn get_return_location(&self, index: usize) -> Location {
        self.location_sig.get_return(index)
    }

    #[must_use]
    pub fn get_return_type(&self, index: usize) -> MachineType {
        self.machine_sig.get_return(index)
    }

    /// Input 0 is the call target; input `i + 1` is parameter `i`.
    #[must_use]
    pub fn get_input_location(&self, index: usize) -> Location {
        match index {
            0 => self.target_location,
            _ => self.location_sig.get_param(index - 1),
        }
    }

    #[must_use]
    pub fn get_input_type(&self, index: usize) -> MachineType {
        match index {
            0 => self.target_type,
            _ => self.machine_sig.get_param(index - 1),
        }
    }

    /// Number of parameters passed in stack slots.
    #[must_use]
    pub fn stack_parameter_count(&self) -> usize {
        self.location_sig
            .params()
            .iter()
            .filter(|loc| loc.is_stack())
            .count()
    }

    #[must_use]
    pub const fn callee_saved_registers(&self) -> RegList {
        self.callee_saved
    }

    #[must_use]
    pub const fn callee_saved_fp_registers(&self) -> RegList {
        self.callee_saved_fp
    }

    #[must_use]
    pub const fn is_callee_saved(&self, reg: Register) -> bool {
        self.callee_saved & reg.bit() != 0
    }

    #[must_use]
    pub const fn flags(&self) -> CallFlags {
        self.flags
    }

    #[must_use]
    pub const fn debug_name(&self) -> &'static str {
        self.debug_name
    }
}

impl fmt::Display for CallDescriptor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.debug_name)
    }
}

/// Build the native call descriptor for `sig` on the build's host target.
///
/// # Panics
///
/// If this build has no calling convention table (see [`HOST`]), or the
/// signature has more returns than the host has return registers.
#[must_use]
pub fn get_simplified_c_descriptor(sig: &MachineSignature) -> CallDescriptor<'_> {
    build_c_descriptor(HOST, sig)
}

/// Build the native call descriptor for `sig` under `config`.
///
/// # Panics
///
/// If `config` has no return registers, with [`UNSUPPORTED_ARCHITECTURE`].
/// Also if `sig` has more than two returns, or more returns than `config`
/// provides registers for.
#[must_use]
pub fn build_c_descriptor<'sig>(
    config: &AbiConfig,
    sig: &'sig MachineSignature,
) -> CallDescriptor<'sig> {
    if !config.is_supported() {
        tracing::error!(config = config.name(), "{UNSUPPORTED_ARCHITECTURE}");
        panic!("{UNSUPPORTED_ARCHITECTURE}");
    }

    let mut locations = LocationSignatureBuilder::new(sig.return_count(), sig.parameter_count());

    // Add return location(s).
    assert!(
        locations.return_count() <= 2,
        "native calls support at most two return values, got {}",
        locations.return_count()
    );
    for index in 0..locations.return_count() {
        let reg = config.return_registers().get(index).copied().unwrap_or_else(|| {
            panic!(
                "{} has no return register for return value {index}",
                config.name()
            )
        });
        locations.add_return(Location::register(reg));
    }

    // Add register and/or stack parameter(s).
    let param_registers = config.param_registers();
    let mut stack_offset = config.stack_shadow_words() as i32;
    for index in 0..locations.param_count() {
        if let Some(&reg) = param_registers.get(index) {
            locations.add_param(Location::register(reg));
        } else {
            locations.add_param(Location::stack(-1 - stack_offset));
            stack_offset += 1;
        }
    }

    tracing::debug!(
        config = config.name(),
        returns = sig.return_count(),
        params = sig.parameter_count(),
        "built native call descriptor"
    );

    CallDescriptor {
        kind: CallKind::Address,
        // The target of a native call is always a machine address.
        target_type: MachineType::Pointer,
        target_location: Location::AnyRegister,
        machine_sig: sig,
        location_sig: locations.build(),
        managed_parameter_count: 0,
        callee_saved: config.callee_saved(),
        callee_saved_fp: config.callee_saved_fp(),
        flags: CallFlags::NONE,
        debug_name: C_CALL_DEBUG_NAME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{ARM, IA32, UNSUPPORTED, X64_SYSV, X64_WINDOWS, x64};
    use crate::test_harness::{config_with, int_signature};

    #[test]
    fn test_fixed_fields() {
        let sig = int_signature(1, 2);
        let desc = build_c_descriptor(&ARM, &sig);

        assert_eq!(desc.kind(), CallKind::Address);
        assert_eq!(desc.target_type(), MachineType::Pointer);
        assert_eq!(desc.target_location(), Location::AnyRegister);
        assert_eq!(desc.managed_parameter_count(), 0);
        assert_eq!(desc.flags(), CallFlags::NONE);
        assert!(desc.flags().is_empty());
        assert_eq!(desc.debug_name(), "c-call");
        assert_eq!(desc.to_string(), "c-call");
        assert!(std::ptr::eq(desc.machine_signature(), &sig));
    }

    #[test]
    fn test_scenario_return_only_with_shadow_space() {
        let config = config_with(2, 2, 2);
        let sig = int_signature(1, 0);
        let desc = build_c_descriptor(&config, &sig);

        assert_eq!(
            desc.location_signature().as_slice(),
            &[Location::register(config.return_registers()[0])]
        );
    }

    #[test]
    fn test_scenario_spill_after_four_registers() {
        let config = config_with(4, 1, 0);
        let sig = int_signature(0, 6);
        let desc = build_c_descriptor(&config, &sig);

        let regs = config.param_registers();
        assert_eq!(
            desc.location_signature().as_slice(),
            &[
                Location::register(regs[0]),
                Location::register(regs[1]),
                Location::register(regs[2]),
                Location::register(regs[3]),
                Location::Stack(-1),
                Location::Stack(-2),
            ]
        );
        assert_eq!(desc.stack_parameter_count(), 2);
    }

    #[test]
    #[should_panic(expected = "no return register for return value 1")]
    fn test_scenario_two_returns_one_register() {
        let config = config_with(4, 1, 0);
        let sig = int_signature(2, 0);
        let _ = build_c_descriptor(&config, &sig);
    }

    #[test]
    #[should_panic(expected = "requested C call descriptor on unsupported architecture")]
    fn test_scenario_unsupported_architecture() {
        let sig = int_signature(0, 0);
        let _ = build_c_descriptor(&UNSUPPORTED, &sig);
    }

    #[test]
    #[should_panic(expected = "requested C call descriptor on unsupported architecture")]
    fn test_unsupported_fails_before_inspecting_returns() {
        let sig = int_signature(3, 0);
        let _ = build_c_descriptor(&UNSUPPORTED, &sig);
    }

    #[test]
    #[should_panic(expected = "at most two return values")]
    fn test_three_returns_panics() {
        let sig = int_signature(3, 0);
        let _ = build_c_descriptor(&X64_SYSV, &sig);
    }

    #[test]
    fn test_windows_shadow_space() {
        let sig = int_signature(1, 6);
        let desc = build_c_descriptor(&X64_WINDOWS, &sig);

        assert_eq!(desc.get_return_location(0), Location::register(x64::RAX));
        assert_eq!(desc.get_input_location(1), Location::register(x64::RCX));
        assert_eq!(desc.get_input_location(4), Location::register(x64::R9));
        assert_eq!(desc.get_input_location(5), Location::Stack(-5));
        assert_eq!(desc.get_input_location(6), Location::Stack(-6));
    }

    #[test]
    fn test_ia32_all_stack() {
        let sig = int_signature(2, 3);
        let desc = build_c_descriptor(&IA32, &sig);
        let params: Vec<_> = desc
            .location_signature()
            .params()
            .iter()
            .map(|loc| loc.as_stack_offset())
            .collect();
        assert_eq!(params, [Some(-1), Some(-2), Some(-3)]);
        assert_eq!(desc.stack_parameter_count(), 3);
    }

    #[test]
    fn test_inputs_include_target() {
        let sig: MachineSignature = "i32, f64 -> u64".parse().unwrap();
        let desc = build_c_descriptor(&X64_SYSV, &sig);

        assert_eq!(desc.input_count(), 3);
        assert_eq!(desc.get_input_type(0), MachineType::Pointer);
        assert_eq!(desc.get_input_location(0), Location::AnyRegister);
        assert_eq!(desc.get_input_type(1), MachineType::Int32);
        assert_eq!(desc.get_input_type(2), MachineType::Float64);
        assert_eq!(desc.get_return_type(0), MachineType::Uint64);
    }

    #[test]
    fn test_is_callee_saved() {
        let sig = int_signature(0, 0);
        let desc = build_c_descriptor(&X64_SYSV, &sig);
        assert!(desc.is_callee_saved(x64::RBX));
        assert!(desc.is_callee_saved(x64::R15));
        assert!(!desc.is_callee_saved(x64::RAX));
        assert!(!desc.is_callee_saved(x64::RDI));
        assert!(desc.location_signature().is_empty());
    }

    #[test]
    fn test_host_descriptor_uses_host_config() {
        let sig = int_signature(1, 1);
        if HOST.is_supported() {
            let desc = get_simplified_c_descriptor(&sig);
            assert_eq!(desc.callee_saved_registers(), HOST.callee_saved());
            assert_eq!(desc.callee_saved_fp_registers(), HOST.callee_saved_fp());
            assert_eq!(
                desc.get_return_location(0),
                Location::register(HOST.return_registers()[0])
            );
        }
    }
}
