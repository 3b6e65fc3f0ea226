#![allow(
    clippy::cast_possible_truncation, // shadow words and spill counts are tiny
    clippy::cast_possible_wrap, // stack offsets are signed word counts
    clippy::missing_errors_doc // errors are documented on the enum
)]

//! Native (C) call descriptors.
//!
//! Given a [`MachineSignature`], [`get_simplified_c_descriptor`] decides which
//! registers and stack slots carry each return value and parameter under the
//! host's C calling convention, and which registers survive the call. The
//! result is a [`CallDescriptor`] for code generators and register allocators.
//!
//! Floating-point kinds are placed like integers. Targets that return floats
//! on the x87 stack cannot express that here; use
//! [`MachineSignature::check_no_floats`] to reject such signatures up front.

pub mod abi;
pub mod descriptor;
pub mod error;
pub mod location;
pub mod machine;

/// Test harness module for writing unit and integration tests.
///
/// This module is only available when running tests or when the
/// `test-harness` feature is enabled.
#[cfg(any(test, feature = "test-harness"))]
pub mod test_harness;

pub use abi::{AbiConfig, HOST, RegList, Register, Target};
pub use descriptor::{
    C_CALL_DEBUG_NAME, CallDescriptor, CallFlags, CallKind, UNSUPPORTED_ARCHITECTURE,
    build_c_descriptor, get_simplified_c_descriptor,
};
pub use error::{Error, Result};
pub use location::{Location, LocationSignature, LocationSignatureBuilder};
pub use machine::{MachineSignature, MachineType};
