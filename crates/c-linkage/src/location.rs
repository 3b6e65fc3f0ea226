//! Value locations and the location signature builder.

use std::fmt;

use crate::abi::Register;

/// Where a single value lives at the call boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Location {
    /// A specific machine register.
    Register(Register),
    /// Word offset from the caller's stack pointer. Always negative.
    Stack(i32),
    /// Any allocatable register; used for the call target.
    AnyRegister,
}

impl Location {
    #[must_use]
    pub const fn register(reg: Register) -> Self {
        Self::Register(reg)
    }

    /// Stack slot at word `offset`, which must be negative.
    #[must_use]
    pub const fn stack(offset: i32) -> Self {
        assert!(offset < 0, "stack locations must have a negative offset");
        Self::Stack(offset)
    }

    #[must_use]
    pub const fn is_register(self) -> bool {
        matches!(self, Self::Register(_) | Self::AnyRegister)
    }

    #[must_use]
    pub const fn is_stack(self) -> bool {
        matches!(self, Self::Stack(_))
    }

    #[must_use]
    pub const fn as_register(self) -> Option<Register> {
        match self {
            Self::Register(reg) => Some(reg),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_stack_offset(self) -> Option<i32> {
        match self {
            Self::Stack(offset) => Some(offset),
            _ => None,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(reg) => write!(f, "reg({})", reg.code()),
            Self::Stack(offset) => write!(f, "stack({offset})"),
            Self::AnyRegister => f.write_str("any-reg"),
        }
    }
}

/// Return locations followed by parameter locations, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LocationSignature {
    return_count: usize,
    locations: Box<[Location]>,
}

impl LocationSignature {
    #[must_use]
    pub fn return_count(&self) -> usize {
        self.return_count
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.locations.len() - self.return_count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    #[must_use]
    pub fn get_return(&self, index: usize) -> Location {
        self.returns()[index]
    }

    #[must_use]
    pub fn get_param(&self, index: usize) -> Location {
        self.params()[index]
    }

    #[must_use]
    pub fn returns(&self) -> &[Location] {
        &self.locations[..self.return_count]
    }

    #[must_use]
    pub fn params(&self) -> &[Location] {
        &self.locations[self.return_count..]
    }

    /// All locations, returns first.
    #[must_use]
    pub fn as_slice(&self) -> &[Location] {
        &self.locations
    }
}

/// Append-only accumulator for a [`LocationSignature`].
///
/// All returns must be added before the first parameter, and [`build`]
/// requires every declared slot to be filled. Violations panic: they are
/// defects in the caller.
///
/// [`build`]: LocationSignatureBuilder::build
#[derive(Debug)]
pub struct LocationSignatureBuilder {
    return_count: usize,
    param_count: usize,
    locations: Vec<Location>,
}

impl LocationSignatureBuilder {
    #[must_use]
    pub fn new(return_count: usize, param_count: usize) -> Self {
        Self {
            return_count,
            param_count,
            locations: Vec::with_capacity(return_count + param_count),
        }
    }

    #[must_use]
    pub const fn return_count(&self) -> usize {
        self.return_count
    }

    #[must_use]
    pub const fn param_count(&self) -> usize {
        self.param_count
    }

    pub fn add_return(&mut self, loc: Location) {
        assert!(
            self.locations.len() < self.return_count,
            "too many return locations (declared {})",
            self.return_count
        );
        self.locations.push(loc);
    }

    pub fn add_param(&mut self, loc: Location) {
        assert!(
            self.locations.len() >= self.return_count,
            "parameter added before all {} return locations",
            self.return_count
        );
        assert!(
            self.locations.len() < self.return_count + self.param_count,
            "too many parameter locations (declared {})",
            self.param_count
        );
        self.locations.push(loc);
    }

    #[must_use]
    pub fn build(self) -> LocationSignature {
        assert_eq!(
            self.locations.len(),
            self.return_count + self.param_count,
            "location signature incomplete"
        );
        LocationSignature {
            return_count: self.return_count,
            locations: self.locations.into_boxed_slice(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(code: u8) -> Location {
        Location::register(Register::new(code))
    }

    #[test]
    fn test_build_in_order() {
        let mut builder = LocationSignatureBuilder::new(1, 2);
        builder.add_return(reg(0));
        builder.add_param(reg(7));
        builder.add_param(Location::stack(-1));
        let sig = builder.build();

        assert_eq!(sig.len(), 3);
        assert_eq!(sig.return_count(), 1);
        assert_eq!(sig.parameter_count(), 2);
        assert_eq!(sig.get_return(0), reg(0));
        assert_eq!(sig.get_param(0), reg(7));
        assert_eq!(sig.get_param(1), Location::Stack(-1));
    }

    #[test]
    fn test_empty_signature() {
        let sig = LocationSignatureBuilder::new(0, 0).build();
        assert!(sig.is_empty());
        assert!(sig.returns().is_empty());
        assert!(sig.params().is_empty());
    }

    #[test]
    #[should_panic(expected = "too many return locations")]
    fn test_extra_return_panics() {
        let mut builder = LocationSignatureBuilder::new(1, 0);
        builder.add_return(reg(0));
        builder.add_return(reg(2));
    }

    #[test]
    #[should_panic(expected = "too many parameter locations")]
    fn test_extra_param_panics() {
        let mut builder = LocationSignatureBuilder::new(0, 1);
        builder.add_param(reg(0));
        builder.add_param(reg(1));
    }

    #[test]
    #[should_panic(expected = "parameter added before all 1 return locations")]
    fn test_param_before_return_panics() {
        let mut builder = LocationSignatureBuilder::new(1, 1);
        builder.add_param(reg(0));
    }

    #[test]
    #[should_panic(expected = "location signature incomplete")]
    fn test_incomplete_build_panics() {
        let mut builder = LocationSignatureBuilder::new(1, 2);
        builder.add_return(reg(0));
        builder.add_param(reg(1));
        let _ = builder.build();
    }

    #[test]
    #[should_panic(expected = "negative offset")]
    fn test_non_negative_stack_offset_panics() {
        let _ = Location::stack(0);
    }

    #[test]
    fn test_location_queries() {
        assert!(reg(3).is_register());
        assert_eq!(reg(3).as_register(), Some(Register::new(3)));
        assert!(Location::AnyRegister.is_register());
        assert_eq!(Location::AnyRegister.as_register(), None);
        assert!(Location::stack(-4).is_stack());
        assert_eq!(Location::stack(-4).as_stack_offset(), Some(-4));
        assert_eq!(Location::stack(-4).to_string(), "stack(-4)");
    }
}
