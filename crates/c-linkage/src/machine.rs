//! Machine-level value kinds and function signatures.
//!
//! A [`MachineSignature`] is the input to descriptor assembly. It is treated as
//! already validated: the builder never rejects a kind, it only places it.

use std::fmt;
use std::str::FromStr;

use crate::error::SignaturePosition;
use crate::{Error, Result};

/// Elementary machine value kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MachineType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    /// Pointer-sized integer.
    Pointer,
    Float32,
    Float64,
}

impl MachineType {
    pub const ALL: [MachineType; 12] = [
        MachineType::Bool,
        MachineType::Int8,
        MachineType::Uint8,
        MachineType::Int16,
        MachineType::Uint16,
        MachineType::Int32,
        MachineType::Uint32,
        MachineType::Int64,
        MachineType::Uint64,
        MachineType::Pointer,
        MachineType::Float32,
        MachineType::Float64,
    ];

    #[must_use]
    pub const fn is_floating_point(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Short textual name, as accepted by [`FromStr`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "i8",
            Self::Uint8 => "u8",
            Self::Int16 => "i16",
            Self::Uint16 => "u16",
            Self::Int32 => "i32",
            Self::Uint32 => "u32",
            Self::Int64 => "i64",
            Self::Uint64 => "u64",
            Self::Pointer => "ptr",
            Self::Float32 => "f32",
            Self::Float64 => "f64",
        }
    }
}

impl fmt::Display for MachineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MachineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|ty| ty.name() == s)
            .ok_or_else(|| Error::UnknownMachineType(s.to_string()))
    }
}

/// Ordered return kinds followed by ordered parameter kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MachineSignature {
    returns: Box<[MachineType]>,
    params: Box<[MachineType]>,
}

impl MachineSignature {
    pub fn new(
        returns: impl Into<Box<[MachineType]>>,
        params: impl Into<Box<[MachineType]>>,
    ) -> Self {
        Self {
            returns: returns.into(),
            params: params.into(),
        }
    }

    #[must_use]
    pub fn return_count(&self) -> usize {
        self.returns.len()
    }

    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    #[must_use]
    pub fn get_return(&self, index: usize) -> MachineType {
        self.returns[index]
    }

    #[must_use]
    pub fn get_param(&self, index: usize) -> MachineType {
        self.params[index]
    }

    #[must_use]
    pub fn returns(&self) -> &[MachineType] {
        &self.returns
    }

    #[must_use]
    pub fn params(&self) -> &[MachineType] {
        &self.params
    }

    /// Reject floating-point returns and parameters.
    ///
    /// Descriptor assembly does not call this. Native calls on x86 targets
    /// return floats on the x87 register stack, which the descriptor cannot
    /// describe, so callers that need portable descriptors opt in here.
    pub fn check_no_floats(&self) -> Result<()> {
        let returns = self
            .returns
            .iter()
            .enumerate()
            .map(|(i, ty)| (SignaturePosition::Return(i), *ty));
        let params = self
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| (SignaturePosition::Param(i), *ty));

        match returns.chain(params).find(|(_, ty)| ty.is_floating_point()) {
            Some((position, ty)) => Err(Error::FloatNotSupported { position, ty }),
            None => Ok(()),
        }
    }
}

fn parse_type_list(list: &str) -> Result<Vec<MachineType>> {
    let list = list.trim();
    if list.is_empty() {
        return Ok(Vec::new());
    }
    list.split(',')
        .map(|item| {
            let item = item.trim();
            if item.is_empty() {
                return Err(Error::InvalidSignature(format!(
                    "empty type in list '{list}'"
                )));
            }
            item.parse()
        })
        .collect()
}

/// Parse `"<params> -> <returns>"`, e.g. `"i32, ptr -> i64"`.
///
/// Either side may be empty. Text without an arrow lists parameters only.
impl FromStr for MachineSignature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (params, returns) = match s.split_once("->") {
            Some((params, returns)) => {
                if returns.contains("->") {
                    return Err(Error::InvalidSignature(format!(
                        "more than one '->' in '{s}'"
                    )));
                }
                (params, returns)
            }
            None => (s, ""),
        };

        Ok(Self::new(parse_type_list(returns)?, parse_type_list(params)?))
    }
}

fn write_type_list(f: &mut fmt::Formatter<'_>, types: &[MachineType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl fmt::Display for MachineSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_type_list(f, &self.params)?;
        f.write_str(" -> ")?;
        write_type_list(f, &self.returns)
    }
}
