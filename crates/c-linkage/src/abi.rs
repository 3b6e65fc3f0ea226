//! Native calling convention tables.
//!
//! Every supported target is described by one constant [`AbiConfig`]. The
//! configuration for the architecture this crate is compiled for is [`HOST`];
//! it is fixed at build time and descriptor assembly never branches on the
//! architecture at runtime. Builds for anything outside the table get
//! [`UNSUPPORTED`], which has no return registers and therefore cannot
//! produce a descriptor.
//!
//! Register values are hardware encodings. Masks are `1 << encoding`.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Bitmask of register encodings.
pub type RegList = u64;

/// A machine register, by hardware encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Register(u8);

impl Register {
    #[must_use]
    pub const fn new(code: u8) -> Self {
        assert!(code < 64, "register encoding out of range");
        Self(code)
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        self.0
    }

    #[must_use]
    pub const fn bit(self) -> RegList {
        1_u64 << self.0
    }
}

/// Combine registers into a mask.
#[must_use]
pub const fn reg_list(regs: &[Register]) -> RegList {
    let mut mask: RegList = 0;
    let mut i = 0;
    while i < regs.len() {
        mask |= regs[i].bit();
        i += 1;
    }
    mask
}

/// Combine floating-point register encodings into a mask.
#[must_use]
pub const fn fp_list(codes: &[u8]) -> RegList {
    let mut mask: RegList = 0;
    let mut i = 0;
    while i < codes.len() {
        mask |= 1_u64 << codes[i];
        i += 1;
    }
    mask
}

/// Encodings set in `mask`, lowest first.
pub fn mask_codes(mask: RegList) -> impl Iterator<Item = u8> {
    (0..64u8).filter(move |&code| mask & (1_u64 << code) != 0)
}

/// Native calling convention of one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiConfig {
    name: &'static str,
    param_registers: &'static [Register],
    return_registers: &'static [Register],
    callee_saved: RegList,
    callee_saved_fp: RegList,
    stack_shadow_words: u32,
    register_names: &'static [&'static str],
    fp_register_prefix: &'static str,
}

impl AbiConfig {
    /// # Panics
    ///
    /// If more than two return registers are given.
    #[must_use]
    pub const fn new(
        name: &'static str,
        param_registers: &'static [Register],
        return_registers: &'static [Register],
        callee_saved: RegList,
        callee_saved_fp: RegList,
        stack_shadow_words: u32,
    ) -> Self {
        assert!(
            return_registers.len() <= 2,
            "at most two return registers are supported"
        );
        Self {
            name,
            param_registers,
            return_registers,
            callee_saved,
            callee_saved_fp,
            stack_shadow_words,
            register_names: &[],
            fp_register_prefix: "f",
        }
    }

    /// Attach register names used for diagnostics.
    #[must_use]
    pub const fn with_register_names(
        mut self,
        register_names: &'static [&'static str],
        fp_register_prefix: &'static str,
    ) -> Self {
        self.register_names = register_names;
        self.fp_register_prefix = fp_register_prefix;
        self
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Integer parameter registers in assignment order. May be empty.
    #[must_use]
    pub const fn param_registers(&self) -> &'static [Register] {
        self.param_registers
    }

    /// Zero, one or two return registers in priority order.
    #[must_use]
    pub const fn return_registers(&self) -> &'static [Register] {
        self.return_registers
    }

    #[must_use]
    pub const fn callee_saved(&self) -> RegList {
        self.callee_saved
    }

    #[must_use]
    pub const fn callee_saved_fp(&self) -> RegList {
        self.callee_saved_fp
    }

    /// Words the caller reserves below the first stack-passed parameter.
    #[must_use]
    pub const fn stack_shadow_words(&self) -> u32 {
        self.stack_shadow_words
    }

    /// Whether descriptors can be built from this configuration.
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        !self.return_registers.is_empty()
    }

    #[must_use]
    pub fn register_name(&self, reg: Register) -> Option<&'static str> {
        self.register_names.get(usize::from(reg.code())).copied()
    }

    /// Architecture name of `reg`, or `r<code>` if the table has none.
    #[must_use]
    pub fn display_register(&self, reg: Register) -> String {
        self.register_name(reg)
            .map_or_else(|| format!("r{}", reg.code()), str::to_string)
    }

    #[must_use]
    pub fn fp_register_name(&self, code: u8) -> String {
        format!("{}{code}", self.fp_register_prefix)
    }

    #[must_use]
    pub fn callee_saved_names(&self) -> Vec<String> {
        mask_codes(self.callee_saved)
            .map(|code| self.display_register(Register::new(code)))
            .collect()
    }

    #[must_use]
    pub fn callee_saved_fp_names(&self) -> Vec<String> {
        mask_codes(self.callee_saved_fp)
            .map(|code| self.fp_register_name(code))
            .collect()
    }
}

// ── ia32 ──

pub mod ia32 {
    use super::Register;

    pub const EAX: Register = Register::new(0);
    pub const ECX: Register = Register::new(1);
    pub const EDX: Register = Register::new(2);
    pub const EBX: Register = Register::new(3);
    pub const ESP: Register = Register::new(4);
    pub const EBP: Register = Register::new(5);
    pub const ESI: Register = Register::new(6);
    pub const EDI: Register = Register::new(7);

    pub const NAMES: &[&str] = &["eax", "ecx", "edx", "ebx", "esp", "ebp", "esi", "edi"];
}

/// cdecl: every parameter goes on the stack.
pub const IA32: AbiConfig = AbiConfig::new(
    "ia32",
    &[],
    &[ia32::EAX, ia32::EDX],
    reg_list(&[ia32::ESI, ia32::EDI, ia32::EBX]),
    0,
    0,
)
.with_register_names(ia32::NAMES, "st");

// ── x64 ──

pub mod x64 {
    use super::Register;

    pub const RAX: Register = Register::new(0);
    pub const RCX: Register = Register::new(1);
    pub const RDX: Register = Register::new(2);
    pub const RBX: Register = Register::new(3);
    pub const RSP: Register = Register::new(4);
    pub const RBP: Register = Register::new(5);
    pub const RSI: Register = Register::new(6);
    pub const RDI: Register = Register::new(7);
    pub const R8: Register = Register::new(8);
    pub const R9: Register = Register::new(9);
    pub const R10: Register = Register::new(10);
    pub const R11: Register = Register::new(11);
    pub const R12: Register = Register::new(12);
    pub const R13: Register = Register::new(13);
    pub const R14: Register = Register::new(14);
    pub const R15: Register = Register::new(15);

    pub const NAMES: &[&str] = &[
        "rax", "rcx", "rdx", "rbx", "rsp", "rbp", "rsi", "rdi", "r8", "r9", "r10", "r11", "r12",
        "r13", "r14", "r15",
    ];
}

/// Microsoft x64: four register parameters and 4 words of shadow space.
pub const X64_WINDOWS: AbiConfig = AbiConfig::new(
    "x64-windows",
    &[x64::RCX, x64::RDX, x64::R8, x64::R9],
    &[x64::RAX, x64::RDX],
    reg_list(&[
        x64::RBX,
        x64::RDI,
        x64::RSI,
        x64::R12,
        x64::R13,
        x64::R14,
        x64::R15,
    ]),
    fp_list(&[6, 7, 8, 9, 10, 11, 12, 13, 14, 15]),
    4,
)
.with_register_names(x64::NAMES, "xmm");

/// System V AMD64.
pub const X64_SYSV: AbiConfig = AbiConfig::new(
    "x64-sysv",
    &[x64::RDI, x64::RSI, x64::RDX, x64::RCX, x64::R8, x64::R9],
    &[x64::RAX, x64::RDX],
    reg_list(&[x64::RBX, x64::R12, x64::R13, x64::R14, x64::R15]),
    0,
    0,
)
.with_register_names(x64::NAMES, "xmm");

// ── arm ──

pub mod arm {
    use super::Register;

    pub const R0: Register = Register::new(0);
    pub const R1: Register = Register::new(1);
    pub const R2: Register = Register::new(2);
    pub const R3: Register = Register::new(3);
    pub const R4: Register = Register::new(4);
    pub const R5: Register = Register::new(5);
    pub const R6: Register = Register::new(6);
    pub const R7: Register = Register::new(7);
    pub const R8: Register = Register::new(8);
    pub const R9: Register = Register::new(9);
    pub const R10: Register = Register::new(10);

    pub const NAMES: &[&str] = &[
        "r0", "r1", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "fp", "ip", "sp", "lr",
        "pc",
    ];
}

/// AAPCS. d8-d15 are preserved across calls.
pub const ARM: AbiConfig = AbiConfig::new(
    "arm",
    &[arm::R0, arm::R1, arm::R2, arm::R3],
    &[arm::R0, arm::R1],
    reg_list(&[
        arm::R4,
        arm::R5,
        arm::R6,
        arm::R7,
        arm::R8,
        arm::R9,
        arm::R10,
    ]),
    fp_list(&[8, 9, 10, 11, 12, 13, 14, 15]),
    0,
)
.with_register_names(arm::NAMES, "d");

// ── arm64 ──

pub mod arm64 {
    use super::Register;

    pub const X0: Register = Register::new(0);
    pub const X1: Register = Register::new(1);
    pub const X2: Register = Register::new(2);
    pub const X3: Register = Register::new(3);
    pub const X4: Register = Register::new(4);
    pub const X5: Register = Register::new(5);
    pub const X6: Register = Register::new(6);
    pub const X7: Register = Register::new(7);
    /// x29.
    pub const FP: Register = Register::new(29);
    /// x30.
    pub const LR: Register = Register::new(30);

    #[must_use]
    pub const fn x(n: u8) -> Register {
        assert!(n < 31, "arm64 has x0-x30");
        Register::new(n)
    }

    pub const NAMES: &[&str] = &[
        "x0", "x1", "x2", "x3", "x4", "x5", "x6", "x7", "x8", "x9", "x10", "x11", "x12", "x13",
        "x14", "x15", "x16", "x17", "x18", "x19", "x20", "x21", "x22", "x23", "x24", "x25", "x26",
        "x27", "x28", "fp", "lr", "sp",
    ];
}

/// AAPCS64. x19-x30 (including fp and lr) are callee-saved.
pub const ARM64: AbiConfig = AbiConfig::new(
    "arm64",
    &[
        arm64::X0,
        arm64::X1,
        arm64::X2,
        arm64::X3,
        arm64::X4,
        arm64::X5,
        arm64::X6,
        arm64::X7,
    ],
    &[arm64::X0, arm64::X1],
    reg_list(&[
        arm64::x(19),
        arm64::x(20),
        arm64::x(21),
        arm64::x(22),
        arm64::x(23),
        arm64::x(24),
        arm64::x(25),
        arm64::x(26),
        arm64::x(27),
        arm64::x(28),
        arm64::FP,
        arm64::LR,
    ]),
    fp_list(&[8, 9, 10, 11, 12, 13, 14, 15]),
    0,
)
.with_register_names(arm64::NAMES, "d");

// ── mips & mips64 ──

pub mod mips {
    use super::Register;

    pub const V0: Register = Register::new(2);
    pub const V1: Register = Register::new(3);
    pub const A0: Register = Register::new(4);
    pub const A1: Register = Register::new(5);
    pub const A2: Register = Register::new(6);
    pub const A3: Register = Register::new(7);
    /// n64 only; t0-t3 on o32.
    pub const A4: Register = Register::new(8);
    pub const A5: Register = Register::new(9);
    pub const A6: Register = Register::new(10);
    pub const A7: Register = Register::new(11);
    pub const S0: Register = Register::new(16);
    pub const S1: Register = Register::new(17);
    pub const S2: Register = Register::new(18);
    pub const S3: Register = Register::new(19);
    pub const S4: Register = Register::new(20);
    pub const S5: Register = Register::new(21);
    pub const S6: Register = Register::new(22);
    pub const S7: Register = Register::new(23);

    pub const NAMES: &[&str] = &[
        "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "t0", "t1", "t2", "t3", "t4", "t5", "t6",
        "t7", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
        "fp", "ra",
    ];

    pub const NAMES_N64: &[&str] = &[
        "zero", "at", "v0", "v1", "a0", "a1", "a2", "a3", "a4", "a5", "a6", "a7", "t0", "t1", "t2",
        "t3", "s0", "s1", "s2", "s3", "s4", "s5", "s6", "s7", "t8", "t9", "k0", "k1", "gp", "sp",
        "fp", "ra",
    ];

    pub const CALLEE_SAVED: super::RegList =
        super::reg_list(&[S0, S1, S2, S3, S4, S5, S6, S7]);

    /// Even-numbered f20-f30.
    pub const CALLEE_SAVED_FP: super::RegList = super::fp_list(&[20, 22, 24, 26, 28, 30]);
}

/// o32.
pub const MIPS: AbiConfig = AbiConfig::new(
    "mips",
    &[mips::A0, mips::A1, mips::A2, mips::A3],
    &[mips::V0, mips::V1],
    mips::CALLEE_SAVED,
    mips::CALLEE_SAVED_FP,
    0,
)
.with_register_names(mips::NAMES, "f");

/// n64.
pub const MIPS64: AbiConfig = AbiConfig::new(
    "mips64",
    &[
        mips::A0,
        mips::A1,
        mips::A2,
        mips::A3,
        mips::A4,
        mips::A5,
        mips::A6,
        mips::A7,
    ],
    &[mips::V0, mips::V1],
    mips::CALLEE_SAVED,
    mips::CALLEE_SAVED_FP,
    0,
)
.with_register_names(mips::NAMES_N64, "f");

// ── ppc & ppc64 ──

pub mod ppc {
    use super::Register;

    #[must_use]
    pub const fn r(n: u8) -> Register {
        assert!(n < 32, "ppc has r0-r31");
        Register::new(n)
    }

    pub const R3: Register = r(3);
    pub const R4: Register = r(4);
    /// r31.
    pub const FP: Register = r(31);

    pub const NAMES: &[&str] = &[
        "r0", "sp", "r2", "r3", "r4", "r5", "r6", "r7", "r8", "r9", "r10", "r11", "ip", "r13",
        "r14", "r15", "r16", "r17", "r18", "r19", "r20", "r21", "r22", "r23", "r24", "r25", "r26",
        "r27", "r28", "r29", "r30", "fp",
    ];
}

/// PowerPC ELF. r14-r31 are callee-saved; r31 doubles as the frame pointer.
pub const PPC: AbiConfig = AbiConfig::new(
    "ppc",
    &[
        ppc::r(3),
        ppc::r(4),
        ppc::r(5),
        ppc::r(6),
        ppc::r(7),
        ppc::r(8),
        ppc::r(9),
        ppc::r(10),
    ],
    &[ppc::R3, ppc::R4],
    reg_list(&[
        ppc::r(14),
        ppc::r(15),
        ppc::r(16),
        ppc::r(17),
        ppc::r(18),
        ppc::r(19),
        ppc::r(20),
        ppc::r(21),
        ppc::r(22),
        ppc::r(23),
        ppc::r(24),
        ppc::r(25),
        ppc::r(26),
        ppc::r(27),
        ppc::r(28),
        ppc::r(29),
        ppc::r(30),
        ppc::FP,
    ]),
    0,
    0,
)
.with_register_names(ppc::NAMES, "f");

// ── unknown ──

/// No registers at all. Descriptor assembly refuses this configuration.
pub const UNSUPPORTED: AbiConfig = AbiConfig::new("unsupported", &[], &[], 0, 0, 0);

#[cfg(target_arch = "x86")]
const HOST_TARGET: Option<Target> = Some(Target::Ia32);
#[cfg(all(target_arch = "x86_64", windows))]
const HOST_TARGET: Option<Target> = Some(Target::X64Windows);
#[cfg(all(target_arch = "x86_64", not(windows)))]
const HOST_TARGET: Option<Target> = Some(Target::X64SysV);
#[cfg(target_arch = "arm")]
const HOST_TARGET: Option<Target> = Some(Target::Arm);
#[cfg(target_arch = "aarch64")]
const HOST_TARGET: Option<Target> = Some(Target::Arm64);
#[cfg(target_arch = "mips")]
const HOST_TARGET: Option<Target> = Some(Target::Mips);
#[cfg(target_arch = "mips64")]
const HOST_TARGET: Option<Target> = Some(Target::Mips64);
#[cfg(any(target_arch = "powerpc", target_arch = "powerpc64"))]
const HOST_TARGET: Option<Target> = Some(Target::Ppc);
#[cfg(not(any(
    target_arch = "x86",
    target_arch = "x86_64",
    target_arch = "arm",
    target_arch = "aarch64",
    target_arch = "mips",
    target_arch = "mips64",
    target_arch = "powerpc",
    target_arch = "powerpc64"
)))]
const HOST_TARGET: Option<Target> = None;

/// Targets with a native calling convention table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Ia32,
    X64Windows,
    X64SysV,
    Arm,
    Arm64,
    Mips,
    Mips64,
    Ppc,
}

impl Target {
    pub const ALL: [Target; 8] = [
        Target::Ia32,
        Target::X64Windows,
        Target::X64SysV,
        Target::Arm,
        Target::Arm64,
        Target::Mips,
        Target::Mips64,
        Target::Ppc,
    ];

    /// The target this crate was compiled for, if it has a table.
    #[must_use]
    pub const fn host() -> Option<Target> {
        HOST_TARGET
    }

    #[must_use]
    pub const fn config(self) -> &'static AbiConfig {
        match self {
            Target::Ia32 => &IA32,
            Target::X64Windows => &X64_WINDOWS,
            Target::X64SysV => &X64_SYSV,
            Target::Arm => &ARM,
            Target::Arm64 => &ARM64,
            Target::Mips => &MIPS,
            Target::Mips64 => &MIPS64,
            Target::Ppc => &PPC,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        self.config().name()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|target| target.name() == s)
            .ok_or_else(|| Error::UnknownTarget(s.to_string()))
    }
}

/// Configuration compiled in for this build.
pub const HOST: &AbiConfig = match Target::host() {
    Some(target) => target.config(),
    None => &UNSUPPORTED,
};
