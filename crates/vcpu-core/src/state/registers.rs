use crate::FaultCode;

/// Number of architecturally visible general-purpose registers (`R0..R7`).
pub const GENERAL_REGISTER_COUNT: usize = 8;

/// Architecturally visible general-purpose register identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
#[allow(missing_docs)]
pub enum GeneralRegister {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
    R4 = 4,
    R5 = 5,
    R6 = 6,
    R7 = 7,
}

impl GeneralRegister {
    /// Ordered list of all general-purpose registers.
    pub const ALL: [Self; GENERAL_REGISTER_COUNT] = [
        Self::R0,
        Self::R1,
        Self::R2,
        Self::R3,
        Self::R4,
        Self::R5,
        Self::R6,
        Self::R7,
    ];

    /// Returns the array index for this register (`0..=7`).
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Looks up a register by index.
    ///
    /// # Errors
    ///
    /// Returns [`FaultCode::InvalidRegister`] when `index > 7`.
    pub const fn from_index(index: u8) -> Result<Self, FaultCode> {
        match index {
            0 => Ok(Self::R0),
            1 => Ok(Self::R1),
            2 => Ok(Self::R2),
            3 => Ok(Self::R3),
            4 => Ok(Self::R4),
            5 => Ok(Self::R5),
            6 => Ok(Self::R6),
            7 => Ok(Self::R7),
            _ => Err(FaultCode::InvalidRegister),
        }
    }
}

impl std::fmt::Display for GeneralRegister {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.index())
    }
}

/// The five condition flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(clippy::struct_excessive_bools)]
pub struct FlagsSnapshot {
    /// Carry flag.
    pub cf: bool,
    /// Parity flag.
    pub pf: bool,
    /// Zero flag.
    pub zf: bool,
    /// Sign flag.
    pub sf: bool,
    /// Overflow flag.
    pub of: bool,
}

impl std::fmt::Display for FlagsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CF={} PF={} ZF={} SF={} OF={}",
            u8::from(self.cf),
            u8::from(self.pf),
            u8::from(self.zf),
            u8::from(self.sf),
            u8::from(self.of)
        )
    }
}

/// Register file, flags, program counter and stack pointer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ArchitecturalState {
    gpr: [u16; GENERAL_REGISTER_COUNT],
    pc: usize,
    sp: u16,
    flags: FlagsSnapshot,
}

impl ArchitecturalState {
    /// Creates a state with cleared registers and `SP` at `stack_top`.
    #[must_use]
    pub const fn with_stack_top(stack_top: u16) -> Self {
        Self {
            gpr: [0; GENERAL_REGISTER_COUNT],
            pc: 0,
            sp: stack_top,
            flags: FlagsSnapshot {
                cf: false,
                pf: false,
                zf: false,
                sf: false,
                of: false,
            },
        }
    }

    /// Reads a general-purpose register.
    #[must_use]
    pub const fn gpr(&self, reg: GeneralRegister) -> u16 {
        self.gpr[reg.index()]
    }

    /// Writes a general-purpose register.
    pub fn set_gpr(&mut self, reg: GeneralRegister, value: u16) {
        self.gpr[reg.index()] = value;
    }

    /// Returns a copy of the whole register file.
    #[must_use]
    pub const fn gprs(&self) -> [u16; GENERAL_REGISTER_COUNT] {
        self.gpr
    }

    /// Reads the program counter (an instruction index).
    #[must_use]
    pub const fn pc(&self) -> usize {
        self.pc
    }

    /// Writes the program counter.
    pub fn set_pc(&mut self, value: usize) {
        self.pc = value;
    }

    /// Reads the stack pointer (a data address).
    #[must_use]
    pub const fn sp(&self) -> u16 {
        self.sp
    }

    /// Writes the stack pointer.
    pub fn set_sp(&mut self, value: u16) {
        self.sp = value;
    }

    /// Reads the condition flags.
    #[must_use]
    pub const fn flags(&self) -> FlagsSnapshot {
        self.flags
    }

    /// Replaces all five condition flags.
    pub fn set_flags(&mut self, flags: FlagsSnapshot) {
        self.flags = flags;
    }
}

#[cfg(test)]
mod tests {
    use super::{ArchitecturalState, FlagsSnapshot, GeneralRegister, GENERAL_REGISTER_COUNT};
    use crate::FaultCode;

    #[test]
    fn register_count_and_lookup_match_architecture() {
        assert_eq!(GENERAL_REGISTER_COUNT, 8);

        for index in 0_u8..=7 {
            let reg = GeneralRegister::from_index(index).expect("valid register index");
            assert_eq!(reg.index(), usize::from(index));
            assert_eq!(reg.to_string(), format!("R{index}"));
        }

        assert_eq!(
            GeneralRegister::from_index(8),
            Err(FaultCode::InvalidRegister)
        );
    }

    #[test]
    fn general_register_file_tracks_each_register_independently() {
        let mut state = ArchitecturalState::default();

        for (offset, reg) in (0_u16..).zip(GeneralRegister::ALL.iter().copied()) {
            state.set_gpr(reg, 0x1000 + offset);
        }

        for (offset, reg) in (0_u16..).zip(GeneralRegister::ALL.iter().copied()) {
            assert_eq!(state.gpr(reg), 0x1000 + offset);
        }
        assert_eq!(state.gprs()[7], 0x1007);
    }

    #[test]
    fn stack_top_constructor_seeds_sp_only() {
        let state = ArchitecturalState::with_stack_top(4094);
        assert_eq!(state.sp(), 4094);
        assert_eq!(state.pc(), 0);
        assert_eq!(state.flags(), FlagsSnapshot::default());
        assert_eq!(state.gprs(), [0; GENERAL_REGISTER_COUNT]);
    }

    #[test]
    fn flags_are_replaced_as_a_whole() {
        let mut state = ArchitecturalState::default();
        let snapshot = FlagsSnapshot {
            cf: true,
            pf: false,
            zf: true,
            sf: false,
            of: true,
        };

        state.set_flags(snapshot);
        assert_eq!(state.flags(), snapshot);
        assert_eq!(state.flags().to_string(), "CF=1 PF=0 ZF=1 SF=0 OF=1");

        state.set_flags(FlagsSnapshot {
            pf: true,
            ..FlagsSnapshot::default()
        });
        assert!(!state.flags().cf);
        assert!(!state.flags().zf);
        assert!(state.flags().pf);
    }
}
