//! End-of-run reports.

use std::fmt::Write as _;

use serde::Serialize;
use vcpu_core::{FlagsSnapshot, Machine, ScreenGeometry, GENERAL_REGISTER_COUNT};

/// What the driver prints once a run stops.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Lifecycle state, as text.
    pub state: String,
    /// Program counter.
    pub pc: usize,
    /// Stack pointer.
    pub sp: u16,
    /// Instructions retired.
    pub retired: u64,
    /// `R0`..`R7`.
    pub registers: [u16; GENERAL_REGISTER_COUNT],
    /// Condition flags.
    pub flags: FlagsSnapshot,
    /// Fault description when the run failed.
    pub fault: Option<String>,
    /// Video window rendered as text rows.
    pub screen: Vec<String>,
}

impl RunReport {
    /// Captures the machine state and renders its screen.
    #[must_use]
    pub fn capture(machine: &Machine, screen: ScreenGeometry) -> Self {
        let snapshot = machine.snapshot();
        Self {
            state: snapshot.state.to_string(),
            pc: snapshot.pc,
            sp: snapshot.sp,
            retired: snapshot.retired,
            registers: snapshot.registers,
            flags: snapshot.flags,
            fault: snapshot.fault.map(|fault| fault.to_string()),
            screen: screen.render_rows(machine.read_video_window()),
        }
    }

    /// Serializes the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Propagates `serde_json` serialization failures.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Renders the screen inside a border followed by a register summary.
    #[must_use]
    pub fn to_text(&self) -> String {
        let width = self.screen.first().map_or(0, |row| row.chars().count());
        let border = format!("+{}+", "-".repeat(width));

        let mut out = String::new();
        let _ = writeln!(out, "{border}");
        for row in &self.screen {
            let _ = writeln!(out, "|{row}|");
        }
        let _ = writeln!(out, "{border}");

        let registers = self
            .registers
            .iter()
            .enumerate()
            .map(|(index, value)| format!("R{index}={value}"))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(out, "{registers}");
        let _ = writeln!(
            out,
            "PC={} SP={} {}",
            self.pc, self.sp, self.flags
        );
        let _ = writeln!(
            out,
            "state: {} after {} instructions",
            self.state, self.retired
        );
        if let Some(fault) = &self.fault {
            let _ = writeln!(out, "fault: {fault}");
        }
        out
    }
}
