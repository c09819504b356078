//! Terminal presentation
//!
//! Reads reel state and stage events back out of the machine; never writes
//! into it.

use rf_reels::{Reel, SlotMachine, Stage, StageEvent};

/// Presentation state driven purely by stage events
#[derive(Debug, Clone, PartialEq)]
pub struct Presenter {
    pub trigger_enabled: bool,
    pub banner: Option<String>,
    pub force_win_armed: bool,
}

impl Presenter {
    pub fn new() -> Self {
        Self {
            trigger_enabled: true,
            banner: None,
            force_win_armed: false,
        }
    }

    pub fn apply(&mut self, event: &StageEvent) {
        match &event.stage {
            Stage::SpinStart => {
                self.trigger_enabled = false;
                self.banner = None;
            }
            Stage::SpinEnd => self.trigger_enabled = true,
            Stage::WinPresent { symbol } => self.banner = Some(format!("WIN! {}", symbol)),
            Stage::NoWin => self.banner = None,
            Stage::ForceWinArmed { armed } => self.force_win_armed = *armed,
            _ => {}
        }
    }

    /// Status line under the reels
    pub fn status_line(&self) -> String {
        let trigger = if self.trigger_enabled { "[ SPIN ]" } else { "[ .... ]" };
        if self.force_win_armed {
            format!("{} FORCE WIN ACTIVE", trigger)
        } else {
            trigger.to_string()
        }
    }
}

impl Default for Presenter {
    fn default() -> Self {
        Self::new()
    }
}

/// Row-major text grid of every reel's visible window
pub fn render_window(machine: &SlotMachine) -> String {
    let columns: Vec<Vec<String>> = machine.reels().iter().map(column_cells).collect();
    let width = columns
        .iter()
        .flatten()
        .map(String::len)
        .max()
        .unwrap_or(0);
    let rows = machine.config().grid.rows as usize;

    let border = format!("+{}+", vec!["-".repeat(width + 2); columns.len()].join("+"));
    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');
    for row in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|col| format!(" {:<width$} ", col.get(row).map(String::as_str).unwrap_or("?")))
            .collect();
        out.push('|');
        out.push_str(&cells.join("|"));
        out.push_str("|\n");
    }
    out.push_str(&border);
    out
}

fn column_cells(reel: &Reel) -> Vec<String> {
    reel.visible_symbols().iter().map(ToString::to_string).collect()
}

/// One-line description of an event for verbose output
pub fn describe(event: &StageEvent) -> String {
    let detail = match &event.stage {
        Stage::ReelStopRequested { reel_index, symbols } | Stage::ReelStop { reel_index, symbols } => {
            let names: Vec<&str> = symbols.iter().map(|s| s.as_str()).collect();
            format!(" reel {} [{}]", reel_index, names.join(", "))
        }
        Stage::ReelSpinning { reel_index } => format!(" reel {}", reel_index),
        Stage::WinPresent { symbol } => format!(" {}", symbol),
        Stage::ForceWinArmed { armed } => format!(" {}", armed),
        _ => String::new(),
    };
    format!(
        "{:>9.1} ms  #{}  {}{}",
        event.timestamp_ms,
        event.spin_index,
        event.type_name(),
        detail
    )
}
