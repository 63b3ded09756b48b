//! Output records and the continuation policy
//!
//! Every directive the writer produces is a [`StabRecord`]. Symbol
//! descriptions are accumulated in a pending segment; once a segment grows
//! past [`CONTINUATION_THRESHOLD`] characters the encoder may split it at the
//! next safe point, producing
//!
//! ```text
//! .stabs "start......\\",code,0,0,value
//! .stabs "...rest",code,0,0,value
//! ```
//!
//! Consumers join consecutive segments that share code and value.

use std::fmt;

use tracing::{trace, warn};

/// Segment length after which a description is split at the next safe point
pub const CONTINUATION_THRESHOLD: usize = 80;

/// Symbol type codes (`N_*` in `<stab.h>`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StabCode {
    /// Global symbol
    Gsym,
    /// Function name, or read-only static data
    Fun,
    /// Static symbol in the data segment
    Stsym,
    /// Static symbol in the bss segment
    Lcsym,
    /// Register variable
    Rsym,
    /// Name of the main source file
    So,
    /// Stack variable or type
    Lsym,
    /// Parameter in the argument list
    Psym,
    /// Left bracket: start of a nested block
    Lbrac,
    /// Right bracket: end of a nested block
    Rbrac,
}

impl StabCode {
    pub const fn value(self) -> u8 {
        match self {
            StabCode::Gsym => 0x20,
            StabCode::Fun => 0x24,
            StabCode::Stsym => 0x26,
            StabCode::Lcsym => 0x28,
            StabCode::Rsym => 0x40,
            StabCode::So => 0x64,
            StabCode::Lsym => 0x80,
            StabCode::Psym => 0xa0,
            StabCode::Lbrac => 0xc0,
            StabCode::Rbrac => 0xe0,
        }
    }
}

impl fmt::Display for StabCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Value field of a symbol record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Frame offset, register number, or zero
    Number(i64),
    /// Assembler label of a static object
    Address(String),
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Placement::Number(n) => write!(f, "{}", n),
            Placement::Address(label) => write!(f, "{}", label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StabRecord {
    /// Leading record naming the source file
    SourceFile { path: String, label: String },
    /// One segment of a symbol description
    Symbol {
        text: String,
        code: StabCode,
        value: Placement,
        /// More segments of the same description follow
        continued: bool,
    },
    /// Block boundary
    Marker { code: StabCode, label: String },
}

impl StabRecord {
    pub fn code(&self) -> StabCode {
        match self {
            StabRecord::SourceFile { .. } => StabCode::So,
            StabRecord::Symbol { code, .. } | StabRecord::Marker { code, .. } => *code,
        }
    }

    /// Description text of a symbol segment
    pub fn text(&self) -> Option<&str> {
        match self {
            StabRecord::Symbol { text, .. } => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for StabRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StabRecord::SourceFile { path, label } => write!(
                f,
                "{}:\t.stabs \"{}\",{},0,0,{}",
                label,
                path,
                StabCode::So,
                label
            ),
            StabRecord::Symbol {
                text,
                code,
                value,
                continued,
            } => {
                let escape = if *continued { "\\\\" } else { "" };
                write!(f, ".stabs \"{}{}\",{},0,0,{}", text, escape, code, value)
            }
            StabRecord::Marker { code, label } => write!(f, ".stabn {},0,0,{}", code, label),
        }
    }
}

/// The symbol whose description is being written
#[derive(Debug)]
struct PendingSymbol {
    code: StabCode,
    value: Placement,
    segment: String,
}

/// Collects finished records and the description of the symbol in flight
#[derive(Debug, Default)]
pub struct RecordEmitter {
    records: Vec<StabRecord>,
    pending: Option<PendingSymbol>,
}

impl RecordEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn source_file(&mut self, path: &str, label: &str) {
        self.records.push(StabRecord::SourceFile {
            path: path.to_string(),
            label: label.to_string(),
        });
    }

    /// Start the description `name:<letter>` of a new symbol
    pub fn begin(&mut self, name: &str, letter: Option<char>, code: StabCode, value: Placement) {
        if let Some(stale) = self.pending.take() {
            warn!(segment = %stale.segment, "discarding unfinished symbol description");
        }
        let mut segment = format!("{}:", name);
        if let Some(letter) = letter {
            segment.push(letter);
        }
        self.pending = Some(PendingSymbol {
            code,
            value,
            segment,
        });
    }

    /// Characters written to the current segment so far
    pub fn chars(&self) -> usize {
        self.pending.as_ref().map_or(0, |p| p.segment.len())
    }

    pub fn in_symbol(&self) -> bool {
        self.pending.is_some()
    }

    /// Split the description here if the current segment has grown too long
    pub fn maybe_continue(&mut self) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if pending.segment.len() <= CONTINUATION_THRESHOLD {
            return;
        }
        trace!(chars = pending.segment.len(), "continuing symbol description");
        let segment = std::mem::take(&mut pending.segment);
        self.records.push(StabRecord::Symbol {
            text: segment,
            code: pending.code,
            value: pending.value.clone(),
            continued: true,
        });
    }

    /// Write the final segment of the current symbol and clear the pending state
    pub fn finish(&mut self) {
        match self.pending.take() {
            Some(pending) => self.records.push(StabRecord::Symbol {
                text: pending.segment,
                code: pending.code,
                value: pending.value,
                continued: false,
            }),
            None => warn!("finish called with no symbol in progress"),
        }
    }

    pub fn marker(&mut self, code: StabCode, label: String) {
        self.records.push(StabRecord::Marker { code, label });
    }

    pub fn records(&self) -> &[StabRecord] {
        &self.records
    }

    pub fn take_records(&mut self) -> Vec<StabRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn reset(&mut self) {
        self.records.clear();
        self.pending = None;
    }
}

/// Writes go to the pending segment; writing with no symbol in progress is an
/// error
impl fmt::Write for RecordEmitter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let pending = self.pending.as_mut().ok_or(fmt::Error)?;
        pending.segment.push_str(s);
        Ok(())
    }
}

/// Render records as assembler text, one directive per line
pub fn render(records: &[StabRecord]) -> String {
    let mut out = String::new();
    for record in records {
        out.push_str(&record.to_string());
        out.push('\n');
    }
    out
}
