// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Listing file generation.

use std::io::Write;

use crate::core::label::LabelTable;

/// Data for a single listing line.
pub struct ListingLine<'a> {
    pub offset: u64,
    pub bytes: &'a [u8],
    pub line_num: u32,
    pub source: &'a str,
    pub notes: &'a [String],
}

/// Writer for listing file output.
pub struct ListingWriter<W: Write> {
    out: W,
}

const BYTES_PER_ROW: usize = 8;

impl<W: Write> ListingWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn header(&mut self, title: &str) -> std::io::Result<()> {
        writeln!(self.out, "{title}")?;
        writeln!(self.out, "OFFSET    BYTES                    LINE  SOURCE")?;
        writeln!(self.out, "--------  -----------------------  ----  ------")?;
        Ok(())
    }

    pub fn write_line(&mut self, line: ListingLine<'_>) -> std::io::Result<()> {
        let offset_col = if line.bytes.is_empty() {
            "--------".to_string()
        } else {
            format!("{:08X}", line.offset)
        };
        let mut rows = line.bytes.chunks(BYTES_PER_ROW);
        let first = rows.next().unwrap_or(&[]);
        writeln!(
            self.out,
            "{offset_col}  {:<23}  {:>4}  {}",
            format_bytes(first),
            line.line_num,
            line.source
        )?;
        for (index, row) in rows.enumerate() {
            let offset = line.offset + ((index + 1) * BYTES_PER_ROW) as u64;
            writeln!(self.out, "{:08X}  {:<23}", offset, format_bytes(row))?;
        }
        for note in line.notes {
            writeln!(self.out, "{:>33}  ; {note}", "")?;
        }
        Ok(())
    }

    pub fn footer(&mut self, labels: &LabelTable, total_bytes: u64) -> std::io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "{total_bytes} byte(s) emitted")?;
        if !labels.globals().is_empty() {
            writeln!(self.out)?;
            writeln!(self.out, "GLOBAL LABELS")?;
            for entry in labels.globals() {
                writeln!(self.out, "{:08X}  {}", entry.offset, entry.name)?;
            }
        }
        Ok(())
    }
}

fn format_bytes(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 3);
    for (index, byte) in bytes.iter().enumerate() {
        if index > 0 {
            text.push(' ');
        }
        text.push_str(&format!("{byte:02X}"));
    }
    text
}
