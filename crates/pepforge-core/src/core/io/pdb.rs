use crate::core::io::traits::StructureFile;
use crate::core::models::structure::{AtomRecord, Structure};
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("No ATOM/HETATM records found")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Line is too short for a coordinate record (must be at least 54 chars)")]
    LineTooShort,
}

const MIN_COORDINATE_LINE: usize = 54;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column_char(line: &str, idx: usize) -> char {
    line.get(idx..idx + 1)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ')
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize, columns: &'static str) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.to_string(),
        },
    })
}

fn parse_optional_float(line: &str, start: usize, end: usize, default: f64) -> f64 {
    slice_and_trim(line, start, end).parse().unwrap_or(default)
}

/// Fixed-column reader and writer for `ATOM`/`HETATM` records.
///
/// Every other record type is ignored on read; the writer emits coordinates, `TER` between
/// chains, and a closing `END`.
pub struct PdbFile;

impl PdbFile {
    fn parse_atom(line: &str, line_num: usize) -> Result<AtomRecord, PdbError> {
        if line.len() < MIN_COORDINATE_LINE {
            return Err(PdbError::Parse {
                line: line_num,
                kind: PdbParseErrorKind::LineTooShort,
            });
        }

        let serial_str = slice_and_trim(line, 6, 11);
        // Serials overflow to hex or stars in very large files; fall back to 0 and renumber.
        let serial = serial_str.parse().unwrap_or(0);

        let res_seq_str = slice_and_trim(line, 22, 26);
        let res_seq: i32 = res_seq_str.parse().map_err(|_| PdbError::Parse {
            line: line_num,
            kind: PdbParseErrorKind::InvalidInt {
                columns: "23-26",
                value: res_seq_str.to_string(),
            },
        })?;

        let x = parse_float(line, line_num, 30, 38, "31-38")?;
        let y = parse_float(line, line_num, 38, 46, "39-46")?;
        let z = parse_float(line, line_num, 46, 54, "47-54")?;

        let name = slice_and_trim(line, 12, 16).to_string();
        let mut element = slice_and_trim(line, 76, 78).to_string();
        if element.is_empty() {
            element = name
                .chars()
                .find(|c| c.is_ascii_alphabetic())
                .map(|c| c.to_string())
                .unwrap_or_default();
        }

        Ok(AtomRecord {
            hetero: line.starts_with("HETATM"),
            serial,
            name,
            alt_loc: column_char(line, 16),
            res_name: slice_and_trim(line, 17, 20).to_string(),
            chain_id: column_char(line, 21),
            res_seq,
            i_code: column_char(line, 26),
            position: Point3::new(x, y, z),
            occupancy: parse_optional_float(line, 54, 60, 1.0),
            b_factor: parse_optional_float(line, 60, 66, 0.0),
            element,
        })
    }

    fn format_atom(atom: &AtomRecord) -> String {
        let record = if atom.hetero { "HETATM" } else { "ATOM" };
        // Names shorter than four characters start in column 14 by convention.
        let name = if atom.name.len() < 4 {
            format!(" {:<3}", atom.name)
        } else {
            atom.name.clone()
        };
        format!(
            "{:<6}{:>5} {:<4}{}{:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record,
            atom.serial % 100_000,
            name,
            atom.alt_loc,
            atom.res_name,
            atom.chain_id,
            atom.res_seq,
            atom.i_code,
            atom.position.x,
            atom.position.y,
            atom.position.z,
            atom.occupancy,
            atom.b_factor,
            atom.element,
        )
    }
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut atoms = Vec::new();
        for (idx, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            if line.starts_with("ATOM") || line.starts_with("HETATM") {
                atoms.push(Self::parse_atom(&line, idx + 1)?);
            } else if line.starts_with("ENDMDL") {
                // Only the first model of multi-model files is used.
                break;
            }
        }
        if atoms.is_empty() {
            return Err(PdbError::Empty);
        }
        Ok(Structure::new(atoms))
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        let mut previous_chain: Option<char> = None;
        for atom in &structure.atoms {
            if previous_chain.is_some_and(|c| c != atom.chain_id) {
                writeln!(writer, "TER")?;
            }
            writeln!(writer, "{}", Self::format_atom(atom))?;
            previous_chain = Some(atom.chain_id);
        }
        if previous_chain.is_some() {
            writeln!(writer, "TER")?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}
