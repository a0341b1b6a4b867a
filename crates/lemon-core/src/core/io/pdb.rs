use crate::core::io::traits::StructureFormat;
use crate::core::models::builder::{BuildError, StructureBuilder};
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Shortest ATOM/HETATM line that still carries all three coordinates.
const MIN_COORDINATE_LINE_LEN: usize = 54;

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Inconsistent data: {0}")]
    Inconsistency(String),
    #[error("Missing required record: {0}")]
    MissingRecord(String),
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: String, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: String, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: String },
    #[error("Line is too short for ATOM/HETATM record (must be at least 54 chars)")]
    LineTooShort,
}

impl From<BuildError> for PdbError {
    fn from(e: BuildError) -> Self {
        PdbError::Inconsistency(e.to_string())
    }
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    line.get(start..end).unwrap_or("").trim()
}

fn single_char(field: &str) -> Option<char> {
    field.chars().next()
}

fn parse_float(line: usize, value: &str, columns: &str) -> Result<f64, PdbError> {
    value.parse().map_err(|_| PdbError::Parse {
        line,
        kind: PdbParseErrorKind::InvalidFloat {
            columns: columns.into(),
            value: value.into(),
        },
    })
}

fn parse_optional_float(
    line: usize,
    value: &str,
    columns: &str,
    default: f64,
) -> Result<f64, PdbError> {
    if value.is_empty() {
        Ok(default)
    } else {
        parse_float(line, value, columns)
    }
}

/// Derives the element from the atom name when columns 77-78 are blank.
///
/// PDB right-justifies one-letter element symbols within the name field, so a name
/// starting in column 13 (no leading blank) carries a two-letter element.
fn element_from_name(raw_name_field: &str, residue_is_hetero: bool) -> String {
    let trimmed = raw_name_field.trim();
    let letters: String = trimmed
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect();
    if residue_is_hetero && !raw_name_field.starts_with(' ') && letters.len() >= 2 {
        letters[..2].to_ascii_uppercase()
    } else {
        letters
            .chars()
            .next()
            .map(|c| c.to_ascii_uppercase().to_string())
            .unwrap_or_default()
    }
}

/// Reader and writer for the fixed-column Protein Data Bank format.
///
/// Only coordinate records of the first model are kept; `ENDMDL` and `END` terminate
/// reading. The `HEADER` id code is stored on the structure.
pub struct PdbFile;

impl StructureFormat for PdbFile {
    type Error = PdbError;

    const EXTENSION: &'static str = "pdb";

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut builder = StructureBuilder::new();
        let mut seen_serials = HashSet::new();
        let mut atom_count = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;

            let record_type = slice_and_trim(&line, 0, 6);
            match record_type {
                "HEADER" => {
                    builder.id_code(slice_and_trim(&line, 62, 66));
                }
                "ATOM" | "HETATM" => {
                    if line.len() < MIN_COORDINATE_LINE_LEN {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }
                    let hetero = record_type == "HETATM";

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let name_field = line.get(12..16).unwrap_or("");
                    let name_str = name_field.trim();
                    let alt_loc = single_char(slice_and_trim(&line, 16, 17));
                    let res_name_str = slice_and_trim(&line, 17, 20);
                    let chain_id = single_char(slice_and_trim(&line, 21, 22)).unwrap_or(' ');
                    let res_seq_str = slice_and_trim(&line, 22, 26);
                    let insertion_code = single_char(slice_and_trim(&line, 26, 27));
                    let x_str = slice_and_trim(&line, 30, 38);
                    let y_str = slice_and_trim(&line, 38, 46);
                    let z_str = slice_and_trim(&line, 46, 54);
                    let occupancy_str = slice_and_trim(&line, 54, 60);
                    let b_factor_str = slice_and_trim(&line, 60, 66);
                    let element_str = slice_and_trim(&line, 76, 78);

                    if name_str.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "13-16".into(),
                            },
                        });
                    }
                    if res_name_str.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField {
                                columns: "18-20".into(),
                            },
                        });
                    }
                    // Serial numbers overflow to hybrid-36 or '*****' in very large entries.
                    let serial: usize = match serial_str.parse() {
                        Ok(serial) => serial,
                        Err(_) if !serial_str.is_empty() && !serial_str.starts_with('-') => {
                            atom_count + 1
                        }
                        Err(_) => {
                            return Err(PdbError::Parse {
                                line: line_num,
                                kind: PdbParseErrorKind::InvalidInt {
                                    columns: "7-11".into(),
                                    value: serial_str.into(),
                                },
                            });
                        }
                    };
                    if !seen_serials.insert(serial) {
                        return Err(PdbError::Inconsistency(format!(
                            "Duplicate atom serial: {}",
                            serial
                        )));
                    }
                    let res_seq: isize = res_seq_str.parse().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26".into(),
                            value: res_seq_str.into(),
                        },
                    })?;
                    let x = parse_float(line_num, x_str, "31-38")?;
                    let y = parse_float(line_num, y_str, "39-46")?;
                    let z = parse_float(line_num, z_str, "47-54")?;
                    let occupancy = parse_optional_float(line_num, occupancy_str, "55-60", 1.0)?;
                    let b_factor = parse_optional_float(line_num, b_factor_str, "61-66", 0.0)?;
                    let element = if element_str.is_empty() {
                        element_from_name(name_field, hetero)
                    } else {
                        element_str.to_string()
                    };

                    builder.start_residue(chain_id, res_name_str, res_seq, insertion_code, hetero);
                    builder.add_atom(
                        serial,
                        name_str,
                        &element,
                        alt_loc,
                        Point3::new(x, y, z),
                        occupancy,
                        b_factor,
                    )?;
                    atom_count += 1;
                }
                "ENDMDL" | "END" => break,
                _ => {}
            }
        }

        if atom_count == 0 {
            return Err(PdbError::MissingRecord("ATOM/HETATM records".into()));
        }
        Ok(builder.build())
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        if let Some(code) = structure.id_code() {
            writeln!(writer, "HEADER    {:<40}{:>12}{:<4}", "", "", code)?;
        }

        for atom in structure.atoms() {
            let residue = structure.residue(atom.residue).ok_or_else(|| {
                PdbError::Inconsistency(format!(
                    "Atom {} refers to missing residue index {}",
                    atom.serial, atom.residue
                ))
            })?;
            let record_type = if residue.hetero { "HETATM" } else { "ATOM" };
            let name = if atom.name.len() < 4 && atom.element.len() < 2 {
                format!(" {}", atom.name)
            } else {
                atom.name.clone()
            };

            writeln!(
                writer,
                "{:<6}{:>5} {:<4}{:1}{:>3} {:1}{:>4}{:1}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
                record_type,
                atom.serial,
                name,
                atom.alt_loc.unwrap_or(' '),
                residue.name,
                residue.chain_id,
                residue.number,
                residue.insertion_code.unwrap_or(' '),
                atom.position.x,
                atom.position.y,
                atom.position.z,
                atom.occupancy,
                atom.b_factor,
                atom.element,
            )?;
        }

        writeln!(writer, "END")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ResidueKind;
    use std::io::Cursor;

    const SAMPLE: &str = "\
HEADER    HYDROLASE                               01-JAN-00   1ABC
ATOM      1  N   ALA A   1      11.104   6.134  -6.504  1.00  0.00           N
ATOM      2  CA  ALA A   1      11.639   6.071  -5.147  1.00  0.00           C
ATOM      3  CA  GLY A   2      12.000   7.000  -4.000  1.00 12.50           C
HETATM    4 ZN    ZN A 101       5.000   5.000   5.000  1.00 20.00          ZN
HETATM    5  O   HOH A 201       1.000   1.000   1.000  1.00 30.00           O
END
";

    fn read(text: &str) -> Result<Structure, PdbError> {
        PdbFile::read_from(&mut Cursor::new(text.as_bytes()))
    }

    #[test]
    fn read_from_parses_atoms_residues_and_header() {
        let structure = read(SAMPLE).unwrap();
        assert_eq!(structure.id_code(), Some("1ABC"));
        assert_eq!(structure.atoms().len(), 5);
        assert_eq!(structure.residues().len(), 4);
        assert_eq!(structure.chains().len(), 1);

        let zinc = &structure.residues()[2];
        assert_eq!(zinc.name, "ZN");
        assert_eq!(zinc.number, 101);
        assert!(zinc.hetero);
        assert_eq!(zinc.kind, ResidueKind::MetalIon);

        let ca = &structure.atoms()[2];
        assert_eq!(ca.name, "CA");
        assert_eq!(ca.element, "C");
        assert!((ca.b_factor - 12.5).abs() < 1e-9);
        assert!((ca.position.z + 4.0).abs() < 1e-9);
    }

    #[test]
    fn read_from_stops_after_first_model() {
        let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
ENDMDL
";
        let structure = read(text).unwrap();
        assert_eq!(structure.atoms().len(), 1);
    }

    #[test]
    fn read_from_derives_missing_element_from_name() {
        let text = "\
HETATM    1 ZN    ZN A 101       5.000   5.000   5.000
ATOM      2  CA  ALA A   1       0.000   0.000   0.000
";
        let structure = read(text).unwrap();
        assert_eq!(structure.atoms()[0].element, "ZN");
        assert_eq!(structure.atoms()[1].element, "C");
        assert!((structure.atoms()[1].occupancy - 1.0).abs() < 1e-9);
    }

    #[test]
    fn read_from_rejects_short_coordinate_line() {
        let err = read("ATOM      1  CA  ALA A   1       0.000\n").unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::LineTooShort
            }
        ));
    }

    #[test]
    fn read_from_rejects_bad_coordinates() {
        let text =
            "ATOM      1  CA  ALA A   1       abcdefg   0.000   0.000  1.00  0.00           C\n";
        let err = read(text).unwrap_err();
        assert!(matches!(
            err,
            PdbError::Parse {
                kind: PdbParseErrorKind::InvalidFloat { .. },
                ..
            }
        ));
    }

    #[test]
    fn read_from_rejects_duplicate_serials() {
        let text = "\
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      1  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
";
        assert!(matches!(read(text), Err(PdbError::Inconsistency(_))));
    }

    #[test]
    fn read_from_requires_coordinates() {
        let err = read("HEADER    EMPTY\nEND\n").unwrap_err();
        assert!(matches!(err, PdbError::MissingRecord(_)));
        assert!(matches!(read("not a structure at all"), Err(PdbError::MissingRecord(_))));
    }

    #[test]
    fn written_structure_reads_back_identically() {
        let original = read(SAMPLE).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&original, &mut buffer).unwrap();
        let reread = read(std::str::from_utf8(&buffer).unwrap()).unwrap();
        assert_eq!(reread, original);
    }

    #[test]
    fn read_from_bytes_accepts_gzip_payloads() {
        let compressed = crate::core::io::compression::gzip(SAMPLE.as_bytes()).unwrap();
        let structure = PdbFile::read_from_bytes(&compressed).unwrap();
        assert_eq!(structure.atoms().len(), 5);
    }
}
