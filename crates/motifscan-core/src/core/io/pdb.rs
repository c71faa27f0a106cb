use crate::core::families::Family;
use crate::core::io::traits::StructureFile;
use crate::core::models::atom::Atom;
use crate::core::models::builder::{BuildError, StructureBuilder};
use crate::core::models::residue::Residue;
use crate::core::models::structure::Structure;
use nalgebra::Point3;
use std::io::{self, BufRead, Write};
use thiserror::Error;

const WATER_NAMES: [&str; 4] = ["HOH", "WAT", "DOD", "H2O"];
const BLANK_CHAIN_ID: char = 'A';

#[derive(Debug, Error)]
pub enum PdbError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error on line {line}: {kind}")]
    Parse { line: usize, kind: PdbParseErrorKind },
    #[error("Structure error on line {line}: {source}")]
    Build { line: usize, source: BuildError },
    #[error("File contains no ATOM or HETATM records")]
    NoAtoms,
}

#[derive(Debug, Error)]
pub enum PdbParseErrorKind {
    #[error("Invalid integer format in columns {columns} (value: '{value}')")]
    InvalidInt { columns: &'static str, value: String },
    #[error("Invalid float format in columns {columns} (value: '{value}')")]
    InvalidFloat { columns: &'static str, value: String },
    #[error("Required field in columns {columns} is empty")]
    MissingRequiredField { columns: &'static str },
    #[error("Line is too short for an ATOM/HETATM record (must reach column 54)")]
    LineTooShort,
}

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len()))
        .unwrap_or("")
        .trim()
}

fn parse_float(line: &str, line_num: usize, start: usize, end: usize, columns: &'static str) -> Result<f64, PdbError> {
    let value = slice_and_trim(line, start, end);
    value.parse::<f64>().map_err(|_| PdbError::Parse {
        line: line_num,
        kind: PdbParseErrorKind::InvalidFloat {
            columns,
            value: value.to_string(),
        },
    })
}

fn column_char(line: &str, index: usize) -> Option<char> {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .filter(|c| !c.is_whitespace())
}

/// Fixed-column PDB reader and writer.
///
/// Reading keeps ATOM and HETATM records, splits MODEL/ENDMDL blocks into
/// models, skips waters and keeps only the first alternate location of each
/// atom. A blank chain identifier is read as chain `A`.
pub struct PdbFile;

impl PdbFile {
    /// Writes bare ATOM/HETATM records for `residues`, numbering atoms from 1.
    pub fn write_residues(residues: &[Residue], writer: &mut impl Write) -> Result<(), PdbError> {
        let mut serial = 1;
        for residue in residues {
            write_residue(residue, &mut serial, writer)?;
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

impl StructureFile for PdbFile {
    type Error = PdbError;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error> {
        let mut builder = StructureBuilder::new("");
        let mut structure_id = String::new();
        let mut current: Option<(char, isize, Option<char>)> = None;
        let mut atom_count = 0usize;

        for (line_num, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            let line_num = line_num + 1;
            let record_type = slice_and_trim(&line, 0, 6);

            match record_type {
                "HEADER" => {
                    structure_id = slice_and_trim(&line, 62, 66).to_string();
                }
                "MODEL" => {
                    let value = slice_and_trim(&line, 10, 14);
                    let serial = value.parse::<usize>().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "11-14",
                            value: value.to_string(),
                        },
                    })?;
                    builder.start_model(serial);
                    current = None;
                }
                "END" => break,
                "ATOM" | "HETATM" => {
                    if line.len() < 54 {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::LineTooShort,
                        });
                    }

                    let residue_name = slice_and_trim(&line, 17, 20);
                    if WATER_NAMES.contains(&residue_name) {
                        continue;
                    }

                    let atom_name = slice_and_trim(&line, 12, 16);
                    if atom_name.is_empty() {
                        return Err(PdbError::Parse {
                            line: line_num,
                            kind: PdbParseErrorKind::MissingRequiredField { columns: "13-16" },
                        });
                    }

                    let serial_str = slice_and_trim(&line, 6, 11);
                    let serial = serial_str.parse::<usize>().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "7-11",
                            value: serial_str.to_string(),
                        },
                    })?;

                    let residue_str = slice_and_trim(&line, 22, 26);
                    let residue_number = residue_str.parse::<isize>().map_err(|_| PdbError::Parse {
                        line: line_num,
                        kind: PdbParseErrorKind::InvalidInt {
                            columns: "23-26",
                            value: residue_str.to_string(),
                        },
                    })?;

                    let chain_id = column_char(&line, 21).unwrap_or(BLANK_CHAIN_ID);
                    let insertion_code = column_char(&line, 26);

                    let x = parse_float(&line, line_num, 30, 38, "31-38")?;
                    let y = parse_float(&line, line_num, 38, 46, "39-46")?;
                    let z = parse_float(&line, line_num, 46, 54, "47-54")?;
                    let element = slice_and_trim(&line, 76, 78);

                    let residue_id = (chain_id, residue_number, insertion_code);
                    if current.map(|(chain, ..)| chain) != Some(chain_id) {
                        builder.start_chain(chain_id);
                    }
                    if current != Some(residue_id) {
                        builder
                            .start_residue(residue_number, insertion_code, residue_name)
                            .map_err(|source| PdbError::Build {
                                line: line_num,
                                source,
                            })?;
                        current = Some(residue_id);
                    }

                    let atom = Atom::new(serial, atom_name, element, Point3::new(x, y, z));
                    let inserted = builder.add_atom(atom).map_err(|source| PdbError::Build {
                        line: line_num,
                        source,
                    })?;
                    if inserted {
                        atom_count += 1;
                    }
                }
                _ => {}
            }
        }

        if atom_count == 0 {
            return Err(PdbError::NoAtoms);
        }

        let mut structure = builder.build();
        structure.set_id(&structure_id);
        Ok(structure)
    }

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error> {
        if !structure.id().is_empty() {
            writeln!(writer, "HEADER    {:<52}{:<4}", "", structure.id())?;
        }
        let multi_model = structure.models().len() > 1;
        for model in structure.models() {
            if multi_model {
                writeln!(writer, "MODEL     {:>4}", model.serial())?;
            }
            let mut serial = 1;
            for chain in model.chains() {
                for residue in chain.residues() {
                    write_residue(residue, &mut serial, writer)?;
                }
                writeln!(writer, "TER")?;
            }
            if multi_model {
                writeln!(writer, "ENDMDL")?;
            }
        }
        writeln!(writer, "END")?;
        Ok(())
    }
}

fn write_residue(residue: &Residue, serial: &mut usize, writer: &mut impl Write) -> Result<(), PdbError> {
    let record_type = if residue.family() == Family::Unknown {
        "HETATM"
    } else {
        "ATOM"
    };
    let key = residue.key();
    for atom in residue.atoms() {
        let name = if atom.name.len() < 4 && atom.element.len() == 1 {
            format!(" {:<3}", atom.name)
        } else {
            format!("{:<4}", atom.name)
        };
        writeln!(
            writer,
            "{:<6}{:>5} {} {:>3} {}{:>4}{}   {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record_type,
            *serial % 100_000,
            name,
            residue.name(),
            key.chain_id,
            key.residue_number,
            key.insertion_code.unwrap_or(' '),
            atom.position.x,
            atom.position.y,
            atom.position.z,
            1.0,
            0.0,
            atom.element,
        )?;
        *serial += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::residue::ResidueKey;
    use std::io::Cursor;

    const SAMPLE: &str = "\
HEADER    HYDROLASE                               01-JAN-00   1ABC
ATOM      1  N   HIS A  57      10.000  11.000  12.000  1.00 20.00           N
ATOM      2  CA AHIS A  57      11.000  11.500  12.500  0.50 20.00           C
ATOM      3  CA BHIS A  57      11.200  11.700  12.700  0.50 20.00           C
ATOM      4  C   HIS A  57      12.000  12.000  13.000  1.00 20.00           C
ATOM      5  CA  ASP A 102       5.000   6.000   7.000  1.00 20.00           C
ATOM      6  CA  SER A 195A      1.000   2.000   3.000  1.00 20.00           C
TER
HETATM    7  O   HOH A 301       0.000   0.000   0.000  1.00 20.00           O
HETATM    8 FE   HEM B 401      -1.000  -2.000  -3.000  1.00 20.00          FE
END
";

    fn read(text: &str) -> Result<Structure, PdbError> {
        PdbFile::read_from(&mut Cursor::new(text))
    }

    #[test]
    fn reads_atoms_residues_and_chains() {
        let structure = read(SAMPLE).unwrap();
        assert_eq!(structure.id(), "1ABC");
        let model = structure.first_model().unwrap();
        assert_eq!(model.chains().len(), 2);
        assert_eq!(model.residue_count(), 4);

        let his = model.residue(&ResidueKey::new('A', 57)).unwrap();
        assert_eq!(his.family(), Family::Histidine);
        assert_eq!(his.atoms().len(), 3);

        let ser = model
            .residue(&ResidueKey::new('A', 195).with_insertion_code('A'))
            .unwrap();
        assert_eq!(ser.atom("CA").unwrap().position, Point3::new(1.0, 2.0, 3.0));

        let heme = model.residue(&ResidueKey::new('B', 401)).unwrap();
        assert_eq!(heme.family(), Family::Unknown);
        assert_eq!(heme.atom("FE").unwrap().element, "FE");
    }

    #[test]
    fn keeps_first_alternate_location_and_skips_water() {
        let structure = read(SAMPLE).unwrap();
        let model = structure.first_model().unwrap();
        let ca = model
            .residue(&ResidueKey::new('A', 57))
            .unwrap()
            .atom("CA")
            .unwrap();
        assert_eq!(ca.position, Point3::new(11.0, 11.5, 12.5));
        assert!(model.residue(&ResidueKey::new('A', 301)).is_none());
    }

    #[test]
    fn splits_models() {
        let text = "\
MODEL        1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
ENDMDL
";
        let structure = read(text).unwrap();
        assert_eq!(structure.models().len(), 2);
        assert_eq!(structure.model(1).unwrap().serial(), 2);
        let ca = structure.model(1).unwrap().residue(&ResidueKey::new('A', 1)).unwrap();
        assert_eq!(ca.atom("CA").unwrap().position.x, 1.0);
    }

    #[test]
    fn reports_bad_coordinates_with_line_number() {
        let text = "ATOM      1  CA  ALA A   1       0.000   abc     0.000  1.00  0.00           C\n";
        match read(text) {
            Err(PdbError::Parse {
                line: 1,
                kind: PdbParseErrorKind::InvalidFloat { columns, .. },
            }) => assert_eq!(columns, "39-46"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(matches!(read("REMARK nothing here\n"), Err(PdbError::NoAtoms)));
    }

    #[test]
    fn written_structure_reads_back() {
        let structure = read(SAMPLE).unwrap();
        let mut buffer = Vec::new();
        PdbFile::write_to(&structure, &mut buffer).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("ATOM      1  N   HIS A  57"));

        let reread = read(&text).unwrap();
        assert_eq!(reread.id(), "1ABC");
        let original = structure.first_model().unwrap();
        let copy = reread.first_model().unwrap();
        assert_eq!(original.residue_count(), copy.residue_count());
        for (a, b) in original.residues().zip(copy.residues()) {
            assert_eq!(a.key(), b.key());
            assert_eq!(a.atoms().len(), b.atoms().len());
            for (x, y) in a.atoms().iter().zip(b.atoms()) {
                assert_eq!(x.name, y.name);
                assert!((x.position - y.position).norm() < 1e-3);
            }
        }
    }

    #[test]
    fn read_from_path_falls_back_to_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motif.pdb");
        std::fs::write(
            &path,
            "ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C\n",
        )
        .unwrap();
        let structure = PdbFile::read_from_path(&path).unwrap();
        assert_eq!(structure.id(), "motif");
    }
}
