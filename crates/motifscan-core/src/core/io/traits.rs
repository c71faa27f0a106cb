use crate::core::models::structure::Structure;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// Reading and writing of a structure file format.
///
/// The search and clustering layers never depend on a format; implementors
/// only translate between files and [`Structure`].
pub trait StructureFile {
    type Error: Error + From<io::Error>;

    fn read_from(reader: &mut impl BufRead) -> Result<Structure, Self::Error>;

    fn write_to(structure: &Structure, writer: &mut impl Write) -> Result<(), Self::Error>;

    /// Reads a structure from a file. When the file carries no identifier, the
    /// file stem is used instead.
    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Structure, Self::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut structure = Self::read_from(&mut reader)?;
        if structure.id().is_empty() {
            if let Some(stem) = path.file_stem() {
                structure.set_id(&stem.to_string_lossy());
            }
        }
        Ok(structure)
    }

    fn write_to_path<P: AsRef<Path>>(structure: &Structure, path: P) -> Result<(), Self::Error> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        Self::write_to(structure, &mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
