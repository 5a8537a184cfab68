use std::{fs::File, io::{BufWriter, Cursor}, path::Path, sync::Arc};

use polars::{frame::DataFrame, io::{mmap::MmapBytesReader, SerReader, SerWriter}, prelude::*};

use crate::Result;

/// Writes a Polars DataFrame to a CSV file at `path`.
pub fn write_csv_file(path: &Path, df: &DataFrame) -> Result<()> {
    let file = File::create(path)?;
    let writer: BufWriter<File> = BufWriter::new(file);
    CsvWriter::new(writer).finish(&mut df.clone())?;
    Ok(())
}

/// Reads a CSV file at `path`, forcing `string_columns` to be read as strings
/// so numeric-looking identifiers keep their leading zeros.
pub fn read_csv_file(path: &Path, string_columns: &[&str]) -> Result<DataFrame> {
    let file = File::open(path)?;
    read_csv(file, string_columns)
}

/// Write DataFrame to CSV bytes.
pub(crate) fn write_csv_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    CsvWriter::new(&mut out).finish(&mut df.clone())?;
    Ok(out)
}

/// Read DataFrame from CSV bytes, see `read_csv_file`.
pub(crate) fn read_csv_bytes(bytes: &[u8], string_columns: &[&str]) -> Result<DataFrame> {
    read_csv(Cursor::new(bytes.to_vec()), string_columns)
}

fn read_csv<R: MmapBytesReader>(reader: R, string_columns: &[&str]) -> Result<DataFrame> {
    let schema: SchemaRef = Arc::new(Schema::from_iter(
        string_columns.iter().map(|name| Field::new((*name).into(), DataType::String))
    ));
    let options = CsvReadOptions::default()
        .with_schema_overwrite(Some(schema));

    let df = CsvReader::new(reader)
        .with_options(options)
        .finish()?;
    empty_strings_to_null(df, string_columns)
}

/// Empty identifier cells are written for null ids; read them back as nulls.
fn empty_strings_to_null(mut df: DataFrame, string_columns: &[&str]) -> Result<DataFrame> {
    for name in string_columns {
        let Ok(column) = df.column(name) else { continue };
        let normalized: StringChunked = column.str()?
            .into_iter()
            .map(|opt| opt.filter(|s| !s.is_empty()))
            .collect();
        df.replace_or_add((*name).into(), normalized.into_series())?;
    }
    Ok(df)
}
