//! Chunked reading of one delimited source file
//!
//! Reads semicolon-delimited, header-less rows as byte records and decodes
//! every field from the table's declared encoding, yielding fixed-size
//! batches of opaque text. Memory stays bounded by the chunk size no matter
//! how large the file is.

use crate::error::{LoadError, Result};
use crate::model::RawBatch;
use csv::{ByteRecord, ReaderBuilder};
use encoding_rs::Encoding;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Field delimiter of the RFB dump files
pub const DELIMITER: u8 = b';';

/// Pull-based reader producing `RawBatch`es of exactly `chunk_size` rows,
/// except possibly the last one.
#[derive(Debug)]
pub struct ChunkReader {
    reader: csv::Reader<File>,
    encoding: &'static Encoding,
    chunk_size: usize,
    path: PathBuf,
    record: ByteRecord,
    done: bool,
}

impl ChunkReader {
    /// Open a source file. Fails with a per-file error if the file cannot
    /// be opened.
    pub fn open(
        path: impl AsRef<Path>,
        encoding: &'static Encoding,
        chunk_size: usize,
    ) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| LoadError::FileAccess {
            path: path.clone(),
            source,
        })?;

        // Rows with the wrong width are accepted here and rejected by the
        // normalizer, which owns the shape check.
        let reader = ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .from_reader(file);

        Ok(Self {
            reader,
            encoding,
            chunk_size: chunk_size.max(1),
            path,
            record: ByteRecord::new(),
            done: false,
        })
    }

    /// Read the next batch, or `None` once the file is exhausted.
    pub fn next_chunk(&mut self) -> Result<Option<RawBatch>> {
        if self.done {
            return Ok(None);
        }

        let mut rows = Vec::with_capacity(self.chunk_size);

        while rows.len() < self.chunk_size {
            let more = self
                .reader
                .read_byte_record(&mut self.record)
                .map_err(|source| LoadError::Csv {
                    path: self.path.clone(),
                    source,
                })?;

            if !more {
                self.done = true;
                break;
            }

            rows.push(self.decode_record()?);
        }

        if rows.is_empty() {
            Ok(None)
        } else {
            Ok(Some(RawBatch::new(rows)))
        }
    }

    /// Decode every field of the current record from the source encoding
    fn decode_record(&self) -> Result<Vec<String>> {
        let mut fields = Vec::with_capacity(self.record.len());

        for field in &self.record {
            let (text, _, had_errors) = self.encoding.decode(field);
            if had_errors {
                return Err(LoadError::Decode {
                    path: self.path.clone(),
                    encoding: self.encoding.name(),
                });
            }
            fields.push(text.into_owned());
        }

        Ok(fields)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use encoding_rs::{UTF_8, WINDOWS_1252};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file.flush().unwrap();
        file
    }

    fn read_all(reader: &mut ChunkReader) -> Vec<RawBatch> {
        let mut batches = Vec::new();
        while let Some(batch) = reader.next_chunk().unwrap() {
            batches.push(batch);
        }
        batches
    }

    #[test]
    fn test_chunk_count_is_ceil_of_rows_over_size() {
        // 5 rows, chunk size 2 -> 3 chunks of sizes 2, 2, 1
        let file = fixture(b"1;a\n2;b\n3;c\n4;d\n5;e\n");
        let mut reader = ChunkReader::open(file.path(), UTF_8, 2).unwrap();
        let batches = read_all(&mut reader);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 2);
        assert_eq!(batches[1].len(), 2);
        assert_eq!(batches[2].len(), 1);
    }

    #[test]
    fn test_round_trip_preserves_rows_and_order() {
        let file = fixture(b"1;10.0\n2;20.5\n3;30.0\n");
        let mut reader = ChunkReader::open(file.path(), UTF_8, 2).unwrap();
        let batches = read_all(&mut reader);

        let rows: Vec<Vec<String>> = batches.into_iter().flat_map(|b| b.rows).collect();
        assert_eq!(
            rows,
            vec![
                vec!["1".to_string(), "10.0".to_string()],
                vec!["2".to_string(), "20.5".to_string()],
                vec!["3".to_string(), "30.0".to_string()],
            ]
        );
    }

    #[test]
    fn test_exact_multiple_has_no_empty_tail_chunk() {
        let file = fixture(b"1;a\n2;b\n3;c\n4;d\n");
        let mut reader = ChunkReader::open(file.path(), UTF_8, 2).unwrap();
        let batches = read_all(&mut reader);

        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 2));
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_empty_file_yields_no_chunks() {
        let file = fixture(b"");
        let mut reader = ChunkReader::open(file.path(), UTF_8, 10).unwrap();
        assert!(reader.next_chunk().unwrap().is_none());
    }

    #[test]
    fn test_latin1_fields_are_decoded() {
        // "SÃO PAULO" in Windows-1252
        let file = fixture(b"7107;S\xC3O PAULO\n");
        let mut reader = ChunkReader::open(file.path(), WINDOWS_1252, 10).unwrap();
        let batch = reader.next_chunk().unwrap().unwrap();
        assert_eq!(batch.rows[0][1], "SÃO PAULO");
    }

    #[test]
    fn test_missing_file_is_a_file_access_error() {
        let err = ChunkReader::open("/no/such/file.csv", UTF_8, 10).unwrap_err();
        assert!(matches!(err, LoadError::FileAccess { .. }));
    }

    #[test]
    fn test_quoted_field_with_embedded_delimiter() {
        let file = fixture(b"1;\"a;b\"\n");
        let mut reader = ChunkReader::open(file.path(), UTF_8, 10).unwrap();
        let batch = reader.next_chunk().unwrap().unwrap();
        assert_eq!(batch.rows[0], vec!["1".to_string(), "a;b".to_string()]);
    }
}
