//! Per-file time bounds used to build the time-range index.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::error::{LogError, Result};
use crate::timestamp::Timestamp;

/// Bytes read per step when scanning a file backwards for its last line.
const TAIL_CHUNK: u64 = 4096;

/// Time range covered by one log file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Absolute or directory-relative path of the file.
    pub path: PathBuf,
    /// Timestamp of the first line.
    pub start: Timestamp,
    /// Timestamp of the last non-empty line.
    pub end: Timestamp,
    /// File length in bytes when the bounds were read.
    pub len: u64,
}

impl FileMetadata {
    /// Reads the first and last non-empty lines of `path` and parses their
    /// timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Io`] if the file cannot be read and
    /// [`LogError::InvalidFormat`] if it is empty or either bound line lacks a
    /// valid timestamp.
    pub fn read(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| LogError::io(path, e))?;
        let len = file.metadata().map_err(|e| LogError::io(path, e))?.len();

        let first = read_first_line(&mut file).map_err(|e| LogError::io(path, e))?;
        if first.is_empty() {
            return Err(LogError::InvalidFormat("first line is empty".to_string()));
        }
        let last = read_last_line(&mut file, len).map_err(|e| LogError::io(path, e))?;

        let start = Timestamp::parse_bytes(&first)?;
        let end = if last.is_empty() {
            start
        } else {
            Timestamp::parse_bytes(&last)?
        };

        Ok(Self {
            path: path.to_path_buf(),
            start,
            end,
            len,
        })
    }

    /// Returns true if `timestamp` lies within `[start, end]`.
    #[must_use]
    pub fn contains(&self, timestamp: Timestamp) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

fn read_first_line(file: &mut File) -> std::io::Result<Vec<u8>> {
    file.seek(SeekFrom::Start(0))?;
    let mut line = Vec::new();
    BufReader::new(&mut *file).read_until(b'\n', &mut line)?;
    trim_line_end(&mut line);
    Ok(line)
}

/// Returns the last line containing anything other than line terminators.
///
/// Chunks are read backwards and each byte is inspected once: first to find
/// where the content ends, then to find the newline before it.
fn read_last_line(file: &mut File, len: u64) -> std::io::Result<Vec<u8>> {
    let mut chunk = vec![0u8; TAIL_CHUNK as usize];
    let mut pos = len;
    let mut end: Option<u64> = None;
    let mut start = 0u64;

    'scan: while pos > 0 {
        let step = TAIL_CHUNK.min(pos);
        pos -= step;
        let buf = &mut chunk[..step as usize];
        file.seek(SeekFrom::Start(pos))?;
        file.read_exact(buf)?;

        for (i, b) in buf.iter().enumerate().rev() {
            let offset = pos + i as u64;
            match end {
                None if *b != b'\n' && *b != b'\r' => end = Some(offset + 1),
                Some(_) if *b == b'\n' => {
                    start = offset + 1;
                    break 'scan;
                }
                _ => {}
            }
        }
    }

    let Some(end) = end else {
        return Ok(Vec::new());
    };
    file.seek(SeekFrom::Start(start))?;
    let mut line = vec![0u8; (end - start) as usize];
    file.read_exact(&mut line)?;
    Ok(line)
}

fn trim_line_end(line: &mut Vec<u8>) {
    while matches!(line.last(), Some(b'\n' | b'\r')) {
        line.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).expect("create");
        f.write_all(content.as_bytes()).expect("write");
        path
    }

    fn ts(s: &str) -> Timestamp {
        s.parse().expect("valid timestamp")
    }

    #[test]
    fn reads_first_and_last_bounds() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(
            &dir,
            "a.log",
            "2023-01-01T00:00:00.000 first\n\
             2023-01-01T00:00:01.000 middle\n\
             2023-01-01T00:00:02.000 last\n",
        );

        let meta = FileMetadata::read(&path).expect("bounds");
        assert_eq!(meta.start.format(), "2023-01-01T00:00:00.000");
        assert_eq!(meta.end.format(), "2023-01-01T00:00:02.000");
        assert_eq!(meta.path, path);
        assert_eq!(meta.len, std::fs::metadata(&path).expect("stat").len());
    }

    #[test]
    fn single_line_file_has_equal_bounds() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "one.log", "2023-01-01T00:00:03.000 only\n");

        let meta = FileMetadata::read(&path).expect("bounds");
        assert_eq!(meta.start, meta.end);
    }

    #[test]
    fn trailing_blank_lines_are_skipped() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(
            &dir,
            "blank.log",
            "2023-01-01T00:00:00.000 a\r\n2023-01-01T00:00:05.000 b\r\n\r\n\n\n",
        );

        let meta = FileMetadata::read(&path).expect("bounds");
        assert_eq!(meta.end, ts("2023-01-01T00:00:05.000"));
    }

    #[test]
    fn last_line_found_across_chunk_boundary() {
        let dir = TempDir::new().expect("temp dir");
        let mut content = String::from("2023-01-01T00:00:00.000 start\n");
        let padding = "x".repeat(TAIL_CHUNK as usize * 2);
        content.push_str(&format!("2023-01-01T00:00:09.999 {padding}\n"));
        let path = write_file(&dir, "long.log", &content);

        let meta = FileMetadata::read(&path).expect("bounds");
        assert_eq!(meta.end, ts("2023-01-01T00:00:09.999"));
    }

    #[test]
    fn long_last_line_is_read_whole() {
        let dir = TempDir::new().expect("temp dir");
        let body = "y".repeat(TAIL_CHUNK as usize * 3 + 17);
        let last = format!("2023-01-01T00:00:07.000 {body}");
        let content = format!(
            "2023-01-01T00:00:00.000 start\n{last}\r\n{}",
            "\n".repeat(TAIL_CHUNK as usize + 5)
        );
        let path = write_file(&dir, "longest.log", &content);

        let mut file = File::open(&path).expect("open");
        let len = file.metadata().expect("metadata").len();
        let line = read_last_line(&mut file, len).expect("tail");
        assert_eq!(line, last.as_bytes());
    }

    #[test]
    fn blank_only_file_has_no_last_line() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "blank.log", "\n\r\n\n");

        let mut file = File::open(&path).expect("open");
        let line = read_last_line(&mut file, 4).expect("tail");
        assert!(line.is_empty());
    }

    #[test]
    fn file_without_trailing_newline() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(
            &dir,
            "nonl.log",
            "2023-01-01T00:00:00.000 a\n2023-01-01T00:00:01.000 b",
        );

        let meta = FileMetadata::read(&path).expect("bounds");
        assert_eq!(meta.end, ts("2023-01-01T00:00:01.000"));
    }

    #[test]
    fn empty_file_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "empty.log", "");

        let err = FileMetadata::read(&path).expect_err("empty");
        assert!(matches!(err, LogError::InvalidFormat(_)));
    }

    #[test]
    fn malformed_last_line_is_rejected() {
        let dir = TempDir::new().expect("temp dir");
        let path = write_file(&dir, "bad.log", "2023-01-01T00:00:00.000 a\nnot a timestamp\n");

        let err = FileMetadata::read(&path).expect_err("malformed");
        assert!(matches!(err, LogError::InvalidFormat(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = TempDir::new().expect("temp dir");
        let err = FileMetadata::read(&dir.path().join("nope.log")).expect_err("missing");
        assert!(matches!(err, LogError::Io { .. }));
    }

    #[test]
    fn contains_is_inclusive() {
        let meta = FileMetadata {
            path: PathBuf::from("x.log"),
            start: ts("2023-01-01T00:00:00.000"),
            end: ts("2023-01-01T00:00:02.000"),
            len: 0,
        };
        assert!(meta.contains(ts("2023-01-01T00:00:00.000")));
        assert!(meta.contains(ts("2023-01-01T00:00:01.500")));
        assert!(meta.contains(ts("2023-01-01T00:00:02.000")));
        assert!(!meta.contains(ts("2023-01-01T00:00:02.001")));
    }
}
