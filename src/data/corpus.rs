// ============================================================
// Layer 4 — Corpus Reader
// ============================================================
// Streams lines from one or more corpus files, in argument
// order, without loading any file into memory.
//
// Each line is:
//   - decoded as UTF-8, invalid bytes replaced
//   - trimmed and lower-cased
//   - skipped if blank
//
// A file that cannot be opened or read is skipped with a
// warning; the stream moves on to the next file.
//
// Passes:
//   1 (default)  read the file list once
//   n            read it n times
//   0            cycle forever (the stream never ends unless
//                every file is unreadable)
//
// Reference: Rust Book §12 (I/O and File Handling)
//            Rust Book §13 (Implementing the Iterator Trait)

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

pub struct CorpusReader {
    paths:         Vec<PathBuf>,
    passes:        usize,
    pass:          usize,
    next_file:     usize,
    lines_in_pass: u64,
    current:       Option<(PathBuf, BufReader<File>)>,
    buf:           Vec<u8>,
}

impl CorpusReader {
    pub fn new<P: AsRef<Path>>(paths: &[P]) -> Self {
        Self {
            paths:         paths.iter().map(|p| p.as_ref().to_path_buf()).collect(),
            passes:        1,
            pass:          0,
            next_file:     0,
            lines_in_pass: 0,
            current:       None,
            buf:           Vec::new(),
        }
    }

    /// Number of passes over the file list; 0 cycles forever.
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    /// Open the next file, or start the next pass.
    /// Returns false when the stream is finished.
    fn advance_file(&mut self) -> bool {
        loop {
            if self.next_file == self.paths.len() {
                // An empty pass means nothing is readable; stop
                // instead of cycling over dead files
                if self.paths.is_empty() || self.lines_in_pass == 0 {
                    return false;
                }
                self.pass += 1;
                if self.passes != 0 && self.pass >= self.passes {
                    return false;
                }
                tracing::info!("Starting corpus pass {}", self.pass + 1);
                self.next_file     = 0;
                self.lines_in_pass = 0;
            }

            let path = self.paths[self.next_file].clone();
            self.next_file += 1;

            match File::open(&path) {
                Ok(f) => {
                    tracing::debug!("Reading corpus file '{}'", path.display());
                    self.current = Some((path, BufReader::new(f)));
                    return true;
                }
                // Log a warning but continue — don't fail on one bad file
                Err(e) => {
                    tracing::warn!("Skipping '{}': {}", path.display(), e);
                }
            }
        }
    }
}

impl Iterator for CorpusReader {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.current.is_none() && !self.advance_file() {
                return None;
            }
            let (path, reader) = self.current.as_mut()?;

            self.buf.clear();
            match reader.read_until(b'\n', &mut self.buf) {
                Ok(0) => {
                    self.current = None;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&self.buf).trim().to_lowercase();
                    if !line.is_empty() {
                        self.lines_in_pass += 1;
                        return Some(line);
                    }
                }
                Err(e) => {
                    tracing::warn!("Stopped reading '{}': {}", path.display(), e);
                    self.current = None;
                }
            }
        }
    }
}
