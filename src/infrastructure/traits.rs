//! I/O boundary traits for testability
//!
//! These traits abstract the re-readable line input and the diagnostics
//! stream, allowing services to be tested with in-memory implementations.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, StdoutLock, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use colored::Colorize;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::domain::Diagnostic;

/// How the bytes of a document map to text and back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Anything that is not valid UTF-8 is read as ISO-8859-1, one char per
    /// byte, so writing it back reproduces the input bytes.
    Latin1,
}

impl TextEncoding {
    /// Latin-1 unless every byte sequence is valid UTF-8.
    pub fn detect(bytes: &[u8]) -> Self {
        match std::str::from_utf8(bytes) {
            Ok(_) => TextEncoding::Utf8,
            Err(_) => TextEncoding::Latin1,
        }
    }

    pub fn decode(self, bytes: Vec<u8>) -> String {
        match self {
            TextEncoding::Utf8 => String::from_utf8(bytes)
                .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned()),
            TextEncoding::Latin1 => bytes.into_iter().map(char::from).collect(),
        }
    }

    pub fn encode(self, text: &str) -> Cow<'_, [u8]> {
        match self {
            TextEncoding::Utf8 => Cow::Borrowed(text.as_bytes()),
            TextEncoding::Latin1 => Cow::Owned(
                text.chars()
                    .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                    .collect(),
            ),
        }
    }
}

/// Line-oriented input that can be read forward and then re-read from the start.
pub trait LineSource {
    /// Next line including its terminator; None at end of input.
    fn next_line(&mut self) -> io::Result<Option<String>>;

    /// Go back to the first line.
    fn rewind(&mut self) -> io::Result<()>;

    /// Encoding the lines were decoded with; output must use the same.
    fn encoding(&self) -> TextEncoding {
        TextEncoding::Utf8
    }
}

/// Receives non-fatal diagnostics as they are found.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// A seekable file read line by line.
#[derive(Debug)]
pub struct FileLineSource {
    reader: BufReader<File>,
    encoding: TextEncoding,
    /// Keeps a spooled stdin copy alive for as long as it is read.
    _spool: Option<NamedTempFile>,
}

impl FileLineSource {
    /// Open `path`, reading it through once to settle its encoding.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut reader = BufReader::new(File::open(path)?);
        let encoding = detect_encoding(&mut reader)?;
        debug!(?encoding, path = %path.display(), "opened input");
        Ok(Self {
            reader,
            encoding,
            _spool: None,
        })
    }

    /// Copy a non-seekable stream (stdin) into a temp file so it can be read twice.
    pub fn spool<R: Read>(mut input: R) -> io::Result<Self> {
        let mut spool = NamedTempFile::new()?;
        let bytes = io::copy(&mut input, spool.as_file_mut())?;
        spool.as_file_mut().flush()?;
        debug!(bytes, path = %spool.path().display(), "spooled input");
        let mut source = Self::open(spool.path())?;
        source._spool = Some(spool);
        Ok(source)
    }
}

/// UTF-8 sequences never span a `\n`, so a line-wise check covers the file.
fn detect_encoding<R: BufRead + Seek>(reader: &mut R) -> io::Result<TextEncoding> {
    let mut line = Vec::new();
    let mut encoding = TextEncoding::Utf8;
    while reader.read_until(b'\n', &mut line)? > 0 {
        if TextEncoding::detect(&line) == TextEncoding::Latin1 {
            encoding = TextEncoding::Latin1;
            break;
        }
        line.clear();
    }
    reader.seek(SeekFrom::Start(0))?;
    Ok(encoding)
}

impl LineSource for FileLineSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        match self.reader.read_until(b'\n', &mut line)? {
            0 => Ok(None),
            _ => Ok(Some(self.encoding.decode(line))),
        }
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.reader.seek(SeekFrom::Start(0)).map(|_| ())
    }

    fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

/// Where the rewritten document goes.
///
/// A file target is written to a temp file in the same directory and only
/// replaces the target on `commit`; dropping the sink discards the output.
#[derive(Debug)]
pub enum OutputSink {
    Stdout(BufWriter<StdoutLock<'static>>),
    File {
        writer: BufWriter<NamedTempFile>,
        path: PathBuf,
    },
}

impl OutputSink {
    pub fn stdout() -> Self {
        OutputSink::Stdout(BufWriter::new(io::stdout().lock()))
    }

    pub fn file(path: &Path) -> io::Result<Self> {
        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let temp = NamedTempFile::new_in(dir)?;
        debug!(temp = %temp.path().display(), target = %path.display(), "staging output");
        Ok(OutputSink::File {
            writer: BufWriter::new(temp),
            path: path.to_path_buf(),
        })
    }

    /// The file this sink will replace, if any.
    pub fn target(&self) -> Option<&Path> {
        match self {
            OutputSink::Stdout(_) => None,
            OutputSink::File { path, .. } => Some(path),
        }
    }

    /// Flush, and move a staged file over its target.
    pub fn commit(self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(mut writer) => writer.flush(),
            OutputSink::File { writer, path } => {
                let temp = writer.into_inner().map_err(|e| e.into_error())?;
                // an existing target keeps its mode
                if let Ok(meta) = std::fs::metadata(&path) {
                    temp.as_file().set_permissions(meta.permissions())?;
                }
                temp.persist(&path).map_err(|e| e.error)?;
                debug!(path = %path.display(), "output committed");
                Ok(())
            }
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::Stdout(writer) => writer.write(buf),
            OutputSink::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::Stdout(writer) => writer.flush(),
            OutputSink::File { writer, .. } => writer.flush(),
        }
    }
}

/// Document held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryLineSource {
    lines: Vec<String>,
    pos: usize,
    encoding: TextEncoding,
}

impl MemoryLineSource {
    pub fn new(content: &str) -> Self {
        Self {
            lines: content.split_inclusive('\n').map(str::to_string).collect(),
            pos: 0,
            encoding: TextEncoding::Utf8,
        }
    }

    /// Raw document bytes, decoded like a file would be.
    pub fn from_bytes(content: &[u8]) -> Self {
        let encoding = TextEncoding::detect(content);
        Self {
            lines: content
                .split_inclusive(|b| *b == b'\n')
                .map(|line| encoding.decode(line.to_vec()))
                .collect(),
            pos: 0,
            encoding,
        }
    }
}

impl LineSource for MemoryLineSource {
    fn next_line(&mut self) -> io::Result<Option<String>> {
        let line = self.lines.get(self.pos).cloned();
        if line.is_some() {
            self.pos += 1;
        }
        Ok(line)
    }

    fn rewind(&mut self) -> io::Result<()> {
        self.pos = 0;
        Ok(())
    }

    fn encoding(&self) -> TextEncoding {
        self.encoding
    }
}

/// Prints diagnostics to stderr (yellow "warning:" prefix).
#[derive(Debug, Default)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        eprintln!("{}: {}", "warning".yellow(), diagnostic);
    }
}

/// Keeps diagnostics for later inspection.
#[derive(Debug, Default)]
pub struct MemoryReporter {
    seen: Mutex<Vec<Diagnostic>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.seen.lock().map(|d| d.clone()).unwrap_or_default()
    }
}

impl Reporter for MemoryReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(diagnostic.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_source_rewinds() {
        let mut source = MemoryLineSource::new("a\nb\nc");
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("b\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("c"));
        assert_eq!(source.next_line().unwrap(), None);
        source.rewind().unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("a\n"));
    }

    #[test]
    fn test_spooled_stdin_rewinds() {
        let mut source = FileLineSource::spool("@node Top\ntext\n".as_bytes()).unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("@node Top\n"));
        assert_eq!(source.next_line().unwrap().as_deref(), Some("text\n"));
        assert_eq!(source.next_line().unwrap(), None);
        source.rewind().unwrap();
        assert_eq!(source.next_line().unwrap().as_deref(), Some("@node Top\n"));
    }

    #[test]
    fn test_latin1_file_decodes_and_encodes_back_to_same_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.texi");
        let raw = b"@node Caf\xe9\n@chapter Caf\xe9 cr\xe8me\n".to_vec();
        std::fs::write(&path, &raw).unwrap();

        let mut source = FileLineSource::open(&path).unwrap();
        assert_eq!(source.encoding(), TextEncoding::Latin1);
        let first = source.next_line().unwrap().unwrap();
        let second = source.next_line().unwrap().unwrap();

        assert_eq!(first, "@node Caf\u{e9}\n");
        let mut written = source.encoding().encode(&first).into_owned();
        written.extend_from_slice(&source.encoding().encode(&second));
        assert_eq!(written, raw);
    }

    #[test]
    fn test_utf8_file_stays_utf8() {
        let source = FileLineSource::spool("@chapter Caf\u{e9}\n".as_bytes()).unwrap();
        assert_eq!(source.encoding(), TextEncoding::Utf8);
        assert_eq!(&*TextEncoding::Utf8.encode("\u{e9}"), "\u{e9}".as_bytes());
    }

    #[test]
    fn test_output_file_appears_only_on_commit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.texi");

        let mut sink = OutputSink::file(&path).unwrap();
        sink.write_all(b"@node Top\n").unwrap();
        sink.flush().unwrap();
        assert!(!path.exists());

        sink.commit().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "@node Top\n");
    }

    #[test]
    fn test_dropped_output_leaves_existing_target_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.texi");
        std::fs::write(&path, "previous\n").unwrap();

        let mut sink = OutputSink::file(&path).unwrap();
        sink.write_all(b"half a docu").unwrap();
        drop(sink);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
