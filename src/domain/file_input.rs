use std::fs::File;
use std::io::Cursor;
use std::path::PathBuf;

/// Everything a caller may hand to an upload.
#[derive(Debug)]
pub enum FileInput {
    /// A file on disk, opened at upload time.
    Path(PathBuf),
    /// Literal file contents.
    Text(String),
    Bytes(Vec<u8>),
    /// The whole buffer is sent regardless of the cursor position.
    Buffer(Cursor<Vec<u8>>),
    /// An already opened file. Closed once the upload request completes.
    Handle { file: File, name: Option<String> },
}

impl FileInput {
    /// Classifies a raw string argument: anything longer than four characters whose
    /// extension is one of `suffixes` names a file, everything else is content.
    pub fn from_argument(arg: &str, suffixes: &[&str]) -> Self {
        if arg.len() > 4 && has_suffix(arg, suffixes) {
            FileInput::Path(PathBuf::from(arg))
        } else {
            FileInput::Text(arg.to_string())
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            FileInput::Path(_) => "path",
            FileInput::Text(_) => "text",
            FileInput::Bytes(_) => "bytes",
            FileInput::Buffer(_) => "buffer",
            FileInput::Handle { .. } => "handle",
        }
    }
}

impl From<Vec<u8>> for FileInput {
    fn from(bytes: Vec<u8>) -> Self {
        FileInput::Bytes(bytes)
    }
}

impl From<Cursor<Vec<u8>>> for FileInput {
    fn from(buffer: Cursor<Vec<u8>>) -> Self {
        FileInput::Buffer(buffer)
    }
}

impl From<File> for FileInput {
    fn from(file: File) -> Self {
        FileInput::Handle { file, name: None }
    }
}

pub fn has_suffix(name: &str, suffixes: &[&str]) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            let ext = ext.to_ascii_lowercase();
            suffixes.iter().any(|s| s.eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

/// A normalized upload body. `source` keeps an opened file alive until the request
/// that carries its bytes has finished.
#[derive(Debug)]
pub struct FilePayload {
    pub file_name: String,
    pub content: Vec<u8>,
    pub source: Option<File>,
}

impl FilePayload {
    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }
}
