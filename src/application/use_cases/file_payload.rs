use crate::domain::error::{AppError, Result};
use crate::domain::file_input::{FileInput, FilePayload};
use crate::domain::http_message::MultipartFile;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Turns any supported input into `(file name, bytes)`, refusing content above
/// `max_bytes`. Nothing here touches the network.
pub fn normalize(input: FileInput, synthetic_name: &str, max_bytes: usize) -> Result<FilePayload> {
    let kind = input.kind();
    let payload = match input {
        FileInput::Path(path) => {
            let file = File::open(&path).map_err(|e| {
                AppError::IoError(format!("Failed to open {}: {}", path.display(), e))
            })?;
            read_handle(file, file_name_of(&path, synthetic_name), max_bytes)?
        }
        FileInput::Handle { file, name } => {
            read_handle(file, name.unwrap_or_else(|| synthetic_name.to_string()), max_bytes)?
        }
        FileInput::Text(text) => wrap(synthetic_name, text.into_bytes()),
        FileInput::Bytes(bytes) => wrap(synthetic_name, bytes),
        FileInput::Buffer(buffer) => wrap(synthetic_name, buffer.into_inner()),
    };

    check_size(payload.len(), max_bytes)?;
    debug!(
        kind,
        file_name = %payload.file_name,
        bytes = payload.len(),
        "Normalized upload payload"
    );
    Ok(payload)
}

/// Splits a payload into the multipart part and the file handle that must outlive
/// the request.
pub fn into_multipart(payload: FilePayload, field: &str) -> (MultipartFile, Option<File>) {
    let FilePayload {
        file_name,
        content,
        source,
    } = payload;
    (
        MultipartFile {
            field: field.to_string(),
            file_name,
            content,
        },
        source,
    )
}

fn wrap(name: &str, content: Vec<u8>) -> FilePayload {
    FilePayload {
        file_name: name.to_string(),
        content,
        source: None,
    }
}

fn read_handle(mut file: File, file_name: String, max_bytes: usize) -> Result<FilePayload> {
    // Reject obviously oversized files before reading them into memory.
    if let Ok(metadata) = file.metadata() {
        check_size(usize::try_from(metadata.len()).unwrap_or(usize::MAX), max_bytes)?;
    }

    // One byte past the limit is enough to tell an oversized file apart.
    let read_limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut content = Vec::new();
    file.by_ref().take(read_limit).read_to_end(&mut content)?;

    Ok(FilePayload {
        file_name,
        content,
        source: Some(file),
    })
}

fn file_name_of(path: &Path, fallback: &str) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| fallback.to_string())
}

fn check_size(size: usize, max_bytes: usize) -> Result<()> {
    if size > max_bytes {
        return Err(AppError::SizeLimitError(format!(
            "File too large ({} bytes). Max size: {}",
            size, max_bytes
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    const TSV: &[u8] = b"email\tdate\nqa@example.com\t2024-01-31\n";

    fn tsv_file() -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".tsv").tempfile().unwrap();
        file.write_all(TSV).unwrap();
        file
    }

    #[test]
    fn test_path_keeps_bytes_and_name() {
        let file = tsv_file();
        let payload = normalize(FileInput::Path(file.path().to_path_buf()), "filename.tsv", 1024)
            .unwrap();
        assert_eq!(payload.content, TSV);
        assert!(payload.file_name.ends_with(".tsv"));
        assert_ne!(payload.file_name, "filename.tsv");
        assert!(payload.source.is_some());
    }

    #[test]
    fn test_in_memory_inputs_keep_bytes() {
        let text = String::from_utf8(TSV.to_vec()).unwrap();
        for input in [
            FileInput::Text(text),
            FileInput::Bytes(TSV.to_vec()),
            FileInput::Buffer(Cursor::new(TSV.to_vec())),
        ] {
            let payload = normalize(input, "filename.tsv", 1024).unwrap();
            assert_eq!(payload.content, TSV);
            assert_eq!(payload.file_name, "filename.tsv");
            assert!(payload.source.is_none());
        }
    }

    #[test]
    fn test_buffer_ignores_cursor_position() {
        let mut buffer = Cursor::new(TSV.to_vec());
        buffer.set_position(10);
        let payload = normalize(FileInput::Buffer(buffer), "filename.tsv", 1024).unwrap();
        assert_eq!(payload.content, TSV);
    }

    #[test]
    fn test_open_handle_passes_through() {
        let file = tsv_file();
        let mut handle = file.reopen().unwrap();
        handle.seek(SeekFrom::Start(0)).unwrap();
        let payload = normalize(
            FileInput::Handle {
                file: handle,
                name: Some("report.tsv".to_string()),
            },
            "filename.tsv",
            1024,
        )
        .unwrap();
        assert_eq!(payload.content, TSV);
        assert_eq!(payload.file_name, "report.tsv");
    }

    #[test]
    fn test_oversized_inputs_rejected() {
        let err = normalize(FileInput::Bytes(vec![0u8; 11]), "filename.tsv", 10).unwrap_err();
        assert!(matches!(err, AppError::SizeLimitError(_)));

        let file = tsv_file();
        let err = normalize(FileInput::Path(file.path().to_path_buf()), "filename.tsv", 4)
            .unwrap_err();
        assert!(matches!(err, AppError::SizeLimitError(_)));
    }

    #[test]
    fn test_unbounded_limit_reads_whole_file() {
        let file = tsv_file();
        let payload = normalize(
            FileInput::Path(file.path().to_path_buf()),
            "filename.tsv",
            usize::MAX,
        )
        .unwrap();
        assert_eq!(payload.content, TSV);

        let payload = normalize(
            FileInput::Handle {
                file: file.reopen().unwrap(),
                name: None,
            },
            "filename.tsv",
            usize::MAX,
        )
        .unwrap();
        assert_eq!(payload.content, TSV);
        assert_eq!(payload.file_name, "filename.tsv");
    }

    #[test]
    fn test_oversized_handle_rejected_before_read() {
        let file = tsv_file();
        let err = normalize(
            FileInput::Handle {
                file: file.reopen().unwrap(),
                name: Some("report.tsv".to_string()),
            },
            "filename.tsv",
            TSV.len() - 1,
        )
        .unwrap_err();
        match err {
            AppError::SizeLimitError(message) => {
                assert!(message.contains(&format!("({} bytes)", TSV.len())));
            }
            other => panic!("expected size error, got {:?}", other),
        }
    }

    #[test]
    fn test_exact_limit_accepted() {
        let payload = normalize(FileInput::Bytes(vec![1u8; 10]), "filename.tsv", 10).unwrap();
        assert_eq!(payload.len(), 10);
    }

    #[test]
    fn test_missing_path_is_io_error() {
        let err = normalize(
            FileInput::Path("/definitely/not/here.tsv".into()),
            "filename.tsv",
            10,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::IoError(_)));
    }

    #[test]
    fn test_into_multipart_keeps_handle() {
        let file = tsv_file();
        let payload = normalize(FileInput::Path(file.path().to_path_buf()), "x.tsv", 1024).unwrap();
        let (part, source) = into_multipart(payload, "file");
        assert_eq!(part.field, "file");
        assert_eq!(part.content, TSV);
        assert!(source.is_some());
    }
}
