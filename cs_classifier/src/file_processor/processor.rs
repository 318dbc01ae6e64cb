//! File processor implementation with compile-time limits and global logging integration

use crate::config::constants::compile_time::file_processing::{
    LARGE_FILE_THRESHOLD, MAX_FILE_SIZE, REGULAR_EXTENSIONS, SCRIPT_EXTENSIONS,
};
use crate::config::ParseMode;
use crate::logging::codes;
use crate::{log_debug, log_error, log_info, log_success};
use std::fs;
use std::path::{Path, PathBuf};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// File processor specific errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileProcessorError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid file extension: expected .cs or .csx, found {extension:?}")]
    InvalidExtension { extension: Option<String> },

    #[error("File too large: {size} bytes (max: {max_size})")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Permission denied: {path}")]
    PermissionDenied { path: String },

    #[error("Invalid UTF-8 encoding in file: {path} (first bad byte at {offset})")]
    InvalidEncoding { path: String, offset: usize },

    #[error("I/O error reading file: {message}")]
    IoError { message: String },

    #[error("Invalid file path: {path}")]
    InvalidPath { path: String },
}

impl FileProcessorError {
    /// Get the appropriate error code for this error type
    pub fn error_code(&self) -> crate::logging::Code {
        match self {
            FileProcessorError::FileNotFound { .. } => codes::file_processing::FILE_NOT_FOUND,
            FileProcessorError::InvalidExtension { .. } => codes::file_processing::INVALID_EXTENSION,
            FileProcessorError::FileTooLarge { .. } => codes::file_processing::FILE_TOO_LARGE,
            FileProcessorError::PermissionDenied { .. } => codes::file_processing::PERMISSION_DENIED,
            FileProcessorError::InvalidEncoding { .. } => codes::file_processing::INVALID_ENCODING,
            FileProcessorError::IoError { .. } => codes::file_processing::IO_ERROR,
            FileProcessorError::InvalidPath { .. } => codes::file_processing::INVALID_PATH,
        }
    }

    /// Get error severity
    pub fn severity(&self) -> &'static str {
        codes::get_severity(self.error_code().as_str()).as_str()
    }

    /// Check if error is recoverable
    pub fn is_recoverable(&self) -> bool {
        codes::is_recoverable(self.error_code().as_str())
    }
}

/// Parse mode implied by a file extension, if it is a known one
pub fn parse_mode_for_path(path: &Path) -> Option<ParseMode> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    if REGULAR_EXTENSIONS.contains(&extension.as_str()) {
        Some(ParseMode::Regular)
    } else if SCRIPT_EXTENSIONS.contains(&extension.as_str()) {
        Some(ParseMode::Script)
    } else {
        None
    }
}

/// Whether `path` names a C# source or script file
pub fn is_source_file(path: &Path) -> bool {
    parse_mode_for_path(path).is_some()
}

/// File metadata collected during processing
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// Canonical file path
    pub path: PathBuf,
    /// File size in bytes, BOM included
    pub size: u64,
    /// File extension (if any)
    pub extension: Option<String>,
    /// Number of lines in file
    pub line_count: usize,
    /// Mode decided by the extension; `None` for unknown extensions
    pub parse_mode: Option<ParseMode>,
    /// Whether a UTF-8 byte order mark was stripped
    pub had_bom: bool,
    pub modified: Option<std::time::SystemTime>,
}

impl FileMetadata {
    /// Get file size in human-readable format
    pub fn human_readable_size(&self) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", self.size, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    pub fn is_large_file(&self) -> bool {
        self.size > LARGE_FILE_THRESHOLD
    }
}

/// File contents with metadata
#[derive(Debug, Clone)]
pub struct FileProcessingResult {
    /// Text with any BOM removed; all offsets are relative to it
    pub source: String,
    pub metadata: FileMetadata,
    pub processing_duration: std::time::Duration,
}

impl FileProcessingResult {
    /// Bytes per millisecond
    pub fn processing_rate(&self) -> f64 {
        let duration_ms = self.processing_duration.as_secs_f64() * 1000.0;
        if duration_ms > 0.0 {
            self.source.len() as f64 / duration_ms
        } else {
            0.0
        }
    }
}

/// Reads C# files with the compile-time size limit
#[derive(Debug, Clone)]
pub struct FileProcessor {
    /// Reject files whose extension is neither `.cs` nor `.csx`
    pub require_source_extension: bool,
    /// Log size and rate details on success
    pub enable_performance_logging: bool,
}

impl FileProcessor {
    pub fn new() -> Self {
        Self {
            require_source_extension: true,
            enable_performance_logging: false,
        }
    }

    pub fn with_source_extension_required(mut self, required: bool) -> Self {
        self.require_source_extension = required;
        self
    }

    /// Get the compile-time maximum file size
    pub fn max_file_size() -> u64 {
        MAX_FILE_SIZE
    }

    /// Read a file and return its text with metadata
    pub fn process_file(&self, file_path: &str) -> Result<FileProcessingResult, FileProcessorError> {
        let start_time = std::time::Instant::now();

        log_debug!("Starting file processing", "file" => file_path);

        let path = self.validate_path(file_path)?;
        let mut metadata = self.get_metadata(&path)?;
        self.validate_file(&metadata, file_path)?;

        let (source, had_bom) = self.read_file(&path, file_path)?;
        metadata.line_count = source.lines().count();
        metadata.had_bom = had_bom;

        let result = FileProcessingResult {
            source,
            metadata,
            processing_duration: start_time.elapsed(),
        };
        self.log_processing_success(&result, file_path);
        Ok(result)
    }

    fn log_processing_success(&self, result: &FileProcessingResult, file_path: &str) {
        let duration_str = format!("{:.2}", result.processing_duration.as_secs_f64() * 1000.0);
        let mode = result.metadata.parse_mode.unwrap_or_default();

        if self.enable_performance_logging {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File processed successfully with performance metrics",
                "file" => file_path,
                "size_bytes" => result.metadata.size,
                "size_human" => result.metadata.human_readable_size(),
                "lines" => result.metadata.line_count,
                "mode" => mode.as_str(),
                "duration_ms" => duration_str.as_str(),
                "bytes_per_ms" => format!("{:.2}", result.processing_rate())
            );
        } else {
            log_success!(
                codes::success::FILE_PROCESSING_SUCCESS,
                "File processed successfully",
                "file" => file_path,
                "size_bytes" => result.metadata.size,
                "lines" => result.metadata.line_count,
                "mode" => mode.as_str(),
                "duration_ms" => duration_str.as_str()
            );
        }

        if result.metadata.is_large_file() {
            log_info!("Large source file", "file" => file_path, "size_human" => result.metadata.human_readable_size());
        }
    }

    /// Validate file path and check existence
    fn validate_path(&self, file_path: &str) -> Result<PathBuf, FileProcessorError> {
        if file_path.is_empty() {
            let error = FileProcessorError::InvalidPath {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "Empty file path provided");
            return Err(error);
        }

        let path = Path::new(file_path);

        if !path.exists() {
            let error = FileProcessorError::FileNotFound {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "File not found", "path" => file_path);
            return Err(error);
        }

        if !path.is_file() {
            let error = FileProcessorError::InvalidPath {
                path: file_path.to_string(),
            };
            log_error!(error.error_code(), "Path is not a file", "path" => file_path);
            return Err(error);
        }

        path.canonicalize().map_err(|e| {
            let error = FileProcessorError::IoError {
                message: format!("Failed to resolve path '{}': {}", file_path, e),
            };
            log_error!(error.error_code(), "Failed to canonicalize path",
                "path" => file_path,
                "io_error" => e);
            error
        })
    }

    fn get_metadata(&self, path: &Path) -> Result<FileMetadata, FileProcessorError> {
        let metadata = fs::metadata(path).map_err(|e| io_failure(path, e, "Failed to read file metadata"))?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|s| s.to_lowercase());
        let file_metadata = FileMetadata {
            path: path.to_path_buf(),
            size: metadata.len(),
            extension,
            line_count: 0,
            parse_mode: parse_mode_for_path(path),
            had_bom: false,
            modified: metadata.modified().ok(),
        };

        log_debug!("File metadata collected",
            "size_bytes" => file_metadata.size,
            "extension" => file_metadata.extension.as_deref().unwrap_or("none"),
            "is_large_file" => file_metadata.is_large_file());

        Ok(file_metadata)
    }

    fn validate_file(&self, metadata: &FileMetadata, file_path: &str) -> Result<(), FileProcessorError> {
        if metadata.size > MAX_FILE_SIZE {
            let error = FileProcessorError::FileTooLarge {
                size: metadata.size,
                max_size: MAX_FILE_SIZE,
            };
            log_error!(error.error_code(), "File exceeds compile-time maximum size limit",
                "file" => file_path,
                "size_bytes" => metadata.size,
                "size_human" => metadata.human_readable_size(),
                "limit_bytes" => MAX_FILE_SIZE);
            return Err(error);
        }

        if self.require_source_extension && metadata.parse_mode.is_none() {
            let error = FileProcessorError::InvalidExtension {
                extension: metadata.extension.clone(),
            };
            log_error!(error.error_code(), "File does not have a C# source extension",
                "file" => file_path,
                "extension" => metadata.extension.as_deref().unwrap_or("none"));
            return Err(error);
        }

        Ok(())
    }

    /// Read bytes, strip a UTF-8 BOM and decode
    fn read_file(&self, path: &Path, file_path: &str) -> Result<(String, bool), FileProcessorError> {
        let mut bytes = fs::read(path).map_err(|e| io_failure(path, e, "I/O error reading file"))?;
        let had_bom = bytes.starts_with(UTF8_BOM);
        if had_bom {
            bytes.drain(..UTF8_BOM.len());
        }

        match String::from_utf8(bytes) {
            Ok(content) => {
                log_debug!("File content read successfully",
                    "file" => file_path,
                    "bytes" => content.len(),
                    "bom" => had_bom);
                Ok((content, had_bom))
            }
            Err(e) => {
                let error = FileProcessorError::InvalidEncoding {
                    path: path.display().to_string(),
                    offset: e.utf8_error().valid_up_to(),
                };
                log_error!(error.error_code(), "Invalid UTF-8 encoding in file",
                    "file" => file_path,
                    "offset" => e.utf8_error().valid_up_to());
                Err(error)
            }
        }
    }
}

impl Default for FileProcessor {
    fn default() -> Self {
        Self::new()
    }
}

fn io_failure(path: &Path, e: std::io::Error, message: &str) -> FileProcessorError {
    let error = match e.kind() {
        std::io::ErrorKind::PermissionDenied => FileProcessorError::PermissionDenied {
            path: path.display().to_string(),
        },
        _ => FileProcessorError::IoError {
            message: format!("{} '{}': {}", message, path.display(), e),
        },
    };
    log_error!(error.error_code(), message,
        "path" => path.display(),
        "io_error" => e);
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_process_valid_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Program.cs");
        fs::write(&file_path, "class C { }\n").unwrap();

        let result = FileProcessor::new().process_file(file_path.to_str().unwrap()).unwrap();
        assert_eq!(result.source, "class C { }\n");
        assert_eq!(result.metadata.line_count, 1);
        assert_eq!(result.metadata.parse_mode, Some(ParseMode::Regular));
        assert!(!result.metadata.had_bom);
    }

    #[test]
    fn test_script_extension() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("build.CSX");
        fs::write(&file_path, "#!/usr/bin/env dotnet-script\nvar x = 1;\n").unwrap();

        let result = FileProcessor::new().process_file(file_path.to_str().unwrap()).unwrap();
        assert_eq!(result.metadata.parse_mode, Some(ParseMode::Script));
    }

    #[test]
    fn test_bom_is_stripped() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Bom.cs");
        fs::write(&file_path, b"\xEF\xBB\xBFclass C { }").unwrap();

        let result = FileProcessor::new().process_file(file_path.to_str().unwrap()).unwrap();
        assert_eq!(result.source, "class C { }");
        assert!(result.metadata.had_bom);
        assert_eq!(result.metadata.size, 14);
    }

    #[test]
    fn test_invalid_utf8() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Bad.cs");
        fs::write(&file_path, b"class \xFF { }").unwrap();

        assert_matches!(
            FileProcessor::new().process_file(file_path.to_str().unwrap()),
            Err(FileProcessorError::InvalidEncoding { offset: 6, .. })
        );
    }

    #[test]
    fn test_file_not_found() {
        let error = FileProcessor::new().process_file("/nonexistent/Missing.cs").unwrap_err();
        assert_matches!(error, FileProcessorError::FileNotFound { .. });
        assert_eq!(error.error_code(), codes::file_processing::FILE_NOT_FOUND);
    }

    #[test]
    fn test_extension_requirement() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("notes.txt");
        fs::write(&file_path, "class C { }").unwrap();

        assert_matches!(
            FileProcessor::new().process_file(file_path.to_str().unwrap()),
            Err(FileProcessorError::InvalidExtension { extension: Some(ref ext) }) if ext == "txt"
        );
        let relaxed = FileProcessor::new().with_source_extension_required(false);
        let result = relaxed.process_file(file_path.to_str().unwrap()).unwrap();
        assert_eq!(result.metadata.parse_mode, None);
    }

    #[test]
    fn test_empty_file_is_accepted() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("Empty.cs");
        fs::write(&file_path, "").unwrap();

        let result = FileProcessor::new().process_file(file_path.to_str().unwrap()).unwrap();
        assert!(result.source.is_empty());
    }

    #[test]
    fn test_directory_is_invalid_path() {
        let dir = tempdir().unwrap();
        assert_matches!(
            FileProcessor::new().process_file(dir.path().to_str().unwrap()),
            Err(FileProcessorError::InvalidPath { .. })
        );
    }

    #[test]
    fn test_human_readable_size() {
        let metadata = FileMetadata {
            path: PathBuf::from("a.cs"),
            size: 2048,
            extension: Some("cs".to_string()),
            line_count: 0,
            parse_mode: Some(ParseMode::Regular),
            had_bom: false,
            modified: None,
        };
        assert_eq!(metadata.human_readable_size(), "2.00 KB");
        assert!(!metadata.is_large_file());
    }
}
