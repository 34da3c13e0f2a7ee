//! Tag extraction through exiftool.

use super::{TagRecord, TemporalConfig, DATE_TAGS};
use crate::core::tool::ToolRunner;
use crate::error::ToolError;
use std::ffi::{OsStr, OsString};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use tracing::{error, info, warn};

const TOOL: &str = "exiftool";

/// Canonical output format for every date tag
const DATE_FORMAT: &str = "%Y:%m:%d %H:%M:%S%z";

/// Argument variants in the order they are attempted
const VARIANTS: [&[&str]; 2] = [
    &[
        "-q", "-q", "-fast", "-j", "-charset", "filename=utf8", "-api", "QuickTimeUTC",
    ],
    &["-q", "-q", "-j", "-charset", "filename=utf8"],
];

/// [`MetadataSource`](super::MetadataSource) backed by the exiftool executable
pub struct ExifTool {
    runner: ToolRunner,
    argfile_threshold: usize,
}

impl ExifTool {
    pub fn new(config: &TemporalConfig) -> Self {
        Self {
            runner: ToolRunner::new(TOOL, &config.exiftool_path),
            argfile_threshold: config.argfile_threshold,
        }
    }

    /// Locate exiftool; `None` means every date falls back to mtime
    pub fn detect(config: &TemporalConfig) -> Option<Self> {
        let tool = Self::new(config);
        match tool.runner.version("-ver") {
            Ok(version) => {
                info!("exiftool found at {} (version {})", config.exiftool_path.display(), version);
                Some(tool)
            }
            Err(e) => {
                warn!("exiftool not available, capture dates will use modification time: {}", e);
                None
            }
        }
    }

    fn tag_args() -> Vec<OsString> {
        let mut args = vec![OsString::from("-d"), OsString::from(DATE_FORMAT)];
        args.extend(DATE_TAGS.iter().map(|tag| OsString::from(format!("-{}", tag))));
        args
    }

    fn parse_records(stdout: &str) -> Result<Vec<TagRecord>, ToolError> {
        if stdout.trim().is_empty() {
            return Err(ToolError::MalformedOutput {
                tool: TOOL.to_string(),
                reason: "empty output".to_string(),
            });
        }
        serde_json::from_str(stdout).map_err(|e| ToolError::MalformedOutput {
            tool: TOOL.to_string(),
            reason: e.to_string(),
        })
    }
}

impl super::MetadataSource for ExifTool {
    fn read_tags(&self, files: &[PathBuf]) -> Result<Vec<TagRecord>, ToolError> {
        // Held until every variant has run
        let argfile = if files.len() > self.argfile_threshold {
            Some(write_argfile(files)?)
        } else {
            None
        };
        let file_args: Vec<OsString> = match &argfile {
            Some(file) => vec![OsString::from("-@"), file.path().as_os_str().to_os_string()],
            None => files.iter().map(|p| p.as_os_str().to_os_string()).collect(),
        };

        let mut last_error = ToolError::Unavailable {
            tool: TOOL.to_string(),
            reason: "no invocation attempted".to_string(),
        };

        for (attempt, variant) in VARIANTS.iter().enumerate() {
            let mut args: Vec<&OsStr> = variant.iter().map(OsStr::new).collect();
            let tag_args = Self::tag_args();
            args.extend(tag_args.iter().map(OsString::as_os_str));
            args.extend(file_args.iter().map(OsString::as_os_str));

            let outcome = self
                .runner
                .run(&args)
                .and_then(|output| Self::parse_records(&output.stdout));
            match outcome {
                Ok(records) => return Ok(records),
                Err(e) if e.is_permission_denied() => {
                    error!(
                        "The system refused to launch {}. Check the executable's permissions \
                         or any security software blocking it.",
                        self.runner.program().display()
                    );
                    return Err(e);
                }
                Err(e) => {
                    warn!(
                        "exiftool attempt {} failed on {} file(s): {}",
                        attempt + 1,
                        files.len(),
                        e
                    );
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

fn write_argfile(files: &[PathBuf]) -> Result<NamedTempFile, ToolError> {
    let io_error = |e: std::io::Error| ToolError::Unavailable {
        tool: TOOL.to_string(),
        reason: format!("cannot write argument file: {}", e),
    };
    let mut file = NamedTempFile::new().map_err(io_error)?;
    for path in files {
        writeln!(file, "{}", path.display()).map_err(io_error)?;
    }
    file.flush().map_err(io_error)?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::temporal::{DateSource, MetadataSource, TemporalResolver};
    use chrono::NaiveDate;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    /// Executable shell script standing in for exiftool
    #[cfg(unix)]
    fn fake_exiftool(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("exiftool");
        fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn tag_arguments_follow_priority_order() {
        let args = ExifTool::tag_args();
        assert_eq!(args[0], "-d");
        assert_eq!(args[1], DATE_FORMAT);
        assert_eq!(args[2], "-SubSecDateTimeOriginal");
        assert_eq!(args.last().unwrap(), "-FileModifyDate");
    }

    #[test]
    fn primary_variant_requests_quicktime_utc() {
        assert!(VARIANTS[0].contains(&"QuickTimeUTC"));
        assert!(!VARIANTS[1].contains(&"-fast"));
    }

    #[test]
    fn empty_and_malformed_output_are_rejected() {
        assert!(ExifTool::parse_records("  \n").is_err());
        assert!(ExifTool::parse_records("[{\"SourceFile\": ").is_err());
        let records = ExifTool::parse_records(r#"[{"SourceFile": "/a.jpg"}]"#).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn argfile_lists_one_path_per_line() {
        let files = vec![PathBuf::from("/photos/a b.jpg"), PathBuf::from("/photos/c.jpg")];
        let argfile = write_argfile(&files).unwrap();
        let content = std::fs::read_to_string(argfile.path()).unwrap();
        assert_eq!(content, "/photos/a b.jpg\n/photos/c.jpg\n");
    }

    #[test]
    fn missing_executable_fails_every_variant() {
        let config = TemporalConfig {
            exiftool_path: PathBuf::from("/nonexistent/exiftool-12345"),
            ..TemporalConfig::default()
        };
        assert!(ExifTool::detect(&config).is_none());
        let err = ExifTool::new(&config)
            .read_tags(&[PathBuf::from("/photos/a.jpg")])
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn failing_fast_variant_retries_with_compatible_one() {
        let dir = TempDir::new().unwrap();
        let calls = dir.path().join("calls.log");
        let script = fake_exiftool(
            dir.path(),
            &format!(
                r#"echo "$*" >> '{}'
for arg in "$@"; do [ "$arg" = "-fast" ] && exit 1; done
for last; do :; done
printf '[{{"SourceFile":"%s","DateTimeOriginal":"2019:07:04 10:30:00"}}]' "$last""#,
                calls.display()
            ),
        );
        let photo = dir.path().join("IMG_0001.jpg");
        fs::write(&photo, b"photo").unwrap();
        let config = TemporalConfig {
            exiftool_path: script,
            ..TemporalConfig::default()
        };
        let resolver =
            TemporalResolver::new(config.clone(), Some(Box::new(ExifTool::new(&config))));

        let record = resolver.resolve(&photo).unwrap();

        assert_eq!(record.source, DateSource::Tag("DateTimeOriginal".to_string()));
        assert_eq!(
            record.captured_at,
            NaiveDate::from_ymd_opt(2019, 7, 4)
                .unwrap()
                .and_hms_opt(10, 30, 0)
                .unwrap()
        );
        let log = fs::read_to_string(&calls).unwrap();
        let attempts: Vec<&str> = log.lines().collect();
        assert_eq!(attempts.len(), 2);
        assert!(attempts[0].contains("-fast"));
        assert!(!attempts[1].contains("-fast"));
    }

    #[cfg(unix)]
    #[test]
    fn every_variant_failing_falls_back_to_modification_time() {
        let dir = TempDir::new().unwrap();
        let script = fake_exiftool(dir.path(), "exit 2");
        let photo = dir.path().join("IMG_0001.jpg");
        fs::write(&photo, b"photo").unwrap();
        let config = TemporalConfig {
            exiftool_path: script,
            ..TemporalConfig::default()
        };

        let err = ExifTool::new(&config).read_tags(&[photo.clone()]).unwrap_err();
        assert!(matches!(err, ToolError::Failed { status: 2, .. }));

        let resolver =
            TemporalResolver::new(config.clone(), Some(Box::new(ExifTool::new(&config))));
        assert_eq!(
            resolver.resolve(&photo).unwrap().source,
            DateSource::ModificationTime
        );
    }
}
