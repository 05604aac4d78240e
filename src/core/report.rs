// src/core/report.rs — Report export

use std::path::{Path, PathBuf};

use crate::core::session::Session;
use crate::infra::errors::HealthMateError;

/// Filename of the exported report artifact.
pub const REPORT_FILENAME: &str = "xray_diagnosis_report.txt";

/// The exportable report: the exact text of the latest assistant turn.
/// Pure read of the session history, callable any number of times.
pub fn latest_report(session: &Session) -> Result<&str, HealthMateError> {
    session
        .latest_report()
        .ok_or(HealthMateError::NoReportAvailable)
}

/// Write the report into `dir` as `xray_diagnosis_report.txt` and return the
/// full path.
pub fn export_to_dir(session: &Session, dir: &Path) -> Result<PathBuf, HealthMateError> {
    let text = latest_report(session)?;
    std::fs::create_dir_all(dir)?;
    let path = dir.join(REPORT_FILENAME);
    std::fs::write(&path, text)?;
    Ok(path)
}

/// Write the report to an explicit file path.
pub fn export_to(session: &Session, path: &Path) -> Result<(), HealthMateError> {
    let text = latest_report(session)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, text)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::intake::ImageIntake;
    use crate::core::session::Turn;
    use tempfile::TempDir;

    fn session_with_report(text: &str) -> Session {
        let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
        let mut buf = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        let handle = ImageIntake::default()
            .validate_and_decode(&buf, buf.len() as u64)
            .unwrap();

        let mut s = Session::new();
        s.attach_image(handle);
        s.append_turn(Turn::user_with_image("analyze")).unwrap();
        s.append_turn(Turn::assistant(text)).unwrap();
        s
    }

    #[test]
    fn test_no_report_before_any_round() {
        let s = Session::new();
        assert!(matches!(
            latest_report(&s),
            Err(HealthMateError::NoReportAvailable)
        ));
    }

    #[test]
    fn test_report_is_latest_assistant_text() {
        let s = session_with_report("No abnormality detected");
        assert_eq!(latest_report(&s).unwrap(), "No abnormality detected");
    }

    #[test]
    fn test_export_writes_expected_file() {
        let s = session_with_report("Findings: clear lung fields.");
        let dir = TempDir::new().unwrap();

        let path = export_to_dir(&s, dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), REPORT_FILENAME);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Findings: clear lung fields.");
    }

    #[test]
    fn test_export_is_repeatable() {
        let s = session_with_report("stable report");
        let dir = TempDir::new().unwrap();
        export_to_dir(&s, dir.path()).unwrap();
        let path = export_to_dir(&s, dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "stable report");
    }
}
