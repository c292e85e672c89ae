//! Character table loading.

use std::path::Path;

use crate::core::OCRError;

/// Reads a character table, one entry per line.
///
/// Line `i` is the character for recognizer class `i`. Empty lines are kept
/// because they still occupy a class index.
///
/// # Errors
///
/// Returns an `OCRError::ModelLoad` if the file cannot be read.
pub fn read_character_dict(path: &Path) -> Result<Vec<String>, OCRError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        OCRError::model_load_error(path, "failed to read character dictionary", Some(e))
    })?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_character_dict() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "a\nb\n\nç\r\n").unwrap();
        let dict = read_character_dict(file.path()).unwrap();
        assert_eq!(dict, vec!["a", "b", "", "ç"]);
    }

    #[test]
    fn test_missing_dict() {
        let err = read_character_dict(Path::new("/nonexistent/dict.txt")).unwrap_err();
        assert!(matches!(err, OCRError::ModelLoad { .. }));
    }
}
