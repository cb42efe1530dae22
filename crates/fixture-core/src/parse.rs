//! Fixture file parsing.

use crate::model::FixtureDocument;
use std::path::Path;

/// Extensions accepted for YAML fixtures.
pub const YAML_EXTENSIONS: &[&str] = &["yml", "yaml"];

/// Error type for fixture parsing.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    /// The document is not valid YAML or does not match the fixture schema.
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// The document parsed but violates a fixture invariant.
    #[error("{0}")]
    Invalid(String),
}

/// Fixture file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureFormat {
    Yaml,
}

impl FixtureFormat {
    /// Resolve the format from a path's extension.
    ///
    /// Returns the offending extension (empty when the path has none) on failure.
    pub fn from_path(path: &Path) -> Result<Self, String> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if YAML_EXTENSIONS.contains(&ext.as_str()) {
            Ok(FixtureFormat::Yaml)
        } else {
            Err(ext)
        }
    }
}

/// Parse fixture bytes in the given format.
pub fn parse(format: FixtureFormat, data: &[u8]) -> Result<FixtureDocument, FormatError> {
    let document: FixtureDocument = match format {
        FixtureFormat::Yaml => serde_yaml::from_slice(data)?,
    };
    document.validate().map_err(FormatError::Invalid)?;
    Ok(document)
}

/// Parse a YAML fixture from a string.
pub fn from_yaml(yaml: &str) -> Result<FixtureDocument, FormatError> {
    parse(FixtureFormat::Yaml, yaml.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ScalarValue;

    const BASIC: &str = r#"
table: test
column_families:
  - family: d
    columns:
      - key: "1"
        rows:
          name: foo
          age: "1"
"#;

    #[test]
    fn test_from_path() {
        assert_eq!(
            FixtureFormat::from_path(Path::new("testdata/test.yml")),
            Ok(FixtureFormat::Yaml)
        );
        assert_eq!(
            FixtureFormat::from_path(Path::new("a/b.yaml")),
            Ok(FixtureFormat::Yaml)
        );
        assert_eq!(
            FixtureFormat::from_path(Path::new("data.txt")),
            Err("txt".to_string())
        );
        assert_eq!(
            FixtureFormat::from_path(Path::new("noext")),
            Err(String::new())
        );
        assert!(FixtureFormat::from_path(Path::new("upper.YML")).is_err());
    }

    #[test]
    fn test_parse_basic() {
        let doc = from_yaml(BASIC).unwrap();
        assert_eq!(doc.table, "test");
        assert_eq!(doc.column_families.len(), 1);

        let cf = &doc.column_families[0];
        assert_eq!(cf.family, "d");
        let col = &cf.columns[0];
        assert_eq!(col.key, "1");
        assert_eq!(col.rows["name"], ScalarValue::Text("foo".to_string()));
        assert_eq!(col.rows["age"], ScalarValue::Text("1".to_string()));
        assert!(col.version.is_none());
    }

    #[test]
    fn test_parse_with_version() {
        let yaml = r#"
table: versioned
column_families:
  - family: d
    columns:
      - key: "1"
        rows:
          n: 10
        version: "2018-01-02 15:04:05 +09:00"
"#;
        let doc = from_yaml(yaml).unwrap();
        let version = doc.column_families[0].columns[0].version.unwrap();
        assert_eq!(version.to_string(), "2018-01-02 15:04:05 +09:00");
    }

    #[test]
    fn test_missing_table_is_invalid() {
        let yaml = "column_families:\n  - family: d\n";
        let err = from_yaml(yaml).unwrap_err();
        assert!(matches!(err, FormatError::Yaml(_)));
        assert!(err.to_string().contains("table"));
    }

    #[test]
    fn test_malformed_version_is_invalid() {
        let yaml = r#"
table: t
column_families:
  - family: d
    columns:
      - key: "1"
        rows: {a: b}
        version: "2018/01/02 15:04:05"
"#;
        assert!(matches!(from_yaml(yaml), Err(FormatError::Yaml(_))));
    }

    #[test]
    fn test_wrong_shapes_are_invalid() {
        assert!(from_yaml("- not\n- a\n- mapping\n").is_err());
        assert!(from_yaml("table: t\ncolumn_families: oops\n").is_err());
        assert!(from_yaml("table: [a]\n").is_err());
        assert!(from_yaml(":::").is_err());
    }

    #[test]
    fn test_empty_table_name_is_invalid() {
        assert!(matches!(
            from_yaml("table: \"\"\n"),
            Err(FormatError::Invalid(_))
        ));
    }
}
