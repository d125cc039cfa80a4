use std::{
    fs::File,
    io::{self, BufRead},
    path::Path,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LabelCatalogError {
    #[error("failed to read labels file: {0}")]
    Io(#[from] io::Error),
    #[error("invalid label record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

/// One class the model can emit, with the color used for box drawing.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassLabel {
    pub label: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

/// Maps the model's class ids to label strings. Line order in the labels
/// file must match the class-id order the model was trained with.
#[derive(Debug)]
pub struct LabelCatalog {
    labels: Vec<ClassLabel>,
}

impl LabelCatalog {
    pub fn load(filepath: &Path) -> Result<Self, LabelCatalogError> {
        let file = File::open(filepath)?;
        Self::from_reader(io::BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, LabelCatalogError> {
        let mut labels = Vec::new();

        for (index, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            if line.trim().is_empty() {
                continue;
            }

            let parts: Vec<&str> = line.split(',').collect();
            if parts.len() != 4 {
                return Err(LabelCatalogError::InvalidRecord {
                    line: index + 1,
                    reason: format!("expected `label, r, g, b`, got `{}`", line),
                });
            }

            let label = parts[0].trim().to_string();
            let channel = |part: &str, name: &str| {
                part.trim()
                    .parse::<u8>()
                    .map_err(|_| LabelCatalogError::InvalidRecord {
                        line: index + 1,
                        reason: format!("invalid {} value `{}`", name, part.trim()),
                    })
            };

            labels.push(ClassLabel {
                label,
                red: channel(parts[1], "red")?,
                green: channel(parts[2], "green")?,
                blue: channel(parts[3], "blue")?,
            });
        }

        Ok(Self { labels })
    }

    pub fn get(&self, class_id: u32) -> Option<&ClassLabel> {
        self.labels.get(class_id as usize)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parses_label_records() {
        let input = "Tomato_Late_blight, 148, 103, 189\nTomato_healthy, 44, 160, 44\n";
        let catalog = LabelCatalog::from_reader(Cursor::new(input)).unwrap();

        assert_eq!(catalog.len(), 2);
        let first = catalog.get(0).unwrap();
        assert_eq!(first.label, "Tomato_Late_blight");
        assert_eq!((first.red, first.green, first.blue), (148, 103, 189));
    }

    #[test]
    fn test_out_of_range_class_id_is_none() {
        let input = "Tomato_healthy, 44, 160, 44\n";
        let catalog = LabelCatalog::from_reader(Cursor::new(input)).unwrap();

        assert!(catalog.get(5).is_none());
    }

    #[test]
    fn test_rejects_malformed_record() {
        let input = "Tomato_healthy, 44, 160\n";
        let result = LabelCatalog::from_reader(Cursor::new(input));

        assert!(matches!(
            result,
            Err(LabelCatalogError::InvalidRecord { line: 1, .. })
        ));
    }

    #[test]
    fn test_rejects_bad_color_value() {
        let input = "Tomato_healthy, 44, green, 44\n";
        let result = LabelCatalog::from_reader(Cursor::new(input));

        assert!(matches!(
            result,
            Err(LabelCatalogError::InvalidRecord { line: 1, .. })
        ));
    }

    #[test]
    fn test_skips_blank_lines() {
        let input = "Tomato_healthy, 44, 160, 44\n\n";
        let catalog = LabelCatalog::from_reader(Cursor::new(input)).unwrap();

        assert_eq!(catalog.len(), 1);
    }
}
