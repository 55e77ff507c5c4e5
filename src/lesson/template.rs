//! Phrase script (`Excel.txt`): `english|spanish[|highlight|translation]*`.

use std::fs;
use std::path::Path;

use super::error::{IoContext, LessonError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub highlight: String,
    pub translation: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phrase {
    /// 1-based, contiguous over the accepted records
    pub index: u32,
    pub english: String,
    pub spanish: String,
    pub fragments: Vec<Fragment>,
}

impl Phrase {
    pub fn fragment_count(&self) -> u32 {
        u32::try_from(self.fragments.len()).unwrap_or(u32::MAX)
    }

    pub fn is_odd(&self) -> bool {
        self.index % 2 == 1
    }
}

pub fn parse_template(path: &Path) -> Result<Vec<Phrase>, LessonError> {
    if !path.is_file() {
        return Err(LessonError::missing("phrase template", path));
    }
    let contents = fs::read_to_string(path).at(path)?;
    Ok(parse_template_str(&contents))
}

pub fn parse_template_str(contents: &str) -> Vec<Phrase> {
    let mut phrases = Vec::new();

    for line in contents.lines() {
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        if line.trim().is_empty() || fields.len() < 2 {
            continue;
        }

        // An unpaired trailing field has no translation to go with it.
        let fragments = fields[2..]
            .chunks_exact(2)
            .map(|pair| Fragment {
                highlight: pair[0].to_string(),
                translation: pair[1].to_string(),
            })
            .collect();

        phrases.push(Phrase {
            index: phrases.len() as u32 + 1,
            english: fields[0].to_string(),
            spanish: fields[1].to_string(),
            fragments,
        });
    }

    phrases
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_phrases_with_fragments() {
        let phrases = parse_template_str(
            "I like coffee | Me gusta el café | like | gusta | coffee | café\nGood night|Buenas noches\n",
        );

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].index, 1);
        assert_eq!(phrases[0].english, "I like coffee");
        assert_eq!(phrases[0].spanish, "Me gusta el café");
        assert_eq!(
            phrases[0].fragments,
            [
                Fragment {
                    highlight: "like".into(),
                    translation: "gusta".into()
                },
                Fragment {
                    highlight: "coffee".into(),
                    translation: "café".into()
                },
            ]
        );
        assert_eq!(phrases[1].index, 2);
        assert!(phrases[1].fragments.is_empty());
        assert!(!phrases[1].is_odd());
    }

    #[test]
    fn short_and_blank_records_do_not_consume_indices() {
        let phrases = parse_template_str("only english\n\nHello|Hola\n   \nBye|Adiós|Bye\n");

        assert_eq!(phrases.len(), 2);
        assert_eq!(phrases[0].english, "Hello");
        assert_eq!(phrases[0].index, 1);
        assert_eq!(phrases[1].index, 2);
        assert_eq!(phrases[1].fragment_count(), 0);
    }

    #[test]
    fn missing_template_is_fatal() {
        let temp = tempdir().unwrap();
        let err = parse_template(&temp.path().join("Excel.txt")).unwrap_err();
        assert!(matches!(err, LessonError::MissingResource { .. }));
    }
}
