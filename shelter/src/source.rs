//! Record files to be imported into a collection.

use std::path::PathBuf;

use glob::Paths;

use crate::{into_records, Error, Record, Value};

/// An iterator producing the records of each file matched by a [`Source`],
/// one file at a time.
pub enum SourceIter {
    Files { paths: Paths },
}

impl Iterator for SourceIter {
    type Item = Result<(PathBuf, Vec<Record>), Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            SourceIter::Files { paths } => loop {
                let next_path = match paths.next()? {
                    Ok(p) => p,
                    Err(e) => return Some(Err(Error::SourceIter(e))),
                };
                if !next_path.is_file() {
                    continue;
                }
                let result = Value::load_from_file(&next_path)
                    .and_then(into_records)
                    .map(|records| (next_path, records));
                return Some(result);
            },
        }
    }
}

/// A source of records that can be loaded into a collection.
#[derive(Debug)]
pub enum Source {
    /// One or more JSON, YAML or TOML files from the local file system.
    ///
    /// The parameter can specify a glob-style pattern for matching files.
    Files(String),
}

impl Source {
    /// Returns an iterator that allows one to iterate through records parsed
    /// from the source as they are read.
    ///
    /// Can fail if this source has been incorrectly configured.
    pub fn iter(&self) -> Result<SourceIter, Error> {
        Ok(match self {
            Self::Files(pattern) => glob::glob(pattern)
                .map(|paths| SourceIter::Files { paths })
                .map_err(|e| Error::SourceFilePattern(pattern.clone(), e))?,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bad_patterns_are_reported() {
        assert!(matches!(
            Source::Files("data/[".to_string()).iter(),
            Err(Error::SourceFilePattern(_, _))
        ));
    }

    #[test]
    fn no_matches_yields_nothing() {
        let mut iter = Source::Files("/nonexistent/shelter/*.json".to_string())
            .iter()
            .unwrap();
        assert!(iter.next().is_none());
    }
}
