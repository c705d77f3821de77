//! The book catalog.
//!
//! Loaded once at startup from a CSV file with the columns
//! `Title, Author, Genre, Skill_Level, Location, Available`, then kept in
//! memory. Only the `available` flag ever changes after loading, and nothing
//! is written back to disk.
//!
//! All text matching is case-insensitive substring matching.

use anyhow::{Context, Result};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;

use crate::models::{Availability, Book};

/// Row shape of the catalog file. Missing cells deserialize as empty strings.
#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(rename = "Title", default)]
    title: String,
    #[serde(rename = "Author", default)]
    author: String,
    #[serde(rename = "Genre", default)]
    genre: String,
    #[serde(rename = "Skill_Level", default)]
    skill_level: String,
    #[serde(rename = "Location", default)]
    location: String,
    #[serde(rename = "Available", default)]
    available: String,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    books: Vec<Book>,
}

impl Catalog {
    pub fn new(books: Vec<Book>) -> Self {
        Self { books }
    }

    /// Read the catalog from a CSV file.
    pub fn load(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open catalog file: {}", path.display()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to read catalog file: {}", path.display()))
    }

    /// Like [`Catalog::load`], but a missing or unreadable file yields an
    /// empty catalog and a message suitable for showing to the user.
    pub fn load_or_empty(path: &Path) -> (Self, Option<String>) {
        match Self::load(path) {
            Ok(catalog) => {
                tracing::info!(path = %path.display(), books = catalog.len(), "catalog loaded");
                (catalog, None)
            }
            Err(e) => {
                let detail = format!("{:#}", e);
                tracing::warn!(path = %path.display(), error = %detail, "catalog unavailable");
                (
                    Self::default(),
                    Some(format!(
                        "The book catalog could not be loaded ({}). Search results will be empty.",
                        path.display()
                    )),
                )
            }
        }
    }

    /// Parse CSV from any reader. Rows with an empty title or an availability
    /// other than Yes/No are skipped with a warning.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let mut books = Vec::new();
        for (idx, row) in rdr.deserialize::<CatalogRow>().enumerate() {
            // Header is line 1
            let line = idx + 2;
            let row = row.with_context(|| format!("malformed catalog row at line {}", line))?;

            if row.title.is_empty() {
                tracing::warn!(line, "skipping catalog row with empty title");
                continue;
            }
            let available = match row.available.parse::<Availability>() {
                Ok(a) => a,
                Err(e) => {
                    tracing::warn!(line, title = %row.title, error = %e, "skipping catalog row");
                    continue;
                }
            };

            books.push(Book {
                title: row.title,
                author: row.author,
                genre: row.genre,
                skill_level: row.skill_level,
                location: row.location,
                available,
            });
        }

        Ok(Self { books })
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn len(&self) -> usize {
        self.books.len()
    }

    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    /// Books whose title contains `query`.
    pub fn search(&self, query: &str) -> Vec<Book> {
        let needle = query.to_lowercase();
        self.books
            .iter()
            .filter(|b| contains_ci(&b.title, &needle))
            .cloned()
            .collect()
    }

    /// Books whose genre contains `genre` and whose skill level contains
    /// `skill_level`. An empty filter matches everything.
    pub fn recommend(&self, genre: &str, skill_level: &str) -> Vec<Book> {
        let genre = genre.to_lowercase();
        let skill = skill_level.to_lowercase();
        self.books
            .iter()
            .filter(|b| contains_ci(&b.genre, &genre) && contains_ci(&b.skill_level, &skill))
            .cloned()
            .collect()
    }

    /// First book whose title contains `title`.
    pub fn find(&self, title: &str) -> Option<&Book> {
        let needle = title.to_lowercase();
        self.books.iter().find(|b| contains_ci(&b.title, &needle))
    }

    pub fn find_mut(&mut self, title: &str) -> Option<&mut Book> {
        let needle = title.to_lowercase();
        self.books.iter_mut().find(|b| contains_ci(&b.title, &needle))
    }

    pub fn check_availability(&self, title: &str) -> String {
        match self.find(title) {
            Some(book) if book.available.is_available() => format!("'{}' is available!", title),
            _ => format!("'{}' is not available.", title),
        }
    }

    /// First book whose full title appears somewhere in `text`.
    pub fn find_mentioned(&self, text: &str) -> Option<&Book> {
        let text = text.to_lowercase();
        self.books
            .iter()
            .find(|b| text.contains(&b.title.to_lowercase()))
    }

    /// First genre that appears somewhere in `text`.
    pub fn genre_mentioned(&self, text: &str) -> Option<String> {
        let text = text.to_lowercase();
        self.genres()
            .into_iter()
            .find(|g| text.contains(&g.to_lowercase()))
    }

    /// Up to `n` randomly chosen books whose genre equals `genre`.
    pub fn sample_genre<R: Rng + ?Sized>(&self, genre: &str, n: usize, rng: &mut R) -> Vec<Book> {
        let matching: Vec<&Book> = self
            .books
            .iter()
            .filter(|b| b.genre.to_lowercase() == genre.to_lowercase())
            .collect();
        matching
            .choose_multiple(rng, n.min(matching.len()))
            .map(|b| (*b).clone())
            .collect()
    }

    pub fn genres(&self) -> Vec<String> {
        distinct(self.books.iter().map(|b| b.genre.as_str()))
    }

    pub fn skill_levels(&self) -> Vec<String> {
        distinct(self.books.iter().map(|b| b.skill_level.as_str()))
    }

    pub fn titles(&self) -> Vec<String> {
        distinct(self.books.iter().map(|b| b.title.as_str()))
    }
}

fn contains_ci(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

/// Non-empty values in first-seen order.
fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for v in values {
        if !v.is_empty() && !out.iter().any(|seen| seen == v) {
            out.push(v.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const CSV: &str = "\
Title,Author,Genre,Skill_Level,Location,Available
Python Crash Course,Eric Matthes,Programming,Beginner,Shelf A1,Yes
Fluent Python,Luciano Ramalho,Programming,Advanced,Shelf A2,No
Deep Learning,Ian Goodfellow,AI,Advanced,Shelf B1,Yes
Clean Code,Robert Martin,Software Engineering,Intermediate,Shelf C3,yes
Mystery Row,Nobody,Programming,Beginner,Shelf Z9,Perhaps
,Anonymous,AI,Beginner,Shelf Z1,Yes
";

    fn catalog() -> Catalog {
        Catalog::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_load_skips_invalid_rows() {
        let c = catalog();
        assert_eq!(c.len(), 4);
        assert!(c.books().iter().all(|b| b.title != "Mystery Row"));
        assert_eq!(c.books()[3].available, Availability::Yes);
    }

    #[test]
    fn test_load_missing_file_degrades_to_empty() {
        let (c, warning) = Catalog::load_or_empty(Path::new("/nonexistent/books.csv"));
        assert!(c.is_empty());
        assert!(warning.unwrap().contains("could not be loaded"));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), CSV).unwrap();
        let (c, warning) = Catalog::load_or_empty(tmp.path());
        assert!(warning.is_none());
        assert_eq!(c.len(), 4);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let c = catalog();
        let titles: Vec<String> = c.search("PYTHON").into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["Python Crash Course", "Fluent Python"]);
        assert!(c.search("haskell").is_empty());
    }

    #[test]
    fn test_recommend_filters_on_both_fields() {
        let c = catalog();
        let recs = c.recommend("programming", "advanced");
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Fluent Python");

        assert_eq!(c.recommend("", "advanced").len(), 2);
        assert!(c.recommend("poetry", "").is_empty());
    }

    #[test]
    fn test_check_availability_messages() {
        let c = catalog();
        assert_eq!(c.check_availability("deep"), "'deep' is available!");
        assert_eq!(
            c.check_availability("Fluent Python"),
            "'Fluent Python' is not available."
        );
        assert_eq!(c.check_availability("Dune"), "'Dune' is not available.");
    }

    #[test]
    fn test_distinct_lists_keep_first_seen_order() {
        let c = catalog();
        assert_eq!(c.genres(), vec!["Programming", "AI", "Software Engineering"]);
        assert_eq!(c.skill_levels(), vec!["Beginner", "Advanced", "Intermediate"]);
        assert_eq!(c.titles().len(), 4);
    }

    #[test]
    fn test_mentions() {
        let c = catalog();
        let book = c.find_mentioned("do you have clean code in stock?").unwrap();
        assert_eq!(book.author, "Robert Martin");
        assert!(c.find_mentioned("anything on gardening").is_none());
        assert_eq!(
            c.genre_mentioned("recommend some ai books").as_deref(),
            Some("AI")
        );
    }

    #[test]
    fn test_sample_genre_caps_at_available_count() {
        let c = catalog();
        let mut rng = StdRng::seed_from_u64(7);
        let picks = c.sample_genre("programming", 3, &mut rng);
        assert_eq!(picks.len(), 2);
        assert!(picks.iter().all(|b| b.genre == "Programming"));
        assert!(c.sample_genre("poetry", 3, &mut rng).is_empty());
    }
}
