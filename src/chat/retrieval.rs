//! Reference document index for grounded answers
//!
//! Documents are read once at start-up, split into overlapping chunks and
//! ranked against a question by TF-IDF cosine similarity. Plain text,
//! markdown and PDF documents are indexed; anything else is skipped.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];
const PDF_EXTENSION: &str = "pdf";

/// Separators tried in order when a piece of text is longer than a chunk
const SEPARATORS: &[&str] = &["\n\n", "\n", " "];

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "by", "do", "does", "for", "from", "how", "in", "is",
    "it", "of", "on", "or", "that", "the", "this", "to", "was", "what", "when", "where", "which",
    "who", "why", "with",
];

#[derive(Debug, Clone)]
pub struct Chunk {
    pub source: PathBuf,
    pub text: String,
    weights: HashMap<String, f64>,
    norm: f64,
}

/// Searchable chunks of the reference corpus
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    chunks: Vec<Chunk>,
    idf: HashMap<String, f64>,
    documents: usize,
}

impl DocumentIndex {
    /// Scan `dir` recursively and index every readable text document.
    ///
    /// Returns `None` when the directory is missing or yields no text, in
    /// which case grounded answering is disabled.
    pub fn build(dir: &Path, chunk_size: usize, overlap: usize) -> Option<Self> {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "reference document directory not found, grounded answers disabled");
            return None;
        }

        let mut docs = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .map(str::to_ascii_lowercase)
                .unwrap_or_default();
            let text = if ext == PDF_EXTENSION {
                read_pdf(path)
            } else if TEXT_EXTENSIONS.contains(&ext.as_str()) {
                std::fs::read_to_string(path).map_err(|e| e.to_string())
            } else {
                debug!(file = %path.display(), "skipping unsupported document");
                continue;
            };
            match text {
                Ok(text) if !text.trim().is_empty() => docs.push((path.to_path_buf(), text)),
                Ok(_) => debug!(file = %path.display(), "skipping document without text"),
                Err(e) => warn!(file = %path.display(), error = %e, "skipping unreadable document"),
            }
        }

        let index = Self::from_documents(docs, chunk_size, overlap)?;
        info!(
            documents = index.documents,
            chunks = index.chunks.len(),
            "reference documents indexed"
        );
        Some(index)
    }

    /// Index in-memory documents; `None` if there is nothing to index
    pub fn from_documents(
        docs: Vec<(PathBuf, String)>,
        chunk_size: usize,
        overlap: usize,
    ) -> Option<Self> {
        let chunk_size = chunk_size.max(1);
        let overlap = overlap.min(chunk_size.saturating_sub(1));

        let mut raw_chunks = Vec::new();
        let documents = docs.len();
        for (source, text) in docs {
            for chunk in split_text(&text, chunk_size, overlap) {
                let terms = term_counts(&chunk);
                if !terms.is_empty() {
                    raw_chunks.push((source.clone(), chunk, terms));
                }
            }
        }
        if raw_chunks.is_empty() {
            return None;
        }

        let mut df: HashMap<String, usize> = HashMap::new();
        for (_, _, terms) in &raw_chunks {
            for term in terms.keys() {
                *df.entry(term.clone()).or_default() += 1;
            }
        }
        let n = raw_chunks.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, count)| (term, ((n + 1.0) / (count as f64 + 1.0)).ln() + 1.0))
            .collect();

        let chunks = raw_chunks
            .into_iter()
            .map(|(source, text, terms)| {
                let weights: HashMap<String, f64> = terms
                    .into_iter()
                    .map(|(term, tf)| {
                        let w = tf as f64 * idf[&term];
                        (term, w)
                    })
                    .collect();
                let norm = weights.values().map(|w| w * w).sum::<f64>().sqrt();
                Chunk {
                    source,
                    text,
                    weights,
                    norm,
                }
            })
            .collect();

        Some(Self {
            chunks,
            idf,
            documents,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Up to `k` chunks sharing vocabulary with `query`, best first
    pub fn search(&self, query: &str, k: usize) -> Vec<&Chunk> {
        let query: HashMap<String, f64> = term_counts(query)
            .into_iter()
            .filter_map(|(term, tf)| self.idf.get(&term).map(|idf| (term, tf as f64 * idf)))
            .collect();
        let query_norm = query.values().map(|w| w * w).sum::<f64>().sqrt();
        if query_norm == 0.0 {
            return Vec::new();
        }

        let mut scored: Vec<(f64, usize)> = self
            .chunks
            .iter()
            .enumerate()
            .filter_map(|(i, chunk)| {
                let dot: f64 = query
                    .iter()
                    .filter_map(|(term, w)| chunk.weights.get(term).map(|cw| w * cw))
                    .sum();
                (dot > 0.0).then(|| (dot / (query_norm * chunk.norm), i))
            })
            .collect();
        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then(a.1.cmp(&b.1)));
        scored
            .into_iter()
            .take(k)
            .map(|(_, i)| &self.chunks[i])
            .collect()
    }
}

/// Text layer of a PDF. Scanned pages without text yield an empty string.
fn read_pdf(path: &Path) -> Result<String, String> {
    let bytes = std::fs::read(path).map_err(|e| e.to_string())?;
    // the extractor panics on some malformed files instead of erroring
    match std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&bytes)) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err("PDF extractor failed on malformed input".to_string()),
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
        .map(str::to_lowercase)
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
}

fn term_counts(text: &str) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for token in tokens(text) {
        *counts.entry(token).or_default() += 1;
    }
    counts
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Break `text` into pieces no longer than `size`, preferring paragraph,
/// then line, then word boundaries.
fn pieces(text: &str, size: usize, separators: &[&str]) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    if char_len(trimmed) <= size {
        return vec![trimmed.to_string()];
    }
    match separators.split_first() {
        Some((sep, rest)) => trimmed
            .split(sep)
            .flat_map(|part| pieces(part, size, rest))
            .collect(),
        None => trimmed
            .chars()
            .collect::<Vec<_>>()
            .chunks(size)
            .map(|c| c.iter().collect())
            .collect(),
    }
}

fn joined_len(window: &VecDeque<String>) -> usize {
    window.iter().map(|p| char_len(p)).sum::<usize>() + window.len().saturating_sub(1)
}

/// Split into chunks of at most `size` characters; consecutive chunks share
/// up to `overlap` characters of trailing pieces.
pub fn split_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();

    for piece in pieces(text, size, SEPARATORS) {
        let piece_len = char_len(&piece);
        if !window.is_empty() && joined_len(&window) + 1 + piece_len > size {
            chunks.push(window.iter().map(String::as_str).collect::<Vec<_>>().join(" "));
            while !window.is_empty()
                && (joined_len(&window) > overlap || joined_len(&window) + 1 + piece_len > size)
            {
                window.pop_front();
            }
        }
        window.push_back(piece);
    }
    if !window.is_empty() {
        chunks.push(window.iter().map(String::as_str).collect::<Vec<_>>().join(" "));
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn doc(name: &str, text: &str) -> (PathBuf, String) {
        (PathBuf::from(name), text.to_string())
    }

    #[test]
    fn test_split_short_text_is_one_chunk() {
        assert_eq!(split_text("  hello grid  ", 100, 10), vec!["hello grid"]);
        assert!(split_text("   \n\n ", 100, 10).is_empty());
    }

    #[test]
    fn test_split_respects_size_and_overlap() {
        let text = (0..200).map(|i| format!("w{i:03}")).collect::<Vec<_>>().join(" ");
        let chunks = split_text(&text, 50, 10);
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(char_len(c) <= 50, "chunk too long: {c:?}");
        }
        // consecutive chunks share their boundary words
        for pair in chunks.windows(2) {
            let last = pair[0].split(' ').last().unwrap();
            let first = pair[1].split(' ').next().unwrap();
            assert!(pair[1].contains(last), "{:?} / {:?}", pair[0], pair[1]);
            assert!(pair[0].contains(first), "{:?} / {:?}", pair[0], pair[1]);
        }
        assert!(chunks.last().unwrap().ends_with("w199"));
    }

    #[test]
    fn test_split_prefers_paragraphs() {
        let text = "first paragraph here\n\nsecond paragraph here";
        let chunks = split_text(text, 25, 0);
        assert_eq!(chunks, vec!["first paragraph here", "second paragraph here"]);
    }

    #[test]
    fn test_split_breaks_long_words() {
        let chunks = split_text(&"x".repeat(25), 10, 0);
        assert_eq!(chunks, vec!["x".repeat(10), "x".repeat(10), "x".repeat(5)]);
    }

    #[test]
    fn test_search_ranks_relevant_chunks_first() {
        let index = DocumentIndex::from_documents(
            vec![
                doc("a.txt", "Transformers change voltage levels between transmission and distribution."),
                doc("b.txt", "Solar panels produce more energy at noon on clear days."),
                doc("c.txt", "Distribution transformers are often mounted on poles."),
            ],
            1000,
            100,
        )
        .unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.search("How do transformers change voltage?", 3);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, PathBuf::from("a.txt"));
        assert_eq!(hits[1].source, PathBuf::from("c.txt"));

        assert_eq!(index.search("transformers", 1).len(), 1);
        assert!(index.search("cryptocurrency mining", 3).is_empty());
        assert!(index.search("what is the", 3).is_empty());
    }

    #[test]
    fn test_empty_corpus_is_none() {
        assert!(DocumentIndex::from_documents(vec![], 1000, 100).is_none());
        assert!(DocumentIndex::from_documents(vec![doc("a.txt", "a ! ?")], 1000, 100).is_none());
    }

    #[test]
    fn test_build_from_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("grid.txt"), "Substations connect feeders to the transmission grid.").unwrap();
        fs::write(dir.path().join("nested/notes.MD"), "Feeder load peaks in the evening.").unwrap();
        fs::write(dir.path().join("manual.pdf"), b"%PDF-1.4 binary").unwrap();
        fs::write(dir.path().join("empty.txt"), "   ").unwrap();

        let index = DocumentIndex::build(dir.path(), 1000, 100).unwrap();
        assert_eq!(index.documents, 2);
        assert_eq!(index.len(), 2);
        let hits = index.search("when does feeder load peak", 3);
        assert_eq!(hits[0].source, dir.path().join("nested/notes.MD"));
    }

    #[test]
    fn test_build_indexes_pdf_text() {
        let dir = TempDir::new().unwrap();
        fs::copy(
            "tests/fixtures/docs/substations.pdf",
            dir.path().join("substations.pdf"),
        )
        .unwrap();
        fs::write(dir.path().join("solar.txt"), "Solar panels produce more energy at noon.").unwrap();

        let index = DocumentIndex::build(dir.path(), 1000, 100).unwrap();
        assert_eq!(index.documents, 2);

        let hits = index.search("Why do substations step voltage down?", 3);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].source, dir.path().join("substations.pdf"));
        assert!(hits[0].text.contains("voltage"));
    }

    #[test]
    fn test_build_without_usable_documents() {
        let dir = TempDir::new().unwrap();
        assert!(DocumentIndex::build(dir.path(), 1000, 100).is_none());
        fs::write(dir.path().join("scan.pdf"), b"%PDF").unwrap();
        assert!(DocumentIndex::build(dir.path(), 1000, 100).is_none());
        assert!(DocumentIndex::build(&dir.path().join("missing"), 1000, 100).is_none());
    }
}
