//! Lexical retrieval over a local directory of `.txt` / `.md` documents.
//!
//! Documents are re-read on every query; nothing is cached. Each document
//! is cut into overlapping chunks, and each chunk is scored by how often
//! the question's tokens occur in it. An optional domain hint adds a flat
//! bonus to chunks from files whose name contains the hint.
//!
//! Unreadable or non-UTF-8 files are skipped silently: retrieval is
//! best-effort and never fails.

pub mod text;

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::RetrievalConfig;

const DOC_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 3;
/// Default bonus for a domain-hint filename match.
pub const DEFAULT_HINT_BONUS: usize = 4;

const NO_CONTEXT: &str = "(No se encontraron fragmentos locales relevantes.)";
const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

/// A local document, identified by its file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub name: String,
    pub content: String,
}

/// A scored slice of a [`Document`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub source: String,
    pub text: String,
    pub score: usize,
}

/// Read every `.txt` / `.md` file directly inside `dir`, sorted by name.
///
/// A missing directory yields an empty list.
pub fn load_documents(dir: &Path) -> Vec<Document> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "docs directory not readable");
            return Vec::new();
        }
    };

    let mut docs: Vec<Document> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && has_doc_extension(path))
        .filter_map(|path| {
            let name = path.file_name()?.to_string_lossy().into_owned();
            match fs::read_to_string(&path) {
                Ok(content) => Some(Document { name, content }),
                Err(e) => {
                    debug!(file = %path.display(), error = %e, "skipping unreadable document");
                    None
                }
            }
        })
        .collect();

    docs.sort_by(|a, b| a.name.cmp(&b.name));
    docs
}

fn has_doc_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DOC_EXTENSIONS.iter().any(|d| e.eq_ignore_ascii_case(d)))
}

/// Sum, over every question token (with repetition), of its occurrences in
/// `chunk_text`.
pub fn score_chunk(question_tokens: &[String], chunk_text: &str) -> usize {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in text::tokenize(chunk_text) {
        *counts.entry(token).or_default() += 1;
    }
    question_tokens
        .iter()
        .map(|t| counts.get(t).copied().unwrap_or(0))
        .sum()
}

/// Render retrieved chunks as a labelled block for prompt injection.
pub fn format_context(results: &[Chunk]) -> String {
    if results.is_empty() {
        return NO_CONTEXT.to_string();
    }
    results
        .iter()
        .map(|c| format!("[Fuente: {}]\n{}", c.source, c.text.trim()))
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// Distinct source names of `results`, sorted alphabetically.
pub fn sources(results: &[Chunk]) -> Vec<String> {
    results
        .iter()
        .map(|c| c.source.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ── Retriever ────────────────────────────────────────────────────────────────

/// Scores chunks of the documents in one directory against a question.
#[derive(Debug, Clone)]
pub struct Retriever {
    docs_dir: PathBuf,
    chunk_size: usize,
    chunk_overlap: usize,
    hint_bonus: usize,
}

impl Retriever {
    /// Retriever with the default chunking (800 / 120) and hint bonus (4).
    pub fn new(docs_dir: impl Into<PathBuf>) -> Self {
        Self {
            docs_dir: docs_dir.into(),
            chunk_size: text::DEFAULT_CHUNK_SIZE,
            chunk_overlap: text::DEFAULT_CHUNK_OVERLAP,
            hint_bonus: DEFAULT_HINT_BONUS,
        }
    }

    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self {
            docs_dir: config.docs_dir.clone(),
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
            hint_bonus: config.hint_bonus,
        }
    }

    pub fn with_chunking(mut self, size: usize, overlap: usize) -> Self {
        self.chunk_size = size;
        self.chunk_overlap = overlap;
        self
    }

    pub fn load_documents(&self) -> Vec<Document> {
        load_documents(&self.docs_dir)
    }

    /// Return up to `top_k` positively scored chunks, best first.
    ///
    /// Equal scores keep discovery order (documents by name, chunks in
    /// document order).
    pub fn retrieve(&self, question: &str, top_k: usize, domain_hint: &str) -> Vec<Chunk> {
        let question_tokens = text::tokenize(question);
        let hint = domain_hint.to_lowercase();

        let mut candidates: Vec<Chunk> = Vec::new();
        for doc in self.load_documents() {
            let bonus = if !hint.is_empty() && doc.name.to_lowercase().contains(&hint) {
                self.hint_bonus
            } else {
                0
            };
            for piece in text::chunk(&doc.content, self.chunk_size, self.chunk_overlap) {
                let score = score_chunk(&question_tokens, &piece) + bonus;
                if score > 0 {
                    candidates.push(Chunk { source: doc.name.clone(), text: piece, score });
                }
            }
        }

        // `sort_by` is stable: ties keep discovery order.
        candidates.sort_by(|a, b| b.score.cmp(&a.score));
        candidates.truncate(top_k);

        debug!(
            docs_dir = %self.docs_dir.display(),
            hint = %domain_hint,
            hits = candidates.len(),
            "retrieval finished"
        );
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn docs(files: &[(&str, &str)]) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        dir
    }

    fn toks(s: &str) -> Vec<String> {
        text::tokenize(s)
    }

    #[test]
    fn load_documents_filters_extensions_and_sorts() {
        let dir = docs(&[
            ("zeta.md", "z"),
            ("alpha.TXT", "a"),
            ("image.png", "binary"),
            ("notes", "no extension"),
        ]);
        fs::create_dir(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("nested/inner.txt"), "ignored").unwrap();

        let names: Vec<_> = load_documents(dir.path()).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["alpha.TXT", "zeta.md"]);
    }

    #[test]
    fn load_documents_skips_invalid_utf8() {
        let dir = docs(&[("ok.txt", "bien")]);
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0x00, 0xc3]).unwrap();
        let loaded = load_documents(dir.path());
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].name, "ok.txt");
    }

    #[test]
    fn load_documents_missing_dir_is_empty() {
        assert!(load_documents(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn score_counts_question_multiplicity() {
        assert_eq!(score_chunk(&toks("beca"), "beca beca nota"), 2);
        assert_eq!(score_chunk(&toks("beca beca"), "beca beca nota"), 4);
        assert_eq!(score_chunk(&toks("examen"), "beca nota"), 0);
        assert_eq!(score_chunk(&[], "beca"), 0);
    }

    #[test]
    fn retrieve_ranks_by_score_and_truncates() {
        let dir = docs(&[
            ("a.txt", "nota nota nota"),
            ("b.txt", "nota"),
            ("c.txt", "nota nota"),
            ("d.txt", "sin coincidencias"),
        ]);
        let hits = Retriever::new(dir.path()).retrieve("nota", 2, "");
        let got: Vec<_> = hits.iter().map(|c| (c.source.as_str(), c.score)).collect();
        assert_eq!(got, vec![("a.txt", 3), ("c.txt", 2)]);
    }

    #[test]
    fn retrieve_ties_keep_discovery_order() {
        let dir = docs(&[("b.txt", "retiro"), ("a.txt", "retiro"), ("c.txt", "retiro")]);
        let r = Retriever::new(dir.path());
        let first: Vec<_> = r.retrieve("retiro", 3, "").into_iter().map(|c| c.source).collect();
        assert_eq!(first, vec!["a.txt", "b.txt", "c.txt"]);
        for _ in 0..5 {
            let again: Vec<_> = r.retrieve("retiro", 3, "").into_iter().map(|c| c.source).collect();
            assert_eq!(again, first);
        }
    }

    #[test]
    fn hint_bonus_lifts_matching_document() {
        let dir = docs(&[("general.txt", "plazo"), ("reglamento.txt", "plazo")]);
        let r = Retriever::new(dir.path());

        let plain = r.retrieve("plazo", 2, "");
        assert_eq!(plain[0].source, "general.txt");

        let hinted = r.retrieve("plazo", 2, "Reglamento");
        assert_eq!(hinted[0].source, "reglamento.txt");
        assert_eq!(hinted[0].score, 1 + DEFAULT_HINT_BONUS);
        assert_eq!(hinted[1].score, 1);
    }

    #[test]
    fn hint_alone_makes_chunks_eligible() {
        let dir = docs(&[("becas.md", "texto sin relación")]);
        let hits = Retriever::new(dir.path()).retrieve("horario", 3, "beca");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].score, DEFAULT_HINT_BONUS);
    }

    #[test]
    fn beca_question_finds_becas_document() {
        let dir = docs(&[
            ("becas.txt", "Los requisitos de la beca incluyen matrícula vigente y registro social."),
            ("horarios.txt", "La secretaría atiende de lunes a viernes."),
        ]);
        let hits = Retriever::new(dir.path())
            .retrieve("¿Cuáles son los requisitos para la beca?", 3, "beca");
        let becas = hits.iter().find(|c| c.source == "becas.txt").expect("becas.txt retrieved");
        assert!(becas.score > 0);
        assert_eq!(hits[0].source, "becas.txt");
    }

    #[test]
    fn retrieve_empty_dir_or_no_match() {
        let empty = tempfile::tempdir().unwrap();
        assert!(Retriever::new(empty.path()).retrieve("beca", 3, "").is_empty());

        let dir = docs(&[("a.txt", "nada que ver")]);
        assert!(Retriever::new(dir.path()).retrieve("beca", 3, "").is_empty());
    }

    #[test]
    fn retrieve_scores_each_chunk() {
        let body = format!("{} beca", "x ".repeat(30));
        let dir = docs(&[("largo.txt", &body)]);
        let hits = Retriever::new(dir.path()).with_chunking(20, 5).retrieve("beca", 10, "");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].text.contains("beca"));
    }

    #[test]
    fn format_context_labels_and_separates() {
        let results = vec![
            Chunk { source: "b.txt".into(), text: "  segundo  ".into(), score: 1 },
            Chunk { source: "a.txt".into(), text: "primero".into(), score: 1 },
        ];
        assert_eq!(
            format_context(&results),
            "[Fuente: b.txt]\nsegundo\n\n---\n\n[Fuente: a.txt]\nprimero"
        );
    }

    #[test]
    fn format_context_empty_message() {
        assert!(format_context(&[]).contains("No se encontraron fragmentos"));
    }

    #[test]
    fn sources_are_distinct_and_sorted() {
        let results = vec![
            Chunk { source: "z.md".into(), text: String::new(), score: 3 },
            Chunk { source: "a.txt".into(), text: String::new(), score: 2 },
            Chunk { source: "z.md".into(), text: String::new(), score: 1 },
        ];
        assert_eq!(sources(&results), vec!["a.txt", "z.md"]);
    }
}
