//! Recursive character splitter with exact overlap.
//!
//! Text is cut on the coarsest separator that still works (`"\n\n"`, then
//! `"\n"`, then `" "`, then between characters). Separators stay attached to
//! the piece before them, so the pieces concatenate back to the input. Pieces
//! are packed greedily into chunks of at most `chunk_size` characters; every
//! chunk after the first starts with the last `chunk_overlap` characters of its
//! predecessor. Sizes are counted in `char`s.

use tracing::{debug, trace};

use crate::errors::RagError;
use crate::record::{Chunk, Document};

/// Separators from coarsest to finest; `""` means "between characters".
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub const DEFAULT_CHUNK_SIZE: usize = 512;
pub const DEFAULT_CHUNK_OVERLAP: usize = 64;

/// Configured splitter. Construct through [`Chunker::new`], which validates sizes.
#[derive(Clone, Copy, Debug)]
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// # Errors
    /// [`RagError::Config`] unless `chunk_size > 0` and `chunk_overlap < chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, RagError> {
        if chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be > 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(RagError::Config(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Splits every document, copying its metadata onto each chunk.
    pub fn chunk_documents(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut out = Vec::new();
        for doc in documents {
            let pieces = self.split_text(doc.content());
            trace!(source = ?doc.source(), chunks = pieces.len(), "document split");
            out.extend(
                pieces
                    .into_iter()
                    .map(|text| Chunk::with_metadata(text, doc.metadata().clone())),
            );
        }
        debug!(
            documents = documents.len(),
            chunks = out.len(),
            chunk_size = self.chunk_size,
            chunk_overlap = self.chunk_overlap,
            "chunking finished"
        );
        out
    }

    /// Splits one text into chunk strings.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if char_len(text) <= self.chunk_size {
            return vec![text.to_string()];
        }

        // Room left in a chunk once the overlap is carried over.
        let atom_max = self.chunk_size - self.chunk_overlap;
        let mut atoms = Vec::new();
        atomize(text, &SEPARATORS, atom_max, &mut atoms);

        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for atom in atoms {
            let atom_len = char_len(atom);
            if current_len + atom_len <= self.chunk_size {
                current.push_str(atom);
                current_len += atom_len;
                continue;
            }
            // `atom_len <= atom_max` so `current_len > chunk_overlap` here.
            let mut next = tail_chars(&current, self.chunk_overlap).to_string();
            next.push_str(atom);
            chunks.push(std::mem::replace(&mut current, next));
            current_len = self.chunk_overlap + atom_len;
        }
        if !current.is_empty() {
            chunks.push(current);
        }

        // Interior blank chunks stay: dropping one would break the overlap chain.
        let is_blank = |c: &String| c.trim().is_empty();
        let Some(first) = chunks.iter().position(|c| !is_blank(c)) else {
            return Vec::new();
        };
        let last = chunks.iter().rposition(|c| !is_blank(c)).unwrap_or(first);
        chunks.truncate(last + 1);
        chunks.drain(..first);
        chunks
    }
}

/// Splits `documents` with an ad-hoc chunker.
///
/// # Errors
/// [`RagError::Config`] for invalid sizes, see [`Chunker::new`].
pub fn chunk(
    documents: &[Document],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Result<Vec<Chunk>, RagError> {
    Ok(Chunker::new(chunk_size, chunk_overlap)?.chunk_documents(documents))
}

/// Breaks `text` into pieces of at most `max` chars, preferring coarse separators.
fn atomize<'a>(text: &'a str, separators: &[&str], max: usize, out: &mut Vec<&'a str>) {
    if char_len(text) <= max {
        out.push(text);
        return;
    }
    let Some(pos) = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
    else {
        hard_split(text, max, out);
        return;
    };
    let sep = separators[pos];
    if sep.is_empty() {
        hard_split(text, max, out);
        return;
    }
    let finer = &separators[pos + 1..];
    for piece in text.split_inclusive(sep) {
        if char_len(piece) <= max {
            out.push(piece);
        } else {
            atomize(piece, finer, max, out);
        }
    }
}

fn hard_split<'a>(text: &'a str, max: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (idx, _) in text.char_indices() {
        if count == max {
            out.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Last `n` characters of `s` (all of `s` when shorter).
fn tail_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    match s.char_indices().rev().nth(n - 1) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
