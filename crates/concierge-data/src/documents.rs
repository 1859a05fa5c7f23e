use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::DataError;

/// Separators tried in order when a piece of text is too long for one chunk.
/// The empty separator splits between characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// A source text file.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub source: PathBuf,
    pub text: String,
}

/// A piece of a document small enough to embed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    pub source: String,
    pub text: String,
}

/// The document directory for `client`, or the default client's when the
/// client has none. Directory names are the lowercased client identifier.
pub fn resolve_documents_dir(
    root: &Path,
    client: &str,
    default_client: &str,
) -> Result<PathBuf, DataError> {
    let dir = root.join(client.to_lowercase());
    if dir.is_dir() {
        return Ok(dir);
    }

    let fallback = root.join(default_client.to_lowercase());
    warn!(
        client = %client,
        missing = %dir.display(),
        fallback = %fallback.display(),
        "No documents for client, using default client's documents"
    );
    if fallback.is_dir() {
        Ok(fallback)
    } else {
        Err(DataError::Documents(format!(
            "neither {} nor {} exists",
            dir.display(),
            fallback.display()
        )))
    }
}

/// Read every `.txt` file under `dir`, recursively, in path order.
pub fn load_documents(dir: &Path) -> Result<Vec<Document>, DataError> {
    let mut paths = Vec::new();
    collect_txt_files(dir, &mut paths)?;
    paths.sort();

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let text = std::fs::read_to_string(&path)?;
        documents.push(Document { source: path, text });
    }
    debug!(dir = %dir.display(), count = documents.len(), "Loaded documents");
    Ok(documents)
}

fn collect_txt_files(dir: &Path, out: &mut Vec<PathBuf>) -> Result<(), DataError> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_txt_files(&path, out)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            out.push(path);
        }
    }
    Ok(())
}

/// Split every document into chunks, keeping the source path on each.
pub fn chunk_documents(documents: &[Document], chunk_size: usize, overlap: usize) -> Vec<Chunk> {
    documents
        .iter()
        .flat_map(|doc| {
            let source = doc.source.display().to_string();
            split_text(&doc.text, chunk_size, overlap)
                .into_iter()
                .map(move |text| Chunk {
                    source: source.clone(),
                    text,
                })
        })
        .collect()
}

/// Recursive character splitter.
///
/// Splits on the coarsest separator present, recursing into pieces still
/// longer than `chunk_size` characters, then greedily merges neighbours back
/// together. Consecutive chunks share up to `overlap` characters of
/// trailing pieces.
pub fn split_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let chunk_size = chunk_size.max(1);
    let overlap = overlap.min(chunk_size.saturating_sub(1));
    split_recursive(text, &SEPARATORS, chunk_size, overlap)
}

fn split_recursive(text: &str, separators: &[&str], chunk_size: usize, overlap: usize) -> Vec<String> {
    let position = separators
        .iter()
        .position(|sep| sep.is_empty() || text.contains(sep))
        .unwrap_or(separators.len().saturating_sub(1));
    let separator = separators.get(position).copied().unwrap_or("");
    let finer = separators.get(position + 1..).unwrap_or(&[]);

    let pieces: Vec<&str> = if separator.is_empty() {
        text.char_indices()
            .map(|(i, ch)| &text[i..i + ch.len_utf8()])
            .collect()
    } else {
        text.split(separator).filter(|p| !p.is_empty()).collect()
    };

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    for piece in pieces {
        if char_len(piece) <= chunk_size {
            pending.push(piece);
            continue;
        }
        if !pending.is_empty() {
            chunks.extend(merge_pieces(&pending, separator, chunk_size, overlap));
            pending.clear();
        }
        if finer.is_empty() {
            chunks.push(piece.trim().to_string());
        } else {
            chunks.extend(split_recursive(piece, finer, chunk_size, overlap));
        }
    }
    if !pending.is_empty() {
        chunks.extend(merge_pieces(&pending, separator, chunk_size, overlap));
    }

    chunks.retain(|c| !c.is_empty());
    chunks
}

fn merge_pieces(pieces: &[&str], separator: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let sep_len = char_len(separator);
    let mut merged = Vec::new();
    let mut window: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
        let len = char_len(piece);
        if total + len + joiner_len(&window, sep_len) > chunk_size && !window.is_empty() {
            push_joined(&mut merged, &window, separator);
            // Drop leading pieces until what remains fits the overlap and leaves room.
            while total > overlap || (total > 0 && total + len + joiner_len(&window, sep_len) > chunk_size) {
                let Some(first) = window.pop_front() else {
                    break;
                };
                total -= char_len(first) + joiner_len(&window, sep_len);
            }
        }

        total += len + joiner_len(&window, sep_len);
        window.push_back(piece);
    }

    if !window.is_empty() {
        push_joined(&mut merged, &window, separator);
    }
    merged
}

/// Separator length to add when appending to `window`.
fn joiner_len(window: &VecDeque<&str>, sep_len: usize) -> usize {
    if window.is_empty() {
        0
    } else {
        sep_len
    }
}

fn push_joined(out: &mut Vec<String>, window: &VecDeque<&str>, separator: &str) {
    let joined = window.iter().copied().collect::<Vec<_>>().join(separator);
    let trimmed = joined.trim();
    if !trimmed.is_empty() {
        out.push(trimmed.to_string());
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
