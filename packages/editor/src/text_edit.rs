use crate::errors::ApplyError;
use weft_parser::Span;

/// Primitive replacement of `[start, end)` in the snapshot source.
///
/// `seq` is the edit's position in the batch and keeps insertions at the
/// same offset in batch order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    pub start: usize,
    pub end: usize,
    pub insert: String,
    pub seq: usize,
}

impl TextEdit {
    pub fn replace(span: Span, insert: impl Into<String>, seq: usize) -> Self {
        Self {
            start: span.start,
            end: span.end,
            insert: insert.into(),
            seq,
        }
    }

    pub fn insert_at(offset: usize, insert: impl Into<String>, seq: usize) -> Self {
        Self::replace(Span::new(offset, offset), insert, seq)
    }

    pub fn delete(span: Span, seq: usize) -> Self {
        Self::replace(span, String::new(), seq)
    }

    fn is_insertion(&self) -> bool {
        self.start == self.end
    }

    fn is_deletion(&self) -> bool {
        self.start < self.end && self.insert.is_empty()
    }
}

/// Apply a set of edits computed against `source`.
///
/// Overlapping deletions are merged. Any other overlap, including an
/// insertion strictly inside a deletion, rejects the whole set.
/// Edits are applied from the highest offset down so no edit shifts the
/// offsets of another.
pub fn apply_edits(source: &str, edits: Vec<TextEdit>) -> Result<String, ApplyError> {
    for edit in &edits {
        if edit.start > edit.end
            || edit.end > source.len()
            || !source.is_char_boundary(edit.start)
            || !source.is_char_boundary(edit.end)
        {
            return Err(ApplyError::InvalidEdit(format!(
                "{}..{} is not a valid range of a {} byte source",
                edit.start,
                edit.end,
                source.len()
            )));
        }
    }

    let mut edits = normalize(edits)?;
    edits.sort_by(|a, b| {
        b.start
            .cmp(&a.start)
            .then(b.end.cmp(&a.end))
            .then(b.seq.cmp(&a.seq))
    });

    let mut output = source.to_string();
    for edit in edits {
        output.replace_range(edit.start..edit.end, &edit.insert);
    }
    Ok(output)
}

fn normalize(edits: Vec<TextEdit>) -> Result<Vec<TextEdit>, ApplyError> {
    let (mut deletions, others): (Vec<TextEdit>, Vec<TextEdit>) =
        edits.into_iter().partition(TextEdit::is_deletion);

    deletions.sort_by_key(|d| (d.start, d.end));
    let mut merged: Vec<TextEdit> = Vec::with_capacity(deletions.len());
    for deletion in deletions {
        match merged.last_mut() {
            Some(last) if deletion.start < last.end => {
                last.end = last.end.max(deletion.end);
                last.seq = last.seq.min(deletion.seq);
            }
            _ => merged.push(deletion),
        }
    }

    let mut result = merged;
    result.extend(others);

    // After merging, only touching edits may share offsets
    for (i, a) in result.iter().enumerate() {
        for b in &result[i + 1..] {
            if conflicts(a, b) {
                return Err(ApplyError::OverlappingEdits {
                    start: a.start.max(b.start),
                    end: a.end.min(b.end).max(a.start.max(b.start)),
                });
            }
        }
    }

    Ok(result)
}

fn conflicts(a: &TextEdit, b: &TextEdit) -> bool {
    match (a.is_insertion(), b.is_insertion()) {
        (true, true) => false,
        (true, false) => b.start < a.start && a.start < b.end,
        (false, true) => a.start < b.start && b.start < a.end,
        (false, false) => a.start < b.end && b.start < a.end,
    }
}
