//! Which bytes around a node go with it when it is removed, and which
//! separator goes with a fragment when it is inserted.

use weft_parser::{NodeRef, Span, Tree};

fn is_blank(byte: u8) -> bool {
    byte == b' ' || byte == b'\t'
}

/// Range to delete when removing the node at `span`.
///
/// A node alone on its line takes the whole line with it, newline included
/// (at end of input, the preceding newline instead). An inline node takes
/// the blanks after it when it follows a blank or starts the line.
pub fn deletion_range(source: &str, span: Span) -> Span {
    let bytes = source.as_bytes();
    let len = bytes.len();

    let mut line_start = span.start;
    while line_start > 0 && is_blank(bytes[line_start - 1]) {
        line_start -= 1;
    }
    let starts_line = line_start == 0 || bytes[line_start - 1] == b'\n';

    let mut line_end = span.end;
    while line_end < len && is_blank(bytes[line_end]) {
        line_end += 1;
    }
    let newline_len = match bytes.get(line_end..) {
        Some([b'\n', ..]) => Some(1),
        Some([b'\r', b'\n', ..]) => Some(2),
        Some([]) => Some(0),
        _ => None,
    };

    match newline_len {
        Some(newline) if starts_line => {
            if newline > 0 || line_start == 0 {
                return Span::new(line_start, line_end + newline);
            }
            // Last line: take the newline that ends the previous line
            let mut start = line_start - 1;
            if start > 0 && bytes[start - 1] == b'\r' {
                start -= 1;
            }
            Span::new(start, line_end)
        }
        _ => {
            let follows_blank = span.start == 0 || {
                let before = bytes[span.start - 1];
                is_blank(before) || before == b'\n'
            };
            if follows_blank {
                let mut end = span.end;
                while end < len && is_blank(bytes[end]) {
                    end += 1;
                }
                Span::new(span.start, end)
            } else {
                span
            }
        }
    }
}

/// Whitespace to put between an inserted fragment and its neighbour at
/// child boundary `index` of `parent`, copied from the existing layout
pub fn separator<'s>(source: &'s str, tree: &Tree, parent: NodeRef, index: usize) -> &'s str {
    let children = tree.children(parent);
    let gap = move |i: usize| {
        let (a, b) = (tree.get(children[i]).span, tree.get(children[i + 1]).span);
        &source[a.end..b.start]
    };

    if children.len() >= 2 {
        // The pair straddling the boundary, else the nearest pair
        let pair = index.clamp(1, children.len() - 1) - 1;
        return gap(pair);
    }

    if let Some(&first) = children.first() {
        let content = tree.get(parent).content;
        let leading = &source[content.start..tree.get(first).span.start];
        if leading.trim().is_empty() {
            return leading;
        }
    }

    ""
}
