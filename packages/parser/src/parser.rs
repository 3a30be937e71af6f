use crate::ast::*;
use crate::error::ParseError;
use crate::id_generator::IDGenerator;
use crate::lexer::{is_name_start, scan_expression, TagLexer, TagToken};
use crate::reconcile;
use crate::result::ParseResult;
use memchr::memchr2;
use serde::{Deserialize, Serialize};

const ANONYMOUS_PATH: &str = "<anonymous>";

/// Limits beyond which a parse is abandoned as fatal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Maximum element nesting depth
    pub max_depth: usize,
    /// Maximum number of recoverable diagnostics
    pub max_errors: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            max_errors: 200,
        }
    }
}

/// Tolerant, location-tracking parser for tagged prose.
///
/// Cheap to clone; holds only options and the document path used to seed
/// node ids.
#[derive(Debug, Clone)]
pub struct Parser {
    options: ParseOptions,
    document_path: String,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParseOptions::default())
    }
}

impl Parser {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            document_path: ANONYMOUS_PATH.to_string(),
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn document_path(&self) -> &str {
        &self.document_path
    }

    /// Parse from scratch, assigning fresh ids seeded by path and text
    pub fn parse(&self, source: &str) -> ParseResult {
        match TreeBuilder::new(source, &self.options).build() {
            Ok((mut tree, diagnostics)) => {
                let mut ids = IDGenerator::for_source(&self.document_path, source);
                reconcile::assign_fresh_ids(&mut tree, &mut ids);
                ParseResult::new(source, Some(tree), diagnostics, 0)
            }
            Err(diagnostics) => ParseResult::new(source, None, diagnostics, 0),
        }
    }

    /// Parse text derived from `previous`, carrying ids over for nodes that
    /// still match structurally
    pub fn reparse(&self, source: &str, previous: &ParseResult) -> ParseResult {
        let revision = previous.revision + 1;

        match TreeBuilder::new(source, &self.options).build() {
            Ok((mut tree, diagnostics)) => {
                match previous.tree() {
                    Some(old) => {
                        let mut ids = IDGenerator::resume(old.seed(), old.id_counter());
                        reconcile::carry_over_ids(
                            &mut tree,
                            source,
                            old,
                            previous.source(),
                            &mut ids,
                        );
                    }
                    None => {
                        let mut ids = IDGenerator::for_source(&self.document_path, source);
                        reconcile::assign_fresh_ids(&mut tree, &mut ids);
                    }
                }
                ParseResult::new(source, Some(tree), diagnostics, revision)
            }
            Err(diagnostics) => ParseResult::new(source, None, diagnostics, revision),
        }
    }
}

pub fn parse(source: &str) -> ParseResult {
    Parser::default().parse(source)
}

pub fn parse_with_path(source: &str, path: &str) -> ParseResult {
    Parser::default().with_path(path).parse(source)
}

/// An element or fragment whose closing tag has not been seen yet. The
/// bottom frame of every content run has no node.
struct Frame {
    node: Option<NodeRef>,
    name: Option<String>,
    children: Vec<NodeRef>,
}

struct OpenTag {
    tag: String,
    tag_span: Span,
    props: Vec<Prop>,
    end: usize,
    self_closing: bool,
}

struct TreeBuilder<'src, 'o> {
    source: &'src str,
    options: &'o ParseOptions,
    nodes: Vec<Node>,
    diagnostics: Vec<ParseError>,
}

impl<'src, 'o> TreeBuilder<'src, 'o> {
    fn new(source: &'src str, options: &'o ParseOptions) -> Self {
        Self {
            source,
            options,
            nodes: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    fn build(mut self) -> Result<(Tree, Vec<ParseError>), Vec<ParseError>> {
        let len = self.source.len();
        let root = self.push_node(Node::container(NodeKind::Fragment, Span::new(0, len)));

        match self.parse_content(0, len, 0) {
            Ok(children) => {
                self.attach_children(root, children);
                Ok((Tree::new(self.nodes, root), self.diagnostics))
            }
            Err(fatal) => {
                self.diagnostics.push(fatal);
                Err(self.diagnostics)
            }
        }
    }

    fn push_node(&mut self, node: Node) -> NodeRef {
        self.nodes.push(node);
        NodeRef((self.nodes.len() - 1) as u32)
    }

    fn node_mut(&mut self, node: NodeRef) -> &mut Node {
        &mut self.nodes[node.index()]
    }

    /// Record a recoverable diagnostic; turns fatal once the budget is spent
    fn report(&mut self, error: ParseError) -> Result<(), ParseError> {
        self.diagnostics.push(error);
        if self.diagnostics.len() > self.options.max_errors {
            return Err(ParseError::TooManyErrors {
                limit: self.options.max_errors,
            });
        }
        Ok(())
    }

    fn attach_children(&mut self, parent: NodeRef, children: Vec<NodeRef>) {
        for (index, child) in children.iter().enumerate() {
            let node = self.node_mut(*child);
            node.parent = Some(parent);
            node.slot = Slot::Child(index);
        }
        self.node_mut(parent).children = children;
    }

    /// Parse `[start, end)` as content and return its top-level nodes
    fn parse_content(
        &mut self,
        start: usize,
        end: usize,
        depth: usize,
    ) -> Result<Vec<NodeRef>, ParseError> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut stack = vec![Frame {
            node: None,
            name: None,
            children: Vec::new(),
        }];
        let mut pos = start;
        let mut text_start = start;

        while pos < end {
            let Some(offset) = memchr2(b'<', b'{', &bytes[pos..end]) else {
                break;
            };
            let at = pos + offset;

            if bytes[at] == b'{' {
                match scan_expression(bytes, at, end) {
                    Some(close) => {
                        self.flush_text(&mut stack, text_start, at);
                        let node = self.push_node(Node::expression(Span::new(at, close)));
                        push_child(&mut stack, node);
                        pos = close;
                        text_start = close;
                    }
                    None => {
                        self.report(ParseError::UnterminatedExpression {
                            span: Span::new(at, end),
                        })?;
                        pos = at + 1;
                    }
                }
                continue;
            }

            let rest = &source[at..end];
            if rest.starts_with("<!--") {
                // Comments stay prose
                pos = rest.find("-->").map(|i| at + i + 3).unwrap_or(end);
                continue;
            }

            let next = if at + 1 < end { Some(bytes[at + 1]) } else { None };
            match next {
                Some(b'/') => match self.close_tag(&mut stack, at, end, text_start)? {
                    Some((resume, consumed)) => {
                        pos = resume;
                        if consumed {
                            text_start = resume;
                        }
                    }
                    None => pos = at + 1,
                },
                Some(b'>') => {
                    self.flush_text(&mut stack, text_start, at);
                    self.check_depth(depth + stack.len(), at)?;
                    let mut fragment = Node::container(NodeKind::Fragment, Span::new(at, at + 2));
                    fragment.open = Some(Span::new(at, at + 2));
                    fragment.content = Span::new(at + 2, at + 2);
                    let node = self.push_node(fragment);
                    stack.push(Frame {
                        node: Some(node),
                        name: None,
                        children: Vec::new(),
                    });
                    pos = at + 2;
                    text_start = pos;
                }
                Some(b) if is_name_start(b) => {
                    match self.open_tag(at, end, depth + stack.len())? {
                        Some(open) => {
                            self.flush_text(&mut stack, text_start, at);
                            let resume = open.end;
                            let self_closing = open.self_closing;
                            let name = open.tag.clone();
                            self.check_depth(depth + stack.len(), at)?;
                            let node = self.push_element(at, open);

                            if self_closing {
                                push_child(&mut stack, node);
                            } else {
                                stack.push(Frame {
                                    node: Some(node),
                                    name: Some(name),
                                    children: Vec::new(),
                                });
                            }
                            pos = resume;
                            text_start = resume;
                        }
                        None => pos = at + 1,
                    }
                }
                _ => pos = at + 1,
            }
        }

        self.flush_text(&mut stack, text_start, end);

        while stack.len() > 1 {
            if let Some(frame) = stack.pop() {
                if let Some(node) = self.finish_unclosed(frame, end)? {
                    push_child(&mut stack, node);
                }
            }
        }

        Ok(stack.pop().map(|frame| frame.children).unwrap_or_default())
    }

    fn check_depth(&self, depth: usize, at: usize) -> Result<(), ParseError> {
        if depth > self.options.max_depth {
            return Err(ParseError::DepthLimitExceeded {
                limit: self.options.max_depth,
                span: Span::new(at, at + 1),
            });
        }
        Ok(())
    }

    /// Handle `</Name>` or `</>` at `at`. Returns the resume offset and
    /// whether the tag closed something; `None` leaves the `<` as prose.
    fn close_tag(
        &mut self,
        stack: &mut Vec<Frame>,
        at: usize,
        end: usize,
        text_start: usize,
    ) -> Result<Option<(usize, bool)>, ParseError> {
        let mut lexer = TagLexer::new(self.source, at + 2, end);

        let (name, close_end) = match lexer.next_token() {
            Some((Ok(TagToken::Close), span)) => (None, span.end),
            Some((Ok(TagToken::Name(name)), _)) => match lexer.next_token() {
                Some((Ok(TagToken::Close), span)) => (Some(name), span.end),
                _ => {
                    self.report(ParseError::UnterminatedTag {
                        span: Span::new(at, at + 2),
                    })?;
                    return Ok(None);
                }
            },
            _ => {
                self.report(ParseError::UnterminatedTag {
                    span: Span::new(at, at + 2),
                })?;
                return Ok(None);
            }
        };

        let close_span = Span::new(at, close_end);
        let matching = stack
            .iter()
            .rposition(|frame| frame.node.is_some() && frame.name.as_deref() == name);

        let Some(index) = matching else {
            self.report(ParseError::UnexpectedClosingTag {
                name: name.unwrap_or_default().to_string(),
                span: close_span,
            })?;
            return Ok(Some((close_end, false)));
        };

        self.flush_text(stack, text_start, at);

        while stack.len() > index + 1 {
            if let Some(frame) = stack.pop() {
                if let Some(node) = self.finish_unclosed(frame, at)? {
                    push_child(stack, node);
                }
            }
        }

        if let Some(Frame {
            node: Some(node),
            children,
            ..
        }) = stack.pop()
        {
            self.finish_closed(node, children, close_span);
            push_child(stack, node);
        }

        Ok(Some((close_end, true)))
    }

    /// Lex an open tag starting at `at`. `None` means it is not a tag after
    /// all and the `<` is prose.
    fn open_tag(
        &mut self,
        at: usize,
        end: usize,
        depth: usize,
    ) -> Result<Option<OpenTag>, ParseError> {
        let source = self.source;
        let mut lexer = TagLexer::new(source, at + 1, end);

        let (tag, tag_span) = match lexer.next_token() {
            Some((Ok(TagToken::Name(name)), span)) if span.start == at + 1 => (name, span),
            _ => return Ok(None),
        };

        let mut props = Vec::new();
        let mut pending = None;

        loop {
            let Some((token, span)) = pending.take().or_else(|| lexer.next_token()) else {
                self.report(ParseError::UnterminatedTag {
                    span: Span::new(at, tag_span.end),
                })?;
                return Ok(None);
            };

            match token {
                Ok(TagToken::Close) | Ok(TagToken::SelfClose) => {
                    return Ok(Some(OpenTag {
                        tag: tag.to_string(),
                        tag_span,
                        props,
                        end: span.end,
                        self_closing: token == Ok(TagToken::SelfClose),
                    }));
                }
                Ok(TagToken::Name(name)) => match lexer.next_token() {
                    Some((Ok(TagToken::Equals), _)) => match lexer.next_token() {
                        Some((Ok(TagToken::Str(raw)), value_span)) => {
                            let quote = raw.chars().next().unwrap_or('"');
                            props.push(Prop {
                                name: name.to_string(),
                                span: Span::new(span.start, value_span.end),
                                name_span: span,
                                value_span: Some(value_span),
                                value: PropValue::Literal {
                                    value: raw[1..raw.len() - 1].to_string(),
                                    quote,
                                },
                            });
                        }
                        Some((Ok(TagToken::LBrace), brace)) => {
                            let Some(close) = scan_expression(source.as_bytes(), brace.start, end)
                            else {
                                self.report(ParseError::UnterminatedExpression {
                                    span: Span::new(brace.start, end),
                                })?;
                                return Ok(None);
                            };
                            let value = self.expression_value(brace.start, close, depth)?;
                            props.push(Prop {
                                name: name.to_string(),
                                span: Span::new(span.start, close),
                                name_span: span,
                                value_span: Some(Span::new(brace.start, close)),
                                value,
                            });
                            lexer.reset(close);
                        }
                        _ => {
                            self.report(ParseError::invalid_attribute(
                                span,
                                format!("expected a value after `{}=`", name),
                            ))?;
                            return Ok(None);
                        }
                    },
                    other => {
                        props.push(Prop {
                            name: name.to_string(),
                            span,
                            name_span: span,
                            value_span: None,
                            value: PropValue::Flag,
                        });
                        pending = other;
                    }
                },
                Ok(TagToken::LBrace) => {
                    // Spread attributes, `{...rest}`
                    let Some(close) = scan_expression(source.as_bytes(), span.start, end) else {
                        self.report(ParseError::UnterminatedExpression {
                            span: Span::new(span.start, end),
                        })?;
                        return Ok(None);
                    };
                    let island = Span::new(span.start, close);
                    props.push(Prop {
                        name: "...".to_string(),
                        span: island,
                        name_span: island,
                        value_span: Some(island),
                        value: PropValue::Expression {
                            code: source[span.start + 1..close - 1].to_string(),
                        },
                    });
                    lexer.reset(close);
                }
                _ => {
                    self.report(ParseError::invalid_attribute(
                        span,
                        format!(
                            "unexpected `{}` in <{}>",
                            source.get(span.range()).unwrap_or("?"),
                            tag
                        ),
                    ))?;
                    return Ok(None);
                }
            }
        }
    }

    /// An attribute expression holding exactly one element becomes a nested
    /// node; anything else stays opaque code
    fn expression_value(
        &mut self,
        open: usize,
        close: usize,
        depth: usize,
    ) -> Result<PropValue, ParseError> {
        let inner = &self.source[open + 1..close - 1];
        let trimmed = inner.trim();

        if trimmed.starts_with('<') && trimmed.ends_with('>') {
            let saved_nodes = self.nodes.len();
            let saved_diagnostics = self.diagnostics.len();
            let children = self.parse_content(open + 1, close - 1, depth + 1)?;

            if let [only] = children.as_slice() {
                if self.diagnostics.len() == saved_diagnostics
                    && self.nodes[only.index()].kind == NodeKind::Element
                {
                    return Ok(PropValue::Node { node: *only });
                }
            }

            self.nodes.truncate(saved_nodes);
            self.diagnostics.truncate(saved_diagnostics);
        }

        Ok(PropValue::Expression {
            code: inner.to_string(),
        })
    }

    fn push_element(&mut self, at: usize, open: OpenTag) -> NodeRef {
        let open_span = Span::new(at, open.end);
        let nested: Vec<(NodeRef, String)> = open
            .props
            .iter()
            .filter_map(|prop| match prop.value {
                PropValue::Node { node } => Some((node, prop.name.clone())),
                _ => None,
            })
            .collect();

        let node = self.push_node(Node {
            tag: Some(open.tag),
            tag_span: Some(open.tag_span),
            open: Some(open_span),
            self_closing: open.self_closing,
            content: Span::new(open.end, open.end),
            props: open.props,
            ..Node::container(NodeKind::Element, open_span)
        });

        for (child, name) in nested {
            let nested_node = self.node_mut(child);
            nested_node.parent = Some(node);
            nested_node.slot = Slot::Prop(name);
        }

        node
    }

    fn finish_closed(&mut self, node: NodeRef, children: Vec<NodeRef>, close: Span) {
        self.attach_children(node, children);

        let n = self.node_mut(node);
        let open_end = n.open.map(|s| s.end).unwrap_or(n.span.start);
        n.close = Some(close);
        n.content = Span::new(open_end, close.start);
        n.span.end = close.end;
    }

    /// Close an element that never saw its closing tag. Its span stops at
    /// the last non-whitespace byte before `limit`.
    fn finish_unclosed(
        &mut self,
        frame: Frame,
        limit: usize,
    ) -> Result<Option<NodeRef>, ParseError> {
        let Some(node) = frame.node else {
            return Ok(None);
        };
        let open = self.nodes[node.index()].open.unwrap_or(self.nodes[node.index()].span);
        self.report(ParseError::unclosed_element(frame.name.as_deref(), open))?;
        self.attach_children(node, frame.children);

        let trimmed = self.source[open.end..limit].trim_end().len();
        let n = self.node_mut(node);
        n.content = Span::new(open.end, open.end + trimmed);
        n.span.end = open.end + trimmed;
        Ok(Some(node))
    }

    /// Turn the prose run `[start, end)` into a text node, minus surrounding
    /// whitespace. Whitespace-only runs are trivia.
    fn flush_text(&mut self, stack: &mut [Frame], start: usize, end: usize) {
        if start >= end {
            return;
        }
        let run = &self.source[start..end];
        let text_start = start + (run.len() - run.trim_start().len());
        let text_end = start + run.trim_end().len();

        if text_start < text_end {
            let node = self.push_node(Node::text(Span::new(text_start, text_end)));
            push_child(stack, node);
        }
    }
}

fn push_child(stack: &mut [Frame], node: NodeRef) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}
