#[cfg(test)]
mod recovery_tests {
    use crate::{parse, NodeKind, NodeRef, ParseError, ParseResult, Span};

    fn top_level(result: &ParseResult) -> Vec<NodeRef> {
        let tree = result.tree().expect("tree");
        tree.children(tree.root()).to_vec()
    }

    #[test]
    fn test_unclosed_element_at_eof() {
        let source = "<Card>\n  <Button>Hi</Button>\n";
        let result = parse(source);

        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            &result.diagnostics[0],
            ParseError::UnclosedElement { name, .. } if name == "Card"
        ));

        let tree = result.tree().unwrap();
        let card = top_level(&result)[0];
        assert_eq!(
            tree.get(card).span.slice(source),
            "<Card>\n  <Button>Hi</Button>"
        );
        assert!(tree.get(card).close.is_none());
        assert_eq!(tree.children(card).len(), 1);
    }

    #[test]
    fn test_closing_an_ancestor_auto_closes_inner_elements() {
        let source = "<A><B>text</A> after";
        let result = parse(source);

        assert_eq!(result.diagnostics.len(), 1);
        assert!(matches!(
            &result.diagnostics[0],
            ParseError::UnclosedElement { name, .. } if name == "B"
        ));

        let tree = result.tree().unwrap();
        let a = top_level(&result)[0];
        let b = tree.children(a)[0];
        assert_eq!(tree.get(a).span.slice(source), "<A><B>text</A>");
        assert_eq!(tree.get(b).span.slice(source), "<B>text");
        assert_eq!(tree.get(top_level(&result)[1]).span.slice(source), "after");
    }

    #[test]
    fn test_stray_closing_tag_is_prose() {
        let source = "Hello </Nope> world";
        let result = parse(source);

        assert!(matches!(
            &result.diagnostics[..],
            [ParseError::UnexpectedClosingTag { name, span }]
                if name == "Nope" && *span == Span::new(6, 13)
        ));

        let children = top_level(&result);
        assert_eq!(children.len(), 1);
        assert_eq!(result.slice(children[0]), Some(source));
    }

    #[test]
    fn test_unterminated_expression_is_prose() {
        let source = "a {b c";
        let result = parse(source);

        assert!(matches!(
            &result.diagnostics[..],
            [ParseError::UnterminatedExpression { .. }]
        ));
        let children = top_level(&result);
        assert_eq!(children.len(), 1);
        assert_eq!(result.tree().unwrap().get(children[0]).kind, NodeKind::Text);
    }

    #[test]
    fn test_unterminated_open_tag_is_prose() {
        let source = "<Card title=\"x\"";
        let result = parse(source);

        assert!(matches!(
            &result.diagnostics[..],
            [ParseError::UnterminatedTag { .. }]
        ));
        assert_eq!(result.slice(top_level(&result)[0]), Some(source));
    }

    #[test]
    fn test_partial_input_never_panics() {
        let inputs = [
            "",
            "<",
            "{",
            "}",
            "</",
            "<a",
            "<a b=",
            "<a {",
            "<>",
            "</>",
            "<<>>",
            "}{",
            "ñ<é>ü",
            "<a b='unterminated>",
            "<Card>{<Icon}</Card>",
            "<a><b><c></a></c>",
        ];

        for input in inputs {
            let result = parse(input);
            let tree = result.tree().expect("recoverable input keeps a tree");
            assert_eq!(tree.get(tree.root()).span, Span::new(0, input.len()));
        }
    }

    #[test]
    fn test_spans_nest_and_reslice() {
        let source = r#"Intro *text*.

<Tabs>
  <Tab label="One">first {value}</Tab>
  <Tab label={`two`} icon={<Icon name="x" />}>
    second
  </Tab>
</Tabs>

<!-- trailing comment -->
"#;
        let result = parse(source);
        assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);

        let tree = result.tree().unwrap();
        for (node, n) in tree.iter() {
            let slice = result.slice(node).expect("span on char boundaries");
            assert_eq!(slice.len(), n.span.len());

            if let Some(parent) = n.parent {
                assert!(tree.get(parent).span.contains(&n.span));
            }
            for pair in n.children.windows(2) {
                assert!(tree.get(pair[0]).span.end <= tree.get(pair[1]).span.start);
            }
            if n.kind == NodeKind::Text {
                assert_eq!(slice, slice.trim());
            }
        }
    }
}
