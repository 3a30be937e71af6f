#[cfg(test)]
mod identity_tests {
    use crate::{ParseResult, Parser};
    use std::collections::HashSet;

    fn parser() -> Parser {
        Parser::default().with_path("/docs/page.mdx")
    }

    /// `(slice, id)` for every node in document order
    fn ids(result: &ParseResult) -> Vec<(String, String)> {
        let tree = result.tree().expect("tree");
        tree.descendants(tree.root())
            .into_iter()
            .map(|node| {
                (
                    result.slice(node).unwrap_or_default().to_string(),
                    tree.get(node).id.clone(),
                )
            })
            .collect()
    }

    fn id_of(result: &ParseResult, slice: &str) -> String {
        ids(result)
            .into_iter()
            .find(|(s, _)| s == slice)
            .map(|(_, id)| id)
            .unwrap_or_else(|| panic!("no node for {:?}", slice))
    }

    #[test]
    fn test_ids_are_unique_and_seeded() {
        let result = parser().parse("<Card><Button>Hi</Button> {x}</Card>");
        let all = ids(&result);
        let unique: HashSet<_> = all.iter().map(|(_, id)| id.clone()).collect();

        assert_eq!(unique.len(), all.len());
        let seed = result.tree().unwrap().seed().to_string();
        assert!(all.iter().all(|(_, id)| id.starts_with(&seed)));
    }

    #[test]
    fn test_reparse_identical_source_keeps_every_id() {
        let source = "# Doc\n\n<Card>\n  <Button>Hi</Button>\n</Card>\n";
        let first = parser().parse(source);
        let second = parser().reparse(source, &first);

        assert_eq!(ids(&first), ids(&second));
        assert_eq!(second.revision, first.revision + 1);
    }

    #[test]
    fn test_retext_keeps_ids_by_position() {
        let first = parser().parse("<Card><Button>Hi</Button></Card>");
        let second = parser().reparse("<Card><Button>Bye</Button></Card>", &first);

        let before: Vec<String> = ids(&first).into_iter().map(|(_, id)| id).collect();
        let after: Vec<String> = ids(&second).into_iter().map(|(_, id)| id).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_insertion_gets_fresh_non_colliding_id() {
        let first = parser().parse("<A />\n<B />\n");
        let second = parser().reparse("<New />\n<A />\n<B />\n", &first);

        assert_eq!(id_of(&first, "<A />"), id_of(&second, "<A />"));
        assert_eq!(id_of(&first, "<B />"), id_of(&second, "<B />"));

        let old_ids: HashSet<String> = ids(&first).into_iter().map(|(_, id)| id).collect();
        assert!(!old_ids.contains(&id_of(&second, "<New />")));
    }

    #[test]
    fn test_moved_subtree_keeps_ids() {
        let first = parser().parse("<List><A>one</A></List><Other></Other>");
        let second = parser().reparse("<List></List><Other><A>one</A></Other>", &first);

        assert_eq!(id_of(&first, "<A>one</A>"), id_of(&second, "<A>one</A>"));
        assert_eq!(id_of(&first, "one"), id_of(&second, "one"));
    }

    #[test]
    fn test_duplicate_keeps_original_and_mints_twin() {
        let first = parser().parse("<Card><Button>Hi</Button></Card>");
        let second = parser().reparse(
            "<Card><Button>Hi</Button><Button>Hi</Button></Card>",
            &first,
        );

        let tree = second.tree().unwrap();
        let card = tree.children(tree.root())[0];
        let original = &tree.get(tree.children(card)[0]).id;
        let twin = &tree.get(tree.children(card)[1]).id;

        assert_eq!(original, &id_of(&first, "<Button>Hi</Button>"));
        assert_ne!(original, twin);
    }

    #[test]
    fn test_prop_nested_node_keeps_id() {
        let first = parser().parse(r#"<Button icon={<Icon name="a" />}>Go</Button>"#);
        let second = parser().reparse(r#"<Button icon={<Icon name="b" />}>Go</Button>"#, &first);

        assert_eq!(
            id_of(&first, r#"<Icon name="a" />"#),
            id_of(&second, r#"<Icon name="b" />"#)
        );
    }

    #[test]
    fn test_reparse_after_fatal_result_mints_fresh_ids() {
        let strict = Parser::new(crate::ParseOptions {
            max_depth: 1,
            ..Default::default()
        });
        let fatal = strict.parse("<a><b /></a>");
        assert!(fatal.is_fatal());

        let recovered = parser().reparse("<a />", &fatal);
        assert!(!recovered.is_fatal());
        assert_eq!(recovered.revision, 1);
        assert_eq!(ids(&recovered).len(), 2);
    }

    #[test]
    fn test_fresh_parse_of_other_text_shares_no_ids() {
        let first = parser().parse("<A />\n<B />\n");
        let second = parser().parse("<B />\n<A />\n");
        let again = parser().parse("<A />\n<B />\n");

        let old: HashSet<String> = ids(&first).into_iter().map(|(_, id)| id).collect();
        assert!(ids(&second).iter().all(|(_, id)| !old.contains(id)));
        assert_eq!(ids(&first), ids(&again));
    }
}
