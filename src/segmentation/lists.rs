//! Nested list reconstruction from indentation and marker patterns.

use regex::Regex;

use crate::types::{ListNode, Segment, TextBlock};

/// Sub-marker token that continues the innermost open list without opening a
/// new nesting level.
const CONTINUATION_PREFIX: &str = "o ";

/// Rebuilds nested [`ListNode`] trees from a flat block sequence.
///
/// A block opens a list item when its leading text matches a marker —
/// bullets (`•·●○-*`), decimals (`1.`), roman numerals (`IV.`) or single
/// letters (`a.`) — followed by whitespace. Indentation width decides
/// nesting: an item indents strictly deeper than the frame above it to
/// become a child, otherwise open frames at the same or deeper indentation
/// are closed first. Whether a bare `"o "` line continues a list is governed
/// by an explicit inside-a-list flag, not by block adjacency; interrupting
/// blocks clear the flag but leave open frames in place, so a later deeper
/// item still attaches to the list it belongs to.
pub struct ListNormalizer {
    marker: Regex,
}

struct Frame {
    indent: usize,
    node: ListNode,
}

impl ListNormalizer {
    pub fn new() -> Self {
        let bullet = r"[•·●○\-*]";
        let decimal = r"\d+\.";
        let roman = r"M{0,4}(?:CM|CD|D?C{0,3})(?:XC|XL|L?X{0,3})(?:IX|IV|V?I{0,3})\.";
        let letter = r"[A-Za-z]\.";
        let marker = Regex::new(&format!(
            r"^(?P<indent>\s*)(?:{bullet}|{decimal}|{roman}|{letter})\s+"
        ))
        .expect("list marker pattern is valid");
        Self { marker }
    }

    /// Normalizes the block sequence into pass-through blocks and list
    /// groups, preserving document order.
    pub fn normalize(&self, blocks: &[TextBlock]) -> Vec<Segment> {
        let mut root: Vec<Segment> = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        // root position where the currently open top-level list belongs
        let mut list_start = 0;
        let mut inside_list = false;

        for block in blocks {
            if let Some((indent, text)) = self.split_marker(&block.content) {
                while stack.last().is_some_and(|frame| frame.indent >= indent) {
                    close_top(&mut stack, &mut root, list_start);
                }
                if stack.is_empty() {
                    list_start = root.len();
                }
                stack.push(Frame {
                    indent,
                    node: ListNode::new(text),
                });
                inside_list = true;
                continue;
            }

            if inside_list {
                let trimmed = block.content.trim_start();
                if let Some(rest) = trimmed.strip_prefix(CONTINUATION_PREFIX) {
                    if let Some(frame) = stack.last_mut() {
                        frame.node.children.push(ListNode::new(rest.trim()));
                        continue;
                    }
                }
            }

            inside_list = false;
            root.push(Segment::Block(block.clone()));
        }

        while !stack.is_empty() {
            close_top(&mut stack, &mut root, list_start);
        }
        root
    }

    fn split_marker<'a>(&self, content: &'a str) -> Option<(usize, &'a str)> {
        let caps = self.marker.captures(content)?;
        let whole = caps.get(0)?;
        let indent = caps
            .name("indent")
            .map_or(0, |m| m.as_str().chars().count());
        Some((indent, content[whole.end()..].trim()))
    }
}

impl Default for ListNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn close_top(stack: &mut Vec<Frame>, root: &mut Vec<Segment>, list_start: usize) {
    if let Some(frame) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.node.children.push(frame.node),
            None => root.insert(list_start, Segment::List(frame.node)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(contents: &[&str]) -> Vec<TextBlock> {
        contents
            .iter()
            .map(|content| TextBlock::paragraph(*content, 1))
            .collect()
    }

    fn as_list(segment: &Segment) -> &ListNode {
        match segment {
            Segment::List(node) => node,
            Segment::Block(block) => panic!("expected list, got block '{}'", block.content),
        }
    }

    #[test]
    fn indented_item_nests_under_previous() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["1. A", "   a. B", "2. C"]));

        assert_eq!(segments.len(), 2);
        let first = as_list(&segments[0]);
        assert_eq!(first.text, "A");
        assert_eq!(first.children.len(), 1);
        assert_eq!(first.children[0].text, "B");
        let second = as_list(&segments[1]);
        assert_eq!(second.text, "C");
        assert!(second.children.is_empty());
    }

    #[test]
    fn equal_indent_creates_siblings() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["• uno", "• dos", "• tres"]));
        assert_eq!(segments.len(), 3);
        assert_eq!(as_list(&segments[1]).text, "dos");
    }

    #[test]
    fn continuation_leaf_attaches_without_new_level() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["- item", "o detail", "o more"]));

        assert_eq!(segments.len(), 1);
        let item = as_list(&segments[0]);
        assert_eq!(item.children.len(), 2);
        assert_eq!(item.children[0].text, "detail");
        assert_eq!(item.children[1].text, "more");
        assert!(item.children[0].children.is_empty());
    }

    #[test]
    fn continuation_requires_live_flag() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["- item", "interruption", "o orphan"]));

        // the interruption clears the flag, so "o orphan" stays a plain block
        assert_eq!(segments.len(), 3);
        let item = as_list(&segments[0]);
        assert_eq!(item.text, "item");
        assert!(item.children.is_empty());
        assert!(matches!(&segments[1], Segment::Block(b) if b.content == "interruption"));
        assert!(matches!(&segments[2], Segment::Block(b) if b.content == "o orphan"));
    }

    #[test]
    fn deeper_item_reattaches_after_interruption() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&[
            "1. first",
            "an interruption",
            "   a. child",
            "o tail",
        ]));

        // the frame for "first" stays open across the interruption, and the
        // marker match re-arms continuation for the "o " leaf
        assert_eq!(segments.len(), 2);
        let list = as_list(&segments[0]);
        assert_eq!(list.text, "first");
        assert_eq!(list.children.len(), 1);
        assert_eq!(list.children[0].text, "child");
        assert_eq!(list.children[0].children.len(), 1);
        assert_eq!(list.children[0].children[0].text, "tail");
        assert!(matches!(&segments[1], Segment::Block(b) if b.content == "an interruption"));
    }

    #[test]
    fn roman_and_letter_markers_are_recognized() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["IV. cuarto", "b. segundo"]));
        assert_eq!(segments.len(), 2);
        assert_eq!(as_list(&segments[0]).text, "cuarto");
        assert_eq!(as_list(&segments[1]).text, "segundo");
    }

    #[test]
    fn marker_without_trailing_space_is_plain_text() {
        let normalizer = ListNormalizer::new();
        let segments = normalizer.normalize(&blocks(&["1.without space", "3.14 is pi"]));
        assert!(matches!(&segments[0], Segment::Block(_)));
        // "3.14 is pi" never matches: the decimal marker requires whitespace
        // right after the dot
        assert!(matches!(&segments[1], Segment::Block(_)));
    }

    #[test]
    fn empty_input_yields_empty_output() {
        let normalizer = ListNormalizer::new();
        assert!(normalizer.normalize(&[]).is_empty());
    }
}
