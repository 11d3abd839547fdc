//! Static completion source: HTML element names plus Slim block
//! keywords, unfiltered by cursor context.

use serde::Serialize;

const HTML_TAGS: &[&str] = &[
    "a", "abbr", "address", "area", "article", "aside", "audio", "b", "base", "bdi", "bdo",
    "blockquote", "body", "br", "button", "canvas", "caption", "cite", "code", "col", "colgroup",
    "data", "datalist", "dd", "del", "details", "dfn", "dialog", "div", "dl", "dt", "em", "embed",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "head", "header", "hr", "html", "i", "iframe", "img", "input", "ins", "kbd", "label", "legend",
    "li", "link", "main", "map", "mark", "meta", "meter", "nav", "noscript", "object", "ol",
    "optgroup", "option", "output", "p", "param", "picture", "pre", "progress", "q", "rp", "rt",
    "ruby", "s", "samp", "script", "section", "select", "small", "source", "span", "strong",
    "style", "sub", "summary", "sup", "table", "tbody", "td", "template", "textarea", "tfoot",
    "th", "thead", "time", "title", "tr", "track", "u", "ul", "var", "video", "wbr",
];

const SLIM_KEYWORDS: &[&str] = &[
    "doctype",
    "javascript:",
    "css:",
    "markdown:",
    "ruby:",
    "coffeescript:",
    "sass:",
    "scss:",
    "less:",
];

// LSP CompletionItemKind codes.
const KIND_PROPERTY: u8 = 10;
const KIND_KEYWORD: u8 = 14;

#[derive(Debug, Serialize)]
pub(crate) struct CompletionItem {
    pub label: &'static str,
    pub kind: u8,
}

/// The full item list: every tag, then every keyword.
pub(crate) fn items() -> Vec<CompletionItem> {
    let mut items: Vec<CompletionItem> = HTML_TAGS
        .iter()
        .map(|tag| CompletionItem {
            label: tag,
            kind: KIND_PROPERTY,
        })
        .collect();
    items.extend(SLIM_KEYWORDS.iter().map(|keyword| CompletionItem {
        label: keyword,
        kind: KIND_KEYWORD,
    }));
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_cover_tags_then_keywords() {
        let items = items();
        assert_eq!(items.len(), HTML_TAGS.len() + SLIM_KEYWORDS.len());
        assert_eq!(items[0].label, "a");
        assert_eq!(items[0].kind, KIND_PROPERTY);
        let last = items.last().unwrap();
        assert_eq!(last.label, "less:");
        assert_eq!(last.kind, KIND_KEYWORD);
    }

    #[test]
    fn test_keywords_follow_all_tags() {
        let items = items();
        let first_keyword = items.iter().position(|i| i.kind == KIND_KEYWORD).unwrap();
        assert_eq!(first_keyword, HTML_TAGS.len());
        assert!(items[first_keyword..].iter().all(|i| i.kind == KIND_KEYWORD));
    }

    #[test]
    fn test_item_serialization_shape() {
        let json = serde_json::to_value(items().first().unwrap()).unwrap();
        assert_eq!(json, serde_json::json!({ "label": "a", "kind": 10 }));
    }
}
