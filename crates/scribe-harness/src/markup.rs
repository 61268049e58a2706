#![forbid(unsafe_code)]

//! Minimal markup reader and writer for [`MemoryDocument`](crate::MemoryDocument).
//!
//! Accepts a forgiving subset of HTML: element tags (attributes are dropped),
//! text, and the five basic entities. Unclosed elements close at the end of
//! input; stray closing tags are ignored. `br`, `hr` and `img` are void.
//!
//! The writer emits the canonical form, so `render(parse(s))` is a fixed
//! point after one pass.

/// Elements that never have children.
pub const VOID_TAGS: &[&str] = &["br", "hr", "img"];

/// Parsed markup tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Markup {
    Element { tag: String, children: Vec<Markup> },
    Text(String),
}

impl Markup {
    /// Append the canonical form of this node to `out`.
    pub fn render_into(&self, out: &mut String) {
        match self {
            Self::Text(text) => escape_into(text, out),
            Self::Element { tag, children } => {
                out.push('<');
                out.push_str(tag);
                out.push('>');
                if is_void(tag) {
                    return;
                }
                for child in children {
                    child.render_into(out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

#[must_use]
pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

/// Canonical form of a node list.
#[must_use]
pub fn render(nodes: &[Markup]) -> String {
    let mut out = String::new();
    for node in nodes {
        node.render_into(&mut out);
    }
    out
}

/// Escape text content.
pub fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
}

fn decode_entities(raw: &str) -> String {
    const ENTITIES: &[(&str, char)] = &[
        ("&amp;", '&'),
        ("&lt;", '<'),
        ("&gt;", '>'),
        ("&quot;", '"'),
        ("&#39;", '\''),
    ];

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    'outer: while let Some(idx) = rest.find('&') {
        out.push_str(&rest[..idx]);
        rest = &rest[idx..];
        for (name, ch) in ENTITIES {
            if let Some(tail) = rest.strip_prefix(name) {
                out.push(*ch);
                rest = tail;
                continue 'outer;
            }
        }
        // Unknown entity: keep the ampersand literally.
        out.push('&');
        rest = &rest[1..];
    }
    out.push_str(rest);
    out
}

enum Tag<'a> {
    Open { name: String, self_closing: bool },
    Close(&'a str),
}

fn read_tag(inner: &str) -> Option<Tag<'_>> {
    let inner = inner.trim();
    if let Some(name) = inner.strip_prefix('/') {
        let name = name.trim();
        return (!name.is_empty()).then_some(Tag::Close(name));
    }
    let self_closing = inner.ends_with('/');
    let body = inner.trim_end_matches('/');
    let name = body.split_whitespace().next()?;
    if !name.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(Tag::Open {
        name: name.to_ascii_lowercase(),
        self_closing,
    })
}

/// Parse markup into a node list.
#[must_use]
pub fn parse(input: &str) -> Vec<Markup> {
    // Open elements: (tag, children collected so far). Index 0 is the
    // implicit top level.
    let mut stack: Vec<(String, Vec<Markup>)> = vec![(String::new(), Vec::new())];
    let mut rest = input;

    fn push(stack: &mut [(String, Vec<Markup>)], node: Markup) {
        if let Some((_, children)) = stack.last_mut() {
            children.push(node);
        }
    }

    fn close_top(stack: &mut Vec<(String, Vec<Markup>)>) {
        if stack.len() > 1
            && let Some((tag, children)) = stack.pop()
        {
            push(stack, Markup::Element { tag, children });
        }
    }

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            push(&mut stack, Markup::Text(decode_entities(rest)));
            break;
        };
        if lt > 0 {
            push(&mut stack, Markup::Text(decode_entities(&rest[..lt])));
            rest = &rest[lt..];
        }

        let Some(gt) = rest.find('>') else {
            push(&mut stack, Markup::Text(decode_entities(rest)));
            break;
        };

        match read_tag(&rest[1..gt]) {
            Some(Tag::Open { name, self_closing }) => {
                if self_closing || is_void(&name) {
                    push(
                        &mut stack,
                        Markup::Element {
                            tag: name,
                            children: Vec::new(),
                        },
                    );
                } else {
                    stack.push((name, Vec::new()));
                }
            }
            Some(Tag::Close(name)) => {
                let name = name.to_ascii_lowercase();
                if let Some(depth) = stack.iter().skip(1).rposition(|(tag, _)| *tag == name) {
                    while stack.len() > depth + 1 {
                        close_top(&mut stack);
                    }
                }
            }
            None => push(&mut stack, Markup::Text(decode_entities(&rest[..=gt]))),
        }
        rest = &rest[gt + 1..];
    }

    while stack.len() > 1 {
        close_top(&mut stack);
    }
    let top = stack.pop().map(|(_, children)| children).unwrap_or_default();
    merge_text(top)
}

/// Merge adjacent text nodes and drop empty ones.
fn merge_text(nodes: Vec<Markup>) -> Vec<Markup> {
    let mut out: Vec<Markup> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Markup::Text(text) if text.is_empty() => {}
            Markup::Text(text) => {
                if let Some(Markup::Text(prev)) = out.last_mut() {
                    prev.push_str(&text);
                } else {
                    out.push(Markup::Text(text));
                }
            }
            Markup::Element { tag, children } => out.push(Markup::Element {
                tag,
                children: merge_text(children),
            }),
        }
    }
    out
}
