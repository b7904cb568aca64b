//! Minimal streaming scan over HTML markup, just enough to pull one
//! meta-tag out of a share page.
//!
//! The document is walked tag by tag; attributes are parsed only for
//! `meta` tags and the scan stops at the first match, so a hit near the
//! top of the page never touches the rest of it.

/// Returns the `content` attribute of the first `<meta>` tag whose
/// `property` attribute equals `property`. Attribute order within the tag
/// does not matter. `None` when the document ends without a match.
pub fn find_meta_content(html: &str, property: &str) -> Option<String> {
    let mut scanner = TagScanner::new(html);
    while let Some(tag) = scanner.next_tag() {
        if !tag.name.eq_ignore_ascii_case("meta") {
            continue;
        }
        let attributes = parse_attributes(tag.attributes.trim_end_matches('/'));
        let matched = attributes
            .iter()
            .any(|(name, value)| name == "property" && value == property);
        if matched {
            let content = attributes
                .into_iter()
                .find(|(name, _)| name == "content")
                .map(|(_, value)| value)
                .unwrap_or_default();
            return Some(content);
        }
    }
    None
}

struct RawTag<'a> {
    name: &'a str,
    attributes: &'a str,
}

struct TagScanner<'a> {
    rest: &'a str,
}

impl<'a> TagScanner<'a> {
    fn new(html: &'a str) -> Self {
        Self { rest: html }
    }

    /// Advances to the next opening or self-closing tag. Comments, closing
    /// tags and declarations are skipped.
    fn next_tag(&mut self) -> Option<RawTag<'a>> {
        loop {
            let open = self.rest.find('<')?;
            self.rest = &self.rest[open + 1..];

            if let Some(after) = self.rest.strip_prefix("!--") {
                match after.find("-->") {
                    Some(end) => {
                        self.rest = &after[end + 3..];
                        continue;
                    }
                    None => {
                        self.rest = "";
                        return None;
                    }
                }
            }

            let Some(end) = find_tag_end(self.rest) else {
                self.rest = "";
                return None;
            };
            let tag = &self.rest[..end];
            self.rest = &self.rest[end + 1..];

            if tag.starts_with(['/', '!', '?']) {
                continue;
            }

            let name_end = tag
                .find(|c: char| c.is_ascii_whitespace() || c == '/')
                .unwrap_or(tag.len());
            let (name, attributes) = tag.split_at(name_end);
            if name.is_empty() {
                continue;
            }
            return Some(RawTag { name, attributes });
        }
    }
}

/// Position of the closing `>`, ignoring any `>` inside quoted attribute
/// values.
fn find_tag_end(s: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in s.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '>' => return Some(i),
                _ => {}
            },
        }
    }
    None
}

fn parse_attributes(mut s: &str) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    loop {
        s = s.trim_start();
        if s.is_empty() {
            break;
        }
        let name_end = s
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(s.len());
        let name = &s[..name_end];
        s = s[name_end..].trim_start();

        let mut value = String::new();
        if let Some(after_eq) = s.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            match after_eq.chars().next() {
                Some(quote @ ('"' | '\'')) => {
                    let inner = &after_eq[1..];
                    match inner.find(quote) {
                        Some(end) => {
                            value = unescape_entities(&inner[..end]);
                            s = &inner[end + 1..];
                        }
                        None => {
                            value = unescape_entities(inner);
                            s = "";
                        }
                    }
                }
                _ => {
                    let end = after_eq
                        .find(|c: char| c.is_ascii_whitespace())
                        .unwrap_or(after_eq.len());
                    value = unescape_entities(&after_eq[..end]);
                    s = &after_eq[end..];
                }
            }
        }

        if !name.is_empty() {
            attributes.push((name.to_ascii_lowercase(), value));
        }
    }
    attributes
}

const ENTITIES: [(&str, &str); 5] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
];

fn unescape_entities(s: &str) -> String {
    if !s.contains('&') {
        return s.to_string();
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match ENTITIES
            .iter()
            .find_map(|(entity, ch)| rest.strip_prefix(entity).map(|r| (r, *ch)))
        {
            Some((after, ch)) => {
                out.push_str(ch);
                rest = after;
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
