use anyhow::Result;
use regex::Regex;

/// Matches one named element inside an RSS `<item>` block.
/// The CDATA form is tried first, then the plain text form.
#[derive(Debug, Clone)]
pub struct FieldMatcher {
    cdata: Regex,
    plain: Regex,
}

impl FieldMatcher {
    /// Builds the patterns for `name`. Prefixes such as `dc:` are matched literally.
    pub fn new(name: &str) -> Result<Self> {
        let tag = regex::escape(name);
        let cdata = Regex::new(&format!(
            r"(?is)<{tag}(?:\s[^>]*)?>\s*<!\[CDATA\[(.*?)\]\]>\s*</{tag}\s*>"
        ))?;
        let plain = Regex::new(&format!(r"(?is)<{tag}(?:\s[^>]*)?>(.*?)</{tag}\s*>"))?;

        Ok(Self { cdata, plain })
    }

    /// Trimmed content of the field, or an empty string when the block lacks it.
    pub fn extract(&self, block: &str) -> String {
        self.cdata
            .captures(block)
            .or_else(|| self.plain.captures(block))
            .and_then(|cap| cap.get(1))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default()
    }
}

/// Raw, undecoded field values pulled out of one item block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFields {
    pub title: String,
    pub description: String,
    pub link: String,
    pub pub_date: String,
    pub creator: String,
    pub content_encoded: String,
}

/// The fixed set of matchers the feed parser runs against every item.
#[derive(Debug, Clone)]
pub struct ItemExtractor {
    title: FieldMatcher,
    description: FieldMatcher,
    link: FieldMatcher,
    pub_date: FieldMatcher,
    creator: FieldMatcher,
    content_encoded: FieldMatcher,
}

impl ItemExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            title: FieldMatcher::new("title")?,
            description: FieldMatcher::new("description")?,
            link: FieldMatcher::new("link")?,
            pub_date: FieldMatcher::new("pubDate")?,
            creator: FieldMatcher::new("dc:creator")?,
            content_encoded: FieldMatcher::new("content:encoded")?,
        })
    }

    pub fn extract(&self, block: &str) -> RawFields {
        RawFields {
            title: self.title.extract(block),
            description: self.description.extract(block),
            link: self.link.extract(block),
            pub_date: self.pub_date.extract(block),
            creator: self.creator.extract(block),
            content_encoded: self.content_encoded.extract(block),
        }
    }
}
