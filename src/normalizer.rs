use chrono::{DateTime, Utc};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use crate::extractor::RawFields;
use crate::models::NewsItem;

pub const DESCRIPTION_LIMIT: usize = 200;
pub const MIN_TITLE_CHARS: usize = 11;
const ELLIPSIS: &str = "...";

static CDATA_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata pattern"));
static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));
static SCRIPT_OR_STYLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>|<style\b[^>]*>.*?</style\s*>")
        .expect("script/style pattern")
});
static TOPIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/politica/([^/?#]+)").expect("topic pattern"));
static URL_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"url="([^"]+)"|url='([^']+)'"#).expect("url pattern"));

/// Labels stamped on every item of one feed.
#[derive(Debug, Clone)]
pub struct ItemLabels {
    pub source: String,
    pub default_category: String,
}

/// Replaces `&lt;`, `&gt;`, `&amp;`, `&quot;`, `&#039;`, `&apos;` and `&nbsp;`, one pass
/// per entity in that order. `&amp;amp;` becomes `&amp;`, while `&amp;quot;` ends up as `"`
/// because `&quot;` is replaced after `&amp;`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .replace("&quot;", "\"")
        .replace("&#039;", "'")
        .replace("&apos;", "'")
        .replace("&nbsp;", " ")
}

/// CDATA unwrap, tag strip, entity decode, trim, then cut to
/// `DESCRIPTION_LIMIT` characters with a trailing ellipsis.
pub fn clean_description(raw: &str) -> String {
    let unwrapped = CDATA_WRAPPER.replace_all(raw, "$1");
    let stripped = MARKUP_TAG.replace_all(&unwrapped, "");
    let decoded = decode_entities(&stripped);
    truncate(decoded.trim())
}

fn truncate(text: &str) -> String {
    if text.chars().count() <= DESCRIPTION_LIMIT {
        return text.to_string();
    }
    let mut cut: String = text
        .chars()
        .take(DESCRIPTION_LIMIT - ELLIPSIS.len())
        .collect();
    cut.push_str(ELLIPSIS);
    cut
}

/// Title-cased topic after `/politica/` in the link, or `default` when there is none.
pub fn derive_category(link: &str, default: &str) -> String {
    TOPIC_SEGMENT
        .captures(link)
        .and_then(|cap| cap.get(1))
        .map(|segment| title_case(&segment.as_str().replace('-', " ")))
        .filter(|category| !category.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// First non-empty `url="..."` or `url='...'` attribute anywhere in the raw block.
/// The scan is not scoped to media tags, so an unrelated `url` attribute can win.
pub fn extract_image(block: &str) -> Option<String> {
    URL_ATTRIBUTE
        .captures(block)
        .and_then(|cap| cap.get(1).or_else(|| cap.get(2)))
        .map(|m| decode_entities(m.as_str()))
        .filter(|url| !url.is_empty())
}

/// Drops `<script>` and `<style>` blocks. Everything else is left as markup.
pub fn strip_active_content(html: &str) -> String {
    SCRIPT_OR_STYLE.replace_all(html, "").into_owned()
}

/// RFC 2822 and RFC 3339 dates become RFC 3339 UTC. Anything else is kept as written,
/// and a missing date is stamped with `now`.
pub fn normalize_pub_date(raw: &str, now: DateTime<Utc>) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return now.to_rfc3339();
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|date| date.with_timezone(&Utc).to_rfc3339())
        .unwrap_or_else(|_| {
            debug!(pub_date = %raw, "Keeping unrecognized pubDate as written");
            raw.to_string()
        })
}

fn optional(text: String) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Builds a `NewsItem` from one item's raw fields, or `None` when the item is too thin
/// to be an article (short title or no link).
pub fn normalize_item(
    fields: &RawFields,
    block: &str,
    labels: &ItemLabels,
    now: DateTime<Utc>,
) -> Option<NewsItem> {
    let title = decode_entities(&fields.title).trim().to_string();
    let link = decode_entities(&fields.link).trim().to_string();

    if title.chars().count() < MIN_TITLE_CHARS || link.is_empty() {
        return None;
    }

    let content_encoded = optional(decode_entities(&strip_active_content(&fields.content_encoded)));

    Some(NewsItem {
        description: clean_description(&fields.description),
        pub_date: normalize_pub_date(&fields.pub_date, now),
        source: labels.source.clone(),
        category: derive_category(&link, &labels.default_category),
        image: extract_image(block),
        creator: optional(decode_entities(&fields.creator)),
        content_encoded,
        title,
        link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn labels() -> ItemLabels {
        ItemLabels {
            source: "La República".to_string(),
            default_category: "Política".to_string(),
        }
    }

    fn fields(title: &str, link: &str) -> RawFields {
        RawFields {
            title: title.to_string(),
            link: link.to_string(),
            ..RawFields::default()
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 12, 8, 30, 0).unwrap()
    }

    #[test]
    fn decode_is_a_single_pass() {
        assert_eq!(decode_entities("&amp;amp;"), "&amp;");
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
        assert_eq!(
            decode_entities("&lt;b&gt; &quot;Sí&quot; &#039;no&apos;&nbsp;"),
            "<b> \"Sí\" 'no' "
        );
    }

    #[test]
    fn later_entities_are_decoded_after_ampersand() {
        assert_eq!(decode_entities("&amp;quot;"), "\"");
        assert_eq!(decode_entities("&amp;#039;"), "'");
        assert_eq!(decode_entities("&amp;nbsp;"), " ");
    }

    #[test]
    fn description_is_stripped_and_decoded() {
        let raw = "<![CDATA[<p>Debate &amp; votación en el <b>Pleno</b></p>]]>";
        assert_eq!(clean_description(raw), "Debate & votación en el Pleno");
    }

    #[test]
    fn long_description_is_cut_with_ellipsis() {
        let raw = "á".repeat(250);
        let cleaned = clean_description(&raw);
        assert_eq!(cleaned.chars().count(), DESCRIPTION_LIMIT);
        assert!(cleaned.ends_with("..."));
        assert_eq!(cleaned.chars().filter(|c| *c == 'á').count(), 197);
    }

    #[test]
    fn description_at_limit_is_untouched() {
        let raw = "x".repeat(DESCRIPTION_LIMIT);
        assert_eq!(clean_description(&raw), raw);
    }

    #[test]
    fn category_from_topic_segment() {
        assert_eq!(
            derive_category("https://x/politica/sub-tema-aqui/art", "Política"),
            "Sub Tema Aqui"
        );
        assert_eq!(
            derive_category("https://x/politica/elecciones-2026", "Política"),
            "Elecciones 2026"
        );
    }

    #[test]
    fn category_defaults_without_topic() {
        assert_eq!(derive_category("https://x/deportes/futbol/art", "Política"), "Política");
        assert_eq!(derive_category("", "Política"), "Política");
    }

    #[test]
    fn image_takes_first_url_attribute_either_quote() {
        let block = r#"<media:content url='https://img.pe/a.jpg?w=1&amp;h=2' medium="image"/>
                       <enclosure url="https://img.pe/b.jpg"/>"#;
        assert_eq!(
            extract_image(block).as_deref(),
            Some("https://img.pe/a.jpg?w=1&h=2")
        );
        assert_eq!(extract_image("<title>sin imagen</title>"), None);
    }

    #[test]
    fn image_scan_skips_empty_url_attributes() {
        let block = r#"<a url=""/><b url=''/><media:content url="https://i/x.jpg"/>"#;
        assert_eq!(extract_image(block).as_deref(), Some("https://i/x.jpg"));
        assert_eq!(extract_image(r#"<a url=""/>"#), None);
    }

    #[test]
    fn script_and_style_blocks_are_removed() {
        let html = "<p>a</p><SCRIPT type=\"x\">alert(1)</script><style>p{}</STYLE><p>b</p>";
        assert_eq!(strip_active_content(html), "<p>a</p><p>b</p>");
    }

    #[test]
    fn pub_date_is_normalized_or_defaulted() {
        let now = fixed_now();
        assert_eq!(
            normalize_pub_date("Fri, 12 Apr 2024 15:00:00 -0500", now),
            "2024-04-12T20:00:00+00:00"
        );
        assert_eq!(normalize_pub_date("", now), now.to_rfc3339());
        assert_eq!(normalize_pub_date("hace 2 horas", now), "hace 2 horas");
    }

    #[test]
    fn short_titles_and_missing_links_are_rejected() {
        let now = fixed_now();
        assert!(normalize_item(&fields("Corto", "https://x/a"), "", &labels(), now).is_none());
        assert!(normalize_item(&fields("0123456789", "https://x/a"), "", &labels(), now).is_none());
        assert!(normalize_item(&fields("Un titular completo", ""), "", &labels(), now).is_none());
        assert!(normalize_item(&fields("01234567890", "https://x/a"), "", &labels(), now).is_some());
    }

    #[test]
    fn accepted_item_carries_every_field() {
        let raw = RawFields {
            title: "JNE publica padr&oacute;n &amp; cronograma".to_string(),
            description: "<p>Detalle</p>".to_string(),
            link: "https://x/politica/jne-cronograma/nota".to_string(),
            pub_date: String::new(),
            creator: "Redacci&amp;n".to_string(),
            content_encoded: "<p>Cuerpo</p><script>x()</script> &amp;amp;".to_string(),
        };
        let block = r#"<media:content url="https://img.pe/c.jpg"/>"#;
        let item = normalize_item(&raw, block, &labels(), fixed_now()).unwrap();

        assert_eq!(item.title, "JNE publica padr&oacute;n & cronograma");
        assert_eq!(item.description, "Detalle");
        assert_eq!(item.category, "Jne Cronograma");
        assert_eq!(item.source, "La República");
        assert_eq!(item.pub_date, fixed_now().to_rfc3339());
        assert_eq!(item.image.as_deref(), Some("https://img.pe/c.jpg"));
        assert_eq!(item.creator.as_deref(), Some("Redacci&n"));
        assert_eq!(item.content_encoded.as_deref(), Some("<p>Cuerpo</p> &amp;"));
    }

    #[test]
    fn empty_optional_fields_are_absent() {
        let item = normalize_item(
            &fields("Titular suficientemente largo", "https://x/a"),
            "",
            &labels(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(item.creator, None);
        assert_eq!(item.content_encoded, None);
        assert_eq!(item.image, None);
        assert_eq!(item.description, "");
    }
}
