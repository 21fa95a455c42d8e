use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use thiserror::Error;

use super::types::VideoSummary;
use crate::util::decode_html_entities;

const ENTRY_TAG: &[u8] = b"entry";
const THUMBNAIL_TAG: &[u8] = b"media:thumbnail";

/// Document-level failures. Problems inside a single entry never surface
/// here; they are absorbed into empty or fallback fields.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The body contains no element at all (plain text, empty body, ...).
    #[error("Feed body is not an XML document")]
    NoRootElement,
    /// The XML reader rejected the document.
    #[error("Malformed feed XML at byte {position}: {message}")]
    Xml { position: u64, message: String },
    /// The document ended while elements were still open.
    #[error("Feed XML ended with {open} unclosed element(s)")]
    Truncated { open: usize },
}

/// Videos extracted from one feed document.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    /// Extracted videos, in document order.
    pub videos: Vec<VideoSummary>,
    /// Entries dropped because no video id could be extracted.
    pub skipped: usize,
}

/// Text-valued fields captured from inside an `<entry>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    VideoId,
    Title,
    Published,
    Description,
}

impl Field {
    fn from_tag(name: &[u8]) -> Option<Self> {
        match name {
            b"yt:videoId" => Some(Field::VideoId),
            b"title" => Some(Field::Title),
            b"published" => Some(Field::Published),
            b"media:description" => Some(Field::Description),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryFields {
    video_id: Option<String>,
    title: Option<String>,
    published: Option<String>,
    description: Option<String>,
    thumbnail: Option<String>,
}

impl EntryFields {
    /// First non-empty value wins; later matches of the same tag are ignored.
    fn offer(&mut self, field: Field, text: String) {
        let (slot, value) = match field {
            Field::VideoId => (&mut self.video_id, text.trim().to_string()),
            Field::Title => (&mut self.title, text),
            Field::Published => (&mut self.published, text),
            Field::Description => (&mut self.description, text),
        };
        if slot.is_none() && !value.is_empty() {
            *slot = Some(value);
        }
    }

    fn offer_thumbnail(&mut self, url: Option<String>) {
        if self.thumbnail.is_none() {
            self.thumbnail = url.filter(|u| !u.is_empty());
        }
    }

    fn into_video(self) -> Option<VideoSummary> {
        let id = self.video_id?;
        Some(VideoSummary {
            title: decode_html_entities(self.title.as_deref().unwrap_or_default()).into_owned(),
            description: decode_html_entities(self.description.as_deref().unwrap_or_default())
                .into_owned(),
            published_at: self.published.unwrap_or_default(),
            thumbnail: self
                .thumbnail
                .unwrap_or_else(|| VideoSummary::fallback_thumbnail(&id)),
            link: VideoSummary::watch_link(&id),
            id,
        })
    }
}

/// Extracts video summaries from a channel feed document.
///
/// Each `<entry>` is handled independently: a missing title, description or
/// publish date becomes an empty string, a missing thumbnail falls back to
/// the URL derived from the id, and an entry with no `yt:videoId` is dropped
/// and counted in [`ParseResult::skipped`].
///
/// Field text is taken raw from the document and only the six entities
/// handled by [`decode_html_entities`] are decoded, so `&nbsp;` or custom
/// entities pass through as literal text.
///
/// # Errors
///
/// Returns [`ParseError`] when the body is not XML, is syntactically broken,
/// or ends with elements still open.
pub fn parse_entries(xml: &str) -> Result<ParseResult, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut result = ParseResult::default();
    let mut depth: usize = 0;
    let mut saw_root = false;
    // (depth of the <entry> element, fields collected so far)
    let mut entry: Option<(usize, EntryFields)> = None;
    // (field, depth of the field element, text collected so far)
    let mut capture: Option<(Field, usize, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                saw_root = true;
                depth += 1;
                let name = e.name();
                if let Some((_, fields)) = entry.as_mut() {
                    if name.as_ref() == THUMBNAIL_TAG {
                        fields.offer_thumbnail(thumbnail_url(&e, &reader));
                    } else if capture.is_none() {
                        if let Some(field) = Field::from_tag(name.as_ref()) {
                            capture = Some((field, depth, String::new()));
                        }
                    }
                } else if name.as_ref() == ENTRY_TAG {
                    entry = Some((depth, EntryFields::default()));
                }
            }
            Ok(Event::Empty(e)) => {
                saw_root = true;
                if let Some((_, fields)) = entry.as_mut() {
                    if e.name().as_ref() == THUMBNAIL_TAG {
                        fields.offer_thumbnail(thumbnail_url(&e, &reader));
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, _, text)) = capture.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::End(_)) => {
                if capture.as_ref().is_some_and(|(_, d, _)| *d == depth) {
                    if let (Some((field, _, text)), Some((_, fields))) =
                        (capture.take(), entry.as_mut())
                    {
                        fields.offer(field, text);
                    }
                }
                if entry.as_ref().is_some_and(|(d, _)| *d == depth) {
                    if let Some((_, fields)) = entry.take() {
                        match fields.into_video() {
                            Some(video) => result.videos.push(video),
                            None => result.skipped += 1,
                        }
                    }
                }
                depth = depth.saturating_sub(1);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ParseError::Xml {
                    position: reader.buffer_position() as u64,
                    message: e.to_string(),
                });
            }
            _ => {}
        }
    }

    if depth > 0 {
        return Err(ParseError::Truncated { open: depth });
    }
    if !saw_root {
        return Err(ParseError::NoRootElement);
    }

    Ok(result)
}

/// Reads the `url` attribute of a `media:thumbnail` element.
///
/// A malformed attribute list only loses the thumbnail, never the entry.
fn thumbnail_url(e: &BytesStart<'_>, reader: &Reader<&[u8]>) -> Option<String> {
    for attr_result in e.attributes() {
        let attr = match attr_result {
            Ok(attr) => attr,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed thumbnail attribute");
                continue;
            }
        };
        if attr.key.as_ref() == b"url" {
            return Some(match attr.decode_and_unescape_value(reader.decoder()) {
                Ok(value) => value.into_owned(),
                Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
            });
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn feed(entries: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns:yt="http://www.youtube.com/xml/schemas/2015" xmlns:media="http://search.yahoo.com/mrss/" xmlns="http://www.w3.org/2005/Atom">
 <title>Shiloh Church</title>
 <published>2020-01-01T00:00:00+00:00</published>
{entries}
</feed>"#
        )
    }

    fn entry(id: &str, title: &str) -> String {
        format!(
            r#" <entry>
  <id>yt:video:{id}</id>
  <yt:videoId>{id}</yt:videoId>
  <title>{title}</title>
  <link rel="alternate" href="https://www.youtube.com/watch?v={id}"/>
  <published>2026-01-26T15:00:00+00:00</published>
  <media:group>
   <media:title>{title}</media:title>
   <media:thumbnail url="https://i1.ytimg.com/vi/{id}/hqdefault.jpg" width="480" height="360"/>
   <media:description>Sermon {id}</media:description>
  </media:group>
 </entry>
"#
        )
    }

    #[test]
    fn test_full_entry() {
        let result = parse_entries(&feed(&entry("abc123", "Walking in Faith"))).unwrap();
        assert_eq!(result.skipped, 0);
        assert_eq!(
            result.videos,
            vec![VideoSummary {
                id: "abc123".into(),
                title: "Walking in Faith".into(),
                description: "Sermon abc123".into(),
                published_at: "2026-01-26T15:00:00+00:00".into(),
                thumbnail: "https://i1.ytimg.com/vi/abc123/hqdefault.jpg".into(),
                link: "https://www.youtube.com/watch?v=abc123".into(),
            }]
        );
    }

    #[test]
    fn test_feed_level_fields_are_not_attributed_to_entries() {
        // The channel <title> and <published> sit outside any entry.
        let xml = feed("<entry><yt:videoId>v1</yt:videoId></entry>");
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "");
        assert_eq!(result.videos[0].published_at, "");
    }

    #[test]
    fn test_minimal_entry_uses_fallbacks() {
        let xml = feed("<entry><yt:videoId>abc123</yt:videoId><title>Grace &amp; Growth</title></entry>");
        let result = parse_entries(&xml).unwrap();
        assert_eq!(
            result.videos,
            vec![VideoSummary {
                id: "abc123".into(),
                title: "Grace & Growth".into(),
                description: String::new(),
                published_at: String::new(),
                thumbnail: "https://img.youtube.com/vi/abc123/maxresdefault.jpg".into(),
                link: "https://www.youtube.com/watch?v=abc123".into(),
            }]
        );
    }

    #[test]
    fn test_preserves_document_order() {
        let entries = ["first", "second", "third", "fourth"]
            .iter()
            .map(|id| entry(id, id))
            .collect::<String>();
        let result = parse_entries(&feed(&entries)).unwrap();
        let ids: Vec<&str> = result.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third", "fourth"]);
    }

    #[test]
    fn test_entry_without_id_is_skipped() {
        let entries = format!(
            "{}<entry><title>No id here</title></entry>{}",
            entry("before", "Before"),
            entry("after", "After")
        );
        let result = parse_entries(&feed(&entries)).unwrap();
        assert_eq!(result.skipped, 1);
        let ids: Vec<&str> = result.videos.iter().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, vec!["before", "after"]);
    }

    #[test]
    fn test_blank_id_is_skipped() {
        let xml = feed("<entry><yt:videoId>   </yt:videoId><title>Blank</title></entry>");
        let result = parse_entries(&xml).unwrap();
        assert!(result.videos.is_empty());
        assert_eq!(result.skipped, 1);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let entries = format!("{}{}", entry("same", "One"), entry("same", "Two"));
        let result = parse_entries(&feed(&entries)).unwrap();
        assert_eq!(result.videos.len(), 2);
        assert_eq!(result.videos[0].title, "One");
        assert_eq!(result.videos[1].title, "Two");
    }

    #[test]
    fn test_first_match_wins() {
        let xml = feed(
            "<entry><yt:videoId>v1</yt:videoId><title>Primary</title><title>Secondary</title></entry>",
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "Primary");
    }

    #[test]
    fn test_media_title_does_not_replace_missing_title() {
        let xml = feed(
            "<entry><yt:videoId>v1</yt:videoId><media:group><media:title>Media</media:title></media:group></entry>",
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "");
    }

    #[test]
    fn test_entities_decoded_in_title_and_description() {
        let xml = feed(
            "<entry><yt:videoId>v1</yt:videoId><title>&quot;Be Still&quot; &amp; Know</title>\
             <media:group><media:description>It&#39;s &lt;time&gt; &apos;now&apos;</media:description></media:group></entry>",
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "\"Be Still\" & Know");
        assert_eq!(result.videos[0].description, "It's <time> 'now'");
    }

    #[test]
    fn test_double_encoded_title_decodes_to_text() {
        let xml = feed("<entry><yt:videoId>v1</yt:videoId><title>I &amp;lt;3 Grace</title></entry>");
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "I <3 Grace");
    }

    #[test]
    fn test_other_entities_left_as_text() {
        let xml = feed("<entry><yt:videoId>v1</yt:videoId><title>A&nbsp;B</title></entry>");
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].title, "A&nbsp;B");
    }

    #[test]
    fn test_cdata_description() {
        let xml = feed(
            "<entry><yt:videoId>v1</yt:videoId><media:description><![CDATA[Line <one>]]></media:description></entry>",
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].description, "Line <one>");
    }

    #[test]
    fn test_multiline_description_kept() {
        let xml = feed(
            "<entry><yt:videoId>v1</yt:videoId><media:description>Part one\nPart two</media:description></entry>",
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].description, "Part one\nPart two");
    }

    #[test]
    fn test_thumbnail_as_open_tag() {
        let xml = feed(
            r#"<entry><yt:videoId>v1</yt:videoId><media:thumbnail url="https://x.test/t.jpg"></media:thumbnail></entry>"#,
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].thumbnail, "https://x.test/t.jpg");
    }

    #[test]
    fn test_thumbnail_without_url_falls_back() {
        let xml = feed(r#"<entry><yt:videoId>v1</yt:videoId><media:thumbnail width="480"/></entry>"#);
        let result = parse_entries(&xml).unwrap();
        assert_eq!(
            result.videos[0].thumbnail,
            "https://img.youtube.com/vi/v1/maxresdefault.jpg"
        );
    }

    #[test]
    fn test_thumbnail_url_attribute_unescaped() {
        let xml = feed(
            r#"<entry><yt:videoId>v1</yt:videoId><media:thumbnail url="https://x.test/t.jpg?a=1&amp;b=2"/></entry>"#,
        );
        let result = parse_entries(&xml).unwrap();
        assert_eq!(result.videos[0].thumbnail, "https://x.test/t.jpg?a=1&b=2");
    }

    #[test]
    fn test_empty_feed_is_ok() {
        let result = parse_entries(&feed("")).unwrap();
        assert!(result.videos.is_empty());
        assert_eq!(result.skipped, 0);
    }

    #[test]
    fn test_plain_text_is_error() {
        let err = parse_entries("Service Unavailable").unwrap_err();
        assert!(matches!(err, ParseError::NoRootElement));
    }

    #[test]
    fn test_empty_body_is_error() {
        assert!(matches!(
            parse_entries("").unwrap_err(),
            ParseError::NoRootElement
        ));
    }

    #[test]
    fn test_unclosed_tag_is_error() {
        assert!(parse_entries("<not valid xml").is_err());
    }

    #[test]
    fn test_mismatched_end_tag_is_error() {
        let err = parse_entries("<feed><entry></feed>").unwrap_err();
        assert!(matches!(err, ParseError::Xml { .. }));
    }

    #[test]
    fn test_truncated_document_is_error() {
        let xml = "<feed><entry><yt:videoId>v1</yt:videoId>";
        let err = parse_entries(xml).unwrap_err();
        assert!(matches!(err, ParseError::Truncated { open: 2 }));
    }

    #[test]
    fn test_idempotent() {
        let xml = feed(&format!("{}{}", entry("a", "A"), entry("b", "B")));
        let first = parse_entries(&xml).unwrap();
        let second = parse_entries(&xml).unwrap();
        assert_eq!(first.videos, second.videos);
    }
}
