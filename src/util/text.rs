use std::borrow::Cow;

/// Entities decoded in feed titles and descriptions, with their replacements.
///
/// Anything else that looks like an entity (`&nbsp;`, `&#8217;`, ...) is left
/// as literal text.
const ENTITIES: [(&str, &str); 6] = [
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&#39;", "'"),
    ("&apos;", "'"),
];

/// Decodes the six HTML character entities that appear in feed text.
///
/// Each entity is replaced across the whole string in table order, `&amp;`
/// first. A double-encoded `&amp;lt;` therefore decodes all the way to `<`,
/// while `&amp;amp;` only loses one level.
///
/// Returns `Cow::Borrowed` when the input contains no `&` (common case).
///
/// # Examples
///
/// ```
/// use sermon_feed::util::decode_html_entities;
///
/// assert_eq!(decode_html_entities("Grace &amp; Growth"), "Grace & Growth");
/// assert_eq!(decode_html_entities("It&#39;s &quot;fine&quot;"), "It's \"fine\"");
/// assert_eq!(decode_html_entities("I &amp;lt;3 Grace"), "I <3 Grace");
/// assert_eq!(decode_html_entities("&nbsp;"), "&nbsp;");
/// ```
pub fn decode_html_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }

    let mut out = Cow::Borrowed(s);
    for (entity, replacement) in ENTITIES {
        if out.contains(entity) {
            out = Cow::Owned(out.replace(entity, replacement));
        }
    }
    out
}
