use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches an optional http(s) scheme at the start of a url
    pub static ref URL_SCHEME_REGEX: Regex = Regex::new(r"^(?i)(https?://)?").unwrap();
}

/// Decodes the few html entities the YouTube API leaves in titles
pub fn decode_html_entities(text: &str) -> String {
    text.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_scheme_normalization() {
        assert_eq!(
            URL_SCHEME_REGEX.replace("youtu.be/z09GolEktUw", "https://"),
            "https://youtu.be/z09GolEktUw"
        );
        assert_eq!(
            URL_SCHEME_REGEX.replace("http://youtu.be/z09GolEktUw", "https://"),
            "https://youtu.be/z09GolEktUw"
        );
    }

    #[test]
    fn test_decode_html_entities() {
        assert_eq!(
            decode_html_entities("Rock &amp; Roll &quot;Live&quot; &#39;77"),
            "Rock & Roll \"Live\" '77"
        );
        assert_eq!(decode_html_entities("&amp;lt;"), "&lt;");
    }
}
