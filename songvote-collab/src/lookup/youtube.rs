use std::collections::HashMap;

use async_trait::async_trait;
use log::warn;
use reqwest::{Client, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize};
use songvote_core::{Config, VideoId};
use url::Url;

use crate::util::{decode_html_entities, URL_SCHEME_REGEX};

use super::{LookupError, VideoCandidate, VideoLookup};

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Searches videos with the YouTube Data API
pub struct YouTubeLookup {
    client: Client,
    api_key: Option<String>,
    max_results: u32,
}

#[derive(Debug, Deserialize)]
struct List<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoItem {
    id: String,
    snippet: Snippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    channel_title: String,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
    width: Option<u32>,
}

impl YouTubeLookup {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            api_key: config.youtube_api_key.clone(),
            max_results: config.search_results,
        }
    }

    async fn fetch<T>(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<T, LookupError>
    where
        T: DeserializeOwned,
    {
        let api_key = self.api_key.as_deref().ok_or(LookupError::NotConfigured)?;

        let response = self
            .client
            .get(format!("{}/{}", API_BASE, endpoint))
            .query(params)
            .query(&[("part", "snippet"), ("key", api_key)])
            .send()
            .await
            .map_err(|e| LookupError::FetchError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(handle_unsuccessful_request(response, status).await);
        }

        response
            .json()
            .await
            .map_err(|e| LookupError::ParseError(e.to_string()))
    }

    async fn video(&self, video_id: &VideoId) -> Result<Vec<VideoCandidate>, LookupError> {
        let list: List<VideoItem> = self
            .fetch("videos", &[("id", video_id.as_str())])
            .await?;

        let candidates = videos_to_candidates(list);

        if candidates.is_empty() {
            return Err(LookupError::NotFound);
        }

        Ok(candidates)
    }

    async fn keywords(&self, query: &str) -> Result<Vec<VideoCandidate>, LookupError> {
        let max_results = self.max_results.to_string();

        let list: List<SearchItem> = self
            .fetch(
                "search",
                &[("type", "video"), ("maxResults", max_results.as_str()), ("q", query)],
            )
            .await?;

        Ok(search_to_candidates(list))
    }
}

#[async_trait]
impl VideoLookup for YouTubeLookup {
    async fn search(&self, query: &str) -> Result<Vec<VideoCandidate>, LookupError> {
        let query = query.trim();

        if query.is_empty() {
            return Err(LookupError::Invalid("Query is empty".to_string()));
        }

        match extract_video_id(query) {
            Some(id) => {
                let video_id = VideoId::parse(&id).map_err(|e| LookupError::Invalid(e.to_string()))?;
                self.video(&video_id).await
            }
            None => self.keywords(query).await,
        }
    }
}

/// Returns the video id if the query is a link to a YouTube video
pub fn extract_video_id(query: &str) -> Option<String> {
    let query = URL_SCHEME_REGEX.replace(query, "https://");
    let url = Url::parse(&query).ok()?;
    let host = url.host_str()?;

    if host == "youtube.com" || host.ends_with(".youtube.com") {
        // /watch?v=...
        if url.path().starts_with("/watch") {
            return url
                .query_pairs()
                .find(|(k, v)| k == "v" && !v.is_empty())
                .map(|(_, v)| v.to_string());
        }

        // /v/... and /shorts/...
        let mut parts = url.path_segments()?;
        return match parts.next()? {
            "v" | "shorts" | "embed" => parts.next().filter(|s| !s.is_empty()).map(String::from),
            _ => None,
        };
    }

    // youtu.be/...
    if host == "youtu.be" {
        return url
            .path_segments()?
            .next()
            .filter(|s| !s.is_empty())
            .map(String::from);
    }

    None
}

fn search_to_candidates(list: List<SearchItem>) -> Vec<VideoCandidate> {
    list.items
        .into_iter()
        .filter_map(|item| to_candidate(item.id.video_id?, item.snippet))
        .collect()
}

fn videos_to_candidates(list: List<VideoItem>) -> Vec<VideoCandidate> {
    list.items
        .into_iter()
        .filter_map(|item| to_candidate(item.id, item.snippet))
        .collect()
}

fn to_candidate(id: String, snippet: Snippet) -> Option<VideoCandidate> {
    if VideoId::parse(&id).is_err() {
        warn!("Dropping video with malformed id {}", id);
        return None;
    }

    Some(VideoCandidate {
        id,
        title: decode_html_entities(&snippet.title),
        channel_title: decode_html_entities(&snippet.channel_title),
        thumbnail_url: determine_thumbnail(snippet.thumbnails),
    })
}

fn determine_thumbnail(thumbnails: HashMap<String, Thumbnail>) -> Option<String> {
    thumbnails
        .into_values()
        .max_by_key(|t| t.width.unwrap_or_default())
        .map(|t| t.url)
}

async fn handle_unsuccessful_request(response: Response, status: StatusCode) -> LookupError {
    match status {
        StatusCode::NOT_FOUND => LookupError::NotFound,
        StatusCode::BAD_REQUEST => LookupError::Invalid(response.text().await.unwrap_or_default()),
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            LookupError::Unavailable(response.text().await.unwrap_or_default())
        }
        _ => match response.text().await {
            Ok(text) => LookupError::FetchError(format!("{}: {}", status, text)),
            Err(e) => LookupError::FetchError(e.to_string()),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_video_id_extraction() {
        let id = |query: &str| extract_video_id(query);

        assert_eq!(
            id("https://www.youtube.com/watch?v=JwRWf3ho4B8&list=PL23A657E4BD523733&index=45"),
            Some("JwRWf3ho4B8".to_string())
        );
        assert_eq!(
            id("www.youtube.com/watch?v=z09GolEktUw&feature=youtu.be"),
            Some("z09GolEktUw".to_string())
        );
        assert_eq!(
            id("https://music.youtube.com/watch?v=-t-75CCdM2o"),
            Some("-t-75CCdM2o".to_string())
        );
        assert_eq!(
            id("https://youtube.com/v/z09GolEktUw"),
            Some("z09GolEktUw".to_string())
        );
        assert_eq!(
            id("https://www.youtube.com/shorts/z09GolEktUw"),
            Some("z09GolEktUw".to_string())
        );
        assert_eq!(id("youtu.be/z09GolEktUw"), Some("z09GolEktUw".to_string()));

        assert_eq!(id("https://www.youtube.com/"), None);
        assert_eq!(id("https://www.youtube.com/@Ayrun"), None);
        assert_eq!(id("youtube.com/"), None);
        assert_eq!(id("amazing grace"), None);
        assert_eq!(id("https://notyoutube.com/watch?v=z09GolEktUw"), None);
        assert_eq!(id("https://youtube.com.evil.example/watch?v=z09GolEktUw"), None);
    }


    #[test]
    fn test_search_response() {
        let json = r#"{
            "kind": "youtube#searchListResponse",
            "items": [
                {
                    "id": { "kind": "youtube#video", "videoId": "CDdvReNKKuk" },
                    "snippet": {
                        "title": "Amazing Grace &amp; Other Hymns",
                        "channelTitle": "Choir &#39;Live&#39;",
                        "thumbnails": {
                            "default": { "url": "https://i.ytimg.com/vi/CDdvReNKKuk/default.jpg", "width": 120 },
                            "high": { "url": "https://i.ytimg.com/vi/CDdvReNKKuk/hqdefault.jpg", "width": 480 },
                            "medium": { "url": "https://i.ytimg.com/vi/CDdvReNKKuk/mqdefault.jpg", "width": 320 }
                        }
                    }
                },
                {
                    "id": { "kind": "youtube#channel", "channelId": "UC123" },
                    "snippet": { "title": "A channel", "channelTitle": "A channel" }
                },
                {
                    "id": { "kind": "youtube#video", "videoId": "bad" },
                    "snippet": { "title": "Broken", "channelTitle": "Nobody" }
                }
            ]
        }"#;

        let list: List<SearchItem> = serde_json::from_str(json).unwrap();
        let candidates = search_to_candidates(list);

        assert_eq!(
            candidates,
            [VideoCandidate {
                id: "CDdvReNKKuk".to_string(),
                title: "Amazing Grace & Other Hymns".to_string(),
                channel_title: "Choir 'Live'".to_string(),
                thumbnail_url: Some("https://i.ytimg.com/vi/CDdvReNKKuk/hqdefault.jpg".to_string()),
            }]
        );
    }

    #[test]
    fn test_videos_response() {
        let json = r#"{
            "items": [
                {
                    "id": "dQw4w9WgXcQ",
                    "snippet": { "title": "Song", "channelTitle": "Artist", "thumbnails": {} }
                }
            ]
        }"#;

        let list: List<VideoItem> = serde_json::from_str(json).unwrap();
        let candidates = videos_to_candidates(list);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].thumbnail_url, None);

        let empty: List<VideoItem> = serde_json::from_str("{}").unwrap();
        assert!(videos_to_candidates(empty).is_empty());

        let empty: List<SearchItem> =
            serde_json::from_str(r#"{ "kind": "youtube#searchListResponse" }"#).unwrap();
        assert!(search_to_candidates(empty).is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured() {
        let lookup = YouTubeLookup::new(&Config::default());

        assert!(matches!(
            lookup.search("amazing grace").await,
            Err(LookupError::NotConfigured)
        ));
        assert!(matches!(lookup.search("  ").await, Err(LookupError::Invalid(_))));
    }
}
