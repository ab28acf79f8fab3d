//! Static metadata for supported social platforms.

use crate::error::{Error, Result};
use crate::render::ArtifactFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Shape of the post text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    /// One compact post.
    Short,
    /// One long-form post.
    Detailed,
    /// An ordered sequence of posts.
    Thread,
}

impl ContentType {
    /// Fallback order when a platform lacks a content type.
    fn degrade(self) -> &'static [ContentType] {
        match self {
            Self::Thread => &[Self::Thread, Self::Detailed, Self::Short],
            Self::Detailed => &[Self::Detailed, Self::Short],
            Self::Short => &[Self::Short],
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Short => write!(f, "short"),
            Self::Detailed => write!(f, "detailed"),
            Self::Thread => write!(f, "thread"),
        }
    }
}

impl FromStr for ContentType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "short" => Ok(Self::Short),
            "detailed" => Ok(Self::Detailed),
            "thread" => Ok(Self::Thread),
            other => Err(Error::invalid_argument(format!(
                "unknown content type '{other}' (expected short, detailed or thread)"
            ))),
        }
    }
}

/// Media a platform accepts as an attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Document,
    File,
}

impl From<ArtifactFormat> for MediaType {
    fn from(format: ArtifactFormat) -> Self {
        match format {
            ArtifactFormat::Png => Self::Image,
            ArtifactFormat::Html | ArtifactFormat::Svg => Self::Document,
        }
    }
}

impl MediaType {
    /// Attachment kind of a file, from its extension.
    ///
    /// Extensions that are not artifact formats upload as a plain file.
    pub fn of_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse::<ArtifactFormat>().ok())
            .map_or(Self::File, Self::from)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Document => "document",
            Self::File => "file",
        }
    }
}

/// Maximum hashtags per content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashtagLimits {
    pub short: usize,
    pub detailed: usize,
    pub thread: usize,
}

impl HashtagLimits {
    pub fn for_type(&self, content_type: ContentType) -> usize {
        match content_type {
            ContentType::Short => self.short,
            ContentType::Detailed => self.detailed,
            ContentType::Thread => self.thread,
        }
    }
}

/// Static description of a platform.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformSpec {
    /// Platform id used in requests.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Supported content types; the first is the platform default.
    pub content_types: &'static [ContentType],
    /// Character limit of one post, hashtags included.
    pub char_limit: usize,
    /// Hashtag caps.
    pub hashtag_limits: HashtagLimits,
    /// Accepted attachments.
    pub media_types: &'static [MediaType],
    /// Whether multi-post threads are supported.
    pub supports_threads: bool,
    /// Whether posts should carry a raster image.
    pub requires_image: bool,
    /// Integration endpoint for publishing.
    pub endpoint: &'static str,
}

impl PlatformSpec {
    pub fn supports(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }

    /// The platform's default content type.
    pub fn default_content_type(&self) -> ContentType {
        self.content_types
            .first()
            .copied()
            .unwrap_or(ContentType::Short)
    }

    /// Closest supported content type: thread degrades to detailed, detailed
    /// to short.
    pub fn resolve_content_type(&self, requested: ContentType) -> ContentType {
        requested
            .degrade()
            .iter()
            .copied()
            .find(|ct| self.supports(*ct))
            .unwrap_or_else(|| self.default_content_type())
    }

    pub fn hashtag_limit(&self, content_type: ContentType) -> usize {
        self.hashtag_limits.for_type(content_type)
    }

    /// Whether an attachment of `kind` can be posted. Platforms taking
    /// generic files also take documents.
    pub fn accepts_media(&self, kind: MediaType) -> bool {
        self.media_types.contains(&kind)
            || (kind != MediaType::Image && self.media_types.contains(&MediaType::File))
    }

    /// Reject an attachment the platform cannot post.
    pub fn require_media(&self, kind: MediaType) -> Result<()> {
        if self.accepts_media(kind) {
            return Ok(());
        }
        Err(Error::invalid_argument(format!(
            "{} does not accept {} attachments",
            self.name,
            kind.as_str()
        )))
    }
}

/// All supported platforms.
pub const PLATFORMS: &[PlatformSpec] = &[
    PlatformSpec {
        id: "twitter",
        name: "Twitter / X",
        content_types: &[ContentType::Short, ContentType::Thread],
        char_limit: 280,
        hashtag_limits: HashtagLimits {
            short: 3,
            detailed: 3,
            thread: 2,
        },
        media_types: &[MediaType::Image],
        supports_threads: true,
        requires_image: true,
        endpoint: "/2/tweets",
    },
    PlatformSpec {
        id: "linkedin",
        name: "LinkedIn",
        content_types: &[ContentType::Detailed, ContentType::Short],
        char_limit: 3000,
        hashtag_limits: HashtagLimits {
            short: 3,
            detailed: 5,
            thread: 5,
        },
        media_types: &[MediaType::Image, MediaType::Document],
        supports_threads: false,
        requires_image: true,
        endpoint: "/v2/ugcPosts",
    },
    PlatformSpec {
        id: "discord",
        name: "Discord",
        content_types: &[ContentType::Short, ContentType::Detailed],
        char_limit: 2000,
        hashtag_limits: HashtagLimits {
            short: 3,
            detailed: 5,
            thread: 5,
        },
        media_types: &[MediaType::Image, MediaType::File],
        supports_threads: false,
        requires_image: true,
        endpoint: "/channels/messages",
    },
    PlatformSpec {
        id: "telegram",
        name: "Telegram",
        content_types: &[ContentType::Detailed, ContentType::Short],
        char_limit: 4096,
        hashtag_limits: HashtagLimits {
            short: 3,
            detailed: 5,
            thread: 5,
        },
        media_types: &[MediaType::Image, MediaType::Document],
        supports_threads: false,
        requires_image: true,
        endpoint: "/sendPhoto",
    },
];

/// Look up a platform by id (case-insensitive; `x` is an alias for twitter).
pub fn platform(id: &str) -> Option<&'static PlatformSpec> {
    let id = id.trim().to_ascii_lowercase();
    let id = if id == "x" { "twitter" } else { id.as_str() };
    PLATFORMS.iter().find(|p| p.id == id)
}

/// Look up a platform, failing with `InvalidArgument`.
pub fn require_platform(id: &str) -> Result<&'static PlatformSpec> {
    platform(id).ok_or_else(|| {
        Error::invalid_argument(format!(
            "unsupported platform '{id}' (supported: {})",
            PLATFORMS.iter().map(|p| p.id).collect::<Vec<_>>().join(", ")
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(platform("Twitter").unwrap().char_limit, 280);
        assert_eq!(platform("x").unwrap().id, "twitter");
        assert!(platform("myspace").is_none());
        assert!(require_platform("myspace").unwrap_err().to_string().contains("myspace"));
    }

    #[test]
    fn test_content_type_resolution() {
        let twitter = platform("twitter").unwrap();
        assert_eq!(twitter.resolve_content_type(ContentType::Thread), ContentType::Thread);
        assert_eq!(twitter.resolve_content_type(ContentType::Detailed), ContentType::Short);

        let linkedin = platform("linkedin").unwrap();
        assert_eq!(linkedin.resolve_content_type(ContentType::Thread), ContentType::Detailed);
        assert_eq!(linkedin.default_content_type(), ContentType::Detailed);
    }

    #[test]
    fn test_media_kind_follows_artifact_extension() {
        assert_eq!(MediaType::of_path(Path::new("out/eth.png")), MediaType::Image);
        assert_eq!(MediaType::of_path(Path::new("out/eth.HTML")), MediaType::Document);
        assert_eq!(MediaType::of_path(Path::new("out/eth.svg")), MediaType::Document);
        assert_eq!(MediaType::of_path(Path::new("out/eth.csv")), MediaType::File);
        assert_eq!(MediaType::of_path(Path::new("out/eth")), MediaType::File);
    }

    #[test]
    fn test_accepted_media() {
        let twitter = platform("twitter").unwrap();
        assert!(twitter.accepts_media(MediaType::Image));
        assert!(!twitter.accepts_media(MediaType::Document));
        assert_eq!(
            twitter.require_media(MediaType::Document).unwrap_err().kind(),
            "InvalidArgument"
        );

        let discord = platform("discord").unwrap();
        assert!(discord.accepts_media(MediaType::Document));
        assert!(platform("telegram").unwrap().accepts_media(MediaType::Document));
        assert!(!platform("linkedin").unwrap().accepts_media(MediaType::File));
    }

    #[test]
    fn test_twitter_short_tag_cap() {
        assert_eq!(platform("twitter").unwrap().hashtag_limit(ContentType::Short), 3);
    }

    #[test]
    fn test_metadata_serializes() {
        let value = serde_json::to_value(PLATFORMS).unwrap();
        assert_eq!(value[0]["id"], "twitter");
        assert_eq!(value[0]["charLimit"], 280);
        assert_eq!(value[0]["contentTypes"][1], "thread");
        assert_eq!(value[1]["mediaTypes"][1], "document");
    }
}
