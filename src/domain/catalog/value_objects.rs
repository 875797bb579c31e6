//! Catalog Context - Value Objects

/// 曲目元数据
///
/// 由曲库按一次查询产生，只读，一次播放尝试后丢弃
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    title: String,
    artists: Vec<String>,
}

impl Track {
    pub fn new(title: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            title: title.into(),
            artists,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    /// 主艺术家（列表中的第一位）
    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// 用于回复的艺术家列表，逗号分隔
    pub fn display_artists(&self) -> String {
        self.artists.join(", ")
    }

    /// 在视频站上检索时使用的关键词: "<标题> <主艺术家>"
    pub fn search_terms(&self) -> String {
        match self.primary_artist() {
            Some(artist) => format!("{} {}", self.title, artist),
            None => self.title.clone(),
        }
    }
}

impl std::fmt::Display for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.artists.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} by {}", self.title, self.display_artists())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_all_artists() {
        let track = Track::new(
            "Under Pressure",
            vec!["Queen".to_string(), "David Bowie".to_string()],
        );
        assert_eq!(track.to_string(), "Under Pressure by Queen, David Bowie");
    }

    #[test]
    fn test_search_terms_use_primary_artist() {
        let track = Track::new(
            "Under Pressure",
            vec!["Queen".to_string(), "David Bowie".to_string()],
        );
        assert_eq!(track.search_terms(), "Under Pressure Queen");
    }

    #[test]
    fn test_track_without_artists() {
        let track = Track::new("Untitled", vec![]);
        assert_eq!(track.primary_artist(), None);
        assert_eq!(track.search_terms(), "Untitled");
        assert_eq!(track.to_string(), "Untitled");
    }
}
