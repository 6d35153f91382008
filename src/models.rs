use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    GameAssets,
    Books,
    Comics,
    Tools,
    Games,
    PhysicalGames,
    Soundtracks,
    GameMods,
    Misc,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::GameAssets,
        Category::Books,
        Category::Comics,
        Category::Tools,
        Category::Games,
        Category::PhysicalGames,
        Category::Soundtracks,
        Category::GameMods,
        Category::Misc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::GameAssets => "game-assets",
            Category::Books => "books",
            Category::Comics => "comics",
            Category::Tools => "tools",
            Category::Games => "games",
            Category::PhysicalGames => "physical-games",
            Category::Soundtracks => "soundtracks",
            Category::GameMods => "game-mods",
            Category::Misc => "misc",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of the `on-sale?format=json` endpoint.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Page {
    pub(crate) page: u32,
    pub(crate) num_items: usize,
    pub(crate) content: String,
}

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    #[serde(rename = "macOS")]
    MacOs,
    Linux,
    Android,
    Web,
}

impl Platform {
    /// Maps the class of a platform badge to its platform.
    pub fn from_badge_class(class: &str) -> Option<Platform> {
        match class {
            "icon icon-windows8" => Some(Platform::Windows),
            "icon icon-apple" => Some(Platform::MacOs),
            "icon icon-tux" => Some(Platform::Linux),
            "icon icon-android" => Some(Platform::Android),
            "web_flag" => Some(Platform::Web),
            _ => None,
        }
    }
}

/// Accumulator for the listing currently being scanned. Its id is always
/// the one carried by the boundary marker that opened it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialListing {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) link: String,
    pub(crate) img_link: String,
    pub(crate) description: String,
    pub(crate) author: String,
    pub(crate) genre: String,
    pub(crate) sales_link: String,
    pub(crate) platforms: Vec<Platform>,
}

impl PartialListing {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn into_listing(self) -> Listing {
        Listing {
            id: self.id,
            link: self.link,
            img_link: self.img_link,
            title: self.title,
            description: self.description,
            author: self.author,
            sales_link: self.sales_link,
            end_date: None,
            genre: self.genre,
            platforms: self.platforms,
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct Listing {
    pub(crate) id: String,
    pub(crate) link: String,
    pub(crate) img_link: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) author: String,
    pub(crate) sales_link: String,
    /// `None` when the sale page did not expose an end date.
    pub(crate) end_date: Option<String>,
    pub(crate) genre: String,
    pub(crate) platforms: Vec<Platform>,
}

impl Listing {
    pub fn with_end_date(self, end_date: Option<String>) -> Self {
        Self { end_date, ..self }
    }
}

pub fn error_to_json(err: &dyn fmt::Display) -> serde_json::Value {
    serde_json::json!({ "error": err.to_string() })
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn able_to_load_page_envelope_from_resources() {
        let mut filepath = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        filepath.push("src/resources/on_sale_page.json");

        let contents = fs::read_to_string(filepath)
            .expect("Should have been able to read the test resource file");

        let page: Page = serde_json::from_str(&contents).unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.num_items, 3);
        assert!(page.content.contains("data-game_id=\"1001\""));
    }

    #[test]
    fn category_slugs_follow_declaration_order() {
        let slugs: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
        assert_eq!(
            slugs,
            vec![
                "game-assets",
                "books",
                "comics",
                "tools",
                "games",
                "physical-games",
                "soundtracks",
                "game-mods",
                "misc"
            ]
        );
    }

    #[test]
    fn listing_serializes_with_storefront_field_names() {
        let mut partial = PartialListing::new("42");
        partial.title = "Free Game".to_string();
        partial.platforms = vec![Platform::Windows, Platform::MacOs, Platform::Web];
        let listing = partial.into_listing();

        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["id"], "42");
        assert_eq!(value["title"], "Free Game");
        assert_eq!(value["end_date"], serde_json::Value::Null);
        assert_eq!(value["img_link"], "");
        assert_eq!(value["sales_link"], "");
        assert_eq!(
            value["platforms"],
            serde_json::json!(["Windows", "macOS", "Web"])
        );

        let dated = listing.with_end_date(Some("2024-05-01 00:00:00".to_string()));
        assert_eq!(dated.end_date.as_deref(), Some("2024-05-01 00:00:00"));
    }

    #[test]
    fn error_payload_escapes_message() {
        let payload = error_to_json(&"bad \"quote\"").to_string();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value, serde_json::json!({ "error": "bad \"quote\"" }));
    }

    #[test]
    fn badge_classes_map_to_platforms() {
        assert_eq!(Platform::from_badge_class("icon icon-tux"), Some(Platform::Linux));
        assert_eq!(Platform::from_badge_class("icon icon-android"), Some(Platform::Android));
        assert_eq!(Platform::from_badge_class("icon"), None);
    }
}
