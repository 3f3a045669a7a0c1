//! A promotional banner as proposed by the assistant.

use serde::{Deserialize, Serialize};

/// A promotional banner.
///
/// Classification requires `title` and `bannerAction`; the remaining fields
/// default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Banner {
    /// Headline text.
    pub title: String,
    /// Supporting copy.
    #[serde(default)]
    pub description: String,
    /// Accent color, e.g. a hex string.
    #[serde(default)]
    pub color: String,
    /// Visual style preset.
    #[serde(default)]
    pub style: String,
    /// Action triggered on tap.
    pub banner_action: String,
    /// Audience the banner is shown to.
    #[serde(default)]
    pub visibility_type: String,
    /// Whether the banner is active.
    #[serde(default)]
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_requires_title_and_action() {
        let banner: Banner = serde_json::from_str(
            r##"{"title":"Double Points Week","bannerAction":"showRewards","color":"#007AFF"}"##,
        )
        .unwrap();
        assert_eq!(banner.title, "Double Points Week");
        assert_eq!(banner.banner_action, "showRewards");

        let missing: Result<Banner, _> = serde_json::from_str(r#"{"title":"x"}"#);
        assert!(missing.is_err());
    }
}
