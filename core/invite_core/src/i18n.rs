//! Two-locale text lookup.
//!
//! Config fields go through [`localize`]; page chrome (buttons, headings,
//! notices) comes from [`ui`], an English table with a Japanese overlay.

use serde_json::Value;

use crate::config_doc::LocalizedText;
use crate::state::Locale;

/// Resolve a config text for `locale`: exact locale, then English, then empty.
pub fn localize(field: Option<&LocalizedText>, locale: Locale) -> String {
    match field {
        None => String::new(),
        Some(LocalizedText::Plain(s)) => s.clone(),
        Some(LocalizedText::ByLocale(map)) => [locale.code(), Locale::En.code()]
            .into_iter()
            .find_map(|code| map.get(code).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        Some(LocalizedText::Other(_)) => String::new(),
    }
}

/// Keys for page chrome strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiText {
    GuestPlaceholder,
    SenderPlaceholder,
    InvitedBy,
    Referral,
    Tickets,
    ChooseTier,
    SoldOut,
    DressCode,
    Lineup,
    Schedule,
    Faq,
    VipFlow,
    Gallery,
    Video,
    Payments,
    Links,
    Policy,
    CopyLink,
    Music,
    LinkCopied,
    CopyManually,
    PlaybackBlocked,
    ConfigUnavailable,
    AttemptedPath,
}

pub fn ui(key: UiText, locale: Locale) -> &'static str {
    match locale {
        Locale::Jp => jp(key).unwrap_or_else(|| en(key)),
        Locale::En => en(key),
    }
}

fn en(key: UiText) -> &'static str {
    match key {
        UiText::GuestPlaceholder => "Distinguished Guest",
        UiText::SenderPlaceholder => "Your name",
        UiText::InvitedBy => "Invited by",
        UiText::Referral => "Referral",
        UiText::Tickets => "Tickets",
        UiText::ChooseTier => "Choose a ticket",
        UiText::SoldOut => "Sold out",
        UiText::DressCode => "Dress code",
        UiText::Lineup => "Lineup",
        UiText::Schedule => "Schedule",
        UiText::Faq => "FAQ",
        UiText::VipFlow => "VIP flow",
        UiText::Gallery => "Gallery",
        UiText::Video => "Video",
        UiText::Payments => "Payment methods",
        UiText::Links => "Links",
        UiText::Policy => "Policy",
        UiText::CopyLink => "Copy invitation link",
        UiText::Music => "Music",
        UiText::LinkCopied => "Link copied",
        UiText::CopyManually => "Copy this link",
        UiText::PlaybackBlocked => "Tap again to play music",
        UiText::ConfigUnavailable => "Event configuration could not be loaded",
        UiText::AttemptedPath => "Attempted path",
    }
}

// Only keys whose Japanese text differs from English.
fn jp(key: UiText) -> Option<&'static str> {
    Some(match key {
        UiText::GuestPlaceholder => "ご招待客",
        UiText::SenderPlaceholder => "お名前",
        UiText::InvitedBy => "ご紹介者",
        UiText::Referral => "紹介コード",
        UiText::Tickets => "チケット",
        UiText::ChooseTier => "チケットを選択",
        UiText::SoldOut => "完売",
        UiText::DressCode => "ドレスコード",
        UiText::Lineup => "出演者",
        UiText::Schedule => "スケジュール",
        UiText::Faq => "よくある質問",
        UiText::VipFlow => "VIPの流れ",
        UiText::Gallery => "ギャラリー",
        UiText::Video => "動画",
        UiText::Payments => "お支払い方法",
        UiText::Links => "リンク",
        UiText::Policy => "ポリシー",
        UiText::CopyLink => "招待リンクをコピー",
        UiText::Music => "音楽",
        UiText::LinkCopied => "リンクをコピーしました",
        UiText::CopyManually => "このリンクをコピーしてください",
        UiText::PlaybackBlocked => "もう一度タップして音楽を再生",
        UiText::ConfigUnavailable | UiText::AttemptedPath => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn by_locale(pairs: &[(&str, &str)]) -> LocalizedText {
        LocalizedText::ByLocale(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), Value::from(*v)))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn plain_text_ignores_locale() {
        let field = LocalizedText::from("Tokyo");
        assert_eq!(localize(Some(&field), Locale::Jp), "Tokyo");
        assert_eq!(localize(Some(&field), Locale::En), "Tokyo");
    }

    #[test]
    fn exact_locale_wins() {
        let field = by_locale(&[("en", "Night"), ("jp", "夜")]);
        assert_eq!(localize(Some(&field), Locale::Jp), "夜");
        assert_eq!(localize(Some(&field), Locale::En), "Night");
    }

    #[test]
    fn missing_locale_falls_back_to_english() {
        let field = by_locale(&[("en", "Night")]);
        assert_eq!(localize(Some(&field), Locale::Jp), "Night");
    }

    #[test]
    fn null_locale_entry_falls_back_to_english() {
        let field: LocalizedText =
            serde_json::from_str(r#"{"en":"Spring Gala","jp":null}"#).unwrap();
        assert_eq!(localize(Some(&field), Locale::Jp), "Spring Gala");
        let field: LocalizedText = serde_json::from_str(r#"{"en":"Spring Gala","jp":3}"#).unwrap();
        assert_eq!(localize(Some(&field), Locale::Jp), "Spring Gala");
    }

    #[test]
    fn missing_everything_is_empty() {
        let field = by_locale(&[("fr", "Nuit")]);
        assert_eq!(localize(Some(&field), Locale::Jp), "");
        assert_eq!(localize(None, Locale::En), "");
        let odd = LocalizedText::Other(serde_json::json!(7));
        assert_eq!(localize(Some(&odd), Locale::En), "");
    }

    #[test]
    fn ui_overlay_falls_back_to_english() {
        assert_eq!(ui(UiText::GuestPlaceholder, Locale::Jp), "ご招待客");
        assert_eq!(
            ui(UiText::AttemptedPath, Locale::Jp),
            ui(UiText::AttemptedPath, Locale::En)
        );
    }
}
