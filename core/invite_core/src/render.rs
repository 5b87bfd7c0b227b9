//! Pure view rendering: `(ConfigDocument, ApplicationState) → HTML`.
//!
//! Each section builder returns `None` when its config data is absent or
//! empty, so the page never carries an empty shell. Rendering the same pair
//! twice yields byte-identical markup.

use crate::config_doc::{ConfigDocument, LocalizedText};
use crate::format::{escape_html, format_price};
use crate::i18n::{localize, ui, UiText};
use crate::paths::asset_url;
use crate::state::{ApplicationState, Locale};

/// Static inputs of a render that are not part of the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderContext {
    /// Base under which `events/<slug>/assets/<file>` lives.
    pub asset_base: String,
}

impl RenderContext {
    pub fn new(asset_base: impl Into<String>) -> Self {
        Self {
            asset_base: asset_base.into(),
        }
    }
}

struct View<'a> {
    config: &'a ConfigDocument,
    state: &'a ApplicationState,
    ctx: &'a RenderContext,
}

impl View<'_> {
    fn locale(&self) -> Locale {
        self.state.locale
    }

    fn text(&self, field: Option<&LocalizedText>) -> String {
        escape_html(&localize(field, self.locale()))
    }

    fn ui(&self, key: UiText) -> &'static str {
        ui(key, self.locale())
    }

    fn asset(&self, filename: &str) -> String {
        escape_html(&asset_url(
            &self.ctx.asset_base,
            self.state.event_slug(),
            filename,
        ))
    }
}

/// Render the full page.
pub fn render_page(
    config: &ConfigDocument,
    state: &ApplicationState,
    ctx: &RenderContext,
) -> String {
    let view = View { config, state, ctx };
    let title = view.text(config.title.as_ref());

    let sections: String = [
        Some(render_controls(&view)),
        Some(render_hero(&view)),
        render_tiers(&view),
        render_dress_code(&view),
        render_lineup(&view),
        render_schedule(&view),
        render_faq(&view),
        render_vip_flow(&view),
        render_gallery(&view),
        render_video(&view),
        render_payments(&view),
        render_links(&view),
        render_policy(&view),
        render_music(&view),
    ]
    .into_iter()
    .flatten()
    .collect();

    format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\">\n\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n\
<title>{title}</title>\n</head>\n<body data-event=\"{slug}\">\n<main id=\"app\">\n{sections}</main>\n</body>\n</html>\n",
        lang = state.locale.html_lang(),
        slug = escape_html(state.event_slug()),
    )
}

/// Standalone page shown instead of the view when the config cannot be loaded.
pub fn render_error_panel(message: &str, attempted_path: &str, locale: Locale) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<head>\n<meta charset=\"UTF-8\">\n\
<title>{heading}</title>\n</head>\n<body>\n<div class=\"error-panel\" role=\"alert\">\n\
<h1>{heading}</h1>\n<p class=\"error-message\">{message}</p>\n\
<p class=\"error-path\">{path_label}: <code>{path}</code></p>\n</div>\n</body>\n</html>\n",
        lang = locale.html_lang(),
        heading = ui(UiText::ConfigUnavailable, locale),
        message = escape_html(message),
        path_label = ui(UiText::AttemptedPath, locale),
        path = escape_html(attempted_path),
    )
}

fn section(id: &str, heading: &str, body: &str) -> String {
    format!("<section class=\"section\" id=\"{id}\">\n<h2>{heading}</h2>\n{body}</section>\n")
}

fn render_controls(view: &View) -> String {
    let state = view.state;
    let lang_button = |locale: Locale, label: &str| {
        let active = if state.locale == locale { " active" } else { "" };
        format!(
            "<button type=\"button\" class=\"lang{active}\" data-action=\"lang\" data-lang=\"{}\">{label}</button>",
            locale.code()
        )
    };

    format!(
        "<nav class=\"controls\">\n{}{}\n\
<input id=\"guestName\" type=\"text\" value=\"{}\" placeholder=\"{}\">\n\
<input id=\"senderName\" type=\"text\" value=\"{}\" placeholder=\"{}\">\n\
<button type=\"button\" id=\"copyLink\" data-action=\"copy\">{}</button>\n</nav>\n",
        lang_button(Locale::En, "EN"),
        lang_button(Locale::Jp, "JP"),
        escape_html(&state.guest_name),
        view.ui(UiText::GuestPlaceholder),
        escape_html(&state.sender_name),
        view.ui(UiText::SenderPlaceholder),
        view.ui(UiText::CopyLink),
    )
}

fn render_hero(view: &View) -> String {
    let config = view.config;
    let state = view.state;
    let mut out = String::new();

    let style = config
        .hero_bg
        .as_deref()
        .filter(|bg| !bg.trim().is_empty())
        .map(|bg| format!(" style=\"background-image:url('{}')\"", view.asset(bg)))
        .unwrap_or_default();
    out.push_str(&format!("<header class=\"hero\" id=\"hero\"{style}>\n"));

    let brand = view.text(config.brand.as_ref());
    if !brand.is_empty() {
        out.push_str(&format!("<p class=\"brand\">{brand}</p>\n"));
    }
    out.push_str(&format!(
        "<h1 class=\"title\">{}</h1>\n",
        view.text(config.title.as_ref())
    ));
    for (class, field) in [
        ("subtitle", &config.subtitle),
        ("date", &config.date),
        ("venue", &config.venue),
        ("description", &config.description),
    ] {
        let text = view.text(field.as_ref());
        if !text.is_empty() {
            out.push_str(&format!("<p class=\"{class}\">{text}</p>\n"));
        }
    }

    let guest = if state.guest_name.trim().is_empty() {
        view.ui(UiText::GuestPlaceholder).to_string()
    } else {
        escape_html(&state.guest_name)
    };
    out.push_str(&format!("<p class=\"guest\">{guest}</p>\n"));

    if !state.sender_name.trim().is_empty() {
        out.push_str(&format!(
            "<p class=\"sender\">{} {}</p>\n",
            view.ui(UiText::InvitedBy),
            escape_html(&state.sender_name)
        ));
    }
    if !state.referral_code.is_empty() {
        out.push_str(&format!(
            "<span class=\"badge referral\">{}: {}</span>\n",
            view.ui(UiText::Referral),
            escape_html(&state.referral_code)
        ));
    }

    out.push_str("</header>\n");
    out
}

fn render_tiers(view: &View) -> Option<String> {
    let config = view.config;
    if config.tiers.is_empty() {
        return None;
    }
    let wanted = view.state.selected_tier_id.as_str();
    let selected = Some(wanted)
        .filter(|id| !id.is_empty())
        .and_then(|id| config.tier(id))
        .map(|t| t.id.as_str());
    let symbol = config.currency_symbol();

    let mut body = String::from("<select id=\"tierSelect\" data-action=\"tier\">\n");
    body.push_str(&format!(
        "<option value=\"\"{}>{}</option>\n",
        if selected.is_none() { " selected" } else { "" },
        view.ui(UiText::ChooseTier)
    ));
    for tier in &config.tiers {
        body.push_str(&format!(
            "<option value=\"{}\"{}{}>{} {}</option>\n",
            escape_html(&tier.id),
            if selected == Some(tier.id.as_str()) { " selected" } else { "" },
            if tier.sold_out { " disabled" } else { "" },
            view.text(tier.name.as_ref()),
            escape_html(&format_price(tier.price, symbol)),
        ));
    }
    body.push_str("</select>\n<div class=\"tiers\">\n");

    for tier in &config.tiers {
        let mut card = format!(
            "<article class=\"tier{}\" data-tier=\"{}\">\n",
            if tier.sold_out { " sold-out" } else { "" },
            escape_html(&tier.id)
        );
        if let Some(image) = tier.image.as_deref().filter(|i| !i.is_empty()) {
            card.push_str(&format!("<img src=\"{}\" alt=\"\">\n", view.asset(image)));
        }
        card.push_str(&format!(
            "<h3>{}</h3>\n<p class=\"price\">{}</p>\n",
            view.text(tier.name.as_ref()),
            escape_html(&format_price(tier.price, symbol))
        ));
        let badge = view.text(tier.badge.as_ref());
        if !badge.is_empty() {
            card.push_str(&format!("<span class=\"badge\">{badge}</span>\n"));
        }
        let includes = view.text(tier.includes.as_ref());
        if !includes.is_empty() {
            card.push_str(&format!("<p class=\"includes\">{includes}</p>\n"));
        }
        let note = view.text(tier.note.as_ref());
        if !note.is_empty() {
            card.push_str(&format!("<p class=\"note\">{note}</p>\n"));
        }
        if tier.sold_out {
            card.push_str(&format!(
                "<span class=\"badge sold-out\">{}</span>\n",
                view.ui(UiText::SoldOut)
            ));
        }
        card.push_str("</article>\n");
        body.push_str(&card);
    }
    body.push_str("</div>\n");

    Some(section("tickets", view.ui(UiText::Tickets), &body))
}

fn render_dress_code(view: &View) -> Option<String> {
    let text = view.text(view.config.dress_code.as_ref());
    if text.is_empty() {
        return None;
    }
    Some(section(
        "dress-code",
        view.ui(UiText::DressCode),
        &format!("<p>{text}</p>\n"),
    ))
}

fn render_lineup(view: &View) -> Option<String> {
    let items: String = view
        .config
        .lineup
        .iter()
        .map(|entry| {
            let role = view.text(entry.role.as_ref());
            let role = if role.is_empty() {
                String::new()
            } else {
                format!(" <span class=\"role\">{role}</span>")
            };
            format!("<li>{}{role}</li>\n", view.text(entry.name.as_ref()))
        })
        .collect();
    list_section(view, "lineup", UiText::Lineup, "ul", items)
}

fn render_schedule(view: &View) -> Option<String> {
    let items: String = view
        .config
        .schedule
        .iter()
        .map(|entry| {
            format!(
                "<li><time>{}</time> {}</li>\n",
                escape_html(entry.time.as_deref().unwrap_or_default()),
                view.text(entry.label.as_ref())
            )
        })
        .collect();
    list_section(view, "schedule", UiText::Schedule, "ol", items)
}

fn render_faq(view: &View) -> Option<String> {
    if view.config.faq.is_empty() {
        return None;
    }
    let body: String = view
        .config
        .faq
        .iter()
        .map(|entry| {
            format!(
                "<details>\n<summary>{}</summary>\n<p>{}</p>\n</details>\n",
                view.text(entry.q.as_ref()),
                view.text(entry.a.as_ref())
            )
        })
        .collect();
    Some(section("faq", view.ui(UiText::Faq), &body))
}

fn render_vip_flow(view: &View) -> Option<String> {
    let items: String = view
        .config
        .vip_flow
        .iter()
        .map(|step| {
            format!(
                "<li><strong>{}</strong> {}</li>\n",
                view.text(step.title.as_ref()),
                view.text(step.text.as_ref())
            )
        })
        .collect();
    list_section(view, "vip-flow", UiText::VipFlow, "ol", items)
}

fn render_gallery(view: &View) -> Option<String> {
    let images: String = view
        .config
        .gallery
        .iter()
        .filter(|f| !f.trim().is_empty())
        .map(|f| format!("<img src=\"{}\" alt=\"\" loading=\"lazy\">\n", view.asset(f)))
        .collect();
    if images.is_empty() {
        return None;
    }
    Some(section(
        "gallery",
        view.ui(UiText::Gallery),
        &format!("<div class=\"gallery\">\n{images}</div>\n"),
    ))
}

fn render_video(view: &View) -> Option<String> {
    let url = view.config.video.as_deref().filter(|v| !v.trim().is_empty())?;
    Some(section(
        "video",
        view.ui(UiText::Video),
        &format!(
            "<iframe src=\"{}\" allowfullscreen loading=\"lazy\"></iframe>\n",
            escape_html(url)
        ),
    ))
}

fn render_payments(view: &View) -> Option<String> {
    if view.config.payments.is_empty() {
        return None;
    }
    let mut body = String::from("<div class=\"payments\">\n");
    for method in &view.config.payments {
        body.push_str(&format!(
            "<article class=\"payment\">\n<h3>{}</h3>\n",
            view.text(method.name.as_ref())
        ));
        let note = view.text(method.note.as_ref());
        if !note.is_empty() {
            body.push_str(&format!("<p class=\"note\">{note}</p>\n"));
        }
        if let Some(qr) = method.qr.as_deref().filter(|q| !q.is_empty()) {
            body.push_str(&format!(
                "<img class=\"qr\" src=\"{}\" alt=\"QR\">\n",
                view.asset(qr)
            ));
        }
        body.push_str("</article>\n");
    }
    body.push_str("</div>\n");
    Some(section("payments", view.ui(UiText::Payments), &body))
}

fn render_links(view: &View) -> Option<String> {
    let items: String = view
        .config
        .links
        .present()
        .into_iter()
        .map(|(kind, href)| {
            format!(
                "<li><a class=\"link-{kind}\" href=\"{}\" target=\"_blank\" rel=\"noopener\">{kind}</a></li>\n",
                escape_html(href)
            )
        })
        .collect();
    list_section(view, "links", UiText::Links, "ul", items)
}

fn render_policy(view: &View) -> Option<String> {
    let text = view.text(view.config.policy.as_ref());
    if text.is_empty() {
        return None;
    }
    Some(section(
        "policy",
        view.ui(UiText::Policy),
        &format!("<p>{text}</p>\n"),
    ))
}

fn render_music(view: &View) -> Option<String> {
    let asset = view.config.music_asset()?;
    Some(format!(
        "<div class=\"music\" id=\"music\">\n<audio id=\"bgm\" src=\"{}\" loop preload=\"none\"></audio>\n\
<button type=\"button\" id=\"musicToggle\" data-action=\"music\" aria-pressed=\"{}\">{}</button>\n</div>\n",
        view.asset(asset),
        view.state.music_enabled,
        view.ui(UiText::Music),
    ))
}

fn list_section(
    view: &View,
    id: &str,
    heading: UiText,
    tag: &str,
    items: String,
) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    Some(section(
        id,
        view.ui(heading),
        &format!("<{tag}>\n{items}</{tag}>\n"),
    ))
}
