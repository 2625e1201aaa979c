//! HTML rendering for profile cards

use crate::domain::profiles::Profile;

pub const WIDGET_MIME_TYPE: &str = "text/html+skybridge";

pub fn render_profile_card(profile: &Profile) -> String {
    let skills = profile
        .skills
        .iter()
        .map(|skill| format!("<li>{}</li>", escape_html(skill)))
        .collect::<String>();

    format!(
        concat!(
            "<div class=\"profile-card\" data-profile-id=\"{id}\">",
            "<h2>{name}</h2>",
            "<p class=\"title\">{title} &middot; {location}</p>",
            "<p class=\"bio\">{bio}</p>",
            "<ul class=\"skills\">{skills}</ul>",
            "</div>"
        ),
        id = escape_html(&profile.id),
        name = escape_html(&profile.name),
        title = escape_html(&profile.title),
        location = escape_html(&profile.location),
        bio = escape_html(&profile.bio),
        skills = skills,
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for character in raw.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}
