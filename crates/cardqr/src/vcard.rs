//! vCard 3.0 encoding.
//!
//! [`encode`] turns a [`Profile`] into the text embedded in its QR code. The
//! output is line-oriented, `\n`-separated, and has no trailing newline after
//! `END:VCARD`. Empty fields produce no line at all.

use crate::photo::parse_photo;
use crate::profile::Profile;

/// First line of every card.
pub const BEGIN: &str = "BEGIN:VCARD";

/// Version line.
pub const VERSION: &str = "VERSION:3.0";

/// Last line of every card.
pub const END: &str = "END:VCARD";

/// Escapes line breaks in an address as the two characters `\n`.
#[must_use]
pub fn escape_newlines(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\n', "\\n")
}

/// Encode a profile as vCard 3.0 text.
///
/// The tagline and the display name are never encoded. Photos that are not
/// `data:image/` references are skipped.
#[must_use]
pub fn encode(profile: &Profile) -> String {
    let mut lines: Vec<String> = vec![BEGIN.to_string(), VERSION.to_string()];

    let fields = [
        ("FN", &profile.full_name),
        ("ORG", &profile.company),
        ("TITLE", &profile.job_title),
        ("TEL;TYPE=WORK,VOICE", &profile.phone),
        ("EMAIL", &profile.email),
        ("URL", &profile.website),
    ];
    for (key, value) in fields {
        if !value.is_empty() {
            lines.push(format!("{key}:{value}"));
        }
    }

    // Only the last positional slot carries the free-text address
    if !profile.address.is_empty() {
        lines.push(format!(
            "ADR;TYPE=WORK:;;{}",
            escape_newlines(&profile.address)
        ));
    }

    if let Some(photo) = profile.photo.as_deref().and_then(parse_photo) {
        lines.push(format!(
            "PHOTO;TYPE={};ENCODING=b:{}",
            photo.kind.vcard_type(),
            photo.payload
        ));
    }

    lines.push(END.to_string());
    lines.join("\n")
}
