//! Quirks-mode detection from a DOCTYPE token (§4.2.2).
//!
//! Public and system identifiers are normalized to lowercase before any
//! comparison here, matching the WHATWG algorithm.

use crate::html5::shared::QuirksMode;

/// Public identifiers that force `Quirks` on an exact (not prefix) match.
const QUIRKY_PUBLIC_IDENTIFIERS: &[&str] = &[
    "-//w3o//dtd w3 html strict 3.0//en//",
    "-/w3c/dtd html 4.0 transitional/en",
    "html",
];

/// Public-identifier prefixes that force `Quirks` (WHATWG "quirky" doctype
/// list). Matched with `starts_with`.
const QUIRKY_PUBLIC_PREFIXES: &[&str] = &[
    "+//silmaril//dtd html pro v0r11 19970101//",
    "-//as//dtd html 3.0 aswedit + extensions//",
    "-//advasoft ltd//dtd html 3.0 aswedit + extensions//",
    "-//ietf//dtd html 2.0 level 1//",
    "-//ietf//dtd html 2.0 level 2//",
    "-//ietf//dtd html 2.0 strict level 1//",
    "-//ietf//dtd html 2.0 strict level 2//",
    "-//ietf//dtd html 2.0 strict//",
    "-//ietf//dtd html 2.0//",
    "-//ietf//dtd html 2.1e//",
    "-//ietf//dtd html 3.0//",
    "-//ietf//dtd html 3.2 final//",
    "-//ietf//dtd html 3.2//",
    "-//ietf//dtd html 3//",
    "-//ietf//dtd html level 0//",
    "-//ietf//dtd html level 1//",
    "-//ietf//dtd html level 2//",
    "-//ietf//dtd html level 3//",
    "-//ietf//dtd html strict level 0//",
    "-//ietf//dtd html strict level 1//",
    "-//ietf//dtd html strict level 2//",
    "-//ietf//dtd html strict level 3//",
    "-//ietf//dtd html strict//",
    "-//ietf//dtd html//",
    "-//metrius//dtd metrius presentational//",
    "-//microsoft//dtd internet explorer 2.0 html strict//",
    "-//microsoft//dtd internet explorer 2.0 html//",
    "-//microsoft//dtd internet explorer 2.0 tables//",
    "-//microsoft//dtd internet explorer 3.0 html strict//",
    "-//microsoft//dtd internet explorer 3.0 html//",
    "-//microsoft//dtd internet explorer 3.0 tables//",
    "-//netscape comm. corp.//dtd html//",
    "-//netscape comm. corp.//dtd strict html//",
    "-//o'reilly and associates//dtd html 2.0//",
    "-//o'reilly and associates//dtd html extended 1.0//",
    "-//o'reilly and associates//dtd html extended relaxed 1.0//",
    "-//sq//dtd html 2.0 hotmetal + extensions//",
    "-//softquad software//dtd hotmetal pro 6.0::19990601::extensions to html 4.0//",
    "-//softquad//dtd hotmetal pro 4.0::19971010::extensions to html 4.0//",
    "-//spyglass//dtd html 2.0 extended//",
    "-//sun microsystems corp.//dtd hotjava html//",
    "-//sun microsystems corp.//dtd hotjava strict html//",
    "-//w3c//dtd html 3 1995-03-24//",
    "-//w3c//dtd html 3.2 draft//",
    "-//w3c//dtd html 3.2 final//",
    "-//w3c//dtd html 3.2//",
    "-//w3c//dtd html 3.2s draft//",
    "-//w3c//dtd html 4.0 frameset//",
    "-//w3c//dtd html 4.0 transitional//",
    "-//w3c//dtd html experimental 19960712//",
    "-//w3c//dtd html experimental 970421//",
    "-//w3c//dtd w3 html//",
    "-//w3o//dtd w3 html 3.0//",
    "-//webtechs//dtd mozilla html 2.0//",
    "-//webtechs//dtd mozilla html//",
];

const QUIRKY_SYSTEM_ID: &str = "http://www.ibm.com/data/dtd/v11/ibmxhtml1-transitional.dtd";

const LIMITED_QUIRKS_PUBLIC_PREFIXES: &[&str] = &[
    "-//w3c//dtd xhtml 1.0 frameset//",
    "-//w3c//dtd xhtml 1.0 transitional//",
];

const LIMITED_QUIRKS_IF_SYSTEM_ID_PRESENT_PREFIXES: &[&str] = &[
    "-//w3c//dtd html 4.01 frameset//",
    "-//w3c//dtd html 4.01 transitional//",
];

/// Computes the quirks mode a DOCTYPE triggers, per §4.2.2.
pub(crate) fn detect(
    name: Option<&str>,
    public_id: Option<&str>,
    system_id: Option<&str>,
    force_quirks: bool,
) -> QuirksMode {
    let public_id = public_id.unwrap_or_default().to_ascii_lowercase();
    let system_id_lower = system_id.map(|s| s.to_ascii_lowercase());

    if force_quirks || name != Some("html") {
        return QuirksMode::Quirks;
    }
    if QUIRKY_PUBLIC_IDENTIFIERS.contains(&public_id.as_str())
        || QUIRKY_PUBLIC_PREFIXES
            .iter()
            .any(|prefix| public_id.starts_with(prefix))
    {
        return QuirksMode::Quirks;
    }
    if system_id_lower.as_deref() == Some(QUIRKY_SYSTEM_ID) {
        return QuirksMode::Quirks;
    }

    if LIMITED_QUIRKS_PUBLIC_PREFIXES
        .iter()
        .any(|prefix| public_id.starts_with(prefix))
    {
        return QuirksMode::LimitedQuirks;
    }
    if system_id_lower.is_some()
        && LIMITED_QUIRKS_IF_SYSTEM_ID_PRESENT_PREFIXES
            .iter()
            .any(|prefix| public_id.starts_with(prefix))
    {
        return QuirksMode::LimitedQuirks;
    }

    QuirksMode::NoQuirks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_html_doctype_is_no_quirks() {
        assert_eq!(detect(Some("html"), None, None, false), QuirksMode::NoQuirks);
    }

    #[test]
    fn unknown_public_id_triggers_quirks() {
        assert_eq!(
            detect(Some("html"), Some("HTML"), None, false),
            QuirksMode::Quirks
        );
    }

    #[test]
    fn html4_transitional_with_system_id_is_limited_quirks() {
        assert_eq!(
            detect(
                Some("html"),
                Some("-//W3C//DTD HTML 4.01 Transitional//EN"),
                Some("http://www.w3.org/TR/html4/loose.dtd"),
                false
            ),
            QuirksMode::LimitedQuirks
        );
    }

    #[test]
    fn html4_transitional_without_system_id_is_no_quirks() {
        assert_eq!(
            detect(
                Some("html"),
                Some("-//W3C//DTD HTML 4.01 Transitional//EN"),
                None,
                false
            ),
            QuirksMode::NoQuirks
        );
    }

    #[test]
    fn force_quirks_always_wins() {
        assert_eq!(detect(Some("html"), None, None, true), QuirksMode::Quirks);
    }

    #[test]
    fn non_html_name_is_quirks() {
        assert_eq!(detect(Some("not-html"), None, None, false), QuirksMode::Quirks);
    }
}
