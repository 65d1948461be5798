//! Device locale detection

use tracing::debug;

use crate::languages::Locale;

/// Environment variables consulted in POSIX precedence order
const LOCALE_VARS: &[&str] = &["LC_ALL", "LC_MESSAGES", "LANG"];

/// Read the device locale from the environment.
///
/// Unset variables and the `C`/`POSIX` locales are skipped; if nothing
/// usable is found the result is an empty locale, which matches English.
pub fn device_locale() -> Locale {
    locale_from(|name| std::env::var(name).ok())
}

fn locale_from<F>(lookup: F) -> Locale
where
    F: Fn(&str) -> Option<String>,
{
    for var in LOCALE_VARS {
        let Some(value) = lookup(var) else { continue };
        let value = value.trim();
        if value.is_empty() || value == "C" || value.starts_with("C.") || value == "POSIX" {
            continue;
        }
        debug!("Device locale from {}: {}", var, value);
        return Locale::parse(value);
    }
    Locale::default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honours_precedence_and_skips_c_locale() {
        let locale = locale_from(|name| match name {
            "LC_ALL" => Some("C.UTF-8".into()),
            "LC_MESSAGES" => None,
            "LANG" => Some("de_AT.UTF-8".into()),
            _ => None,
        });
        assert_eq!(locale.to_language_tag(), "de-AT");
    }

    #[test]
    fn empty_environment_gives_empty_locale() {
        assert_eq!(locale_from(|_| None), Locale::default());
    }
}
