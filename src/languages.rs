//! Supported UI languages and locale matching

use serde::Serialize;

/// Tag used whenever nothing better can be resolved
pub const FALLBACK_TAG: &str = "en";

/// A supported UI language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Language {
    pub tag: &'static str,
    /// Name of the language written in itself
    pub autonym: &'static str,
}

const fn lang(tag: &'static str, autonym: &'static str) -> Language {
    Language { tag, autonym }
}

static SUPPORTED: &[Language] = &[
    lang("ar", "العربية"),
    lang("bn", "বাংলা"),
    lang("zh-TW", "繁體中文"),
    lang("zh-CN", "简体中文"),
    lang("cs", "Čeština"),
    lang("de", "Deutsch"),
    lang("el", "Ελληνικά"),
    lang("en", "English"),
    lang("es", "Español"),
    lang("fa", "فارسی"),
    lang("fil", "Filipino"),
    lang("fr", "Français"),
    lang("gu", "ગુજરાતી"),
    lang("he", "עברית"),
    lang("hi", "हिन्दी"),
    lang("hu", "Magyar"),
    lang("id", "Bahasa Indonesia"),
    lang("it", "Italiano"),
    lang("ja", "日本語"),
    lang("kn", "ಕನ್ನಡ"),
    lang("ko", "한국어"),
    lang("mr", "मराठी"),
    lang("ms", "Bahasa Melayu"),
    lang("ms-Arab", "بهاس ملايو"),
    lang("my", "မြန်မာ"),
    lang("nl", "Nederlands"),
    lang("pa", "ਪੰਜਾਬੀ"),
    lang("pl", "Polski"),
    lang("pt-PT", "Português (Portugal)"),
    lang("pt-BR", "Português (Brasil)"),
    lang("ro", "Română"),
    lang("ru", "Русский"),
    lang("sk", "Slovenčina"),
    lang("sw", "Kiswahili"),
    lang("ta", "தமிழ்"),
    lang("te", "తెలుగు"),
    lang("th", "ไทย"),
    lang("tr", "Türkçe"),
    lang("uk", "Українська"),
    lang("ur", "اردو"),
    lang("vi", "Tiếng Việt"),
];

const RTL_LANGUAGES: &[&str] = &["ar", "he", "fa", "ur", "ps", "sd"];

/// Supported languages ordered by autonym, as shown in a language picker
pub fn supported_languages() -> Vec<Language> {
    let mut all = SUPPORTED.to_vec();
    all.sort_by_key(|l| l.autonym.to_lowercase());
    all
}

/// Look up a supported language by tag, ignoring case
pub fn find(tag: &str) -> Option<&'static Language> {
    SUPPORTED.iter().find(|l| l.tag.eq_ignore_ascii_case(tag))
}

/// Right-to-left if the primary language is RTL or any subtag names the Arabic script
pub fn is_rtl(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    let mut parts = tag.split(['-', '_']);
    let primary = parts.next().unwrap_or_default();
    if RTL_LANGUAGES.contains(&primary) {
        return true;
    }
    parts.any(|p| p == "arab")
}

/// A parsed locale identifier.
///
/// Accepts BCP-47 tags (`pt-BR`, `zh-Hant-TW`) as well as POSIX locale
/// names (`pt_BR.UTF-8`, `sr_RS@latin`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Locale {
    pub language: String,
    pub script: Option<String>,
    pub region: Option<String>,
}

impl Locale {
    pub fn parse(raw: &str) -> Self {
        let core = raw
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .trim();

        let mut parts = core.split(['-', '_']).filter(|p| !p.is_empty());
        let language = parts
            .next()
            .map(|l| normalize_language(&l.to_ascii_lowercase()))
            .unwrap_or_default();

        let mut script = None;
        let mut region = None;
        for part in parts {
            let is_alpha = part.chars().all(|c| c.is_ascii_alphabetic());
            if script.is_none() && region.is_none() && part.len() == 4 && is_alpha {
                let mut s = part.to_ascii_lowercase();
                s[..1].make_ascii_uppercase();
                script = Some(s);
            } else if region.is_none()
                && ((part.len() == 2 && is_alpha)
                    || (part.len() == 3 && part.chars().all(|c| c.is_ascii_digit())))
            {
                region = Some(part.to_ascii_uppercase());
            }
        }

        Self { language, script, region }
    }

    /// Canonical BCP-47 form
    pub fn to_language_tag(&self) -> String {
        let mut tag = self.language.clone();
        if let Some(script) = &self.script {
            tag.push('-');
            tag.push_str(script);
        }
        if let Some(region) = &self.region {
            tag.push('-');
            tag.push_str(region);
        }
        tag
    }
}

/// Map withdrawn ISO 639 codes onto their current form
fn normalize_language(code: &str) -> String {
    match code {
        "iw" => "he",
        "in" => "id",
        "ji" => "yi",
        "tl" => "fil",
        other => other,
    }
    .to_string()
}

/// Best supported tag for `locale`, falling back to English
pub fn best_match_for(locale: &Locale) -> String {
    if locale.language.is_empty() {
        return FALLBACK_TAG.to_string();
    }

    if let Some(exact) = find(&locale.to_language_tag()) {
        return exact.tag.to_string();
    }

    let region = locale.region.as_deref().unwrap_or_default();
    match locale.language.as_str() {
        "zh" => {
            let preferred = match region {
                "TW" | "HK" | "MO" => "zh-TW",
                _ => "zh-CN",
            };
            return find(preferred).map_or(FALLBACK_TAG, |l| l.tag).to_string();
        }
        "pt" => {
            let order: [&str; 2] = if region == "BR" { ["pt-BR", "pt-PT"] } else { ["pt-PT", "pt-BR"] };
            return order
                .iter()
                .find_map(|t| find(t))
                .map_or(FALLBACK_TAG, |l| l.tag)
                .to_string();
        }
        "ms" => return find("ms").map_or(FALLBACK_TAG, |l| l.tag).to_string(),
        _ => {}
    }

    find(&locale.language).map_or(FALLBACK_TAG, |l| l.tag).to_string()
}
