//! Fixed per-language string tables.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Pl,
    En,
}

impl Language {
    #[cfg(test)]
    pub const ALL: [Language; 2] = [Language::Pl, Language::En];

    pub fn code(self) -> &'static str {
        match self {
            Language::Pl => "pl",
            Language::En => "en",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "pl" => Some(Language::Pl),
            "en" => Some(Language::En),
            _ => None,
        }
    }

    /// The toggle checkbox is checked for English.
    pub fn from_toggle(checked: bool) -> Self {
        if checked {
            Language::En
        } else {
            Language::Pl
        }
    }

    pub fn toggle_checked(self) -> bool {
        self == Language::En
    }

    pub fn consent_texts(self) -> &'static ConsentTexts {
        match self {
            Language::Pl => &CONSENT_PL,
            Language::En => &CONSENT_EN,
        }
    }

    pub fn page_meta(self) -> &'static PageMeta {
        match self {
            Language::Pl => &META_PL,
            Language::En => &META_EN,
        }
    }

    pub fn aria_labels(self) -> &'static AriaLabels {
        match self {
            Language::Pl => &ARIA_PL,
            Language::En => &ARIA_EN,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct ConsentTexts {
    pub title: &'static str,
    pub description: &'static str,
    pub accept: &'static str,
    pub settings: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct PageMeta {
    pub description: &'static str,
    pub title: &'static str,
}

#[derive(Debug, PartialEq, Eq)]
pub struct AriaLabels {
    pub prev_image: &'static str,
    pub next_image: &'static str,
    pub close_modal: &'static str,
    pub open_menu: &'static str,
    pub close_menu: &'static str,
}

static CONSENT_PL: ConsentTexts = ConsentTexts {
    title: "Ciasteczka gry 🎮",
    description: "Ta strona używa ciasteczek, aby zapewnić najlepsze doświadczenie podczas Game Jam. Akceptując, zgadzasz się na śledzenie analityczne, które pomaga nam udoskonalać wydarzenie.",
    accept: "Akceptuj wszystkie",
    settings: "Ustawienia",
};

static CONSENT_EN: ConsentTexts = ConsentTexts {
    title: "Game Cookies 🎮",
    description: "This site uses cookies to ensure the best Game Jam experience. By accepting, you agree to analytics tracking that helps us improve the event.",
    accept: "Accept all",
    settings: "Settings",
};

static META_PL: PageMeta = PageMeta {
    description: "Skansen Game Jam 2025 — 40 godzin na stworzenie gry komputerowej w Sierpcu. 7–9 listopada 2025. Wersja online hostowana na itch.io.",
    title: "Skansen Game Jam 2025 | Sierpc",
};

static META_EN: PageMeta = PageMeta {
    description: "Skansen Game Jam 2025 — a 40-hour game creation marathon in Sierpc, Poland. 7–9 November 2025. Online edition hosted on itch.io.",
    title: "Skansen Game Jam 2025 | Sierpc (EN)",
};

static ARIA_PL: AriaLabels = AriaLabels {
    prev_image: "Poprzednie zdjęcie",
    next_image: "Następne zdjęcie",
    close_modal: "Zamknij modal",
    open_menu: "Otwórz menu",
    close_menu: "Zamknij menu",
};

static ARIA_EN: AriaLabels = AriaLabels {
    prev_image: "Previous image",
    next_image: "Next image",
    close_modal: "Close modal",
    open_menu: "Open menu",
    close_menu: "Close menu",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banner_strings_match_table_for_every_language() {
        let pl = Language::Pl.consent_texts();
        assert_eq!(pl.title, "Ciasteczka gry 🎮");
        assert_eq!(pl.accept, "Akceptuj wszystkie");
        assert_eq!(pl.settings, "Ustawienia");
        assert_eq!(
            pl.description,
            "Ta strona używa ciasteczek, aby zapewnić najlepsze doświadczenie podczas Game Jam. Akceptując, zgadzasz się na śledzenie analityczne, które pomaga nam udoskonalać wydarzenie."
        );

        let en = Language::En.consent_texts();
        assert_eq!(en.title, "Game Cookies 🎮");
        assert_eq!(en.accept, "Accept all");
        assert_eq!(en.settings, "Settings");
        assert_eq!(
            en.description,
            "This site uses cookies to ensure the best Game Jam experience. By accepting, you agree to analytics tracking that helps us improve the event."
        );
    }

    #[test]
    fn toggle_maps_checked_to_english() {
        for lang in Language::ALL {
            assert_eq!(Language::from_toggle(lang.toggle_checked()), lang);
        }
        assert_eq!(Language::from_toggle(false), Language::Pl);
    }

    #[test]
    fn parse_accepts_only_supported_codes() {
        assert_eq!(Language::parse("PL"), Some(Language::Pl));
        assert_eq!(Language::parse(" en "), Some(Language::En));
        assert_eq!(Language::parse("de"), None);
        assert_eq!(Language::parse(""), None);
    }

    #[test]
    fn titles_differ_per_language() {
        assert_eq!(Language::Pl.page_meta().title, "Skansen Game Jam 2025 | Sierpc");
        assert_eq!(Language::En.page_meta().title, "Skansen Game Jam 2025 | Sierpc (EN)");
        assert_eq!(Language::En.aria_labels().close_menu, "Close menu");
        assert_eq!(Language::Pl.aria_labels().prev_image, "Poprzednie zdjęcie");
    }
}
