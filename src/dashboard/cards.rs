//! Card components for headline figures.
//!
//! Used by the dashboard and by the transactions, budgets, investments and
//! accounts pages to show totals above their tables.

use maud::{Markup, html};

use crate::html::{CARD_STYLE, CARD_TITLE_STYLE, CARD_VALUE_STYLE};

/// The colour of a card's caption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CardTone {
    Neutral,
    Positive,
    Negative,
}

impl CardTone {
    /// Positive for values at or above zero, negative otherwise.
    pub(crate) fn from_sign(is_negative: bool) -> Self {
        if is_negative {
            CardTone::Negative
        } else {
            CardTone::Positive
        }
    }

    fn caption_style(&self) -> &'static str {
        match self {
            CardTone::Neutral => "text-xs text-gray-500 dark:text-gray-400",
            CardTone::Positive => "text-xs text-green-600 dark:text-green-400",
            CardTone::Negative => "text-xs text-red-600 dark:text-red-400",
        }
    }
}

/// A card with a title, a large value and a short caption underneath.
pub(crate) fn summary_card(title: &str, value: &str, caption: &str, tone: CardTone) -> Markup {
    html! {
        div class=(CARD_STYLE) data-card=(title)
        {
            p class=(CARD_TITLE_STYLE) { (title) }
            p class=(CARD_VALUE_STYLE) { (value) }
            @if !caption.is_empty() {
                p class=(tone.caption_style()) { (caption) }
            }
        }
    }
}

/// Lays out cards in a responsive grid.
pub(crate) fn cards_grid(cards: &[Markup]) -> Markup {
    html! {
        section class="w-full grid gap-4 grid-cols-1 md:grid-cols-2 lg:grid-cols-4 mb-6"
        {
            @for card in cards {
                (card)
            }
        }
    }
}

#[cfg(test)]
mod cards_tests {
    use scraper::{Html, Selector};

    use super::{CardTone, cards_grid, summary_card};

    #[test]
    fn renders_title_value_and_caption() {
        let html = summary_card("Monthly Income", "$1,200", "This month", CardTone::Positive);

        let fragment = Html::parse_fragment(&html.into_string());
        let text: String = fragment
            .select(&Selector::parse("div[data-card]").unwrap())
            .next()
            .unwrap()
            .text()
            .collect();
        assert!(text.contains("Monthly Income"));
        assert!(text.contains("$1,200"));
        assert!(text.contains("This month"));
    }

    #[test]
    fn omits_empty_caption() {
        let html = summary_card("Net Worth", "$0", "", CardTone::Neutral).into_string();

        assert_eq!(html.matches("<p").count(), 2);
    }

    #[test]
    fn grid_contains_every_card() {
        let cards = [
            summary_card("A", "1", "", CardTone::Neutral),
            summary_card("B", "2", "", CardTone::Negative),
        ];

        let fragment = Html::parse_fragment(&cards_grid(&cards).into_string());

        assert_eq!(
            fragment
                .select(&Selector::parse("section div[data-card]").unwrap())
                .count(),
            2
        );
    }

    #[test]
    fn tone_from_sign() {
        assert_eq!(CardTone::from_sign(true), CardTone::Negative);
        assert_eq!(CardTone::from_sign(false), CardTone::Positive);
    }
}
