//! First-run walkthrough.
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TutorialPage {
    pub title: &'static str,
    pub content: &'static str,
    pub highlight: &'static str,
}

pub const PAGES: [TutorialPage; 3] = [
    TutorialPage {
        title: "Welcome to GiftStream!",
        content: "Mystery boxes roll along the conveyor belt. Each one holds a random token reward.",
        highlight: "🎁 Mystery boxes appear on the conveyor belt",
    },
    TutorialPage {
        title: "How to Play",
        content: "Every box shows its cost. Unbox any box you can afford; the reward is random, \
                  so you may win big or lose some tokens. Rarer boxes pay more.",
        highlight: "💰 Pay to unbox → Get random rewards",
    },
    TutorialPage {
        title: "Ready to Unbox?",
        content: "Connect your wallet to receive 100 GIFT. Buy power-ups in the shop, compare \
                  profits with friends, and review your collection.",
        highlight: "🚀 Good luck and have fun!",
    },
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tutorial {
    #[serde(default)]
    page: usize,
    #[serde(default)]
    completed: bool,
}

impl Tutorial {
    #[must_use]
    pub const fn page_index(&self) -> usize {
        self.page
    }

    #[must_use]
    pub fn page(&self) -> &'static TutorialPage {
        &PAGES[self.page.min(PAGES.len() - 1)]
    }

    #[must_use]
    pub const fn is_last_page(&self) -> bool {
        self.page + 1 >= PAGES.len()
    }

    #[must_use]
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Advance one page; stays put on the last page.
    pub fn next(&mut self) -> &'static TutorialPage {
        if !self.is_last_page() {
            self.page += 1;
        }
        self.page()
    }

    pub fn complete(&mut self) {
        self.completed = true;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
