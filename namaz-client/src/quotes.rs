use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hadith {
    pub text: &'static str,
    pub source: &'static str,
}

impl fmt::Display for Hadith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\" ({})", self.text, self.source)
    }
}

pub const HADITH_ABOUT_PRAYER: [Hadith; 6] = [
    Hadith {
        text: "The Prophet (ﷺ) said: 'The first matter that the slave will be brought to account for on the Day of Judgment is the prayer. If it is sound, then the rest of his deeds will be sound. And if it is bad, then the rest of his deeds will be bad.'",
        source: "Recorded by at-Tabarani",
    },
    Hadith {
        text: "The Prophet (ﷺ) said: 'Between a man and disbelief and paganism is the abandonment of prayer.'",
        source: "Recorded by Muslim",
    },
    Hadith {
        text: "The Prophet (ﷺ) said: 'Prayer is the pillar of religion. Whoever establishes it has established religion, and whoever destroys it has destroyed religion.'",
        source: "Recorded by al-Bayhaqi",
    },
    Hadith {
        text: "The Prophet (ﷺ) said: 'The closest that a servant comes to his Lord is when he is prostrating, so make plenty of supplication then.'",
        source: "Recorded by Muslim",
    },
    Hadith {
        text: "The Prophet (ﷺ) said: 'Whoever prays the dawn prayer in congregation is under the protection of Allah.'",
        source: "Recorded by Muslim",
    },
    Hadith {
        text: "The Prophet (ﷺ) said: 'Prayer in congregation is twenty-seven times more virtuous than prayer performed individually.'",
        source: "Recorded by Bukhari and Muslim",
    },
];

/// Cycles through a fixed list of quotations.
#[derive(Debug, Clone)]
pub struct QuoteRotator {
    quotes: &'static [Hadith],
    index: usize,
}

impl Default for QuoteRotator {
    fn default() -> Self {
        Self::new(&HADITH_ABOUT_PRAYER)
    }
}

impl QuoteRotator {
    pub fn new(quotes: &'static [Hadith]) -> Self {
        Self { quotes, index: 0 }
    }

    /// Start at `index`, wrapped to the list length.
    pub fn starting_at(mut self, index: usize) -> Self {
        if !self.quotes.is_empty() {
            self.index = index % self.quotes.len();
        }
        self
    }

    pub fn current(&self) -> Option<&Hadith> {
        self.quotes.get(self.index)
    }

    pub fn advance(&mut self) -> Option<&Hadith> {
        if self.quotes.is_empty() {
            return None;
        }
        self.index = (self.index + 1) % self.quotes.len();
        self.current()
    }

    /// Zero-based index and total count.
    pub fn position(&self) -> (usize, usize) {
        (self.index, self.quotes.len())
    }
}
