use crate::TargetScript;

/// Letter counts for the script-ratio rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptRatio {
    /// Letters belonging to the target script.
    pub matching: usize,
    /// All alphabetic characters.
    pub letters: usize,
}

impl ScriptRatio {
    /// Counts the letters of `text` and those that belong to `script`.
    pub fn measure(text: &str, script: TargetScript) -> Self {
        text.chars()
            .filter(|c| c.is_alphabetic())
            .fold(Self { matching: 0, letters: 0 }, |acc, c| Self {
                matching: acc.matching + usize::from(script.contains(c)),
                letters: acc.letters + 1,
            })
    }

    /// Share of matching letters in percent.
    pub fn percent(&self) -> f64 {
        if self.letters == 0 {
            return 0.0;
        }
        self.matching as f64 * 100.0 / self.letters as f64
    }

    /// Returns true if at least `min_percent` of the letters match.
    ///
    /// Compared in integers so that exactly the threshold passes.
    pub fn meets(&self, min_percent: u8) -> bool {
        self.matching * 100 >= self.letters * usize::from(min_percent)
    }
}
