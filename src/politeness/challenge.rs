/// Phrases that identify a bot-challenge page instead of real content
pub const DEFAULT_CHALLENGE_SIGNATURES: &[&str] =
    &["captcha", "security check", "подтвердите, что вы человек"];

/// A set of block-page phrases matched case-insensitively against bodies
#[derive(Debug, Clone)]
pub struct ChallengeSignatures {
    phrases: Vec<String>,
}

impl ChallengeSignatures {
    pub fn new<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let phrases = phrases
            .into_iter()
            .map(|p| p.as_ref().trim().to_lowercase())
            .filter(|p| !p.is_empty())
            .collect();
        Self { phrases }
    }

    /// Returns the first signature found in the body, if any
    pub fn detect(&self, body: &str) -> Option<&str> {
        if self.phrases.is_empty() {
            return None;
        }
        let lowered = body.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowered.contains(phrase.as_str()))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

impl Default for ChallengeSignatures {
    fn default() -> Self {
        Self::new(DEFAULT_CHALLENGE_SIGNATURES)
    }
}
