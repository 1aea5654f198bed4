use rand::seq::SliceRandom;

pub const HAIR_CARE_TIPS: [&str; 5] = [
    "Massage your scalp daily for 5-10 minutes to improve blood circulation",
    "Use a mild, sulfate-free shampoo to avoid stripping natural oils",
    "Avoid hot water showers as they can dry out your scalp",
    "Eat a protein-rich diet including eggs, nuts, and fish",
    "Trim hair every 6-8 weeks to prevent split ends",
];

/// Static hair-care advice handed out alongside every analysis.
#[derive(Debug, Clone, Copy, Default)]
pub struct TipProvider;

impl TipProvider {
    pub fn new() -> Self {
        Self
    }

    /// Up to `n` distinct tips in random order. Asking for more than the pool
    /// holds returns the whole pool shuffled.
    pub fn sample(&self, n: usize) -> Vec<String> {
        let mut tips = HAIR_CARE_TIPS.to_vec();
        tips.shuffle(&mut rand::thread_rng());
        tips.truncate(n);
        tips.into_iter().map(str::to_string).collect()
    }
}
