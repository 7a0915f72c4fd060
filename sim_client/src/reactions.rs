//! Client-side reaction comments for incoming events.
//!
//! Each event gets a short list of resident comments. The sentiment of every
//! comment is drawn with weights that follow the event's positivity; the text
//! comes from a category-specific pool mixed with a general one.

use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use sim_proto::{EventCategory, ReactionComment, Sentiment, SimulationEvent};

use crate::config::ReactionConfig;

const AUTHORS: &[&str] = &[
    "Longtime resident",
    "Small business owner",
    "Daily commuter",
    "Parent of two",
    "Retired librarian",
    "Local landlord",
    "College student",
    "Night-shift nurse",
    "Neighborhood association member",
    "New homeowner",
];

const GENERAL_POSITIVE: &[&str] = &[
    "This is exactly what {zone} has needed for years.",
    "Good to see the city paying attention to {zone}.",
    "Cautiously optimistic. If it holds up, this is a win.",
    "Finally some movement. Count me in.",
];

const GENERAL_NEUTRAL: &[&str] = &[
    "I'd like to see the numbers before I decide.",
    "Curious how this plays out in {zone} over the next year.",
    "Could go either way. Depends on the follow-through.",
    "Has anyone seen a timeline for this?",
];

const GENERAL_NEGATIVE: &[&str] = &[
    "Nobody in {zone} asked for this.",
    "Another decision made without talking to residents.",
    "I'm worried this pushes people out of {zone}.",
    "Who is actually paying for this?",
];

fn category_pool(category: &EventCategory, sentiment: Sentiment) -> &'static [&'static str] {
    use Sentiment::*;
    match (category, sentiment) {
        (EventCategory::Transportation | EventCategory::Traffic, Positive) => &[
            "My commute through {zone} could finally be bearable.",
            "Safer streets for the kids walking to school.",
        ],
        (EventCategory::Transportation | EventCategory::Traffic, Neutral) => &[
            "Will the buses actually run more often?",
            "Depends where the lanes end up going.",
        ],
        (EventCategory::Transportation | EventCategory::Traffic, Negative) => &[
            "Traffic in {zone} is already a nightmare.",
            "Construction detours are going to kill my business.",
        ],
        (EventCategory::Housing | EventCategory::Population, Positive) => &[
            "More homes in {zone} means my kids might afford to stay.",
            "We need supply, and this adds it.",
        ],
        (EventCategory::Housing | EventCategory::Population, Neutral) => &[
            "How many of these units are actually affordable?",
            "Depends who ends up living there.",
        ],
        (EventCategory::Housing | EventCategory::Population, Negative) => &[
            "Rents in {zone} are going to jump again.",
            "Density without parking is a recipe for trouble.",
        ],
        (EventCategory::Economic, Positive) => &[
            "New jobs close to home. Great news.",
            "Foot traffic on our block is going to pick up.",
        ],
        (EventCategory::Economic, Neutral) => &[
            "Will local businesses benefit or just the chains?",
        ],
        (EventCategory::Economic, Negative) => &[
            "Small shops in {zone} can't absorb higher costs.",
        ],
        (EventCategory::Environmental | EventCategory::Infrastructure, Positive) => &[
            "Cleaner air and better parks. Long overdue.",
            "Glad someone is finally fixing what's under our streets.",
        ],
        (EventCategory::Environmental | EventCategory::Infrastructure, Neutral) => &[
            "Hope the work doesn't drag on for years.",
        ],
        (EventCategory::Environmental | EventCategory::Infrastructure, Negative) => &[
            "More noise and dust for {zone}, again.",
        ],
        (EventCategory::Other(_), _) => &[],
    }
}

fn general_pool(sentiment: Sentiment) -> &'static [&'static str] {
    match sentiment {
        Sentiment::Positive => GENERAL_POSITIVE,
        Sentiment::Neutral => GENERAL_NEUTRAL,
        Sentiment::Negative => GENERAL_NEGATIVE,
    }
}

/// Relative weights for positive, neutral and negative comments.
fn sentiment_weights(positivity: f64) -> [f64; 3] {
    let p = if positivity.is_nan() {
        0.0
    } else {
        positivity.clamp(-1.0, 1.0)
    };
    [
        p.max(0.0) + 0.15,
        (1.0 - p.abs()) * 0.5 + 0.1,
        (-p).max(0.0) + 0.15,
    ]
}

const SENTIMENTS: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

pub struct ReactionSynthesizer {
    rng: Box<dyn RngCore + Send>,
    min_comments: usize,
    max_comments: usize,
}

impl std::fmt::Debug for ReactionSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactionSynthesizer")
            .field("min_comments", &self.min_comments)
            .field("max_comments", &self.max_comments)
            .finish_non_exhaustive()
    }
}

impl ReactionSynthesizer {
    pub fn new(config: &ReactionConfig) -> Self {
        Self::with_rng(config, SmallRng::from_entropy())
    }

    /// Uses the given random source, e.g. a seeded one in tests.
    pub fn with_rng<R: RngCore + Send + 'static>(config: &ReactionConfig, rng: R) -> Self {
        let min_comments = config.min_comments.max(1);
        Self {
            rng: Box::new(rng),
            min_comments,
            max_comments: config.max_comments.max(min_comments),
        }
    }

    pub fn comment_bounds(&self) -> (usize, usize) {
        (self.min_comments, self.max_comments)
    }

    pub fn synthesize(&mut self, event: &SimulationEvent) -> Vec<ReactionComment> {
        let count = self.rng.gen_range(self.min_comments..=self.max_comments);
        let weights = WeightedIndex::new(sentiment_weights(event.positivity)).ok();
        let zone = match event.owning_zone() {
            "" => "the neighborhood",
            zone => zone,
        };

        (0..count)
            .map(|_| {
                let sentiment = weights
                    .as_ref()
                    .map_or(Sentiment::Neutral, |dist| SENTIMENTS[dist.sample(&mut self.rng)]);
                let specific = category_pool(&event.category, sentiment);
                let general = general_pool(sentiment);
                let pick = self.rng.gen_range(0..specific.len() + general.len());
                let template = if pick < specific.len() {
                    specific[pick]
                } else {
                    general[pick - specific.len()]
                };
                let author = AUTHORS.choose(&mut self.rng).copied().unwrap_or("Resident");
                ReactionComment {
                    author: author.to_string(),
                    message: template.replace("{zone}", zone),
                    sentiment,
                }
            })
            .collect()
    }
}
