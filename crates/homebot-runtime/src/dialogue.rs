//! [`DialogueContextBuilder`] – renders a [`RobotState`] into the
//! natural-language context that accompanies each chat request.

use homebot_types::{Language, RobotState};

use crate::llm_driver::ChatMessage;
use crate::phrasebook::Phrasebook;

/// How many labels the "detected objects" sentence lists at most.
pub const MAX_LISTED_LABELS: usize = 5;

#[derive(Debug, Clone)]
pub struct DialogueContextBuilder {
    phrasebook: Phrasebook,
}

impl DialogueContextBuilder {
    pub fn new(language: Language) -> Self {
        Self {
            phrasebook: Phrasebook::new(language),
        }
    }

    /// Context sentences for `state`, possibly none.
    ///
    /// Lists the first [`MAX_LISTED_LABELS`] labels in detection order,
    /// repeats included, then the fused distance if there is one.  An empty
    /// state produces no sentence at all.
    pub fn build(&self, state: &RobotState) -> Vec<String> {
        let mut context = Vec::with_capacity(2);
        if !state.detections.is_empty() {
            let labels = state
                .detections
                .iter()
                .take(MAX_LISTED_LABELS)
                .map(|d| d.label.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            context.push(self.phrasebook.detected_objects(&labels));
        }
        if let Some(distance_m) = state.distance_m {
            context.push(self.phrasebook.estimated_distance(distance_m));
        }
        context
    }

    /// The full message list for one chat request: persona, the context
    /// sentences joined into a single system message (omitted when empty),
    /// then the user's utterance.
    pub fn messages(&self, state: &RobotState, utterance: &str) -> Vec<ChatMessage> {
        let mut messages = vec![ChatMessage::system(self.phrasebook.persona())];
        let context = self.build(state);
        if !context.is_empty() {
            messages.push(ChatMessage::system(context.join(" ")));
        }
        messages.push(ChatMessage::user(utterance));
        messages
    }
}
