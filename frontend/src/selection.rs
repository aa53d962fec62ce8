use crate::models::Artifact;

/// Which artifact the code/preview pane shows.
///
/// Automatic selection follows the first artifact of the latest extraction.
/// A pick made by the user sticks until the next turn starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ArtifactSelection {
    #[default]
    Empty,
    Auto(Artifact),
    Pinned(Artifact),
}

impl ArtifactSelection {
    pub fn current(&self) -> Option<&Artifact> {
        match self {
            ArtifactSelection::Empty => None,
            ArtifactSelection::Auto(a) | ArtifactSelection::Pinned(a) => Some(a),
        }
    }

    /// Called after each extraction; an empty extraction keeps the current choice.
    pub fn observe(&mut self, extracted: &[Artifact]) {
        if matches!(self, ArtifactSelection::Pinned(_)) {
            return;
        }
        if let Some(first) = extracted.first() {
            *self = ArtifactSelection::Auto(first.clone());
        }
    }

    pub fn pick(&mut self, artifact: Artifact) {
        *self = ArtifactSelection::Pinned(artifact);
    }

    /// Returns to automatic selection, keeping what is shown until new artifacts arrive.
    pub fn release(&mut self) {
        if let ArtifactSelection::Pinned(a) = self {
            *self = ArtifactSelection::Auto(a.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(title: &str) -> Artifact {
        Artifact { title: title.into(), language: "typescript".into(), content: String::new() }
    }

    #[test]
    fn first_artifact_is_selected_by_default() {
        let mut selection = ArtifactSelection::default();
        selection.observe(&[]);
        assert_eq!(selection.current(), None);

        selection.observe(&[artifact("Subject"), artifact("Body")]);
        assert_eq!(selection.current().map(|a| a.title.as_str()), Some("Subject"));
    }

    #[test]
    fn explicit_pick_survives_further_streaming() {
        let mut selection = ArtifactSelection::default();
        selection.observe(&[artifact("Subject"), artifact("Body")]);
        selection.pick(artifact("Body"));

        selection.observe(&[artifact("Subject"), artifact("Body"), artifact("Footer")]);
        assert_eq!(selection.current().map(|a| a.title.as_str()), Some("Body"));
    }

    #[test]
    fn new_turn_returns_to_automatic_selection() {
        let mut selection = ArtifactSelection::default();
        selection.pick(artifact("Body"));
        selection.release();
        assert_eq!(selection.current().map(|a| a.title.as_str()), Some("Body"));

        selection.observe(&[artifact("Revised Subject")]);
        assert_eq!(
            selection.current().map(|a| a.title.as_str()),
            Some("Revised Subject")
        );
    }
}
