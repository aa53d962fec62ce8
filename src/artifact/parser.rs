use super::{artifact_regex, Artifact, CLOSE_MARKER, OPEN_MARKER};

/// Incremental artifact extractor for streamed output.
///
/// Keeps the accumulated text and a scan cursor. Text before the cursor can no
/// longer start a block, so each push only re-examines the earliest still-open
/// marker onward, and skips matching entirely unless the appended text could
/// have completed a close marker. At any point `artifacts()` equals
/// [`super::extract_artifacts`] over the whole buffer.
#[derive(Debug, Default, Clone)]
pub struct ArtifactParser {
    buffer: String,
    cursor: usize,
    artifacts: Vec<Artifact>,
}

impl ArtifactParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `delta` and returns the artifacts it completed, in order.
    pub fn push(&mut self, delta: &str) -> &[Artifact] {
        let appended_at = self.buffer.len();
        let first_new = self.artifacts.len();
        self.buffer.push_str(delta);

        if self.may_have_closed(appended_at) {
            self.scan();
        }
        self.settle_cursor();

        &self.artifacts[first_new..]
    }

    /// All artifacts closed so far.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// A new block can only end inside the appended text, or in a close
    /// marker straddling the old end of the buffer.
    fn may_have_closed(&self, appended_at: usize) -> bool {
        let from = floor_char_boundary(
            &self.buffer,
            appended_at.saturating_sub(CLOSE_MARKER.len() - 1),
        );
        self.buffer[from..].contains(CLOSE_MARKER)
    }

    fn scan(&mut self) {
        let re = artifact_regex();
        while let Some(caps) = re.captures_at(&self.buffer, self.cursor) {
            let Some(whole) = caps.get(0) else { break };
            self.artifacts.push(Artifact::from_captures(&caps));
            self.cursor = whole.end();
        }
    }

    /// Moves the cursor to the first open marker after it, or, when there is
    /// none, to where a marker split across chunks could still begin.
    fn settle_cursor(&mut self) {
        self.cursor = match self.buffer[self.cursor..].find(OPEN_MARKER) {
            Some(offset) => self.cursor + offset,
            None => {
                let tail = self.buffer.len().saturating_sub(OPEN_MARKER.len() - 1);
                floor_char_boundary(&self.buffer, tail.max(self.cursor))
            }
        };
    }
}

fn floor_char_boundary(s: &str, index: usize) -> usize {
    let mut index = index.min(s.len());
    while !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}
