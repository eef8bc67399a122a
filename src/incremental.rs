use crate::builder::{Builder, BuilderOptions};
use crate::document::Document;
use crate::error::Error;
use crate::parse::Reader;

const DEFAULT_CHUNK: usize = 1024;

/// Result of one [`IncrementalBuild::step`].
#[derive(Debug)]
pub enum Progress {
    /// More input remains. `nodes` is the number of nodes built so far.
    Pending { nodes: usize },
    /// The input is consumed and the document sealed.
    Complete(Document),
}

#[derive(Debug)]
enum State {
    Building(Builder),
    Complete(Document),
    Cancelled,
    Done,
}

/// A cooperative build: the document is built a chunk of nodes at a time,
/// so the consumer can interleave building with other work.
///
/// ```rust
/// use xdtm::{IncrementalBuild, Progress};
///
/// let mut build = IncrementalBuild::new("<a><b/><c/><d/></a>");
/// let document = loop {
///     match build.step(2)? {
///         Progress::Pending { nodes } => assert!(nodes >= 2),
///         Progress::Complete(document) => break document,
///     }
/// };
/// assert_eq!(document.len(), 5);
/// # Ok::<(), xdtm::Error>(())
/// ```
///
/// As an iterator it yields the node count after each chunk. Once it ends,
/// [`IncrementalBuild::finish`] hands out the document.
///
/// Cancelling or dropping an unfinished build discards everything built;
/// a partially built document is never sealed. The same holds after any
/// error.
pub struct IncrementalBuild<'a> {
    reader: Reader<'a>,
    state: State,
    chunk: usize,
}

impl<'a> IncrementalBuild<'a> {
    /// Start a build of XML text with default options.
    pub fn new(xml: &'a str) -> Self {
        Self::with_builder(xml, Builder::new())
    }

    /// Start a build with the given options.
    pub fn with_options(xml: &'a str, options: BuilderOptions) -> Self {
        Self::with_builder(xml, Builder::with_options(options))
    }

    /// Start a build into a prepared builder.
    pub fn with_builder(xml: &'a str, builder: Builder) -> Self {
        IncrementalBuild {
            reader: Reader::new(xml),
            state: State::Building(builder),
            chunk: DEFAULT_CHUNK,
        }
    }

    /// The number of nodes each iterator step builds.
    pub fn chunk_size(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Whether the build is still in progress.
    pub fn is_pending(&self) -> bool {
        matches!(self.state, State::Building(_))
    }

    /// Build at least `nodes` more nodes, or up to the end of the input.
    ///
    /// Stepping a cancelled build gives [`Error::Cancelled`]; stepping one
    /// that has completed or failed gives [`Error::Aborted`].
    pub fn step(&mut self, nodes: usize) -> Result<Progress, Error> {
        let builder = match &mut self.state {
            State::Building(builder) => builder,
            State::Cancelled => return Err(Error::Cancelled),
            _ => return Err(Error::Aborted),
        };
        let target = builder.len().saturating_add(nodes.max(1));
        let result = loop {
            if builder.len() >= target {
                break Ok(true);
            }
            match self.reader.step(builder) {
                Ok(true) => {}
                Ok(false) => break Ok(false),
                Err(err) => break Err(err),
            }
        };
        match result {
            Ok(true) => {
                let nodes = builder.len();
                tracing::trace!(nodes, "built chunk");
                Ok(Progress::Pending { nodes })
            }
            Ok(false) => {
                let State::Building(builder) = std::mem::replace(&mut self.state, State::Done)
                else {
                    return Err(Error::Aborted);
                };
                Ok(Progress::Complete(builder.end_document()?))
            }
            Err(err) => {
                self.state = State::Done;
                Err(err)
            }
        }
    }

    /// Build the rest of the document.
    pub fn finish(mut self) -> Result<Document, Error> {
        loop {
            if let State::Complete(_) = self.state {
                let State::Complete(document) = std::mem::replace(&mut self.state, State::Done)
                else {
                    return Err(Error::Aborted);
                };
                return Ok(document);
            }
            if let Progress::Complete(document) = self.step(usize::MAX)? {
                return Ok(document);
            }
        }
    }

    /// Abandon the build. Nothing built so far survives.
    pub fn cancel(&mut self) {
        if let State::Building(builder) = &self.state {
            tracing::warn!(nodes = builder.len(), "incremental build cancelled");
            self.state = State::Cancelled;
        }
    }
}

impl<'a> Iterator for IncrementalBuild<'a> {
    type Item = Result<usize, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.is_pending() {
            return None;
        }
        match self.step(self.chunk) {
            Ok(Progress::Pending { nodes }) => Some(Ok(nodes)),
            Ok(Progress::Complete(document)) => {
                let nodes = document.len();
                self.state = State::Complete(document);
                Some(Ok(nodes))
            }
            Err(err) => Some(Err(err)),
        }
    }
}

impl<'a> std::fmt::Debug for IncrementalBuild<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncrementalBuild")
            .field("state", &self.state)
            .field("chunk", &self.chunk)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_in_chunks() {
        let mut build = IncrementalBuild::new("<a><b/><c/><d/><e/></a>");
        match build.step(2).unwrap() {
            Progress::Pending { nodes } => assert!((2..6).contains(&nodes)),
            Progress::Complete(_) => panic!("completed too early"),
        }
        let document = build.finish().unwrap();
        assert_eq!(document.len(), 6);
    }

    #[test]
    fn test_iterator_then_finish() {
        let mut build = IncrementalBuild::new("<a><b/><c/><d/><e/></a>").chunk_size(1);
        let counts = build.by_ref().collect::<Result<Vec<_>, _>>().unwrap();
        assert_eq!(counts.last(), Some(&6));
        assert!(counts.windows(2).all(|w| w[0] <= w[1]));
        let document = build.finish().unwrap();
        assert_eq!(document.len(), 6);
    }

    #[test]
    fn test_error_discards_build() {
        let mut build = IncrementalBuild::new("<a><b></a>");
        assert!(build.step(usize::MAX).is_err());
        assert!(!build.is_pending());
        assert!(matches!(build.step(1), Err(Error::Aborted)));
    }

    #[test]
    fn test_cancel() {
        let mut build = IncrementalBuild::new("<a><b/><c/></a>");
        build.step(1).unwrap();
        build.cancel();
        assert!(!build.is_pending());
        assert!(matches!(build.step(1), Err(Error::Cancelled)));
        assert!(matches!(build.finish(), Err(Error::Cancelled)));
    }
}
