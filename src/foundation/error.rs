/// Convenience result type used across revlapse.
pub type LapseResult<T> = Result<T, LapseError>;

/// Top-level error taxonomy used by the pipeline and its collaborators.
#[derive(thiserror::Error, Debug)]
pub enum LapseError {
    /// Invalid user-provided configuration, rejected before a run starts.
    #[error("validation error: {0}")]
    Validation(String),

    /// Listing revisions or checking one out failed.
    #[error("vcs error: {0}")]
    Vcs(String),

    /// The build command could not be started or failed under the `abort` policy.
    #[error("build error: {0}")]
    Build(String),

    /// The artifact is missing, corrupt, has no pages, or the page range selects none.
    ///
    /// This is the only kind the pipeline recovers from by skipping the revision.
    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    /// Rendering failed for a reason unrelated to the artifact contents.
    #[error("render error: {0}")]
    Render(String),

    /// Writing the animation failed.
    #[error("encode error: {0}")]
    Encode(String),

    /// A fatal error annotated with the revision and operation it happened in.
    #[error("revision {revision}: {operation} failed: {source}")]
    AtRevision {
        /// Revision identifier being processed.
        revision: String,
        /// Name of the failing step (`checkout`, `build`, `render`).
        operation: &'static str,
        /// Underlying error.
        #[source]
        source: Box<LapseError>,
    },

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LapseError {
    /// Build a [`LapseError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`LapseError::Vcs`] value.
    pub fn vcs(msg: impl Into<String>) -> Self {
        Self::Vcs(msg.into())
    }

    /// Build a [`LapseError::Build`] value.
    pub fn build(msg: impl Into<String>) -> Self {
        Self::Build(msg.into())
    }

    /// Build a [`LapseError::UnreadableDocument`] value.
    pub fn unreadable_document(msg: impl Into<String>) -> Self {
        Self::UnreadableDocument(msg.into())
    }

    /// Build a [`LapseError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`LapseError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Attach the revision and step name to an error.
    pub fn at_revision(self, revision: impl Into<String>, operation: &'static str) -> Self {
        Self::AtRevision {
            revision: revision.into(),
            operation,
            source: Box::new(self),
        }
    }

    /// Whether this error is the recoverable "unreadable/empty document" kind.
    pub fn is_unreadable_document(&self) -> bool {
        match self {
            Self::UnreadableDocument(_) => true,
            Self::AtRevision { source, .. } => source.is_unreadable_document(),
            _ => false,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
