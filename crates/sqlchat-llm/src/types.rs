/// One unit of a streamed model response.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChunk {
    /// A piece of answer text, in arrival order. No maximum size or count.
    Token(String),
    /// The transport signalled completion; the stream ends after this.
    Done,
}
