use crate::{Holoform, Result};

/// Front end that turns one source file into Holoforms.
///
/// The project layer is generic over this trait so it never depends on a
/// concrete grammar.
pub trait HoloformParser {
    /// Generate a Holoform for every top-level definition in `source`, in
    /// source order. A source that does not parse is an `Err(Parse)`.
    fn parse_source(&self, source: &str, module_id: &str) -> Result<Vec<Holoform>>;

    /// File extensions (without the dot) this parser understands.
    fn supported_extensions(&self) -> Vec<&'static str>;
}
