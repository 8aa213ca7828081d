use std::fmt::Debug;
use std::hash::Hash;

/// Identifies a compute program's source text.
///
/// A source key generates its kernel source lazily (e.g. a reduce operator
/// baked into a kernel template) and is hashable/comparable so the program
/// cache can key compiled programs by it.
pub trait SourceKey: Clone + Eq + Hash + Debug + Send + Sync + 'static {
    /// Ordered source fragments, concatenated to form the compiled program.
    fn generate_source(&self) -> Vec<String>;

    /// The key used for the second stage of a two-stage tree reduction.
    ///
    /// Defaults to `self`, covering the common case of one `"reduce"` kernel
    /// reused unmodified for both passes. Override when stage 2 needs a
    /// different kernel body.
    fn stage2(&self) -> Self {
        self.clone()
    }

    /// String used as the program cache's map key.
    ///
    /// Defaults to the key's `Debug` representation; override if `Debug`
    /// doesn't uniquely identify the generated source (e.g. it includes
    /// fields that don't affect `generate_source`'s output).
    fn cache_key(&self) -> String {
        format!("{:?}", self)
    }
}
