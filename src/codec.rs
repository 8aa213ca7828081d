/// Encodes and decodes individual elements of type `T` to and from flat
/// byte windows.
///
/// Implementors are typically zero-sized marker types (`struct F32Codec;`)
/// selected at the call site via turbofish, since the encoding has no state
/// of its own beyond the element's fixed size.
pub trait ElementCodec<T> {
    /// Byte size of one encoded element. Must divide both the map window
    /// size and the dust buffer size.
    fn size_of() -> usize;

    /// Encodes `value` as element `idx` into `window`, which is exactly
    /// `size_of()` bytes long.
    fn encode(idx: usize, window: &mut [u8], value: T);

    /// Decodes element `idx` from `window`, which is exactly `size_of()`
    /// bytes long.
    fn decode(idx: usize, window: &[u8]) -> T;
}
