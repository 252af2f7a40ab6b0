use std::io;

/// A type that can be written as the body of a frame.
pub trait Serialize<'a> {
    /// Writes `self` into `buf`.
    ///
    /// Implementations may return a borrowed slice that is written right after `buf`
    /// instead of copying it.
    ///
    /// # Returns
    /// The optional zero-copy tail or an io error if `self` can't be encoded.
    fn serialize(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>>;
}
