pub(crate) trait SafeAccess<T> {
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> Result<&[T], std::io::Error>;
}

impl<T> SafeAccess<T> for [T] {
    /// Safely retrieves a reference to a range of elements in a slice.
    ///
    /// # Errors
    ///
    /// Returns an `std::io::Error` with `std::io::ErrorKind::UnexpectedEof`
    /// if the range reaches past the end of the slice, which is how a
    /// truncated stream shows up to the chunk reader.
    fn get_range_safe(&self, range: std::ops::Range<usize>) -> Result<&[T], std::io::Error> {
        self.get(range.clone()).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                format!(
                    "Range {}..{} out of bounds (len {})",
                    range.start,
                    range.end,
                    self.len()
                ),
            )
        })
    }
}
