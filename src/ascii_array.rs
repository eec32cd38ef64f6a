//! Byte tags that are meant to be read as text.

/// An array of bytes expected to contain ascii data, such as a PNG chunk tag.
///
/// Nothing checks the encoding. Formatting escapes anything that isn't
/// printable ascii, so a corrupt tag still prints on one line.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct AsciiArray<const N: usize>(pub [u8; N]);

impl<const N: usize> Default for AsciiArray<N> {
  #[inline]
  fn default() -> Self {
    Self([0; N])
  }
}

impl<const N: usize> core::fmt::Debug for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "\"{}\"", self.0.escape_ascii())
  }
}
impl<const N: usize> core::fmt::Display for AsciiArray<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    write!(f, "{}", self.0.escape_ascii())
  }
}

impl<const N: usize> From<[u8; N]> for AsciiArray<N> {
  #[inline]
  fn from(array: [u8; N]) -> Self {
    Self(array)
  }
}

#[test]
fn test_ascii_array_formatting() {
  let tag = AsciiArray(*b"IDAT");
  assert_eq!(format!("{tag}"), "IDAT");
  assert_eq!(format!("{tag:?}"), "\"IDAT\"");
  assert_eq!(format!("{}", AsciiArray([b'a', 0, b'\n'])), "a\\x00\\n");
  assert_eq!(AsciiArray::<4>::default().0, [0; 4]);
}
