//! Writing the plain text format.
//!
//! The plain text format is a simple format consisting of two lines.
//! The first line contains a header line `#SHAPE=<[shape]>`, where `[shape]`
//! is a `/`-separated representation of the shape of the spectrum. The next line
//! gives the spectrum in flat, row-major order separated by a single space.

use std::{fmt, io};

use crate::{
    spectrum::{Shape, State},
    Spectrum,
};

/// Formats the values of a spectrum in flat, row-major order.
pub fn format_spectrum<S: State>(spectrum: &Spectrum<S>, sep: &str, precision: usize) -> String {
    spectrum
        .array
        .iter()
        .map(|x| format!("{x:.precision$}"))
        .collect::<Vec<_>>()
        .join(sep)
}

/// Writes a spectrum in text format to a writer.
pub fn write_spectrum<W, S: State>(
    writer: &mut W,
    spectrum: &Spectrum<S>,
    precision: usize,
) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(writer, "{}", Header::new(spectrum.shape().clone()))?;
    writeln!(writer, "{}", format_spectrum(spectrum, " ", precision))
}

#[derive(Clone, Debug)]
struct Header {
    shape: Shape,
}

impl Header {
    pub fn new(shape: Shape) -> Self {
        Self { shape }
    }
}

impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#SHAPE=<{}>", self.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Scs;

    #[test]
    fn test_display_header() {
        assert_eq!(Header::new(Shape(vec![25])).to_string(), "#SHAPE=<25>");
        assert_eq!(Header::new(Shape(vec![7, 9])).to_string(), "#SHAPE=<7/9>");
    }

    #[test]
    fn test_write_1d() -> io::Result<()> {
        let mut dest = Vec::new();
        write_spectrum(&mut dest, &Scs::from_vec([0., 1., 2.]), 2)?;

        assert_eq!(dest, b"#SHAPE=<3>\n0.00 1.00 2.00\n");

        Ok(())
    }

    #[test]
    fn test_write_2d() -> io::Result<()> {
        let mut dest = Vec::new();
        write_spectrum(
            &mut dest,
            &Scs::new([0., 1., 2., 3., 4., 5.], [2, 3]).unwrap(),
            0,
        )?;

        assert_eq!(dest, b"#SHAPE=<2/3>\n0 1 2 3 4 5\n");

        Ok(())
    }
}
