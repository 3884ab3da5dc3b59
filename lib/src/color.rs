/// An 8-bit RGB color
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Sum of the absolute per-channel differences, in `0..=765`
    #[inline]
    pub fn distance(self, other: Self) -> u32 {
        channel_diff(self.r, other.r)
            + channel_diff(self.g, other.g)
            + channel_diff(self.b, other.b)
    }

    /// Per-channel mean of three colors, truncated
    #[inline]
    pub fn average(a: Self, b: Self, c: Self) -> Self {
        let avg = |x: u8, y: u8, z: u8| ((u16::from(x) + u16::from(y) + u16::from(z)) / 3) as u8;
        Self {
            r: avg(a.r, b.r, c.r),
            g: avg(a.g, b.g, c.g),
            b: avg(a.b, b.b, c.b),
        }
    }

    #[inline]
    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

#[inline]
fn channel_diff(a: u8, b: u8) -> u32 {
    u32::from(if a > b { a - b } else { b - a })
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

impl From<Color> for [u8; 3] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(px: image::Rgb<u8>) -> Self {
        Self::from(px.0)
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(c: Color) -> Self {
        image::Rgb(c.to_array())
    }
}

#[cfg(test)]
mod test {
    use super::Color;

    const SAMPLES: [Color; 6] = [
        Color::new(0, 0, 0),
        Color::new(255, 255, 255),
        Color::new(255, 0, 0),
        Color::new(12, 200, 99),
        Color::new(1, 2, 3),
        Color::new(254, 128, 7),
    ];

    #[test]
    fn distance_is_symmetric_and_zero_on_self() {
        for &a in &SAMPLES {
            assert_eq!(a.distance(a), 0);
            for &b in &SAMPLES {
                assert_eq!(a.distance(b), b.distance(a));
            }
        }
    }

    #[test]
    fn distance_sums_channels() {
        assert_eq!(Color::new(0, 0, 0).distance(Color::new(255, 255, 255)), 765);
        assert_eq!(Color::new(12, 200, 99).distance(Color::new(1, 2, 3)), 11 + 198 + 96);
    }

    #[test]
    fn average_truncates() {
        for &a in &SAMPLES {
            for &b in &SAMPLES {
                for &c in &SAMPLES {
                    let avg = Color::average(a, b, c);
                    let expect = |x: u8, y: u8, z: u8| ((x as u32 + y as u32 + z as u32) / 3) as u8;
                    assert_eq!(avg.r, expect(a.r, b.r, c.r));
                    assert_eq!(avg.g, expect(a.g, b.g, c.g));
                    assert_eq!(avg.b, expect(a.b, b.b, c.b));
                }
            }
        }

        assert_eq!(
            Color::average(Color::new(1, 0, 255), Color::new(1, 0, 255), Color::new(0, 1, 255)),
            Color::new(0, 0, 255)
        );
    }

    #[test]
    fn average_of_one_color_is_that_color() {
        for &a in &SAMPLES {
            assert_eq!(Color::average(a, a, a), a);
        }
    }
}
