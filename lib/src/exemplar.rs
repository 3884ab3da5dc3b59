use crate::errors::SizeMismatch;
use crate::neighborhood::{Grid, GridId, Neighborhood, Window};
use crate::{Color, Dims, Error};

/// The flat example image that a volume is synthesized from
#[derive(Clone, Debug)]
pub struct Exemplar {
    id: GridId,
    dims: Dims,
    pixels: Vec<Color>,
}

impl Exemplar {
    /// Creates an exemplar from row-major pixels
    pub fn new(dims: Dims, pixels: Vec<Color>) -> Result<Self, Error> {
        if dims.width == 0 || dims.height == 0 {
            return Err(Error::EmptyExemplar);
        }

        let expected = dims.width as usize * dims.height as usize;
        if pixels.len() != expected {
            return Err(Error::SizeMismatch(SizeMismatch {
                expected,
                actual: pixels.len(),
            }));
        }

        Ok(Self {
            id: GridId::next(),
            dims,
            pixels,
        })
    }

    pub fn from_image(img: &image::RgbImage) -> Result<Self, Error> {
        let (width, height) = img.dimensions();
        let pixels = img.pixels().map(|px| Color::from(*px)).collect();
        Self::new(Dims::new(width, height), pixels)
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        self.dims
    }

    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.dims.width + x) as usize]
    }

    /// Row-major pixels
    #[inline]
    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    /// The 2D neighborhood centered at `(x, y)`, wrapping at the edges
    pub fn neighborhood(&self, x: i32, y: i32, window: Window) -> Neighborhood {
        Neighborhood::planar(self.id, (self.dims.width, self.dims.height), (x, y), window)
    }
}

impl Grid for Exemplar {
    #[inline]
    fn id(&self) -> GridId {
        self.id
    }

    #[inline]
    fn cells(&self) -> &[Color] {
        &self.pixels
    }
}

/// Every neighborhood of an exemplar, computed once up front.
///
/// Entries are stored row-major, entry `y * width + x` is the neighborhood
/// centered at `(x, y)`.
pub struct ExemplarIndex {
    exemplar: Exemplar,
    window: Window,
    entries: Vec<Neighborhood>,
}

impl ExemplarIndex {
    pub fn build(exemplar: Exemplar, window: Window) -> Self {
        let Dims { width, height } = exemplar.dims;
        let mut entries = Vec::with_capacity(width as usize * height as usize);

        for y in 0..height as i32 {
            for x in 0..width as i32 {
                entries.push(exemplar.neighborhood(x, y, window));
            }
        }

        log::debug!(
            "indexed {} neighborhoods of a {}x{} exemplar with a {}x{} window",
            entries.len(),
            width,
            height,
            window.size(),
            window.size()
        );

        Self {
            exemplar,
            window,
            entries,
        }
    }

    #[inline]
    pub fn exemplar(&self) -> &Exemplar {
        &self.exemplar
    }

    #[inline]
    pub fn window(&self) -> Window {
        self.window
    }

    #[inline]
    pub fn entries(&self) -> &[Neighborhood] {
        &self.entries
    }

    #[inline]
    pub fn entry(&self, x: u32, y: u32) -> &Neighborhood {
        &self.entries[(y * self.exemplar.dims.width + x) as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
