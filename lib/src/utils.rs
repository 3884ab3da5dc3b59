use crate::exemplar::Exemplar;
use crate::Error;
use std::path::Path;

/// Helper type used to define the source of `ImageSource`'s data
#[derive(Clone)]
pub enum ImageSource<'a> {
    /// A raw buffer of image data, see `image::load_from_memory` for details
    /// on what is supported
    Memory(&'a [u8]),
    /// The path to an image to load from disk. The image format is inferred
    /// from the file extension, see `image::open` for details
    Path(&'a Path),
    /// An already loaded image that is passed directly to the generator
    Image(image::DynamicImage),
    /// An already decoded exemplar
    Exemplar(Exemplar),
}

impl<'a> ImageSource<'a> {
    pub fn from_path(path: &'a Path) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<image::DynamicImage> for ImageSource<'a> {
    fn from(img: image::DynamicImage) -> Self {
        Self::Image(img)
    }
}

impl<'a> From<Exemplar> for ImageSource<'a> {
    fn from(ex: Exemplar) -> Self {
        Self::Exemplar(ex)
    }
}

impl<'a, S> From<&'a S> for ImageSource<'a>
where
    S: AsRef<Path> + 'a,
{
    fn from(path: &'a S) -> Self {
        Self::Path(path.as_ref())
    }
}

pub fn load_dynamic_image(src: ImageSource<'_>) -> Result<image::DynamicImage, Error> {
    match src {
        ImageSource::Memory(data) => Ok(image::load_from_memory(data)?),
        ImageSource::Path(path) => Ok(image::open(path)?),
        ImageSource::Image(img) => Ok(img),
        ImageSource::Exemplar(ex) => {
            let dims = ex.dims();
            let mut img = image::RgbImage::new(dims.width, dims.height);
            for (x, y, px) in img.enumerate_pixels_mut() {
                *px = ex.get_pixel(x, y).into();
            }
            Ok(image::DynamicImage::ImageRgb8(img))
        }
    }
}

/// Loads an exemplar, any alpha channel is dropped
pub fn load_exemplar(src: ImageSource<'_>) -> Result<Exemplar, Error> {
    if let ImageSource::Exemplar(ex) = src {
        return Ok(ex);
    }

    let img = load_dynamic_image(src)?.to_rgb();
    Exemplar::from_image(&img)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{Color, Dims};

    #[test]
    fn loads_binary_ppm() {
        let mut ppm = b"P6\n2 1\n255\n".to_vec();
        ppm.extend_from_slice(&[255, 0, 0, 0, 0, 255]);

        let ex = load_exemplar(ImageSource::Memory(&ppm)).unwrap();
        assert_eq!(ex.dims(), Dims::new(2, 1));
        assert_eq!(ex.get_pixel(0, 0), Color::new(255, 0, 0));
        assert_eq!(ex.get_pixel(1, 0), Color::new(0, 0, 255));
    }

    #[test]
    fn drops_alpha() {
        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([10, 20, 30, 0]));

        let ex = load_exemplar(image::DynamicImage::ImageRgba8(img).into()).unwrap();
        assert_eq!(ex.get_pixel(0, 0), Color::new(10, 20, 30));
    }

    #[test]
    fn passes_exemplars_through() {
        let ex = Exemplar::new(
            Dims::new(1, 2),
            vec![Color::new(1, 1, 1), Color::new(2, 2, 2)],
        )
        .unwrap();
        let img = load_dynamic_image(ex.clone().into()).unwrap().to_rgb();
        assert_eq!(img.get_pixel(0, 1), &image::Rgb([2, 2, 2]));

        let loaded = load_exemplar(ex.into()).unwrap();
        assert_eq!(loaded.get_pixel(0, 1), Color::new(2, 2, 2));
    }

    #[test]
    fn garbage_is_an_image_error() {
        assert!(matches!(
            load_exemplar(ImageSource::Memory(b"not an image")),
            Err(Error::Image(_))
        ));
    }
}
