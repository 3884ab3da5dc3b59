use rand::Rng;

use crate::errors::{InvalidRange, SizeMismatch};
use crate::neighborhood::{wrap_3d, Grid, GridId, Neighborhood, Plane, Point3, Window};
use crate::{Color, Error};

/// A cube of colors with wrap-around addressing on every axis.
///
/// Voxels are stored with x outermost and z innermost, so voxel
/// `(x, y, z)` lives at `(x * size + y) * size + z`.
#[derive(Clone, Debug)]
pub struct Volume {
    id: GridId,
    size: u32,
    voxels: Vec<Color>,
}

pub(crate) fn check_size(size: u32) -> Result<(), Error> {
    // The flat index of a neighborhood slot is stored as a u32
    const MAX_SIZE: u32 = 1625;

    if size == 0 || size > MAX_SIZE {
        return Err(Error::InvalidRange(InvalidRange {
            min: 1.0,
            max: MAX_SIZE as f32,
            value: size as f32,
            name: "volume-size",
        }));
    }
    Ok(())
}

impl Volume {
    /// Creates a black volume with the given edge length
    pub fn new(size: u32) -> Result<Self, Error> {
        check_size(size)?;
        Ok(Self {
            id: GridId::next(),
            size,
            voxels: vec![Color::BLACK; (size as usize).pow(3)],
        })
    }

    /// Wraps existing voxels, which must be laid out as described on `Volume`
    pub fn from_raw(size: u32, voxels: Vec<Color>) -> Result<Self, Error> {
        check_size(size)?;
        let expected = (size as usize).pow(3);
        if voxels.len() != expected {
            return Err(Error::SizeMismatch(SizeMismatch {
                expected,
                actual: voxels.len(),
            }));
        }

        Ok(Self {
            id: GridId::next(),
            size,
            voxels,
        })
    }

    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Color {
        self.voxels[wrap_3d(self.size, x, y, z)]
    }

    #[inline]
    pub fn set(&mut self, x: i32, y: i32, z: i32, color: Color) {
        let idx = wrap_3d(self.size, x, y, z);
        self.voxels[idx] = color;
    }

    /// The cross-section neighborhood through `p` in `plane`
    #[inline]
    pub fn neighborhood(&self, p: Point3, plane: Plane, window: Window) -> Neighborhood {
        Neighborhood::cross_section(self.id, self.size, p, plane, window)
    }

    /// Overwrites every voxel with the voxels of `other`, which must have the
    /// same size.
    pub fn replace_with(&mut self, other: &Self) -> Result<(), Error> {
        if other.size != self.size {
            return Err(Error::VolumeSizeMismatch(self.size, other.size));
        }

        self.voxels.copy_from_slice(&other.voxels);
        Ok(())
    }

    /// Reallocates the volume with a new edge length, all voxels are reset
    /// to black. Neighborhoods extracted before the resize no longer resolve
    /// against this volume.
    pub fn resize(&mut self, size: u32) -> Result<(), Error> {
        check_size(size)?;
        self.id = GridId::next();
        self.size = size;
        self.voxels = vec![Color::BLACK; (size as usize).pow(3)];
        Ok(())
    }

    /// Fills every channel of every voxel with uniform noise
    pub fn init_random<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for voxel in self.voxels.iter_mut() {
            *voxel = Color::new(rng.gen(), rng.gen(), rng.gen());
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[Color] {
        &self.voxels
    }

    /// Consecutive runs of `size * size` voxels are x-slabs
    #[inline]
    pub(crate) fn as_mut_slice(&mut self) -> &mut [Color] {
        &mut self.voxels
    }

    pub fn into_raw(self) -> Vec<Color> {
        self.voxels
    }

    /// The voxels as packed RGB bytes, in storage order
    pub fn to_rgb_bytes(&self) -> Vec<u8> {
        self.voxels.iter().flat_map(|c| c.to_array()).collect()
    }
}

impl Grid for Volume {
    #[inline]
    fn id(&self) -> GridId {
        self.id
    }

    #[inline]
    fn cells(&self) -> &[Color] {
        &self.voxels
    }
}
