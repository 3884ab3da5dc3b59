//! Fixed-size, toroidally wrapped neighborhoods over exemplars and volumes.
//!
//! A `Neighborhood` never holds colors, only flat cell indices into the grid
//! it was extracted from, tagged with that grid's `GridId`. Colors are looked
//! up through the grid at comparison time, so a neighborhood can't outlive
//! the meaning of its indices without that being detected.

use std::ops::RangeInclusive;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::errors::InvalidRange;
use crate::{Color, Error};

#[inline]
pub(crate) fn modulo(a: i32, b: i32) -> i32 {
    let result = a % b;
    if result < 0 {
        result + b
    } else {
        result
    }
}

/// Flat index of a wrapped 2D coordinate in a row-major `width x height` grid
#[inline]
pub(crate) fn wrap_2d(width: u32, height: u32, x: i32, y: i32) -> usize {
    let x = modulo(x, width as i32) as usize;
    let y = modulo(y, height as i32) as usize;
    y * width as usize + x
}

/// Flat index of a wrapped 3D coordinate in a `size^3` grid, x outermost
#[inline]
pub(crate) fn wrap_3d(size: u32, x: i32, y: i32, z: i32) -> usize {
    let s = size as i32;
    let (x, y, z) = (
        modulo(x, s) as usize,
        modulo(y, s) as usize,
        modulo(z, s) as usize,
    );
    let size = size as usize;
    (x * size + y) * size + z
}

/// A voxel coordinate, may lie outside the volume in which case it wraps
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Point3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Point3 {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

/// The axis-aligned plane a cross-section is taken in, named by the axis
/// that is held fixed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Plane {
    /// x is fixed, y pairs with exemplar rows and z with columns
    X,
    /// y is fixed, x pairs with exemplar rows and z with columns
    Y,
    /// z is fixed, x pairs with exemplar rows and y with columns
    Z,
}

impl Plane {
    pub const ALL: [Plane; 3] = [Plane::X, Plane::Y, Plane::Z];

    /// Maps a (row, column) offset in the plane to a 3D offset
    #[inline]
    fn offset(self, row: i32, col: i32) -> (i32, i32, i32) {
        match self {
            Plane::X => (0, row, col),
            Plane::Y => (row, 0, col),
            Plane::Z => (row, col, 0),
        }
    }
}

/// Edge length of the square neighborhood window
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Window(u32);

impl Window {
    /// Largest supported edge length. The summed distance of two full
    /// neighborhoods, at most `765 * len`, must fit a `u32`.
    pub const MAX_SIZE: u32 = 1023;

    /// Creates a window, the size must be odd so the window has a center
    pub fn new(size: u32) -> Result<Self, Error> {
        if size == 0 || size % 2 == 0 {
            return Err(Error::InvalidWindowSize(size));
        }

        if size > Self::MAX_SIZE {
            return Err(Error::InvalidRange(InvalidRange {
                min: 1.0,
                max: Self::MAX_SIZE as f32,
                value: size as f32,
                name: "window-size",
            }));
        }

        Ok(Self(size))
    }

    #[inline]
    pub fn size(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn half_width(self) -> i32 {
        ((self.0 - 1) / 2) as i32
    }

    /// Number of samples in a neighborhood
    #[inline]
    pub fn len(self) -> usize {
        (self.0 * self.0) as usize
    }

    /// Slot of the center sample
    #[inline]
    pub fn center(self) -> usize {
        self.len() / 2
    }

    #[inline]
    fn offsets(self) -> RangeInclusive<i32> {
        let h = self.half_width();
        -h..=h
    }
}

impl Default for Window {
    fn default() -> Self {
        Self(3)
    }
}

/// Identifies one grid instance for the lifetime of the process
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct GridId(u32);

impl GridId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// A grid of colors that neighborhoods can be resolved against
pub trait Grid {
    fn id(&self) -> GridId;
    /// The cells in the grid's flat index order
    fn cells(&self) -> &[Color];
}

/// An ordered window of cell indices into a single grid
#[derive(Clone, Debug)]
pub struct Neighborhood {
    grid: GridId,
    slots: Vec<u32>,
    capacity: usize,
}

impl Neighborhood {
    pub fn new(grid: GridId, window: Window) -> Self {
        Self {
            grid,
            slots: Vec::with_capacity(window.len()),
            capacity: window.len(),
        }
    }

    /// Extracts the 2D window centered at `(x, y)` of a row-major grid,
    /// rows (dy) outer, columns (dx) inner
    pub fn planar(
        grid: GridId,
        (width, height): (u32, u32),
        (x, y): (i32, i32),
        window: Window,
    ) -> Self {
        let mut n = Self::new(grid, window);
        for dy in window.offsets() {
            for dx in window.offsets() {
                n.push(wrap_2d(width, height, x + dx, y + dy));
            }
        }
        n
    }

    /// Extracts the cross-section of a `size^3` volume through `center` in
    /// the given plane. The free axes keep x, y, z order, the first one is
    /// iterated as rows and the second as columns, the same order `planar`
    /// uses, so the two kinds of neighborhood compare slot by slot.
    pub fn cross_section(
        grid: GridId,
        size: u32,
        center: Point3,
        plane: Plane,
        window: Window,
    ) -> Self {
        let mut n = Self::new(grid, window);
        for row in window.offsets() {
            for col in window.offsets() {
                let (dx, dy, dz) = plane.offset(row, col);
                n.push(wrap_3d(size, center.x + dx, center.y + dy, center.z + dz));
            }
        }
        n
    }

    /// Appends a cell index. Returns `false` and leaves the neighborhood
    /// untouched if it is already full.
    #[inline]
    pub fn push(&mut self, index: usize) -> bool {
        if self.slots.len() >= self.capacity {
            return false;
        }
        self.slots.push(index as u32);
        true
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.slots.len() == self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn grid_id(&self) -> GridId {
        self.grid
    }

    /// The raw cell indices, in slot order
    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.slots
    }

    fn check<G: Grid + ?Sized>(&self, grid: &G) -> Result<(), Error> {
        if !self.is_full() {
            return Err(Error::IncompleteNeighborhood(self.slots.len(), self.capacity));
        }
        if grid.id() != self.grid {
            return Err(Error::GridMismatch);
        }
        Ok(())
    }

    /// Cell index of the center slot
    pub fn center_index(&self) -> Result<usize, Error> {
        if !self.is_full() {
            return Err(Error::IncompleteNeighborhood(self.slots.len(), self.capacity));
        }
        Ok(self.slots[self.capacity / 2] as usize)
    }

    pub fn center_color<G: Grid + ?Sized>(&self, grid: &G) -> Result<Color, Error> {
        self.check(grid)?;
        Ok(grid.cells()[self.slots[self.capacity / 2] as usize])
    }

    /// Looks up the colors of every slot, replacing the contents of `out`
    pub fn resolve_into<G: Grid + ?Sized>(
        &self,
        grid: &G,
        out: &mut Vec<Color>,
    ) -> Result<(), Error> {
        self.check(grid)?;
        let cells = grid.cells();
        out.clear();
        out.extend(self.slots.iter().map(|&i| cells[i as usize]));
        Ok(())
    }

    /// Sum of the color distances between matching slots of two neighborhoods
    pub fn diff<G: Grid + ?Sized, H: Grid + ?Sized>(
        &self,
        grid: &G,
        other: &Self,
        other_grid: &H,
    ) -> Result<u32, Error> {
        self.check(grid)?;
        other.check(other_grid)?;

        let (a, b) = (grid.cells(), other_grid.cells());
        Ok(self
            .slots
            .iter()
            .zip(other.slots.iter())
            .map(|(&i, &j)| a[i as usize].distance(b[j as usize]))
            .sum())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    struct TestGrid {
        id: GridId,
        cells: Vec<Color>,
    }

    impl Grid for TestGrid {
        fn id(&self) -> GridId {
            self.id
        }

        fn cells(&self) -> &[Color] {
            &self.cells
        }
    }

    // Every cell gets a unique color derived from its flat index
    fn indexed_grid(len: usize) -> TestGrid {
        TestGrid {
            id: GridId::next(),
            cells: (0..len).map(|i| Color::new(i as u8, 0, 0)).collect(),
        }
    }

    #[test]
    fn window_must_be_odd() {
        assert!(Window::new(0).is_err());
        assert!(Window::new(2).is_err());
        assert!(Window::new(4).is_err());

        let w = Window::new(5).unwrap();
        assert_eq!(w.half_width(), 2);
        assert_eq!(w.len(), 25);
        assert_eq!(w.center(), 12);

        let w = Window::new(1).unwrap();
        assert_eq!(w.half_width(), 0);
        assert_eq!(w.len(), 1);
        assert_eq!(w.center(), 0);

        assert_eq!(Window::default().len(), 9);
    }

    #[test]
    fn window_size_is_bounded() {
        let w = Window::new(Window::MAX_SIZE).unwrap();
        assert_eq!(w.len(), 1023 * 1023);

        assert!(matches!(
            Window::new(Window::MAX_SIZE + 2),
            Err(Error::InvalidRange(_))
        ));
        assert!(matches!(Window::new(2371), Err(Error::InvalidRange(_))));
        assert!(matches!(Window::new(65537), Err(Error::InvalidRange(_))));
        assert!(matches!(Window::new(65536), Err(Error::InvalidWindowSize(65536))));
    }

    #[test]
    fn windows_wider_than_the_grid_alias() {
        // 2x1 grid, a 5x5 window visits each cell many times
        let grid = indexed_grid(2);
        let window = Window::new(5).unwrap();
        let n = Neighborhood::planar(grid.id, (2, 1), (0, 0), window);

        assert!(n.is_full());
        assert_eq!(n.center_index().unwrap(), 0);
        for (slot, &i) in n.indices().iter().enumerate() {
            let dx = slot as i32 % 5 - 2;
            assert_eq!(i as usize, modulo(dx, 2) as usize);
        }

        // A 1^3 volume: every slot of every plane is the one voxel
        let voxel = indexed_grid(1);
        for &plane in Plane::ALL.iter() {
            let n = Neighborhood::cross_section(voxel.id, 1, Point3::new(3, -7, 2), plane, window);
            assert!(n.indices().iter().all(|&i| i == 0));
            assert_eq!(n.diff(&voxel, &n, &voxel).unwrap(), 0);
        }
    }

    #[test]
    fn modulo_wraps_negatives() {
        assert_eq!(modulo(-1, 4), 3);
        assert_eq!(modulo(-4, 4), 0);
        assert_eq!(modulo(-5, 4), 3);
        assert_eq!(modulo(9, 4), 1);
    }

    #[test]
    fn push_beyond_capacity_is_a_no_op() {
        let mut n = Neighborhood::new(GridId::next(), Window::new(1).unwrap());
        assert!(n.push(3));
        assert!(!n.push(4));
        assert_eq!(n.indices(), &[3]);
        assert!(n.is_full());
    }

    #[test]
    fn incomplete_neighborhood_is_reported() {
        let grid = indexed_grid(9);
        let mut n = Neighborhood::new(grid.id, Window::default());
        n.push(0);
        n.push(1);

        assert!(matches!(n.center_index(), Err(Error::IncompleteNeighborhood(2, 9))));
        assert!(matches!(n.center_color(&grid), Err(Error::IncompleteNeighborhood(2, 9))));

        let mut colors = Vec::new();
        assert!(n.resolve_into(&grid, &mut colors).is_err());
    }

    #[test]
    fn wrong_grid_is_reported() {
        let a = indexed_grid(12);
        let b = indexed_grid(12);
        let n = Neighborhood::planar(a.id, (4, 3), (1, 1), Window::default());

        assert!(n.center_color(&a).is_ok());
        assert!(matches!(n.center_color(&b), Err(Error::GridMismatch)));
    }

    #[test]
    fn planar_wraps_at_origin() {
        // 4 wide, 3 tall
        let grid = indexed_grid(12);
        let n = Neighborhood::planar(grid.id, (4, 3), (0, 0), Window::default());

        let idx = |x: usize, y: usize| (y * 4 + x) as u32;
        assert_eq!(
            n.indices(),
            &[
                idx(3, 2),
                idx(0, 2),
                idx(1, 2),
                idx(3, 0),
                idx(0, 0),
                idx(1, 0),
                idx(3, 1),
                idx(0, 1),
                idx(1, 1),
            ]
        );
        assert_eq!(n.center_index().unwrap(), 0);
        assert_eq!(n.center_color(&grid).unwrap(), Color::new(0, 0, 0));
    }

    #[test]
    fn planar_wraps_at_far_corner() {
        let grid = indexed_grid(12);
        let n = Neighborhood::planar(grid.id, (4, 3), (3, 2), Window::default());
        assert_eq!(n.indices()[8], 0);
        assert_eq!(n.center_index().unwrap(), 11);
    }

    #[test]
    fn cross_sections_order_free_axes() {
        let size = 4;
        let grid = indexed_grid(64);
        let idx = |x: i32, y: i32, z: i32| wrap_3d(size, x, y, z) as u32;
        let c = Point3::new(1, 2, 3);

        let x = Neighborhood::cross_section(grid.id, size, c, Plane::X, Window::default());
        let y = Neighborhood::cross_section(grid.id, size, c, Plane::Y, Window::default());
        let z = Neighborhood::cross_section(grid.id, size, c, Plane::Z, Window::default());

        // x fixed: y rows, z columns
        assert_eq!(x.indices()[0], idx(1, 1, 2));
        assert_eq!(x.indices()[1], idx(1, 1, 3));
        assert_eq!(x.indices()[2], idx(1, 1, 4));
        assert_eq!(x.indices()[3], idx(1, 2, 2));

        // y fixed: x rows, z columns
        assert_eq!(y.indices()[0], idx(0, 2, 2));
        assert_eq!(y.indices()[1], idx(0, 2, 3));
        assert_eq!(y.indices()[3], idx(1, 2, 2));

        // z fixed: x rows, y columns
        assert_eq!(z.indices()[0], idx(0, 1, 3));
        assert_eq!(z.indices()[1], idx(0, 2, 3));
        assert_eq!(z.indices()[3], idx(1, 1, 3));

        for n in &[&x, &y, &z] {
            assert_eq!(n.center_index().unwrap(), idx(1, 2, 3) as usize);
        }

        // The fixed axis never moves
        for &i in x.indices() {
            assert_eq!(i as usize / 16, 1);
        }
        for &i in z.indices() {
            assert_eq!(i as usize % 4, 3);
        }
    }

    #[test]
    fn wrap_3d_wraps_every_axis() {
        assert_eq!(wrap_3d(4, -1, 0, 0), wrap_3d(4, 3, 0, 0));
        assert_eq!(wrap_3d(4, 0, 4, 0), wrap_3d(4, 0, 0, 0));
        assert_eq!(wrap_3d(4, 0, 0, -1), 3);
        assert_eq!(wrap_3d(4, 1, 2, 3), 16 + 8 + 3);
    }

    #[test]
    fn diff_compares_slot_by_slot() {
        let grid = indexed_grid(12);
        let a = Neighborhood::planar(grid.id, (4, 3), (1, 1), Window::default());
        let b = Neighborhood::planar(grid.id, (4, 3), (2, 1), Window::default());

        assert_eq!(a.diff(&grid, &a, &grid).unwrap(), 0);
        // every sample in b is one column to the right of its slot in a
        let d = a.diff(&grid, &b, &grid).unwrap();
        assert_eq!(d, b.diff(&grid, &a, &grid).unwrap());
        assert_eq!(d, 9);
    }
}
