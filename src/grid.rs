/// Occupancy bitmap for the sand grid.
///
/// One flag per cell, indexed by `x + y * width`. Exactly one grain may hold
/// a cell at a time; the simulation keeps grain positions and this bitmap in
/// lockstep. Out-of-range access is a contract violation on the caller's
/// side (grain coordinates are boundary-clamped before every lookup), so it
/// panics rather than returning an error.
pub struct Bitmap {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Bitmap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![false; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "cell ({}, {}) outside {}x{} grid",
            x,
            y,
            self.width,
            self.height
        );
        y * self.width + x
    }

    /// Is the cell at (x, y) occupied?
    pub fn get(&self, x: usize, y: usize) -> bool {
        self.cells[self.index(x, y)]
    }

    /// Mark the cell at (x, y) occupied.
    pub fn set(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.cells[idx] = true;
    }

    /// Mark the cell at (x, y) empty.
    pub fn clear(&mut self, x: usize, y: usize) {
        let idx = self.index(x, y);
        self.cells[idx] = false;
    }

    /// Number of occupied cells.
    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_clear_single_cell() {
        let mut bitmap = Bitmap::new(8, 4);
        assert!(!bitmap.get(3, 2));

        bitmap.set(3, 2);
        assert!(bitmap.get(3, 2));
        assert_eq!(bitmap.occupied_count(), 1);

        // Neighbors untouched
        assert!(!bitmap.get(2, 2));
        assert!(!bitmap.get(3, 1));

        bitmap.clear(3, 2);
        assert!(!bitmap.get(3, 2));
        assert_eq!(bitmap.occupied_count(), 0);
    }

    #[test]
    fn test_corners_addressable() {
        let mut bitmap = Bitmap::new(5, 3);
        bitmap.set(0, 0);
        bitmap.set(4, 0);
        bitmap.set(0, 2);
        bitmap.set(4, 2);
        assert_eq!(bitmap.occupied_count(), 4);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_get_out_of_bounds_panics() {
        let bitmap = Bitmap::new(8, 4);
        bitmap.get(8, 0);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_out_of_bounds_panics() {
        let mut bitmap = Bitmap::new(8, 4);
        bitmap.set(0, 4);
    }
}
