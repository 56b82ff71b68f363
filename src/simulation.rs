use crate::grid::Bitmap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 1-axis elastic bounce factor, 0 to 256. Higher is bouncier.
const ELASTICITY: i32 = 180;

/// Reflect a velocity component off a surface, losing some energy.
/// Truncates toward zero, same as the fixed-point hardware variant.
fn bounce(v: i32) -> i32 {
    -v * ELASTICITY / 256
}

/// One grain of sand: sub-pixel position and velocity in 1/256ths of a cell,
/// plus the cell it currently occupies in the bitmap.
pub struct Grain {
    x: i32,
    y: i32,
    vx: i32,
    vy: i32,
    px: usize,
    py: usize,
}

impl Grain {
    /// Drop a new grain onto a random free cell and claim it in the bitmap.
    ///
    /// Rejection sampling: keeps drawing cells until an empty one turns up.
    /// Expected O(1) while the grid is mostly empty; the simulation caps the
    /// grain count at the cell count so this always terminates.
    fn place(grid: &mut Bitmap, rng: &mut StdRng) -> Self {
        loop {
            let px = rng.gen_range(0..grid.width());
            let py = rng.gen_range(0..grid.height());
            if grid.get(px, py) {
                continue;
            }
            grid.set(px, py);
            return Self {
                x: (px as i32) << 8,
                y: (py as i32) << 8,
                vx: 0,
                vy: 0,
                px,
                py,
            };
        }
    }

    /// Cell this grain occupies.
    pub fn cell(&self) -> (usize, usize) {
        (self.px, self.py)
    }

    /// Velocity magnitude normalized to [0, 1] of terminal velocity.
    pub fn speed(&self) -> f32 {
        let v2 = self.vx as i64 * self.vx as i64 + self.vy as i64 * self.vy as i64;
        ((v2 as f64).sqrt() / 256.0).min(1.0) as f32
    }

    /// Pass 1: accelerate. `ax`/`ay` are deterministic per-frame increments,
    /// `az` is the exclusive ceiling of the per-axis random jitter. The
    /// independent jitter on each axis is what makes tall stacks topple
    /// instead of sliding around as a block.
    fn update_vel(&mut self, ax: i32, ay: i32, az: i32, rng: &mut StdRng) {
        self.vx += ax + rng.gen_range(0..az);
        self.vy += ay + rng.gen_range(0..az);

        // Terminal velocity (in any direction) is 256 units, i.e. one cell,
        // which keeps a moving grain from passing through another undetected.
        // Clipped as a 2D vector rather than per axis so diagonal movement
        // isn't faster than horizontal or vertical.
        let v2 = self.vx as i64 * self.vx as i64 + self.vy as i64 * self.vy as i64;
        if v2 > 65535 {
            let v = (v2 as f64).sqrt();
            self.vx = (256.0 * self.vx as f64 / v) as i32;
            self.vy = (256.0 * self.vy as f64 / v) as i32;
        }
    }

    /// Pass 2: move, resolving collisions against the live bitmap.
    ///
    /// Only this grain moves; every other grain is treated as stationary at
    /// whatever cell the bitmap currently reports. Naive, but repeated fast
    /// enough it visually integrates into something that resembles physics.
    fn update_pos(&mut self, grid: &mut Bitmap) {
        let max_x = ((grid.width() as i32) << 8) - 1;
        let max_y = ((grid.height() as i32) << 8) - 1;

        let mut new_x = self.x + self.vx;
        let mut new_y = self.y + self.vy;

        // Keep it inside the box, bouncing off the walls.
        if new_x < 0 {
            new_x = 0;
            self.vx = bounce(self.vx);
        } else if new_x > max_x {
            new_x = max_x;
            self.vx = bounce(self.vx);
        }
        if new_y < 0 {
            new_y = 0;
            self.vy = bounce(self.vy);
        } else if new_y > max_y {
            new_y = max_y;
            self.vy = bounce(self.vy);
        }

        let mut new_px = (new_x >> 8) as usize;
        let mut new_py = (new_y >> 8) as usize;

        if new_px == self.px && new_py == self.py {
            // Still in the same cell; bitmap is unchanged.
            self.x = new_x;
            self.y = new_y;
            return;
        }

        if !grid.get(new_px, new_py) {
            // Moving to a clear cell, nothing to resolve.
        } else if new_py == self.py {
            // Blocked along X only: cancel the X motion, keep this column.
            new_x = self.x;
            new_px = self.px;
            self.vx = bounce(self.vx);
        } else if new_px == self.px {
            // Blocked along Y only.
            new_y = self.y;
            new_py = self.py;
            self.vy = bounce(self.vy);
        } else if self.vx.abs() >= self.vy.abs() {
            // Diagonal collision with X the faster axis: prefer slipping
            // sideways, so try the X-shifted cell first.
            if !grid.get(new_px, self.py) {
                new_y = self.y;
                new_py = self.py;
                self.vy = bounce(self.vy);
            } else if !grid.get(self.px, new_py) {
                new_x = self.x;
                new_px = self.px;
                self.vx = bounce(self.vx);
            } else {
                // Boxed in: stay put and bounce both components.
                self.vx = bounce(self.vx);
                self.vy = bounce(self.vy);
                return;
            }
        } else {
            // Diagonal collision with Y faster: same candidates, Y-shifted
            // cell first.
            if !grid.get(self.px, new_py) {
                new_x = self.x;
                new_px = self.px;
                self.vx = bounce(self.vx);
            } else if !grid.get(new_px, self.py) {
                new_y = self.y;
                new_py = self.py;
                self.vy = bounce(self.vy);
            } else {
                self.vx = bounce(self.vx);
                self.vy = bounce(self.vy);
                return;
            }
        }

        // Commit the move.
        grid.clear(self.px, self.py);
        grid.set(new_px, new_py);
        self.px = new_px;
        self.py = new_py;
        self.x = new_x;
        self.y = new_y;
    }
}

/// The sand simulation: an occupancy bitmap plus a fixed-order collection of
/// grains, advanced one frame at a time by [`SandSimulation::update`].
pub struct SandSimulation {
    width: usize,
    height: usize,
    num_grains: usize,
    /// Scale factor applied to raw acceleration input before the `>> 8`
    /// (X/Y) and `>> 12` (Z) fixed-point reductions.
    scale: i32,
    grid: Bitmap,
    grains: Vec<Grain>,
    rng: StdRng,
}

impl SandSimulation {
    /// Build a simulation with `num_grains` grains scattered over random
    /// cells. The grain count is capped at `width * height` so placement
    /// always terminates.
    pub fn new(width: usize, height: usize, num_grains: usize, scale: i32) -> Self {
        Self::with_rng(width, height, num_grains, scale, StdRng::from_entropy())
    }

    /// Deterministic variant for reproducible runs and tests.
    pub fn with_seed(width: usize, height: usize, num_grains: usize, scale: i32, seed: u64) -> Self {
        Self::with_rng(width, height, num_grains, scale, StdRng::seed_from_u64(seed))
    }

    fn with_rng(width: usize, height: usize, num_grains: usize, scale: i32, rng: StdRng) -> Self {
        let mut sim = Self {
            width,
            height,
            num_grains: num_grains.min(width * height),
            scale: scale.max(1),
            grid: Bitmap::new(width, height),
            grains: Vec::new(),
            rng,
        };
        sim.randomize();
        sim
    }

    /// Discard all grains and scatter `num_grains` fresh ones over random
    /// free cells.
    pub fn randomize(&mut self) {
        let mut grid = Bitmap::new(self.width, self.height);
        let mut grains = Vec::with_capacity(self.num_grains);
        for _ in 0..self.num_grains {
            grains.push(Grain::place(&mut grid, &mut self.rng));
        }
        self.grid = grid;
        self.grains = grains;
    }

    /// Advance one frame under the given raw acceleration vector
    /// (accelerometer counts; caller's units).
    ///
    /// Two passes: velocities first for every grain, then positions one
    /// grain at a time against the live bitmap. The sequential second pass
    /// is what keeps single-cell collision detection well-defined.
    pub fn update(&mut self, ax: i32, ay: i32, az: i32) {
        // Scale raw accelerometer input down to a manageable range. Z is
        // attenuated a further 16x; it only sizes the topple jitter.
        let mut ax = (ax * self.scale) >> 8;
        let mut ay = (ay * self.scale) >> 8;
        let mut az = ((az * self.scale) >> 12).abs();

        // Clip & invert: a level surface (small scaled tilt) needs more
        // randomness to break up symmetric stacks; a strongly tilted one
        // already has a net pull. The asymmetry here is tuned visual
        // behavior; keep it exactly as-is.
        az = if az >= 4 { 1 } else { 5 - az };
        ax -= az;
        ay -= az;
        let az2 = az * 2 + 1; // max random motion to add back in

        for grain in &mut self.grains {
            grain.update_vel(ax, ay, az2, &mut self.rng);
        }
        for grain in &mut self.grains {
            grain.update_pos(&mut self.grid);
        }
        debug_assert_eq!(self.grid.occupied_count(), self.grains.len());
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn num_grains(&self) -> usize {
        self.num_grains
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Is the cell at (x, y) currently holding a grain?
    pub fn occupied(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }

    /// Read-only view of the grains, in creation (update) order.
    pub fn grains(&self) -> &[Grain] {
        &self.grains
    }

    /// Maximum sensible grain count for this grid (every cell filled).
    pub fn max_grains(&self) -> usize {
        self.width * self.height
    }

    /// Adjust the grain count and re-scatter.
    pub fn adjust_grains(&mut self, delta: i32) {
        let max = self.max_grains() as i32;
        self.num_grains = (self.num_grains as i32 + delta).clamp(1, max) as usize;
        self.randomize();
    }

    /// Adjust the acceleration scale factor.
    pub fn adjust_scale(&mut self, delta: i32) {
        self.scale = (self.scale + delta).clamp(1, 64);
    }

    /// Resize the grid, re-scattering the grains.
    pub fn resize(&mut self, new_width: usize, new_height: usize) {
        if new_width != self.width || new_height != self.height {
            self.width = new_width;
            self.height = new_height;
            self.num_grains = self.num_grains.min(self.max_grains());
            self.randomize();
        }
    }

    #[cfg(test)]
    fn check_consistency(&self) {
        use std::collections::HashSet;
        let cells: HashSet<(usize, usize)> = self.grains.iter().map(|g| g.cell()).collect();
        assert_eq!(cells.len(), self.grains.len(), "two grains share a cell");
        assert_eq!(self.grid.occupied_count(), self.grains.len());
        for &(px, py) in &cells {
            assert!(px < self.width && py < self.height);
            assert!(self.grid.get(px, py), "grain cell not marked occupied");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand-build a grain on a claimed cell, for collision scenarios.
    fn grain_at(grid: &mut Bitmap, px: usize, py: usize, vx: i32, vy: i32) -> Grain {
        grid.set(px, py);
        Grain {
            x: (px as i32) << 8,
            y: (py as i32) << 8,
            vx,
            vy,
            px,
            py,
        }
    }

    #[test]
    fn test_bounce_truncates_toward_zero() {
        assert_eq!(bounce(300), -210); // 300 * 180 / 256 = 210.9
        assert_eq!(bounce(-300), 210);
        assert_eq!(bounce(256), -180);
        assert_eq!(bounce(0), 0);
        assert_eq!(bounce(1), 0);
    }

    #[test]
    fn test_terminal_velocity_is_2d_clamped() {
        let mut grid = Bitmap::new(8, 8);
        let mut rng = StdRng::seed_from_u64(7);
        let mut grain = grain_at(&mut grid, 4, 4, 0, 0);

        // Huge diagonal kick, tiny jitter ceiling.
        grain.update_vel(5000, 5000, 1, &mut rng);
        let v2 = grain.vx as i64 * grain.vx as i64 + grain.vy as i64 * grain.vy as i64;
        assert!(v2 <= 65536, "v2 = {} exceeds one cell per frame", v2);
        // Direction preserved: still diagonal-ish.
        assert!(grain.vx > 0 && grain.vy > 0);
        assert!((grain.vx - grain.vy).abs() <= 2);
    }

    #[test]
    fn test_velocity_update_applies_jitter_below_ceiling() {
        let mut grid = Bitmap::new(8, 8);
        let mut rng = StdRng::seed_from_u64(1);
        let mut grain = grain_at(&mut grid, 4, 4, 0, 0);

        grain.update_vel(10, -3, 5, &mut rng);
        assert!(grain.vx >= 10 && grain.vx < 15);
        assert!(grain.vy >= -3 && grain.vy < 2);
    }

    #[test]
    fn test_still_grain_stays_put() {
        let mut grid = Bitmap::new(8, 8);
        let mut grain = grain_at(&mut grid, 3, 5, 0, 0);

        for _ in 0..10 {
            grain.update_pos(&mut grid);
        }
        assert_eq!(grain.cell(), (3, 5));
        assert_eq!(grain.x, 3 << 8);
        assert_eq!(grain.y, 5 << 8);
        assert!(grid.get(3, 5));
        assert_eq!(grid.occupied_count(), 1);
    }

    #[test]
    fn test_wall_bounce_left_edge() {
        let mut grid = Bitmap::new(4, 4);
        let mut grain = grain_at(&mut grid, 0, 0, -300, 0);

        grain.update_pos(&mut grid);
        assert_eq!(grain.cell(), (0, 0));
        assert_eq!(grain.x, 0);
        assert_eq!(grain.vx, 210); // bounce(-300)
    }

    #[test]
    fn test_wall_bounce_bottom_edge() {
        let mut grid = Bitmap::new(4, 4);
        let mut grain = grain_at(&mut grid, 2, 3, 0, 400);

        grain.update_pos(&mut grid);
        // Clamped to the last row's final sub-pixel position.
        assert_eq!(grain.cell(), (2, 3));
        assert_eq!(grain.y, (4 << 8) - 1);
        assert_eq!(grain.vy, bounce(400));
    }

    #[test]
    fn test_stacked_grain_collision() {
        // Upper grain at (1,0) driven straight down into a stationary grain
        // at (1,1): it must stay put with vy bounced, the lower untouched.
        let mut grid = Bitmap::new(4, 4);
        let mut upper = grain_at(&mut grid, 1, 0, 0, 300);
        let lower = grain_at(&mut grid, 1, 1, 0, 0);

        upper.update_pos(&mut grid);
        assert_eq!(upper.cell(), (1, 0));
        assert_eq!(upper.vy, -210); // bounce(300)
        assert_eq!(lower.cell(), (1, 1));
        assert!(grid.get(1, 0));
        assert!(grid.get(1, 1));
        assert_eq!(grid.occupied_count(), 2);
    }

    #[test]
    fn test_pure_x_collision_cancels_x_only() {
        let mut grid = Bitmap::new(4, 4);
        let mut grain = grain_at(&mut grid, 0, 2, 300, 0);
        let _wall = grain_at(&mut grid, 1, 2, 0, 0);

        grain.update_pos(&mut grid);
        assert_eq!(grain.cell(), (0, 2));
        assert_eq!(grain.x, 0 << 8);
        assert_eq!(grain.vx, -210);
        assert_eq!(grain.vy, 0);
    }

    #[test]
    fn test_diagonal_collision_slips_along_faster_axis() {
        // Grain part-way through cell (0,0) heading for occupied (1,1),
        // |vx| >= |vy| so the X-shifted cell (1,0) is tried first.
        let mut grid = Bitmap::new(4, 4);
        let mut grain = Grain {
            x: 200,
            y: 200,
            vx: 220,
            vy: 200,
            px: 0,
            py: 0,
        };
        grid.set(0, 0);
        let _blocker = grain_at(&mut grid, 1, 1, 0, 0);

        grain.update_pos(&mut grid);
        // Slipped sideways into (1,0); Y motion cancelled and bounced.
        assert_eq!(grain.cell(), (1, 0));
        assert_eq!(grain.y, 200);
        assert_eq!(grain.vy, bounce(200));
        assert_eq!(grain.vx, 220);
        assert!(!grid.get(0, 0));
        assert!(grid.get(1, 0));
    }

    #[test]
    fn test_diagonal_collision_falls_back_to_slower_axis() {
        // Same setup but the X-shifted cell is also taken: the move falls
        // back to the Y-shifted cell (0,1) and cancels X instead.
        let mut grid = Bitmap::new(4, 4);
        let mut grain = Grain {
            x: 200,
            y: 200,
            vx: 220,
            vy: 200,
            px: 0,
            py: 0,
        };
        grid.set(0, 0);
        let _b1 = grain_at(&mut grid, 1, 1, 0, 0);
        let _b2 = grain_at(&mut grid, 1, 0, 0, 0);

        grain.update_pos(&mut grid);
        assert_eq!(grain.cell(), (0, 1));
        assert_eq!(grain.x, 200);
        assert_eq!(grain.vx, bounce(220));
        assert_eq!(grain.vy, 200);
    }

    #[test]
    fn test_diagonal_collision_boxed_in_cancels_all_motion() {
        let mut grid = Bitmap::new(4, 4);
        let mut grain = Grain {
            x: 200,
            y: 200,
            vx: 220,
            vy: 200,
            px: 0,
            py: 0,
        };
        grid.set(0, 0);
        let _b1 = grain_at(&mut grid, 1, 1, 0, 0);
        let _b2 = grain_at(&mut grid, 1, 0, 0, 0);
        let _b3 = grain_at(&mut grid, 0, 1, 0, 0);

        grain.update_pos(&mut grid);
        assert_eq!(grain.cell(), (0, 0));
        assert_eq!((grain.x, grain.y), (200, 200));
        assert_eq!(grain.vx, bounce(220));
        assert_eq!(grain.vy, bounce(200));
        // Bitmap untouched
        assert!(grid.get(0, 0));
        assert_eq!(grid.occupied_count(), 4);
    }

    #[test]
    fn test_randomize_places_exact_grain_count() {
        let mut sim = SandSimulation::with_seed(16, 8, 40, 1, 42);
        sim.check_consistency();
        assert_eq!(sim.grains().len(), 40);

        // Reset independence: a second randomize is also internally valid.
        sim.randomize();
        sim.check_consistency();
        assert_eq!(sim.grains().len(), 40);
    }

    #[test]
    fn test_grain_count_capped_at_grid_area() {
        let sim = SandSimulation::with_seed(4, 4, 100, 1, 3);
        assert_eq!(sim.num_grains(), 16);
        assert_eq!(sim.grid.occupied_count(), 16);
    }

    #[test]
    fn test_full_grid_update_holds_invariants() {
        // Completely packed grid: nothing can move, nothing may be lost.
        let mut sim = SandSimulation::with_seed(6, 6, 36, 1, 9);
        sim.update(2000, -1500, 100);
        sim.check_consistency();
    }

    #[test]
    fn test_occupancy_invariant_over_many_frames() {
        let mut sim = SandSimulation::with_seed(32, 16, 120, 1, 1234);
        for frame in 0..200 {
            // Swirl the acceleration vector around to exercise every branch.
            let ax = if frame % 3 == 0 { 4000 } else { -2500 };
            let ay = if frame % 2 == 0 { 1800 } else { -1800 };
            sim.update(ax, ay, (frame * 37) % 5000);
            sim.check_consistency();
        }
    }

    #[test]
    fn test_no_tunneling_per_frame() {
        let mut sim = SandSimulation::with_seed(24, 24, 80, 8, 99);
        for _ in 0..100 {
            let before: Vec<(usize, usize)> = sim.grains().iter().map(|g| g.cell()).collect();
            sim.update(8000, 8000, 0);
            for (g, (opx, opy)) in sim.grains().iter().zip(before) {
                let (px, py) = g.cell();
                assert!(px.abs_diff(opx) <= 1, "grain jumped {} -> {} in x", opx, px);
                assert!(py.abs_diff(opy) <= 1, "grain jumped {} -> {} in y", opy, py);
            }
        }
    }

    #[test]
    fn test_terminal_velocity_after_update() {
        let mut sim = SandSimulation::with_seed(32, 32, 50, 16, 5);
        for _ in 0..50 {
            sim.update(30000, 30000, 0);
            for g in sim.grains() {
                let v2 = g.vx as i64 * g.vx as i64 + g.vy as i64 * g.vy as i64;
                assert!(v2 <= 65536, "velocity escaped the clamp: {}", v2);
            }
        }
    }

    #[test]
    fn test_level_surface_still_jitters() {
        // Raw Z at full scale with scale 1 lands in the `5 - az` branch, so
        // grains get symmetric jitter and a level tray still settles.
        let mut sim = SandSimulation::with_seed(16, 16, 30, 1, 77);
        let before: Vec<(usize, usize)> = sim.grains().iter().map(|g| g.cell()).collect();
        for _ in 0..20 {
            sim.update(0, 0, 4096);
        }
        sim.check_consistency();
        let after: Vec<(usize, usize)> = sim.grains().iter().map(|g| g.cell()).collect();
        assert_ne!(before, after, "jitter never moved any grain");
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let mut a = SandSimulation::with_seed(20, 12, 60, 4, 2024);
        let mut b = SandSimulation::with_seed(20, 12, 60, 4, 2024);
        for _ in 0..50 {
            a.update(1810, 0, 100);
            b.update(1810, 0, 100);
        }
        let cells_a: Vec<_> = a.grains().iter().map(|g| g.cell()).collect();
        let cells_b: Vec<_> = b.grains().iter().map(|g| g.cell()).collect();
        assert_eq!(cells_a, cells_b);
    }

    #[test]
    fn test_gravity_piles_sand_at_the_bottom() {
        let mut sim = SandSimulation::with_seed(16, 16, 32, 1, 11);
        // Steady pull toward +Y, as if the tray were tilted on edge.
        for _ in 0..400 {
            sim.update(0, 4000, 500);
        }
        sim.check_consistency();
        // Two full rows' worth of grains must end in the bottom half.
        let bottom = sim
            .grains()
            .iter()
            .filter(|g| g.cell().1 >= sim.height() / 2)
            .count();
        assert!(bottom > sim.num_grains() * 3 / 4, "only {} grains settled", bottom);
    }
}
