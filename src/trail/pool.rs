//! CPU particle pool: emission along the pointer path, per-frame aging,
//! ring-cursor slot recycling.

use glam::{Vec2, Vec3};

/// Fixed pool capacity. Slots are pre-allocated once and recycled forever.
pub const MAX_PARTICLES: usize = 2000;

/// Pointer moves shorter than this are treated as jitter and emit nothing.
const MIN_MOVE: f32 = 0.1;
/// Pointer moves longer than this are treated as a discontinuity (pointer
/// re-entering the canvas) and emit nothing.
const MAX_MOVE: f32 = 300.0;
/// Particles emitted per unit of pointer movement.
const EMIT_PER_UNIT: f32 = 0.1;

const SPAWN_OPACITY: f32 = 0.5;
const GROWTH_PER_FRAME: f32 = 0.016;
const DECAY_FACTOR: f32 = 0.96;
/// Below this opacity a slot is considered fully faded and turns invisible.
const FADE_EPSILON: f32 = 0.001;

/// One pooled sprite.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSlot {
    pub visible: bool,
    pub position: Vec3,
    /// x/y animate together; z stays 1.
    pub scale: Vec3,
    pub opacity: f32,
}

impl Default for ParticleSlot {
    fn default() -> Self {
        Self {
            visible: false,
            position: Vec3::ZERO,
            scale: Vec3::new(0.0, 0.0, 1.0),
            opacity: 0.0,
        }
    }
}

/// Fixed-capacity particle pool with a rotating recycle cursor.
///
/// Growth and decay rates are applied per call to [`advance`](Self::advance),
/// not per elapsed second; hosts stepping at a different framerate get a
/// proportionally different trail.
///
/// Recycling is strictly cursor-driven: a long emission burst can reclaim a
/// slot that is still fading, which reads as a visible pop.
#[derive(Debug, Clone)]
pub struct TrailPool {
    slots: Vec<ParticleSlot>,
    cursor: usize,
    prev_pointer: Vec2,
}

impl TrailPool {
    pub fn new() -> Self {
        Self {
            slots: vec![ParticleSlot::default(); MAX_PARTICLES],
            cursor: 0,
            prev_pointer: Vec2::ZERO,
        }
    }

    /// Activate slots along the segment from the previous pointer sample to
    /// `pointer`, interpolated so fast moves still read as a continuous trail.
    /// Returns how many slots were activated.
    ///
    /// Callers must pass finite coordinates; [`TrailMap`](crate::TrailMap)
    /// rejects non-finite input before it reaches the pool.
    pub fn emit(&mut self, pointer: Vec2) -> usize {
        debug_assert!(pointer.is_finite());

        let move_length = pointer.distance(self.prev_pointer);
        if move_length < MIN_MOVE || move_length > MAX_MOVE {
            return 0;
        }

        let emit_count = ((move_length * EMIT_PER_UNIT).floor() as usize).max(1);

        for i in 0..emit_count {
            let emit_at = self
                .prev_pointer
                .lerp(pointer, i as f32 / emit_count as f32);

            let slot = &mut self.slots[self.cursor];
            slot.visible = true;
            slot.opacity = SPAWN_OPACITY;
            slot.scale = Vec3::new(0.0, 0.0, 1.0);
            slot.position = emit_at.extend(0.0);

            self.cursor = (self.cursor + 1) % MAX_PARTICLES;
        }

        emit_count
    }

    /// Age every visible slot: grow, decay opacity, retire once fully faded.
    pub fn advance(&mut self) {
        for slot in &mut self.slots {
            if !slot.visible {
                continue;
            }

            slot.scale.x += GROWTH_PER_FRAME;
            slot.scale.y += GROWTH_PER_FRAME;
            slot.opacity *= DECAY_FACTOR;

            if slot.opacity < FADE_EPSILON {
                slot.visible = false;
            }
        }
    }

    /// Record this frame's pointer sample for the next emission.
    pub fn set_prev_pointer(&mut self, pointer: Vec2) {
        self.prev_pointer = pointer;
    }

    pub fn prev_pointer(&self) -> Vec2 {
        self.prev_pointer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn slots(&self) -> &[ParticleSlot] {
        &self.slots
    }

    pub fn visible_count(&self) -> usize {
        self.slots.iter().filter(|s| s.visible).count()
    }
}

impl Default for TrailPool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_emission_at_prev_pointer() {
        let mut pool = TrailPool::new();
        let emitted = pool.emit(Vec2::new(10.0, 0.0));

        // Distance 10 -> floor(10 * 0.1) = 1 particle, placed at the lerp
        // start, which is the previous pointer.
        assert_eq!(emitted, 1);
        assert_eq!(pool.cursor(), 1);
        assert_eq!(pool.visible_count(), 1);

        let slot = pool.slots()[0];
        assert!(slot.visible);
        assert_eq!(slot.position, Vec3::ZERO);
        assert_eq!(slot.scale, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(slot.opacity, 0.5);
    }

    #[test]
    fn test_emit_count_scales_with_distance() {
        let mut pool = TrailPool::new();
        assert_eq!(pool.emit(Vec2::new(25.0, 0.0)), 2);

        let mut pool = TrailPool::new();
        assert_eq!(pool.emit(Vec2::new(299.0, 0.0)), 29);

        // Slow but above the jitter threshold still emits at least one.
        let mut pool = TrailPool::new();
        assert_eq!(pool.emit(Vec2::new(0.5, 0.0)), 1);
    }

    #[test]
    fn test_jitter_is_ignored() {
        let mut pool = TrailPool::new();
        let emitted = pool.emit(Vec2::new(0.05, 0.0));

        assert_eq!(emitted, 0);
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.visible_count(), 0);
    }

    #[test]
    fn test_teleport_is_ignored() {
        let mut pool = TrailPool::new();
        let emitted = pool.emit(Vec2::new(500.0, 0.0));

        assert_eq!(emitted, 0);
        assert_eq!(pool.cursor(), 0);
        assert_eq!(pool.visible_count(), 0);
    }

    #[test]
    fn test_interpolated_positions_lie_on_segment() {
        let mut pool = TrailPool::new();
        let emitted = pool.emit(Vec2::new(100.0, 0.0));
        assert_eq!(emitted, 10);

        for (i, slot) in pool.slots()[..10].iter().enumerate() {
            let expected_x = i as f32 * 10.0;
            assert!((slot.position.x - expected_x).abs() < 1e-3);
            assert_eq!(slot.position.y, 0.0);
            assert_eq!(slot.position.z, 0.0);
        }

        // Monotone along the segment, never reaching the end point.
        let xs: Vec<f32> = pool.slots()[..10].iter().map(|s| s.position.x).collect();
        assert!(xs.windows(2).all(|w| w[0] < w[1]));
        assert!(xs[9] < 100.0);
    }

    #[test]
    fn test_cursor_advances_by_emitted_count_modulo_max() {
        let mut pool = TrailPool::new();

        // Each emission covers distance 300 -> 30 slots.
        for _ in 0..67 {
            let before = pool.cursor();
            let emitted = pool.emit(Vec2::new(300.0, 0.0));
            assert_eq!(emitted, 30);
            assert_eq!(pool.cursor(), (before + emitted) % MAX_PARTICLES);
        }

        // 67 * 30 = 2010 emissions wrapped around the 2000-slot pool.
        assert_eq!(pool.cursor(), 10);
        assert_eq!(pool.slots().len(), MAX_PARTICLES);
        assert!(pool.visible_count() <= MAX_PARTICLES);
    }

    #[test]
    fn test_aging_is_monotone_until_invisible() {
        let mut pool = TrailPool::new();
        pool.emit(Vec2::new(10.0, 0.0));

        let mut last_opacity = pool.slots()[0].opacity;
        for _ in 0..152 {
            pool.advance();
            let slot = pool.slots()[0];
            assert!(slot.visible);
            assert!(slot.opacity < last_opacity);
            last_opacity = slot.opacity;
        }

        // 0.5 * 0.96^152 is still barely above the fade threshold; one more
        // frame crosses it.
        pool.advance();
        let slot = pool.slots()[0];
        assert!(!slot.visible);
        assert!(slot.opacity < 0.001);
    }

    #[test]
    fn test_scale_grows_linearly() {
        let mut pool = TrailPool::new();
        pool.emit(Vec2::new(10.0, 0.0));

        pool.advance();
        pool.advance();
        pool.advance();

        let slot = pool.slots()[0];
        assert!((slot.scale.x - 0.048).abs() < 1e-6);
        assert_eq!(slot.scale.x, slot.scale.y);
        assert_eq!(slot.scale.z, 1.0);
    }

    #[test]
    fn test_advance_skips_invisible_slots() {
        let mut pool = TrailPool::new();
        pool.advance();
        assert_eq!(pool.visible_count(), 0);
        assert_eq!(pool.slots()[0].opacity, 0.0);
    }

    #[test]
    fn test_prev_pointer_round_trip() {
        let mut pool = TrailPool::new();
        assert_eq!(pool.prev_pointer(), Vec2::ZERO);

        pool.set_prev_pointer(Vec2::new(3.0, 4.0));
        assert_eq!(pool.prev_pointer(), Vec2::new(3.0, 4.0));

        // Distance from (3,4) to (3,9) is 5 -> one particle at the start.
        let emitted = pool.emit(Vec2::new(3.0, 9.0));
        assert_eq!(emitted, 1);
        assert_eq!(pool.slots()[0].position, Vec3::new(3.0, 4.0, 0.0));
    }

    #[test]
    fn test_exact_threshold_move_emits() {
        let mut pool = TrailPool::new();
        // The teleport guard is strict: exactly 300 still emits.
        assert_eq!(pool.emit(Vec2::new(300.0, 0.0)), 30);
    }
}
