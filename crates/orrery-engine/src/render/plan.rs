use std::fmt;

use super::camera::CUBE_FACES;
use super::entity::EntityId;
use super::uniforms::{PRIMARY_SLOT, SLOT_COUNT};

/// One pass of a frame, in recording order.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PassKind {
    /// Render every other entity into `face` of `entity`'s cube, with the
    /// face camera in `slot`.
    Bake {
        entity: EntityId,
        face: usize,
        slot: u32,
    },
    /// Render every entity into the HDR target.
    Primary { slot: u32 },
    BlurX,
    BlurY,
    /// HDR + blur into the surface.
    Composite,
}

impl PassKind {
    #[inline]
    pub fn is_compute(self) -> bool {
        matches!(self, Self::BlurX | Self::BlurY)
    }

    /// Whether the pass draws the render list.
    #[inline]
    pub fn draws_scene(self) -> bool {
        matches!(self, Self::Bake { .. } | Self::Primary { .. })
    }

    /// The entity this pass leaves out: a cube never sees its owner.
    #[inline]
    pub fn excluded(self) -> Option<EntityId> {
        match self {
            Self::Bake { entity, .. } => Some(entity),
            _ => None,
        }
    }
}

/// Entities a scene pass draws, in render-list order: every drawable one
/// except `skip`.
pub fn drawn_entities(
    drawable: impl IntoIterator<Item = bool>,
    skip: Option<EntityId>,
) -> impl Iterator<Item = EntityId> {
    drawable
        .into_iter()
        .enumerate()
        .filter(move |&(index, drawable)| drawable && skip != Some(EntityId(index)))
        .map(|(index, _)| EntityId(index))
}

/// The ordered pass list of one frame, decided before anything is recorded.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct FramePlan {
    passes: Vec<PassKind>,
    /// Cube entities that keep last frame's cube because slots ran out.
    skipped_bakes: Vec<EntityId>,
}

impl FramePlan {
    /// Plans a frame for the given cube-owning entities, in render-list order.
    ///
    /// Face cameras take slots 1.. in order. An entity whose six faces do not
    /// all fit in the remaining slots is skipped whole.
    pub fn build(cube_entities: impl IntoIterator<Item = EntityId>) -> Self {
        let mut passes = Vec::new();
        let mut skipped_bakes = Vec::new();
        let mut next_slot = PRIMARY_SLOT + 1;

        for entity in cube_entities {
            if next_slot + CUBE_FACES as u32 > SLOT_COUNT {
                skipped_bakes.push(entity);
                continue;
            }
            for face in 0..CUBE_FACES {
                passes.push(PassKind::Bake {
                    entity,
                    face,
                    slot: next_slot,
                });
                next_slot += 1;
            }
        }

        passes.extend([
            PassKind::Primary { slot: PRIMARY_SLOT },
            PassKind::BlurX,
            PassKind::BlurY,
            PassKind::Composite,
        ]);

        Self {
            passes,
            skipped_bakes,
        }
    }

    #[inline]
    pub fn passes(&self) -> &[PassKind] {
        &self.passes
    }

    #[inline]
    pub fn skipped_bakes(&self) -> &[EntityId] {
        &self.skipped_bakes
    }

    pub fn render_pass_count(&self) -> usize {
        self.passes.iter().filter(|p| !p.is_compute()).count()
    }

    pub fn compute_pass_count(&self) -> usize {
        self.passes.iter().filter(|p| p.is_compute()).count()
    }
}

/// Work recorded for one frame.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct RenderStats {
    pub render_passes: u32,
    pub compute_passes: u32,
    pub draw_calls: u32,
    pub indices: u64,
}

impl RenderStats {
    #[inline]
    pub fn record_draw(&mut self, index_count: u32) {
        self.draw_calls += 1;
        self.indices += u64::from(index_count);
    }
}

impl fmt::Display for RenderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} render passes, {} compute passes, {} draws, {} indices",
            self.render_passes, self.compute_passes, self.draw_calls, self.indices
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scene_still_posts() {
        let plan = FramePlan::build(std::iter::empty::<EntityId>());
        assert_eq!(
            plan.passes(),
            [
                PassKind::Primary { slot: 0 },
                PassKind::BlurX,
                PassKind::BlurY,
                PassKind::Composite,
            ]
        );
        assert_eq!(plan.render_pass_count(), 2);
        assert_eq!(plan.compute_pass_count(), 2);
        assert!(plan.skipped_bakes().is_empty());
    }

    #[test]
    fn bakes_come_first_with_consecutive_slots() {
        let plan = FramePlan::build([EntityId(2), EntityId(5)]);
        let passes = plan.passes();
        assert_eq!(passes.len(), 12 + 4);

        for (i, pass) in passes[..12].iter().enumerate() {
            let entity = if i < 6 { EntityId(2) } else { EntityId(5) };
            assert_eq!(
                *pass,
                PassKind::Bake {
                    entity,
                    face: i % 6,
                    slot: 1 + i as u32,
                }
            );
        }
        assert_eq!(passes[12], PassKind::Primary { slot: 0 });
        assert_eq!(passes[15], PassKind::Composite);
    }

    #[test]
    fn slot_exhaustion_skips_whole_entities() {
        // 1023 face slots hold 170 full cubes (1020 slots).
        let cubes: Vec<_> = (0..172).map(EntityId).collect();
        let plan = FramePlan::build(cubes);

        let bakes: Vec<_> = plan
            .passes()
            .iter()
            .filter_map(|p| match p {
                PassKind::Bake { slot, .. } => Some(*slot),
                _ => None,
            })
            .collect();
        assert_eq!(bakes.len(), 170 * 6);
        assert_eq!(bakes.last(), Some(&1020));
        assert!(bakes.iter().all(|s| *s < SLOT_COUNT));
        assert_eq!(plan.skipped_bakes(), [EntityId(170), EntityId(171)]);
        // The rest of the frame is unaffected.
        assert_eq!(plan.passes().last(), Some(&PassKind::Composite));
    }

    #[test]
    fn bakes_leave_out_their_owner() {
        let drawable = [true, true, true];
        let drawn: Vec<_> = drawn_entities(drawable, Some(EntityId(1))).collect();
        assert_eq!(drawn, [EntityId(0), EntityId(2)]);

        let drawn: Vec<_> = drawn_entities(drawable, None).collect();
        assert_eq!(drawn, [EntityId(0), EntityId(1), EntityId(2)]);
    }

    #[test]
    fn empty_meshes_are_never_drawn() {
        let drawable = [false, true, false, true];
        let drawn: Vec<_> = drawn_entities(drawable, None).collect();
        assert_eq!(drawn, [EntityId(1), EntityId(3)]);

        // Skipping an entity that wouldn't draw anyway changes nothing.
        let drawn: Vec<_> = drawn_entities(drawable, Some(EntityId(0))).collect();
        assert_eq!(drawn, [EntityId(1), EntityId(3)]);
    }

    #[test]
    fn frame_draw_count() {
        // Two cube owners, one plain model, one empty mesh.
        let drawable = [true, true, true, false];
        let plan = FramePlan::build([EntityId(0), EntityId(1)]);

        let draws: Vec<usize> = plan
            .passes()
            .iter()
            .filter(|p| p.draws_scene())
            .map(|p| drawn_entities(drawable, p.excluded()).count())
            .collect();
        // 12 faces see the other two drawable models, the primary sees all three.
        assert_eq!(draws.len(), 13);
        assert!(draws[..12].iter().all(|&n| n == 2));
        assert_eq!(draws[12], 3);
        assert_eq!(draws.iter().sum::<usize>(), 27);

        assert_eq!(plan.render_pass_count(), 14);
        assert_eq!(plan.compute_pass_count(), 2);
        assert!(plan.passes()[..12].iter().all(|p| p.excluded().is_some()));
        assert_eq!(plan.passes()[12].excluded(), None);
    }

    #[test]
    fn stats_accumulate_draws() {
        let mut stats = RenderStats::default();
        stats.record_draw(36);
        stats.record_draw(3);
        assert_eq!(stats.draw_calls, 2);
        assert_eq!(stats.indices, 39);
        assert_eq!(
            stats.to_string(),
            "0 render passes, 0 compute passes, 2 draws, 39 indices"
        );
    }
}
