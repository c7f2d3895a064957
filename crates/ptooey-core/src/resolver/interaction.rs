//! Interaction resolver: pickup, steal, deposit, and drop.
//!
//! The resolver turns one [`ActionRequest`] into at most one committed
//! possession or deposit transition:
//!
//! 1. **Steal**: only when the requester is empty-handed and the target is
//!    another participant's character holding an item. The item moves from
//!    victim to requester in a single registry transfer.
//! 2. **Pickup**: an empty-handed requester acquires a free holdable.
//! 3. **Deposit or drop**: a holding requester deposits into a container in
//!    reach, otherwise drops the item where they stand. Dropping always
//!    succeeds.
//!
//! The resolver never touches scores itself; the container matcher does.

use glam::Vec2;
use tracing::{debug, trace};

use crate::arena::ProximityQuery;
use crate::entity::{Entity, EntityId, ParticipantId};
use crate::events::SimEvent;

use super::{select_target, ActionKind, ActionRequest, AuthorityContext, InteractionOutcome};

/// Resolves interaction requests against the shared state.
///
/// # Example
///
/// ```
/// use ptooey_core::resolver::InteractionResolver;
///
/// let resolver = InteractionResolver::new(2.0);
/// assert_eq!(resolver.reach(), 2.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionResolver {
    reach: f32,
}

impl InteractionResolver {
    /// Creates a resolver with the given reach radius.
    #[must_use]
    pub const fn new(reach: f32) -> Self {
        Self { reach }
    }

    /// Radius passed to the proximity provider.
    #[must_use]
    pub const fn reach(&self) -> f32 {
        self.reach
    }

    /// Handles a request end to end: drops it if stale, asks `proximity`
    /// (or the arena's own reach index) for candidates, selects a target,
    /// and resolves.
    pub fn handle(
        &self,
        ctx: &mut AuthorityContext<'_>,
        request: ActionRequest,
        proximity: Option<&dyn ProximityQuery>,
    ) -> InteractionOutcome {
        if request.tick != ctx.tick {
            trace!(
                requester = %request.requester,
                request_tick = request.tick,
                tick = ctx.tick,
                "dropping stale request"
            );
            return InteractionOutcome::Ignored;
        }
        let Some(origin) = ctx
            .arena
            .character_of(request.requester)
            .and_then(|character| ctx.arena.position(character))
        else {
            return InteractionOutcome::Ignored;
        };

        let candidates = match proximity {
            Some(provider) => provider.find_candidates(origin, self.reach),
            None => ctx.arena.reach_index().find_candidates(origin, self.reach),
        };
        let target = select_target(
            ctx.arena,
            ctx.possession,
            request.requester,
            request.kind,
            &candidates,
        );

        let outcome = Self::resolve(ctx, request.requester, target, request.kind == ActionKind::Steal);
        debug!(
            requester = %request.requester,
            kind = ?request.kind,
            target = ?target,
            outcome = ?outcome,
            "resolved request"
        );
        outcome
    }

    /// Applies one resolution for `requester` against `target`.
    ///
    /// Invalid combinations resolve to [`InteractionOutcome::Ignored`]
    /// without changing anything.
    pub fn resolve(
        ctx: &mut AuthorityContext<'_>,
        requester: ParticipantId,
        target: Option<EntityId>,
        steal: bool,
    ) -> InteractionOutcome {
        let Some(character) = ctx.arena.character_of(requester) else {
            return InteractionOutcome::Ignored;
        };
        let Some(entity) = ctx.arena.get(character) else {
            return InteractionOutcome::Ignored;
        };
        let origin = entity.position();
        let held = entity.as_character().and_then(|c| c.held);

        match (steal, held) {
            (true, None) => Self::steal(ctx, requester, character, origin, target),
            (true, Some(_)) => InteractionOutcome::Ignored,
            (false, None) => Self::pick_up(ctx, requester, character, origin, target),
            (false, Some(item)) => {
                Self::deposit_or_drop(ctx, requester, character, origin, item, target)
            }
        }
    }

    fn steal(
        ctx: &mut AuthorityContext<'_>,
        thief: ParticipantId,
        thief_character: EntityId,
        origin: Vec2,
        target: Option<EntityId>,
    ) -> InteractionOutcome {
        let Some(target) = target else {
            return InteractionOutcome::Ignored;
        };
        let Some(victim_character) = ctx.arena.get(target).and_then(Entity::as_character) else {
            return InteractionOutcome::Ignored;
        };
        let victim = victim_character.owner;
        let Some(item) = victim_character.held else {
            return InteractionOutcome::Ignored;
        };
        if victim == thief || !ctx.possession.transfer(item, victim, thief) {
            return InteractionOutcome::Ignored;
        }

        if let Some(components) = ctx.arena.get_mut(target).and_then(Entity::as_character_mut) {
            components.held = None;
        }
        if let Some(components) = ctx
            .arena
            .get_mut(thief_character)
            .and_then(Entity::as_character_mut)
        {
            components.held = Some(item);
            components.counters.bump_pickup();
        }
        ctx.arena.set_position(item, origin);

        ctx.effects.emit(SimEvent::Stolen {
            thief,
            victim,
            item,
        });
        InteractionOutcome::Stolen { item, victim }
    }

    fn pick_up(
        ctx: &mut AuthorityContext<'_>,
        requester: ParticipantId,
        character: EntityId,
        origin: Vec2,
        target: Option<EntityId>,
    ) -> InteractionOutcome {
        let Some(item) = target else {
            return InteractionOutcome::Ignored;
        };
        if !ctx.arena.get(item).is_some_and(Entity::is_holdable)
            || !ctx.possession.is_free(item)
            || !ctx.possession.acquire(item, requester)
        {
            return InteractionOutcome::Ignored;
        }

        if let Some(components) = ctx.arena.get_mut(character).and_then(Entity::as_character_mut) {
            components.held = Some(item);
            components.counters.bump_pickup();
        }
        ctx.arena.set_position(item, origin);

        ctx.effects.emit(SimEvent::PickedUp {
            participant: requester,
            item,
        });
        InteractionOutcome::PickedUp { item }
    }

    fn deposit_or_drop(
        ctx: &mut AuthorityContext<'_>,
        requester: ParticipantId,
        character: EntityId,
        origin: Vec2,
        item: EntityId,
        target: Option<EntityId>,
    ) -> InteractionOutcome {
        let kind = ctx
            .arena
            .get(item)
            .and_then(Entity::as_holdable)
            .map(|holdable| holdable.kind);

        ctx.possession.release(item);
        if let Some(components) = ctx.arena.get_mut(character).and_then(Entity::as_character_mut) {
            components.held = None;
            components.counters.bump_throw();
        }

        if let (Some(container), Some(kind)) = (target, kind) {
            if let Some(pot) = ctx
                .arena
                .get_mut(container)
                .and_then(Entity::as_container_mut)
            {
                let receipt =
                    ctx.matcher
                        .deposit(pot, kind, requester, &mut *ctx.ledger, &mut *ctx.rng);
                ctx.despawn(item);

                ctx.effects.emit(SimEvent::Deposited {
                    participant: requester,
                    item,
                    kind,
                    container,
                    points: receipt.points_awarded,
                });
                if let Some(recipe) = receipt.completed.and_then(|i| ctx.matcher.catalog().get(i)) {
                    ctx.effects.emit(SimEvent::RecipeCompleted {
                        participant: requester,
                        recipe: recipe.name.clone(),
                    });
                }
                return InteractionOutcome::Deposited {
                    item,
                    container,
                    receipt,
                };
            }
        }

        ctx.arena.set_position(item, origin);
        ctx.effects.emit(SimEvent::Dropped {
            participant: requester,
            item,
            position: origin,
        });
        InteractionOutcome::Dropped {
            item,
            position: origin,
        }
    }
}
