//! Ability systems: input → slot dispatch → эмиттеры → попадания

use bevy::prelude::*;
use bevy_rapier3d::prelude::{CollisionGroups, Velocity};
use rand::Rng;
use std::f32::consts::TAU;

use super::ability::{Abilities, Ability, AbilityActions, STRAFE_RELEASE_DELAY};
use super::emitters::{BlinkDash, Emitter, Summon, SummonEmitter, SummonTracker, SUMMON_FADE_TIME};
use super::events::{AbilityFired, AbilityHit, AbilityInput, EmittersStopped, FormChanged};
use super::forms::{FormKind, Forms};
use crate::ai::StunRequest;
use crate::animation::{params, AnimParams};
use crate::combat::{DamageRequest, Dead};
use crate::controller::{ControllerInput, ControllerState};
use crate::math::{look_rotation, planar};
use crate::navigation::WalkableArea;
use crate::physics::collision::{dashing_character_groups, hostile_mask, MASK_GROUND, MASK_LOS_BLOCK};
use crate::physics::{PhysicsQueries, PhysicsWorld};
use crate::pool::{despawn_later, prototypes, Dormant, PoolRegistry, PrototypeId};
use crate::projectile::{spawn_projectile, Projectile, ProjectilePayload};
use crate::targeting::Faction;
use crate::DeterministicRng;

/// Направление прицеливания: камера (если есть) или forward персонажа
pub fn aim_direction(transform: &Transform, input: Option<&ControllerInput>) -> Vec3 {
    input
        .and_then(|input| input.camera_forward.try_normalize())
        .unwrap_or_else(|| transform.forward().as_vec3())
}

fn fired_ability<'a>(abilities: &'a Abilities, event: &AbilityFired) -> Option<&'a Ability> {
    abilities.get(event.slot)
}

/// strafe/анимация/AbilityFired по результату try_use или tick
fn apply_actions(
    owner: Entity,
    actions: &AbilityActions,
    abilities: &Abilities,
    state: Option<&mut ControllerState>,
    anim: Option<&mut AnimParams>,
    fired: &mut EventWriter<AbilityFired>,
) {
    if let Some(state) = state {
        if actions.started.is_some() {
            state.set_strafing(true);
        }
        if actions.stopped {
            state.end_strafing_after(STRAFE_RELEASE_DELAY);
        }
    }

    if let Some(anim) = anim {
        if let Some(slot) = actions.started {
            anim.set_bool(params::IS_ATTACKING, true);
            anim.set_float(params::ABILITY_INDEX, slot as f32);
        }
        if actions.stopped {
            anim.set_bool(params::IS_ATTACKING, false);
        }
    }

    for &slot in actions.fired.iter() {
        fired.write(AbilityFired { owner, slot });
        if let Some(ability) = abilities.get(slot) {
            crate::logger::log(&format!(
                "✨ {:?} fired {} '{}' (slot {})",
                owner,
                ability.emitter.kind_name(),
                ability.name,
                slot
            ));
        }
    }
}

/// Система: нажатия/отпускания слотов
///
/// Отказ (cooldown, занят, нет слота) — лог и drop.
#[allow(clippy::type_complexity)]
pub fn handle_ability_input(
    mut inputs: EventReader<AbilityInput>,
    mut owners: Query<
        (&mut Abilities, Option<&mut ControllerState>, Option<&mut AnimParams>),
        Without<Dead>,
    >,
    mut fired: EventWriter<AbilityFired>,
) {
    for input in inputs.read() {
        let Ok((mut abilities, mut state, mut anim)) = owners.get_mut(input.entity) else {
            continue;
        };

        if !input.pressed {
            abilities.release(input.slot);
            continue;
        }

        match abilities.try_use(input.slot) {
            Ok(actions) => apply_actions(
                input.entity,
                &actions,
                &abilities,
                state.as_deref_mut(),
                anim.as_deref_mut(),
                &mut fired,
            ),
            Err(err) => crate::logger::log(&format!("🚫 {:?}: {}", input.entity, err)),
        }
    }
}

/// Система: cooldown'ы, fire point'ы, конец activity
#[allow(clippy::type_complexity)]
pub fn tick_abilities(
    time: Res<Time>,
    mut owners: Query<
        (
            Entity,
            &mut Abilities,
            Option<&mut ControllerState>,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
    mut fired: EventWriter<AbilityFired>,
) {
    let delta = time.delta_secs();

    for (entity, mut abilities, mut state, mut anim) in owners.iter_mut() {
        let actions = abilities.tick(delta);
        if actions.is_empty() {
            continue;
        }
        apply_actions(
            entity,
            &actions,
            &abilities,
            state.as_deref_mut(),
            anim.as_deref_mut(),
            &mut fired,
        );
    }
}

// ============================================================================
// Forms
// ============================================================================

/// Система: Transform эмиттер → временная форма
pub fn fire_transform_emitters(
    mut fired: EventReader<AbilityFired>,
    mut owners: Query<(&Abilities, &mut Forms)>,
) {
    for event in fired.read() {
        let Ok((abilities, mut forms)) = owners.get_mut(event.owner) else {
            continue;
        };
        let Some(Emitter::Transform(transform)) = fired_ability(&abilities, event).map(|a| a.emitter)
        else {
            continue;
        };
        forms.apply_timed(
            transform.form,
            transform.blend,
            transform.duration,
            transform.blend,
        );
    }
}

/// Система: смена формы + visual blend
///
/// Смена: stop_fire всех эмиттеров, прерывание activity, обмен наборов
/// способностей, скорость/полёт формы сразу.
#[allow(clippy::type_complexity)]
pub fn apply_form_switches(
    time: Res<Time>,
    mut owners: Query<
        (
            Entity,
            &mut Forms,
            &mut Abilities,
            Option<&mut ControllerState>,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
    mut stopped: EventWriter<EmittersStopped>,
    mut changed: EventWriter<FormChanged>,
) {
    let delta = time.delta_secs();

    for (entity, mut forms, mut abilities, mut state, mut anim) in owners.iter_mut() {
        forms.tick(delta);

        if let Some((kind, blend_time)) = forms.take_pending() {
            stopped.write(EmittersStopped { owner: entity });
            if abilities.interrupt() {
                if let Some(state) = state.as_deref_mut() {
                    state.end_strafing_after(STRAFE_RELEASE_DELAY);
                }
            }

            if kind != forms.active {
                let outgoing = forms.active;
                let incoming = std::mem::take(&mut forms.form_mut(kind).abilities);
                let previous = std::mem::replace(&mut abilities.slots, incoming);
                forms.form_mut(outgoing).abilities = previous;
                forms.active = kind;
            }

            let form = forms.current();
            let (speed, can_fly) = (form.move_speed_multiplier, form.can_fly);
            if let Some(state) = state.as_deref_mut() {
                state.speed_factor = speed;
                state.enable_flight(can_fly);
            }
            if let Some(anim) = anim.as_deref_mut() {
                anim.set_bool(params::IS_TRANSFORMED, kind == FormKind::Alternate);
                anim.set_bool(params::IS_ATTACKING, false);
            }
            forms.begin_blend(kind, blend_time);

            changed.write(FormChanged { entity, form: kind });
            crate::logger::log(&format!(
                "🦋 {:?} form → {:?} (speed ×{:.2}, fly {})",
                entity, kind, speed, can_fly
            ));
        }

        if let Some(anim) = anim.as_deref_mut() {
            anim.set_float(params::FORM_AMOUNT, forms.amount);
        }
    }
}

// ============================================================================
// Melee / Projectile / Hitscan
// ============================================================================

/// Система: Melee эмиттер — все враги в сфере
pub fn fire_melee_emitters(
    physics: PhysicsWorld,
    mut fired: EventReader<AbilityFired>,
    owners: Query<(&Abilities, &Transform, &Faction)>,
    targets: Query<&Faction, Without<Dead>>,
    mut hits: EventWriter<AbilityHit>,
) {
    for event in fired.read() {
        let Ok((abilities, transform, faction)) = owners.get(event.owner) else {
            continue;
        };
        let Some(ability) = fired_ability(abilities, event) else {
            continue;
        };
        let Emitter::Melee(melee) = ability.emitter else {
            continue;
        };

        let center = transform.transform_point(melee.offset);
        let radius = ability.range * melee.radius_multiplier;
        for target in physics.overlap_sphere(center, radius, hostile_mask(*faction)) {
            if target == event.owner {
                continue;
            }
            let Ok(target_faction) = targets.get(target) else {
                continue;
            };
            if !faction.is_hostile_to(*target_faction) {
                continue;
            }
            hits.write(AbilityHit {
                attacker: event.owner,
                target,
                slot: event.slot,
                direct: true,
            });
        }
    }
}

/// Система: Projectile эмиттер — pooled снаряд по прицелу
pub fn fire_projectile_emitters(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    mut fired: EventReader<AbilityFired>,
    owners: Query<(&Abilities, &Transform, &Faction, Option<&ControllerInput>)>,
) {
    let prototype = PrototypeId::new(prototypes::PLAYER_PROJECTILE);

    for event in fired.read() {
        let Ok((abilities, transform, faction, input)) = owners.get(event.owner) else {
            continue;
        };
        let Some(ability) = fired_ability(abilities, event) else {
            continue;
        };
        let Emitter::Projectile(emitter) = ability.emitter else {
            continue;
        };

        let muzzle = transform.transform_point(emitter.offset);
        let direction = aim_direction(transform, input);
        let projectile = Projectile::new(
            Some(event.owner),
            *faction,
            ProjectilePayload::Ability { slot: event.slot },
            muzzle,
            direction * emitter.launch_speed,
            ability.range * emitter.base_range,
        );

        if let Err(err) = spawn_projectile(&mut commands, &mut registry, &prototype, projectile) {
            crate::logger::log_warning(&format!(
                "⚠️ {:?} projectile ability failed: {}",
                event.owner, err
            ));
        }
    }
}

/// Система: Hitscan эмиттер — первый враг на луче (не direct)
pub fn fire_hitscan_emitters(
    physics: PhysicsWorld,
    mut fired: EventReader<AbilityFired>,
    owners: Query<(&Abilities, &Transform, &Faction, Option<&ControllerInput>)>,
    targets: Query<&Faction, Without<Dead>>,
    mut hits: EventWriter<AbilityHit>,
) {
    for event in fired.read() {
        let Ok((abilities, transform, faction, input)) = owners.get(event.owner) else {
            continue;
        };
        let Some(ability) = fired_ability(abilities, event) else {
            continue;
        };
        let Emitter::Hitscan(hitscan) = ability.emitter else {
            continue;
        };

        let origin = transform.transform_point(hitscan.offset);
        let hit = physics.cast_ray(
            origin,
            aim_direction(transform, input),
            hitscan.base_range * ability.range,
            hostile_mask(*faction) | MASK_LOS_BLOCK,
            Some(event.owner),
        );
        let Some(target) = hit.and_then(|hit| hit.entity) else {
            continue;
        };
        let Ok(target_faction) = targets.get(target) else {
            continue;
        };
        if !faction.is_hostile_to(*target_faction) {
            continue;
        }

        hits.write(AbilityHit {
            attacker: event.owner,
            target,
            slot: event.slot,
            direct: false,
        });
    }
}

// ============================================================================
// Blink
// ============================================================================

/// Отмена рывка: скорость 0, управление и коллизии как до рывка
fn cancel_dash(
    owner: Entity,
    dash: &BlinkDash,
    velocity: Option<&mut Velocity>,
    state: Option<&mut ControllerState>,
    groups: Option<&mut CollisionGroups>,
) {
    if let Some(velocity) = velocity {
        velocity.linvel = Vec3::ZERO;
    }
    if dash.lock_control {
        if let Some(state) = state {
            state.set_movement_enabled(true);
        }
    }
    if let (Some(groups), Some(restore)) = (groups, dash.restore_groups) {
        *groups = restore;
    }
    crate::logger::log(&format!(
        "💨 {:?} blink dash cancelled ({} hit)",
        owner,
        dash.hit.len()
    ));
}

/// Система: старт рывка
///
/// Повторный fire во время рывка отменяет прежний: новый рывок
/// восстановит коллизии, сохранённые самым первым.
#[allow(clippy::type_complexity)]
pub fn start_blink_dashes(
    mut commands: Commands,
    mut fired: EventReader<AbilityFired>,
    mut owners: Query<
        (
            &mut Abilities,
            &Transform,
            &Faction,
            Option<&ControllerInput>,
            Option<&mut ControllerState>,
            Option<&mut CollisionGroups>,
            Option<&mut Velocity>,
            Option<&BlinkDash>,
        ),
        Without<Dead>,
    >,
) {
    // Рывки этого tick'а: компонент вставится командой только в конце
    let mut started: Vec<(Entity, BlinkDash)> = Vec::new();

    for event in fired.read() {
        let Ok((mut abilities, transform, faction, input, mut state, mut groups, mut velocity, current)) =
            owners.get_mut(event.owner)
        else {
            continue;
        };
        let Some(ability) = fired_ability(&abilities, event) else {
            continue;
        };
        let Emitter::Blink(blink) = ability.emitter else {
            continue;
        };

        let pending = started.iter().position(|(owner, _)| *owner == event.owner);
        let previous = match pending {
            Some(index) => Some(started.swap_remove(index).1),
            None => current.cloned(),
        };

        let mut original_groups = groups.as_deref().copied();
        if let Some(previous) = previous {
            cancel_dash(
                event.owner,
                &previous,
                velocity.as_deref_mut(),
                state.as_deref_mut(),
                groups.as_deref_mut(),
            );
            if previous.slot != event.slot {
                abilities.finish_instant(previous.slot);
            }
            original_groups = previous.restore_groups.or(original_groups);
        }

        let mut dash = BlinkDash::new(event.slot, &blink, aim_direction(transform, input));
        if dash.lock_control {
            if let Some(state) = state.as_deref_mut() {
                state.set_movement_enabled(false);
            }
        }
        if let Some(groups) = groups.as_deref_mut() {
            dash.restore_groups = original_groups;
            *groups = dashing_character_groups(*faction);
        }

        started.push((event.owner, dash));
        crate::logger::log(&format!("💨 {:?} blink dash started", event.owner));
    }

    for (owner, dash) in started {
        commands.entity(owner).insert(dash);
    }
}

/// Система: шаг рывка + попадания по капсуле персонажа
pub fn tick_blink_dashes(
    time: Res<Time>,
    physics: PhysicsWorld,
    mut dashes: Query<(Entity, &Transform, &Faction, &mut BlinkDash, &mut Velocity)>,
    targets: Query<&Faction, Without<Dead>>,
    mut hits: EventWriter<AbilityHit>,
) {
    let delta = time.delta_secs();

    for (entity, transform, faction, mut dash, mut velocity) in dashes.iter_mut() {
        if dash.finished {
            continue;
        }

        velocity.linvel = dash.direction * dash.speed;
        dash.advance(delta);

        let center = transform.translation;
        let half = Vec3::Y * (dash.hit_height * 0.5);
        let candidates: Vec<Entity> = physics
            .overlap_capsule(center - half, center + half, dash.hit_radius, hostile_mask(*faction))
            .into_iter()
            .filter(|target| *target != entity)
            .filter(|target| {
                targets
                    .get(*target)
                    .is_ok_and(|other| faction.is_hostile_to(*other))
            })
            .collect();

        for target in dash.register_hits(candidates) {
            hits.write(AbilityHit {
                attacker: entity,
                target,
                slot: dash.slot,
                direct: true,
            });
        }
    }
}

/// Система: stop_fire — отмена рывков
pub fn stop_emitters(
    mut stopped: EventReader<EmittersStopped>,
    mut dashes: Query<&mut BlinkDash>,
) {
    for event in stopped.read() {
        if let Ok(mut dash) = dashes.get_mut(event.owner) {
            dash.finished = true;
        }
    }
}

/// Система: конец рывка — скорость 0, управление и коллизии назад,
/// cooldown Blink стартует
#[allow(clippy::type_complexity)]
pub fn end_blink_dashes(
    mut commands: Commands,
    mut dashes: Query<(
        Entity,
        &BlinkDash,
        &mut Velocity,
        Option<&mut ControllerState>,
        Option<&mut CollisionGroups>,
        Option<&mut Abilities>,
    )>,
) {
    for (entity, dash, mut velocity, state, groups, abilities) in dashes.iter_mut() {
        if !dash.finished {
            continue;
        }
        if let Some(mut abilities) = abilities {
            abilities.finish_instant(dash.slot);
        }

        velocity.linvel = Vec3::ZERO;
        if dash.lock_control {
            if let Some(mut state) = state {
                state.set_movement_enabled(true);
            }
        }
        if let (Some(mut groups), Some(restore)) = (groups, dash.restore_groups) {
            *groups = restore;
        }

        commands.entity(entity).remove::<BlinkDash>();
        crate::logger::log(&format!(
            "💨 {:?} blink dash ended ({} hit)",
            entity,
            dash.hit.len()
        ));
    }
}

// ============================================================================
// Summon
// ============================================================================

/// Точка призыва: перед владельцем + разброс, snap к walkable area
///
/// None — ни walkable area, ни земли рядом (вызывающий берёт fallback).
pub fn summon_spawn_point(
    physics: &impl PhysicsQueries,
    area: Option<&WalkableArea>,
    rng: &mut impl Rng,
    position: Vec3,
    forward: Vec3,
    emitter: &SummonEmitter,
) -> Option<Vec3> {
    let mut desired = position + forward * emitter.spawn_distance;
    if let Some(ground) = physics.cast_ray(desired, Vec3::NEG_Y, 100.0, MASK_GROUND, None) {
        desired.y = ground.point.y;
    }

    let angle = rng.gen_range(0.0..TAU);
    let radius = emitter.spawn_radius * rng.gen::<f32>().sqrt();
    desired += Vec3::new(angle.cos(), 0.0, angle.sin()) * radius;

    if let Some(area) = area {
        if let Some(point) = area.sample_nearest_walkable(desired, emitter.sample_radius) {
            return Some(point);
        }
    }

    physics
        .cast_ray(desired + Vec3::Y * 5.0, Vec3::NEG_Y, 20.0, MASK_GROUND, None)
        .map(|hit| hit.point)
}

fn fade_summon(commands: &mut Commands, entity: Entity, summon: &mut Summon, now: f32) {
    if summon.fading {
        return;
    }
    summon.fading = true;
    despawn_later(commands, entity, now, SUMMON_FADE_TIME);
    crate::logger::log(&format!("🌫️ Summon {:?} fading out", entity));
}

/// Система: Summon эмиттер
///
/// Лимит max_active: replace_oldest → старейший исчезает, иначе отказ.
#[allow(clippy::too_many_arguments)]
pub fn fire_summon_emitters(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    mut rng: ResMut<DeterministicRng>,
    area: Option<Res<WalkableArea>>,
    time: Res<Time>,
    physics: PhysicsWorld,
    mut fired: EventReader<AbilityFired>,
    mut owners: Query<(&Abilities, &Transform, Option<&ControllerInput>, &mut SummonTracker)>,
    mut summons: Query<&mut Summon>,
) {
    let prototype = PrototypeId::new(prototypes::SUMMON);
    let now = time.elapsed_secs();

    for event in fired.read() {
        let Ok((abilities, transform, input, mut tracker)) = owners.get_mut(event.owner) else {
            continue;
        };
        let Some(ability) = fired_ability(abilities, event) else {
            continue;
        };
        let Emitter::Summon(emitter) = ability.emitter else {
            continue;
        };

        let max_active = emitter.max_active.max(1);
        let count = if emitter.all_at_once { max_active } else { 1 };
        let forward = planar(aim_direction(transform, input))
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z);

        for _ in 0..count {
            // Summon вставлен командой: в этом tick'е компонента ещё может не быть
            tracker.active.retain(|summon| {
                registry.is_active(*summon) && summons.get(*summon).map_or(true, |s| !s.fading)
            });

            if tracker.active.len() >= max_active {
                if !emitter.replace_oldest {
                    crate::logger::log(&format!(
                        "🚫 {:?} summon limit reached ({})",
                        event.owner, max_active
                    ));
                    break;
                }
                while tracker.active.len() >= max_active {
                    let Some(oldest) = tracker.active.pop_front() else {
                        break;
                    };
                    if let Ok(mut summon) = summons.get_mut(oldest) {
                        fade_summon(&mut commands, oldest, &mut summon, now);
                    }
                }
            }

            let position = summon_spawn_point(
                &physics,
                area.as_deref(),
                &mut rng.rng,
                transform.translation,
                forward,
                &emitter,
            )
            .unwrap_or(transform.translation + forward * emitter.fallback_distance);
            let rotation = look_rotation(forward, Vec3::Y).unwrap_or_default();

            match registry.spawn(
                &mut commands,
                &prototype,
                Transform::from_translation(position).with_rotation(rotation),
            ) {
                Ok(entity) => {
                    commands
                        .entity(entity)
                        .insert(Summon::new(event.owner, emitter.duration));
                    tracker.active.push_back(entity);
                    crate::logger::log(&format!(
                        "👻 {:?} summoned {:?} at {:.1?}",
                        event.owner, entity, position
                    ));
                }
                Err(err) => {
                    crate::logger::log_warning(&format!(
                        "⚠️ {:?} summon failed: {}",
                        event.owner, err
                    ));
                    break;
                }
            }
        }
    }
}

/// Система: время жизни призванных
pub fn tick_summons(
    mut commands: Commands,
    time: Res<Time>,
    mut summons: Query<(Entity, &mut Summon), Without<Dormant>>,
) {
    let delta = time.delta_secs();
    let now = time.elapsed_secs();

    for (entity, mut summon) in summons.iter_mut() {
        summon.age += delta;
        if summon.age >= summon.lifetime {
            fade_summon(&mut commands, entity, &mut summon, now);
        }
    }
}

// ============================================================================
// Hits
// ============================================================================

/// Система: AbilityHit → урон (× множитель формы) + stun
///
/// On-hit предметы читают тот же AbilityHit (items).
pub fn apply_ability_hits(
    mut hits: EventReader<AbilityHit>,
    owners: Query<(&Abilities, Option<&Forms>)>,
    mut damage_events: EventWriter<DamageRequest>,
    mut stun_events: EventWriter<StunRequest>,
) {
    for hit in hits.read() {
        let Ok((abilities, forms)) = owners.get(hit.attacker) else {
            continue;
        };
        let Some(ability) = abilities.get(hit.slot) else {
            continue;
        };

        let multiplier = forms.map_or(1.0, |forms| forms.damage_multiplier());
        damage_events.write(DamageRequest {
            target: hit.target,
            source: Some(hit.attacker),
            amount: ability.damage * multiplier,
            direct: hit.direct,
        });

        if let Some(duration) = ability.stun_on_hit {
            stun_events.write(StunRequest {
                entity: hit.target,
                duration,
            });
        }
    }
}
