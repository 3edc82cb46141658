use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::detector::Transition;

pub const BURST_TTL: Duration = Duration::from_millis(1000);
pub const SHAKE_TTL: Duration = Duration::from_millis(1000);
pub const TRAIL_TTL: Duration = Duration::from_millis(3000);
pub const TRAIL_MAX_DELAY_MS: u64 = 300;
pub const TRAILS_PER_KILL: usize = 8;
pub const FLASH_TTL: Duration = Duration::from_millis(1500);

pub type EffectId = u64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EffectKind {
    ImpactBurst,
    /// `left_pct` is the horizontal position in percent of the board width.
    LinearTrail { left_pct: f32 },
    DirectionalFlash { angle_deg: f32 },
}

impl EffectKind {
    pub fn is_burst(&self) -> bool {
        matches!(self, EffectKind::ImpactBurst)
    }

    pub fn is_trail(&self) -> bool {
        matches!(self, EffectKind::LinearTrail { .. })
    }

    pub fn is_flash(&self) -> bool {
        matches!(self, EffectKind::DirectionalFlash { .. })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EffectInstance {
    pub id: EffectId,
    pub kind: EffectKind,
    pub created_at: Instant,
    pub start_delay: Duration,
    pub duration: Duration,
}

impl EffectInstance {
    pub fn expires_at(&self) -> Instant {
        self.created_at + self.start_delay + self.duration
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at()
    }

    pub fn is_started(&self, now: Instant) -> bool {
        now >= self.created_at + self.start_delay
    }

    /// Fraction of the visible lifetime that has elapsed, clamped to `0.0..=1.0`.
    pub fn progress(&self, now: Instant) -> f32 {
        let start = self.created_at + self.start_delay;
        if now <= start || self.duration.is_zero() {
            return 0.0;
        }
        let elapsed = now.duration_since(start).as_secs_f32();
        (elapsed / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Live effect instances keyed by id. Every instance carries its own expiry; [`sweep`]
/// drops the expired ones and every read path filters them out as well, so an instance is
/// never observable past its deadline regardless of how often the sweep runs.
///
/// [`sweep`]: EffectRegistry::sweep
#[derive(Debug, Clone)]
pub struct EffectRegistry {
    next_id: EffectId,
    instances: BTreeMap<EffectId, EffectInstance>,
    shake: Option<(Instant, Instant)>,
    rng: StdRng,
}

impl Default for EffectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            next_id: 1,
            instances: BTreeMap::new(),
            shake: None,
            rng,
        }
    }

    /// Spawns the effects for one detected transition and returns the new ids.
    pub fn on_transition(&mut self, transition: Transition, now: Instant) -> Vec<EffectId> {
        let mut spawned = Vec::new();
        if transition.has_kill() {
            spawned.extend(self.trigger_kill(now));
        }
        if transition.has_death() {
            spawned.push(self.trigger_death(now));
        }
        spawned
    }

    /// One impact burst, the shake window and a batch of trails with random placement.
    pub fn trigger_kill(&mut self, now: Instant) -> Vec<EffectId> {
        let mut ids = Vec::with_capacity(TRAILS_PER_KILL + 1);
        ids.push(self.insert(EffectKind::ImpactBurst, now, Duration::ZERO, BURST_TTL));
        self.shake = Some((now, now + SHAKE_TTL));

        for _ in 0..TRAILS_PER_KILL {
            let left_pct = self.rng.gen_range(0.0..100.0);
            let delay = Duration::from_millis(self.rng.gen_range(0..TRAIL_MAX_DELAY_MS));
            ids.push(self.insert(
                EffectKind::LinearTrail { left_pct },
                now,
                delay,
                TRAIL_TTL,
            ));
        }
        ids
    }

    /// A single directional flash. Any flash still on screen is replaced.
    pub fn trigger_death(&mut self, now: Instant) -> EffectId {
        self.instances.retain(|_, effect| !effect.kind.is_flash());
        let angle_deg = self.rng.gen_range(0.0..360.0);
        self.insert(
            EffectKind::DirectionalFlash { angle_deg },
            now,
            Duration::ZERO,
            FLASH_TTL,
        )
    }

    fn insert(
        &mut self,
        kind: EffectKind,
        now: Instant,
        start_delay: Duration,
        duration: Duration,
    ) -> EffectId {
        let id = self.next_id;
        self.next_id += 1;
        self.instances.insert(
            id,
            EffectInstance {
                id,
                kind,
                created_at: now,
                start_delay,
                duration,
            },
        );
        id
    }

    /// Removes expired instances and returns how many were dropped.
    pub fn sweep(&mut self, now: Instant) -> usize {
        let before = self.instances.len();
        self.instances.retain(|_, effect| !effect.is_expired(now));
        if self.shake.is_some_and(|(_, until)| now >= until) {
            self.shake = None;
        }
        before - self.instances.len()
    }

    pub fn live(&self, now: Instant) -> impl Iterator<Item = &EffectInstance> {
        self.instances
            .values()
            .filter(move |effect| !effect.is_expired(now))
    }

    pub fn get(&self, id: EffectId, now: Instant) -> Option<&EffectInstance> {
        self.instances
            .get(&id)
            .filter(|effect| !effect.is_expired(now))
    }

    pub fn count_live(&self, now: Instant, pred: impl Fn(&EffectKind) -> bool) -> usize {
        self.live(now).filter(|effect| pred(&effect.kind)).count()
    }

    pub fn burst_active(&self, now: Instant) -> bool {
        self.live(now).any(|effect| effect.kind.is_burst())
    }

    pub fn active_flash(&self, now: Instant) -> Option<&EffectInstance> {
        self.live(now).find(|effect| effect.kind.is_flash())
    }

    /// Time since the current shake window opened, if one is open.
    pub fn shake_elapsed(&self, now: Instant) -> Option<Duration> {
        match self.shake {
            Some((start, until)) if now < until => Some(now.saturating_duration_since(start)),
            _ => None,
        }
    }

    pub fn shake_active(&self, now: Instant) -> bool {
        self.shake_elapsed(now).is_some()
    }

    /// Number of stored instances, including expired ones not yet swept.
    pub fn stored(&self) -> usize {
        self.instances.len()
    }

    pub fn clear(&mut self) {
        self.instances.clear();
        self.shake = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_lifetime_includes_start_delay() {
        let now = Instant::now();
        let mut reg = EffectRegistry::with_seed(7);
        reg.trigger_kill(now);
        for trail in reg.live(now).filter(|e| e.kind.is_trail()) {
            assert!(trail.start_delay < Duration::from_millis(TRAIL_MAX_DELAY_MS));
            assert_eq!(trail.expires_at(), now + trail.start_delay + TRAIL_TTL);
        }
    }

    #[test]
    fn progress_is_zero_before_start_and_one_at_expiry() {
        let now = Instant::now();
        let effect = EffectInstance {
            id: 1,
            kind: EffectKind::LinearTrail { left_pct: 10.0 },
            created_at: now,
            start_delay: Duration::from_millis(200),
            duration: Duration::from_millis(1000),
        };
        assert_eq!(effect.progress(now + Duration::from_millis(100)), 0.0);
        assert!(!effect.is_started(now + Duration::from_millis(199)));
        assert!((effect.progress(now + Duration::from_millis(700)) - 0.5).abs() < 1e-3);
        assert_eq!(effect.progress(now + Duration::from_millis(1200)), 1.0);
    }
}
