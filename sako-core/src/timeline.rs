//! Keyframe scheduler for board animations.
//!
//! A [`Timeline`] holds the value currently shown, an optional value it is
//! animating towards and a queue of further keyframes. The host drives it
//! with [`Timeline::tick`] from its animation frame callback for as long as
//! [`Timeline::is_running`] reports pending work.

use std::collections::VecDeque;

/// Milliseconds, as handed out by `requestAnimationFrame`.
pub type Millis = f64;

#[derive(Clone, Debug, PartialEq)]
pub struct Timeline<T> {
    now: Millis,
    old: (Millis, T),
    new: Option<(Millis, T)>,
    queued: VecDeque<(Millis, T)>,
    running: bool,
}

/// Projection of a timeline at its current clock.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AnimationState<'a, T> {
    Resting(&'a T),
    Transition(Transition<'a, T>),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transition<'a, T> {
    /// Linear progress in `[0, 1]`.
    pub t: f64,
    pub old: &'a T,
    pub new: &'a T,
}

/// How a single property of the animated value changes over a transition.
#[derive(Clone, Debug, PartialEq)]
pub enum PropertyAnimation<P> {
    Interpolate { t: f64, old: P, new: P },
    FadeIn { t: f64, new: P },
    FadeOut { t: f64, old: P },
}

impl<T> Timeline<T> {
    pub fn new(initial: T) -> Self {
        Timeline {
            now: 0.0,
            old: (0.0, initial),
            new: None,
            queued: VecDeque::new(),
            running: false,
        }
    }

    /// Appends a keyframe reached `duration` after the previous one.
    pub fn queue(&mut self, duration: Millis, value: T) {
        self.queued.push_back((duration.max(0.0), value));
        self.running = true;
    }

    /// Drops all pending animation and shows `value` right away.
    pub fn interrupt(&mut self, value: T) {
        if self.running {
            log::debug!("timeline interrupted with {} queued keyframes", self.queued.len());
        }
        self.new = None;
        self.queued.clear();
        self.old = (self.now, value);
        self.schedule();
    }

    /// Advances the clock to `now` and resolves every keyframe that is due.
    pub fn tick(&mut self, now: Millis) {
        if self.new.is_none() {
            // A resting value has no timing of its own, so the next keyframe
            // starts from the current frame.
            self.old.0 = now.max(self.old.0);
        }
        self.now = now.max(self.old.0);
        self.schedule();
    }

    fn schedule(&mut self) {
        loop {
            if let Some((target, _)) = &self.new {
                if self.now < *target {
                    self.running = true;
                    return;
                }
                if let Some(reached) = self.new.take() {
                    self.old = reached;
                }
            }
            match self.queued.pop_front() {
                Some((duration, value)) => {
                    self.new = Some((self.old.0 + duration, value));
                }
                None => {
                    self.running = false;
                    return;
                }
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    /// The value the timeline will settle on once all work is done.
    pub fn latest(&self) -> &T {
        self.queued
            .back()
            .map(|(_, v)| v)
            .or(self.new.as_ref().map(|(_, v)| v))
            .unwrap_or(&self.old.1)
    }

    pub fn target(&self) -> Option<(Millis, &T)> {
        self.new.as_ref().map(|(ts, v)| (*ts, v))
    }

    pub fn animate(&self) -> AnimationState<'_, T> {
        match &self.new {
            None => AnimationState::Resting(&self.old.1),
            Some((target, new)) => {
                let (start, old) = (&self.old.0, &self.old.1);
                let span = target - start;
                let elapsed = (self.now - start).max(0.0);
                let t = if span > 0.0 {
                    (elapsed / span).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                AnimationState::Transition(Transition { t, old, new })
            }
        }
    }
}

/// Classifies one property of a transition by whether it exists at either
/// end.
pub fn animate_property<T, P, F>(
    transition: &Transition<'_, T>,
    extract: F,
) -> Option<PropertyAnimation<P>>
where
    F: Fn(&T) -> Option<P>,
{
    let t = transition.t;
    match (extract(transition.old), extract(transition.new)) {
        (Some(old), Some(new)) => Some(PropertyAnimation::Interpolate { t, old, new }),
        (None, Some(new)) => Some(PropertyAnimation::FadeIn { t, new }),
        (Some(old), None) => Some(PropertyAnimation::FadeOut { t, old }),
        (None, None) => None,
    }
}
