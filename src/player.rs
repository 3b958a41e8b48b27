//! Flipbook playback orchestration.
//!
//! [`Player`] ties the pieces together: it asks an [`ImageLoader`] for every
//! frame, waits until all of them have arrived, then draws one frame per
//! [`Timer`] tick onto a [`Surface`].
//!
//! Everything runs on one logical thread. The host feeds asynchronous
//! outcomes back in through [`Player::on_image_loaded`],
//! [`Player::on_image_failed`] and [`Player::on_timer`]; none of these may
//! be called re-entrantly from inside a collaborator method. Observers that
//! want to steer playback push onto the player's [`CommandQueue`] instead.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crate::animation::{Advance, AnimationController, LoopMode};
use crate::config::PlayerConfig;
use crate::data::{FrameList, ImageAsset};
use crate::error::Result;
use crate::loader::{FrameLoaderState, ImageLoader, LoadError, LoadingPhase, LoadingProgress};
use crate::render::{draw_fitted, Surface};
use crate::sequence::FrameSource;
use crate::sizing::Size;
use crate::timer::{ManualTimer, Timer, TimerId};

/// Coarse player state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlayerState {
    /// Constructed, nothing requested yet
    Idle,
    /// Requests issued, waiting for completions
    Loading,
    /// Every request settled but some frames failed
    Stalled,
    /// All frames loaded, playback never started
    Ready,
    /// A tick is pending
    Playing,
    /// Loaded and stopped after having played
    Paused,
}

/// Snapshot of the playback state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackState {
    pub current_frame_index: usize,
    pub is_playing: bool,
    pub loop_playback: bool,
    pub frames_per_second: f64,
}

/// Notifications emitted by a [`Player`].
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    /// A frame finished loading; carries the loaded fraction (0.0 - 1.0)
    LoadProgress(f64),
    /// Every frame has loaded
    Loaded,
    /// A frame failed to load
    LoadFailed { index: usize, id: String, error: LoadError },
    /// A frame was drawn
    FrameChanged(usize),
    /// Playback wrapped from the last frame to the first
    Looped,
}

/// Receives [`PlayerEvent`]s.
///
/// Implemented for every `FnMut(&PlayerEvent)` closure. Observers run while
/// the player is mutably borrowed; to pause on [`PlayerEvent::Looped`] and
/// the like, push a [`Command`] onto [`Player::command_queue`].
pub trait PlayerObserver {
    fn notify(&mut self, event: &PlayerEvent);
}

impl<F: FnMut(&PlayerEvent)> PlayerObserver for F {
    fn notify(&mut self, event: &PlayerEvent) {
        self(event)
    }
}

/// Handle returned by [`Player::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A playback command that can be deferred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Resume,
}

/// Commands issued from inside an observer.
///
/// Clones share one queue. Queued commands run in order at the end of the
/// player's next `load`, `on_*` or `play` call, after the event that queued
/// them has been delivered.
#[derive(Clone, Debug, Default)]
pub struct CommandQueue(Rc<RefCell<VecDeque<Command>>>);

impl CommandQueue {
    /// Queue `command` for the owning player.
    pub fn push(&self, command: Command) {
        self.0.borrow_mut().push_back(command);
    }

    /// Number of commands waiting to run.
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Returns true if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    fn pop(&self) -> Option<Command> {
        self.0.borrow_mut().pop_front()
    }
}

/// Image-sequence player.
///
/// ## Example
///
/// ```rust
/// use std::time::Duration;
/// use flipbook_core::{ImageAsset, ManualTimer, Player, PlayerConfig, RecordingLoader, RecordingSurface, SequenceDescriptor};
///
/// let surface = RecordingSurface::new(320.0, 180.0);
/// let config = PlayerConfig { fps: 10.0, play_on_load: true, ..Default::default() };
/// let mut player = Player::new(surface, ManualTimer::new(), SequenceDescriptor::new("f1.png", "f3.png"), config);
///
/// // Requests are only recorded; completions are fed back by hand.
/// let mut loader = RecordingLoader::new();
/// player.load(&mut loader);
/// for request in loader.take_requests() {
///     let asset = ImageAsset::new(request.id.clone(), 640, 360, request.id);
///     player.on_image_loaded(request.index, asset);
/// }
///
/// assert!(player.is_playing());
/// player.advance(Duration::from_millis(200));
/// assert!(!player.is_playing());
/// assert_eq!(player.current_frame(), 2);
/// ```
pub struct Player<S: Surface, T: Timer> {
    config: PlayerConfig,
    surface: S,
    timer: T,
    frames: FrameList,
    loading: FrameLoaderState<S::Image>,
    animation: AnimationController,
    /// Armed iff playing
    pending_tick: Option<TimerId>,
    load_deadline: Option<TimerId>,
    deferred: Vec<(TimerId, Command)>,
    play_when_ready: bool,
    has_played: bool,
    observers: Vec<(SubscriptionId, Box<dyn PlayerObserver>)>,
    next_subscription: u64,
    queued: CommandQueue,
    running_queued: bool,
}

impl<S: Surface, T: Timer> Player<S, T> {
    /// Create a player drawing onto `surface`.
    ///
    /// The frame source is resolved immediately; a bad sequence descriptor is
    /// logged and leaves the player with no frames. Nothing is requested until
    /// [`load`](Self::load) is called.
    pub fn new(surface: S, timer: T, source: impl Into<FrameSource>, config: PlayerConfig) -> Self {
        Self::with_frames(surface, timer, source.into().into_frames(), config)
    }

    /// Like [`new`](Self::new), but a sequence descriptor that cannot be
    /// expanded is an error instead of an empty player.
    pub fn try_new(surface: S, timer: T, source: impl Into<FrameSource>, config: PlayerConfig) -> Result<Self> {
        let frames = source.into().try_into_frames()?;
        Ok(Self::with_frames(surface, timer, frames, config))
    }

    fn with_frames(mut surface: S, timer: T, frames: FrameList, config: PlayerConfig) -> Self {
        let config = config.normalized(frames.len());

        if config.width.is_some() || config.height.is_some() {
            let current = surface.size();
            surface.set_size(Size::new(
                config.width.map_or(current.width, f64::from),
                config.height.map_or(current.height, f64::from),
            ));
        }

        let mut animation = AnimationController::new(config.fps);
        animation.set_frame_count(frames.len());
        animation.set_loop_mode(LoopMode::from(config.loop_playback));
        animation.set_current_frame(config.first_frame_index);

        log::debug!("player created with {} frames at {} fps", frames.len(), animation.fps());

        Self {
            config,
            surface,
            timer,
            frames,
            loading: FrameLoaderState::new(),
            animation,
            pending_tick: None,
            load_deadline: None,
            deferred: Vec::new(),
            play_when_ready: false,
            has_played: false,
            observers: Vec::new(),
            next_subscription: 0,
            queued: CommandQueue::default(),
            running_queued: false,
        }
    }

    /// Register an observer for [`PlayerEvent`]s.
    pub fn subscribe(&mut self, observer: impl PlayerObserver + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    /// Queue through which observers issue commands to this player.
    pub fn command_queue(&self) -> CommandQueue {
        self.queued.clone()
    }

    /// Request every frame from `loader`.
    ///
    /// Only the first call has any effect. With no frames the player is
    /// ready at once.
    pub fn load<L: ImageLoader<Image = S::Image>>(&mut self, loader: &mut L) {
        if self.loading.phase() != LoadingPhase::Idle {
            log::warn!("load() called twice, ignoring");
            return;
        }

        self.loading.start_loading(self.frames.len());
        if self.frames.is_empty() {
            log::warn!("no frames to load");
            self.finish_loading();
            self.run_queued();
            return;
        }

        log::debug!("requesting {} frames", self.frames.len());
        for (index, id) in self.frames.iter().enumerate() {
            loader.request(index, id, self.config.cross_origin);
        }
        self.arm_load_timeout();
    }

    /// Re-request every frame that failed. Returns how many were retried.
    pub fn retry_failed<L: ImageLoader<Image = S::Image>>(&mut self, loader: &mut L) -> usize {
        let retried = self.loading.retry_failed();
        if retried.is_empty() {
            return 0;
        }

        log::debug!("retrying {} frames", retried.len());
        for &index in &retried {
            loader.request(index, &self.frames[index], self.config.cross_origin);
        }
        self.arm_load_timeout();
        retried.len()
    }

    /// Deliver a successfully decoded frame.
    ///
    /// Completions may arrive in any order. Unknown, duplicate or late ones
    /// are ignored.
    pub fn on_image_loaded(&mut self, index: usize, asset: ImageAsset<S::Image>) {
        if !self.loading.complete(index, asset) {
            log::warn!("ignoring unexpected load completion for frame {index}");
            return;
        }

        let progress = self.loading.progress();
        log::trace!("frame {index} loaded ({}/{})", progress.loaded, progress.total);
        let fraction = progress.fraction();
        self.emit(PlayerEvent::LoadProgress(fraction));
        self.after_settle();
        self.run_queued();
    }

    /// Deliver a load failure for a frame.
    pub fn on_image_failed(&mut self, index: usize, error: LoadError) {
        if !self.loading.fail(index, error.clone()) {
            log::warn!("ignoring unexpected load failure for frame {index}");
            return;
        }

        log::warn!("frame {index} (`{}`) failed: {error}", self.frames[index]);
        let id = self.frames[index].clone();
        self.emit(PlayerEvent::LoadFailed { index, id, error });
        self.after_settle();
        self.run_queued();
    }

    /// Deliver an expired timer.
    ///
    /// Ids that are stale (cancelled, already handled, or not ours) are ignored.
    pub fn on_timer(&mut self, id: TimerId) {
        if self.pending_tick == Some(id) {
            self.pending_tick = None;
            self.step();
        } else if self.load_deadline == Some(id) {
            self.load_deadline = None;
            self.expire_pending_loads();
        } else if let Some(pos) = self.deferred.iter().position(|&(timer, _)| timer == id) {
            let (_, command) = self.deferred.remove(pos);
            self.run(command);
        } else {
            log::trace!("ignoring stale timer {id:?}");
        }
        self.run_queued();
    }

    /// Clear the surface and draw frame `index`.
    ///
    /// Emits [`PlayerEvent::FrameChanged`] when the frame was drawn. Returns
    /// false, drawing nothing, if that frame has not loaded.
    pub fn render_frame(&mut self, index: usize) -> bool {
        let Some(asset) = self.loading.asset(index) else {
            log::warn!("frame {index} is not loaded, nothing to render");
            return false;
        };

        let natural = asset.natural_size();
        if draw_fitted(&mut self.surface, &asset.image, natural, self.config.fit, self.config.anchor).is_none() {
            log::warn!(
                "cannot fit {}x{} frame {index} into {:?}",
                natural.width,
                natural.height,
                self.surface.size()
            );
        }
        self.emit(PlayerEvent::FrameChanged(index));
        true
    }

    /// Start playing from the current frame.
    ///
    /// The current frame is drawn at once, then one frame per tick. Does
    /// nothing when already playing. Before loading completes, the request is
    /// remembered and honoured once the player is ready.
    pub fn play(&mut self) {
        self.start();
        self.run_queued();
    }

    fn start(&mut self) {
        if self.pending_tick.is_some() {
            return;
        }
        if self.loading.phase() != LoadingPhase::Complete {
            log::debug!("play requested before frames loaded, deferring until ready");
            self.play_when_ready = true;
            return;
        }
        if self.frames.is_empty() {
            log::debug!("nothing to play");
            return;
        }

        self.has_played = true;
        self.step();
    }

    /// Stop at the current frame. Does nothing when not playing.
    pub fn pause(&mut self) {
        self.play_when_ready = false;
        if let Some(id) = self.pending_tick.take() {
            self.timer.cancel(id);
            log::debug!("paused at frame {}", self.animation.current_frame());
        }
    }

    /// Continue from the current frame. Does nothing when already playing.
    pub fn resume(&mut self) {
        if !self.is_playing() {
            self.play();
        }
    }

    /// Pause when playing, play otherwise.
    pub fn toggle_play(&mut self) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play();
        }
    }

    /// [`play`](Self::play) after `delay`.
    pub fn play_after(&mut self, delay: Duration) {
        self.defer(Command::Play, delay);
    }

    /// [`pause`](Self::pause) after `delay`.
    pub fn pause_after(&mut self, delay: Duration) {
        self.defer(Command::Pause, delay);
    }

    /// [`resume`](Self::resume) after `delay`.
    pub fn resume_after(&mut self, delay: Duration) {
        self.defer(Command::Resume, delay);
    }

    /// Schedule a pause if playing now, a play otherwise.
    ///
    /// The direction is decided at call time, not when the delay expires.
    pub fn toggle_play_after(&mut self, delay: Duration) {
        let command = if self.is_playing() { Command::Pause } else { Command::Play };
        self.defer(command, delay);
    }

    /// Run `command` after `delay`, or right away for a zero delay.
    ///
    /// Deferred commands are not deduplicated: each one fires.
    pub fn defer(&mut self, command: Command, delay: Duration) {
        if delay.is_zero() {
            self.run(command);
            return;
        }
        let id = self.timer.arm(delay);
        self.deferred.push((id, command));
    }

    /// Coarse state of the player.
    pub fn state(&self) -> PlayerState {
        match self.loading.phase() {
            LoadingPhase::Idle => PlayerState::Idle,
            LoadingPhase::Loading => PlayerState::Loading,
            LoadingPhase::Stalled => PlayerState::Stalled,
            LoadingPhase::Complete if self.is_playing() => PlayerState::Playing,
            LoadingPhase::Complete if self.has_played => PlayerState::Paused,
            LoadingPhase::Complete => PlayerState::Ready,
        }
    }

    /// Snapshot of index, play flag, loop flag and rate.
    pub fn playback(&self) -> PlaybackState {
        PlaybackState {
            current_frame_index: self.animation.current_frame(),
            is_playing: self.is_playing(),
            loop_playback: self.animation.loop_mode() == LoopMode::Loop,
            frames_per_second: self.animation.fps(),
        }
    }

    /// Returns true while a tick is pending.
    #[inline]
    pub fn is_playing(&self) -> bool {
        self.pending_tick.is_some()
    }

    /// Index of the frame drawn on the next tick.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.animation.current_frame()
    }

    /// Frame identifiers, in playback order.
    #[inline]
    pub fn frames(&self) -> &[String] {
        &self.frames
    }

    /// Load counters.
    #[inline]
    pub fn progress(&self) -> &LoadingProgress {
        self.loading.progress()
    }

    /// Loaded asset for a frame, if any.
    pub fn asset(&self, index: usize) -> Option<&ImageAsset<S::Image>> {
        self.loading.asset(index)
    }

    /// Normalized configuration.
    #[inline]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// The drawing surface.
    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Mutable access to the drawing surface.
    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Mutable access to the timer.
    #[inline]
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Draw the current frame, advance, and arm the next tick unless the
    /// sequence just ended.
    fn step(&mut self) {
        self.render_frame(self.animation.current_frame());

        match self.animation.advance() {
            Advance::Next => {}
            Advance::Wrapped => {
                log::trace!("looped");
                self.emit(PlayerEvent::Looped);
            }
            Advance::Finished => {
                log::debug!("reached the last frame, stopping");
                return;
            }
        }

        self.pending_tick = Some(self.timer.arm(self.animation.interval()));
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::Play => self.play(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
        }
    }

    fn arm_load_timeout(&mut self) {
        if let Some(id) = self.load_deadline.take() {
            self.timer.cancel(id);
        }
        if let Some(timeout) = self.config.load_timeout() {
            self.load_deadline = Some(self.timer.arm(timeout));
        }
    }

    fn expire_pending_loads(&mut self) {
        let expired = self.loading.fail_pending(LoadError::TimedOut);
        if expired.is_empty() {
            return;
        }

        log::warn!("{} frames still loading after timeout", expired.len());
        for index in expired {
            let id = self.frames[index].clone();
            self.emit(PlayerEvent::LoadFailed { index, id, error: LoadError::TimedOut });
        }
        self.after_settle();
    }

    fn after_settle(&mut self) {
        match self.loading.phase() {
            LoadingPhase::Complete => self.finish_loading(),
            LoadingPhase::Stalled => {
                if let Some(id) = self.load_deadline.take() {
                    self.timer.cancel(id);
                }
                log::warn!("{}", self.loading.progress().message());
            }
            LoadingPhase::Idle | LoadingPhase::Loading => {}
        }
    }

    fn finish_loading(&mut self) {
        if let Some(id) = self.load_deadline.take() {
            self.timer.cancel(id);
        }

        let first = self.config.first_frame_index;
        if self.config.size_to_first_image {
            if let Some(asset) = self.loading.asset(first) {
                self.surface.set_size(asset.natural_size());
                self.config.width = Some(asset.natural_width);
                self.config.height = Some(asset.natural_height);
            }
        }

        log::debug!("all {} frames loaded", self.frames.len());
        self.emit(PlayerEvent::Loaded);

        if self.config.render_first_frame_on_load && !self.frames.is_empty() {
            self.render_frame(first);
        }
        let requested = std::mem::take(&mut self.play_when_ready);
        if self.config.play_on_load || requested {
            self.play();
        }
    }

    fn run_queued(&mut self) {
        if self.running_queued {
            return;
        }
        self.running_queued = true;
        while let Some(command) = self.queued.pop() {
            log::trace!("running queued {command:?}");
            self.run(command);
        }
        self.running_queued = false;
    }

    fn emit(&mut self, event: PlayerEvent) {
        for (_, observer) in &mut self.observers {
            observer.notify(&event);
        }
    }
}

impl<S: Surface> Player<S, ManualTimer> {
    /// Move the virtual clock forward by `by`, firing due timers in order.
    ///
    /// Ticks re-armed while advancing fire too if they fall inside the window.
    pub fn advance(&mut self, by: Duration) {
        let until = self.timer.now() + by;
        while let Some(id) = self.timer.pop_due(until) {
            self.on_timer(id);
        }
        self.timer.set_now(until);
    }
}

impl<S: Surface, T: Timer> Drop for Player<S, T> {
    fn drop(&mut self) {
        if let Some(id) = self.pending_tick.take() {
            self.timer.cancel(id);
        }
        if let Some(id) = self.load_deadline.take() {
            self.timer.cancel(id);
        }
        for (id, _) in self.deferred.drain(..) {
            self.timer.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::loader::{CrossOrigin, RecordingLoader};
    use crate::render::{DrawCommand, RecordingSurface};
    use crate::sequence::SequenceDescriptor;
    use crate::sizing::Placement;

    type TestPlayer = Player<RecordingSurface<String>, ManualTimer>;

    const TICK: Duration = Duration::from_millis(100);

    fn config() -> PlayerConfig {
        PlayerConfig {
            fps: 10.0,
            ..Default::default()
        }
    }

    fn player(frames: &[&str], config: PlayerConfig) -> (TestPlayer, RecordingLoader<String>, Rc<RefCell<Vec<PlayerEvent>>>) {
        let frames: Vec<String> = frames.iter().map(|f| f.to_string()).collect();
        let mut player = Player::new(RecordingSurface::new(100.0, 100.0), ManualTimer::new(), frames, config);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        player.subscribe(move |event: &PlayerEvent| sink.borrow_mut().push(event.clone()));
        (player, RecordingLoader::new(), events)
    }

    fn asset(id: &str, width: u32, height: u32) -> ImageAsset<String> {
        ImageAsset::new(id, width, height, id.to_string())
    }

    fn load_all(player: &mut TestPlayer, loader: &mut RecordingLoader<String>) {
        for request in loader.take_requests() {
            player.on_image_loaded(request.index, asset(&request.id, 200, 100));
        }
    }

    fn ready(frames: &[&str], config: PlayerConfig) -> (TestPlayer, Rc<RefCell<Vec<PlayerEvent>>>) {
        let (mut player, mut loader, events) = player(frames, config);
        player.load(&mut loader);
        load_all(&mut player, &mut loader);
        events.borrow_mut().clear();
        player.surface_mut().take_commands();
        (player, events)
    }

    fn frame_changes(events: &Rc<RefCell<Vec<PlayerEvent>>>) -> Vec<usize> {
        events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                PlayerEvent::FrameChanged(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    fn loops(events: &Rc<RefCell<Vec<PlayerEvent>>>) -> usize {
        events.borrow().iter().filter(|e| **e == PlayerEvent::Looped).count()
    }

    #[test]
    fn test_load_requests_everything_up_front() {
        let config = PlayerConfig { cross_origin: CrossOrigin::Anonymous, ..config() };
        let (mut player, mut loader, _) = player(&["a.png", "b.png", "c.png"], config);
        assert_eq!(player.state(), PlayerState::Idle);

        player.load(&mut loader);
        assert_eq!(player.state(), PlayerState::Loading);
        let ids: Vec<&str> = loader.requests().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a.png", "b.png", "c.png"]);
        assert!(loader.requests().iter().all(|r| r.cross_origin == CrossOrigin::Anonymous));

        player.load(&mut loader);
        assert_eq!(loader.requests().len(), 3);
    }

    #[test]
    fn test_ready_only_after_every_completion() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png", "c.png"], config());
        player.load(&mut loader);

        player.on_image_loaded(2, asset("c.png", 200, 100));
        player.on_image_loaded(0, asset("a.png", 200, 100));
        assert_eq!(player.state(), PlayerState::Loading);
        assert!(player.surface().commands().is_empty());

        player.on_image_loaded(1, asset("b.png", 200, 100));
        assert_eq!(player.state(), PlayerState::Ready);

        let events = events.borrow();
        assert_eq!(
            events.as_slice(),
            &[
                PlayerEvent::LoadProgress(1.0 / 3.0),
                PlayerEvent::LoadProgress(2.0 / 3.0),
                PlayerEvent::LoadProgress(1.0),
                PlayerEvent::Loaded,
                PlayerEvent::FrameChanged(0),
            ]
        );
        assert_eq!(
            player.surface().commands(),
            &[
                DrawCommand::Clear,
                DrawCommand::Image {
                    image: "a.png".to_string(),
                    placement: Placement { x: -50.0, y: 0.0, width: 200.0, height: 100.0 },
                },
            ]
        );
    }

    #[test]
    fn test_duplicate_completion_ignored() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config());
        player.load(&mut loader);

        player.on_image_loaded(0, asset("a.png", 200, 100));
        player.on_image_loaded(0, asset("a.png", 200, 100));
        player.on_image_loaded(5, asset("z.png", 200, 100));
        assert_eq!(player.state(), PlayerState::Loading);
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_render_first_frame_can_be_disabled() {
        let config = PlayerConfig { render_first_frame_on_load: false, ..config() };
        let (mut player, mut loader, events) = player(&["a.png"], config);
        player.load(&mut loader);
        load_all(&mut player, &mut loader);

        assert!(player.surface().commands().is_empty());
        assert!(frame_changes(&events).is_empty());
        assert_eq!(player.state(), PlayerState::Ready);
    }

    #[test]
    fn test_play_on_load() {
        let config = PlayerConfig { play_on_load: true, ..config() };
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config);
        player.load(&mut loader);
        load_all(&mut player, &mut loader);

        assert!(player.is_playing());
        // First frame drawn on load, then again as the first tick
        assert_eq!(frame_changes(&events), vec![0, 0]);
        assert_eq!(player.current_frame(), 1);
    }

    #[test]
    fn test_play_twice_arms_one_tick() {
        let (mut player, events) = ready(&["a.png", "b.png", "c.png"], config());

        player.play();
        player.play();
        assert!(player.is_playing());
        assert_eq!(player.timer_mut().pending_count(), 1);
        assert_eq!(frame_changes(&events), vec![0]);
    }

    #[test]
    fn test_pause_twice_is_harmless() {
        let (mut player, _) = ready(&["a.png", "b.png", "c.png"], config());

        player.play();
        player.pause();
        player.pause();
        assert!(!player.is_playing());
        assert_eq!(player.timer_mut().pending_count(), 0);
        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn test_one_draw_per_tick() {
        let (mut player, events) = ready(&["a.png", "b.png", "c.png", "d.png"], config());

        player.play();
        player.advance(TICK * 2);
        assert_eq!(frame_changes(&events), vec![0, 1, 2]);
        assert_eq!(player.surface().drawn().len(), 3);
    }

    #[test]
    fn test_loop_returns_to_start_every_n_ticks() {
        let config = PlayerConfig { loop_playback: true, ..config() };
        let (mut player, events) = ready(&["a.png", "b.png", "c.png", "d.png"], config);

        // play() is the first of the four ticks
        player.play();
        player.advance(TICK * 3);
        assert_eq!(player.current_frame(), 0);
        assert_eq!(loops(&events), 1);

        player.advance(TICK * 4);
        assert_eq!(player.current_frame(), 0);
        assert_eq!(loops(&events), 2);
        assert!(player.is_playing());
        assert_eq!(frame_changes(&events), vec![0, 1, 2, 3, 0, 1, 2, 3]);
    }

    #[test]
    fn test_single_frame_loop() {
        let config = PlayerConfig { loop_playback: true, ..config() };
        let (mut player, events) = ready(&["a.png"], config);

        player.play();
        player.advance(TICK * 2);
        assert_eq!(loops(&events), 3);
        assert_eq!(player.current_frame(), 0);
    }

    #[test]
    fn test_stops_after_last_frame() {
        let (mut player, events) = ready(&["a.png", "b.png", "c.png"], config());

        player.play();
        player.advance(TICK);
        assert_eq!(player.current_frame(), 2);
        assert!(player.is_playing());

        player.advance(TICK);
        assert!(!player.is_playing());
        assert_eq!(player.timer_mut().pending_count(), 0);
        assert_eq!(player.current_frame(), 2);

        player.advance(TICK * 10);
        assert_eq!(frame_changes(&events), vec![0, 1, 2]);
        assert_eq!(loops(&events), 0);

        // Replay continues from the stopped index rather than rewinding
        player.resume();
        assert_eq!(frame_changes(&events), vec![0, 1, 2, 2]);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let (mut player, events) = ready(&["a.png", "b.png", "c.png", "d.png", "e.png"], config());

        player.play();
        player.advance(TICK);
        player.pause();
        assert_eq!(player.current_frame(), 2);

        player.advance(TICK * 5);
        assert_eq!(frame_changes(&events), vec![0, 1]);

        player.resume();
        assert!(player.is_playing());
        assert_eq!(frame_changes(&events), vec![0, 1, 2]);
    }

    #[test]
    fn test_toggle_play() {
        let (mut player, _) = ready(&["a.png", "b.png"], config());

        player.toggle_play();
        assert_eq!(player.state(), PlayerState::Playing);
        player.toggle_play();
        assert_eq!(player.state(), PlayerState::Paused);
    }

    #[test]
    fn test_delayed_play() {
        let (mut player, _) = ready(&["a.png", "b.png"], config());

        player.play_after(Duration::from_millis(50));
        assert!(!player.is_playing());

        player.advance(Duration::from_millis(49));
        assert!(!player.is_playing());
        player.advance(Duration::from_millis(1));
        assert!(player.is_playing());
    }

    #[test]
    fn test_zero_delay_runs_immediately() {
        let (mut player, _) = ready(&["a.png", "b.png"], config());
        player.play_after(Duration::ZERO);
        assert!(player.is_playing());

        player.pause_after(Duration::ZERO);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_delayed_commands_not_deduplicated() {
        let (mut player, events) = ready(&["a.png", "b.png", "c.png"], config());

        player.play_after(Duration::from_millis(10));
        player.play_after(Duration::from_millis(20));
        assert_eq!(player.timer_mut().pending_count(), 2);

        player.advance(Duration::from_millis(20));
        assert!(player.is_playing());
        assert_eq!(frame_changes(&events), vec![0]);
        assert_eq!(player.timer_mut().pending_count(), 1);
    }

    #[test]
    fn test_delayed_pause_and_resume() {
        let (mut player, _) = ready(&["a.png", "b.png", "c.png", "d.png", "e.png"], config());

        player.play();
        player.pause_after(Duration::from_millis(150));
        player.advance(Duration::from_millis(150));
        assert!(!player.is_playing());
        assert_eq!(player.current_frame(), 2);

        player.resume_after(Duration::from_millis(30));
        player.advance(Duration::from_millis(30));
        assert!(player.is_playing());
    }

    #[test]
    fn test_toggle_after_decides_at_call_time() {
        let (mut player, _) = ready(&["a.png", "b.png", "c.png"], config());

        // Not playing now, so this schedules a play
        player.toggle_play_after(Duration::from_millis(10));
        player.play();
        player.advance(Duration::from_millis(10));
        assert!(player.is_playing());
    }

    #[test]
    fn test_play_before_ready_waits() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config());
        player.play();
        assert!(!player.is_playing());

        player.load(&mut loader);
        player.play();
        assert!(!player.is_playing());

        load_all(&mut player, &mut loader);
        assert!(player.is_playing());
        assert_eq!(frame_changes(&events), vec![0, 0]);
    }

    #[test]
    fn test_pause_before_ready_cancels_pending_play() {
        let (mut player, mut loader, _) = player(&["a.png", "b.png"], config());
        player.load(&mut loader);
        player.play();
        player.pause();

        load_all(&mut player, &mut loader);
        assert!(!player.is_playing());
        assert_eq!(player.state(), PlayerState::Ready);
    }

    #[test]
    fn test_first_frame_index_and_size_to_first_image() {
        let config = PlayerConfig {
            first_frame_index: 1,
            size_to_first_image: true,
            ..config()
        };
        let (mut player, mut loader, events) = player(&["a.png", "b.png", "c.png"], config);
        player.load(&mut loader);
        player.on_image_loaded(0, asset("a.png", 200, 100));
        player.on_image_loaded(1, asset("b.png", 64, 32));
        player.on_image_loaded(2, asset("c.png", 200, 100));

        assert_eq!(player.surface().size(), Size::new(64.0, 32.0));
        assert_eq!(player.config().width, Some(64));
        assert_eq!(player.config().height, Some(32));
        assert_eq!(player.current_frame(), 1);
        assert_eq!(frame_changes(&events), vec![1]);
        assert_eq!(
            player.surface().drawn(),
            vec![(&"b.png".to_string(), &Placement { x: 0.0, y: 0.0, width: 64.0, height: 32.0 })]
        );
    }

    #[test]
    fn test_explicit_viewport_size() {
        let config = PlayerConfig { width: Some(300), ..config() };
        let (player, _, _) = player(&["a.png"], config);
        assert_eq!(player.surface().size(), Size::new(300.0, 100.0));
    }

    #[test]
    fn test_first_frame_index_clamped() {
        let config = PlayerConfig { first_frame_index: 10, ..config() };
        let (player, _, _) = player(&["a.png", "b.png"], config);
        assert_eq!(player.current_frame(), 1);
        assert_eq!(player.config().first_frame_index, 1);
    }

    #[test]
    fn test_failed_load_stalls_then_retry_recovers() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config());
        player.load(&mut loader);
        loader.take_requests();

        player.on_image_failed(0, LoadError::Failed("404".into()));
        player.on_image_loaded(1, asset("b.png", 200, 100));
        assert_eq!(player.state(), PlayerState::Stalled);
        assert!(!events.borrow().contains(&PlayerEvent::Loaded));
        assert!(events.borrow().contains(&PlayerEvent::LoadFailed {
            index: 0,
            id: "a.png".into(),
            error: LoadError::Failed("404".into()),
        }));

        player.play();
        assert!(!player.is_playing());

        assert_eq!(player.retry_failed(&mut loader), 1);
        assert_eq!(player.state(), PlayerState::Loading);
        assert_eq!(loader.requests().len(), 1);
        assert_eq!(loader.requests()[0].index, 0);

        load_all(&mut player, &mut loader);
        assert!(events.borrow().contains(&PlayerEvent::Loaded));
        assert!(player.is_playing());
    }

    #[test]
    fn test_load_timeout() {
        let config = PlayerConfig { load_timeout_ms: Some(500), ..config() };
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config);
        player.load(&mut loader);
        player.on_image_loaded(0, asset("a.png", 200, 100));

        player.advance(Duration::from_millis(499));
        assert_eq!(player.state(), PlayerState::Loading);

        player.advance(Duration::from_millis(1));
        assert_eq!(player.state(), PlayerState::Stalled);
        assert!(events.borrow().contains(&PlayerEvent::LoadFailed {
            index: 1,
            id: "b.png".into(),
            error: LoadError::TimedOut,
        }));

        // Too late
        player.on_image_loaded(1, asset("b.png", 200, 100));
        assert_eq!(player.state(), PlayerState::Stalled);
    }

    #[test]
    fn test_load_timeout_cancelled_when_ready() {
        let config = PlayerConfig { load_timeout_ms: Some(500), ..config() };
        let (mut player, mut loader, _) = player(&["a.png"], config);
        player.load(&mut loader);
        assert_eq!(player.timer_mut().pending_count(), 1);

        load_all(&mut player, &mut loader);
        assert_eq!(player.timer_mut().pending_count(), 0);
    }

    #[test]
    fn test_empty_frame_list() {
        let (mut player, mut loader, events) = player(&[], PlayerConfig { play_on_load: true, ..config() });
        player.load(&mut loader);

        assert!(loader.requests().is_empty());
        assert_eq!(player.state(), PlayerState::Ready);
        assert_eq!(events.borrow().as_slice(), &[PlayerEvent::Loaded]);

        player.play();
        assert!(!player.is_playing());
    }

    #[test]
    fn test_bad_sequence_gives_empty_player() {
        let player: TestPlayer = Player::new(
            RecordingSurface::new(10.0, 10.0),
            ManualTimer::new(),
            SequenceDescriptor::new("a.png", "b.png"),
            config(),
        );
        assert!(player.frames().is_empty());
    }

    #[test]
    fn test_sequence_source() {
        let player: TestPlayer = Player::new(
            RecordingSurface::new(10.0, 10.0),
            ManualTimer::new(),
            SequenceDescriptor::new("shot_08.jpg", "shot_11.jpg"),
            config(),
        );
        assert_eq!(player.frames(), &["shot_08.jpg", "shot_09.jpg", "shot_10.jpg", "shot_11.jpg"]);
    }

    #[test]
    fn test_unsubscribe() {
        let (mut player, _) = ready(&["a.png"], config());
        let count = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&count);
        let id = player.subscribe(move |_: &PlayerEvent| *sink.borrow_mut() += 1);

        player.render_frame(0);
        assert!(player.unsubscribe(id));
        assert!(!player.unsubscribe(id));
        player.render_frame(0);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_render_unloaded_frame() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config());
        player.load(&mut loader);
        assert!(!player.render_frame(0));
        assert!(!player.render_frame(9));
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn test_stale_timer_ignored() {
        let (mut player, events) = ready(&["a.png", "b.png"], config());
        player.on_timer(TimerId(999));
        assert!(events.borrow().is_empty());
        assert_eq!(player.state(), PlayerState::Ready);
    }

    #[test]
    fn test_extreme_frame_rates_stay_bounded() {
        let config = PlayerConfig { fps: 1e12, loop_playback: true, ..Default::default() };
        let (mut player, events) = ready(&["a.png", "b.png"], config);
        player.play();
        player.advance(Duration::from_millis(3));
        assert_eq!(frame_changes(&events), vec![0, 1, 0, 1]);
        assert!(player.is_playing());

        let config = PlayerConfig { fps: 1e-30, ..Default::default() };
        let (mut player, events) = ready(&["a.png", "b.png"], config);
        player.play();
        player.advance(TICK);
        assert_eq!(frame_changes(&events), vec![0]);
        assert!(player.is_playing());
    }

    #[test]
    fn test_degenerate_frame_only_clears() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png", "c.png"], config());
        player.load(&mut loader);
        for request in loader.take_requests() {
            player.on_image_loaded(request.index, asset(&request.id, 0, 100));
        }
        events.borrow_mut().clear();
        player.surface_mut().take_commands();

        player.play();
        player.advance(TICK);
        assert_eq!(frame_changes(&events), vec![0, 1]);
        assert_eq!(player.surface().commands(), &[DrawCommand::Clear, DrawCommand::Clear]);
        assert!(player.surface().drawn().is_empty());
        assert!(player.is_playing());
        assert_eq!(player.current_frame(), 2);
    }

    #[test]
    fn test_try_new_reports_bad_sequence() {
        let result: Result<TestPlayer> = Player::try_new(
            RecordingSurface::new(10.0, 10.0),
            ManualTimer::new(),
            SequenceDescriptor::new("img01.png", "img1.png"),
            config(),
        );
        assert!(matches!(result, Err(crate::Error::Sequence(_))));

        let player: TestPlayer = Player::try_new(
            RecordingSurface::new(10.0, 10.0),
            ManualTimer::new(),
            SequenceDescriptor::new("img1.png", "img3.png"),
            config(),
        )
        .unwrap();
        assert_eq!(player.frames().len(), 3);
    }

    #[test]
    fn test_observer_pauses_on_loop() {
        let config = PlayerConfig { loop_playback: true, ..config() };
        let (mut player, events) = ready(&["a.png", "b.png", "c.png"], config);
        let queue = player.command_queue();
        player.subscribe(move |event: &PlayerEvent| {
            if *event == PlayerEvent::Looped {
                queue.push(Command::Pause);
            }
        });

        player.play();
        player.advance(TICK * 5);
        assert_eq!(frame_changes(&events), vec![0, 1, 2]);
        assert_eq!(loops(&events), 1);
        assert!(!player.is_playing());
        assert_eq!(player.current_frame(), 0);
        assert!(player.command_queue().is_empty());
    }

    #[test]
    fn test_observer_plays_once_loaded() {
        let (mut player, mut loader, events) = player(&["a.png", "b.png"], config());
        let queue = player.command_queue();
        player.subscribe(move |event: &PlayerEvent| {
            if *event == PlayerEvent::Loaded {
                queue.push(Command::Play);
            }
        });

        player.load(&mut loader);
        load_all(&mut player, &mut loader);
        assert!(player.is_playing());
        assert_eq!(frame_changes(&events), vec![0, 0]);
    }

    #[test]
    fn test_playback_snapshot() {
        let config = PlayerConfig { loop_playback: true, fps: 12.5, ..Default::default() };
        let (mut player, _) = ready(&["a.png", "b.png"], config);
        player.play();

        assert_eq!(
            player.playback(),
            PlaybackState {
                current_frame_index: 1,
                is_playing: true,
                loop_playback: true,
                frames_per_second: 12.5,
            }
        );
    }
}
